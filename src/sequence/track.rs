use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::foundation::core::TimeWindow;
use crate::foundation::error::{PosereelError, PosereelResult};

/// One step of an event track: `value` holds for the whole `[start_sec, end_sec)` window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent<T> {
    /// Inclusive local start.
    pub start_sec: f64,
    /// Exclusive local end.
    pub end_sec: f64,
    /// Target value applied over the window.
    pub value: T,
}

impl<T> TimedEvent<T> {
    /// Create an event.
    pub fn new(start_sec: f64, end_sec: f64, value: T) -> Self {
        Self {
            start_sec,
            end_sec,
            value,
        }
    }

    /// The event's half-open window.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_sec, self.end_sec)
    }
}

/// Ordered, non-overlapping list of events describing one aspect of a pose.
///
/// Construction sorts events by start and rejects empty or overlapping windows, so a track that
/// exists is always well formed. JSON goes through the same checks.
#[derive(Clone, Debug, PartialEq)]
pub struct EventTrack<T> {
    events: Vec<TimedEvent<T>>,
}

impl<T> Default for EventTrack<T> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<T> EventTrack<T> {
    /// Build a validated track.
    pub fn new(mut events: Vec<TimedEvent<T>>) -> PosereelResult<Self> {
        for e in &events {
            if !e.window().is_well_formed() || e.start_sec < 0.0 {
                return Err(PosereelError::validation(format!(
                    "event [{}, {}) must satisfy 0 <= start < end",
                    e.start_sec, e.end_sec
                )));
            }
        }
        events.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
        for pair in events.windows(2) {
            if pair[1].start_sec < pair[0].end_sec {
                return Err(PosereelError::validation(format!(
                    "events [{}, {}) and [{}, {}) overlap",
                    pair[0].start_sec, pair[0].end_sec, pair[1].start_sec, pair[1].end_sec
                )));
            }
        }
        Ok(Self { events })
    }

    /// A track with no events; every sample falls through to the default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Events in start order.
    pub fn events(&self) -> &[TimedEvent<T>] {
        &self.events
    }

    /// Return `true` when the track has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End of the last event, or `0.0` for an empty track.
    pub fn end_sec(&self) -> f64 {
        self.events.last().map(|e| e.end_sec).unwrap_or(0.0)
    }

    /// Value of the event whose `[start, end)` contains `t`, if any.
    ///
    /// At an exact `end` instant the next event wins when it starts there; otherwise there is no
    /// value and callers fall back to the track default.
    pub fn sample(&self, t: f64) -> Option<&T> {
        let idx = self.events.partition_point(|e| e.start_sec <= t);
        let e = self.events.get(idx.checked_sub(1)?)?;
        (t < e.end_sec).then_some(&e.value)
    }
}

impl<T: Serialize> Serialize for EventTrack<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.events.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for EventTrack<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let events = Vec::<TimedEvent<T>>::deserialize(deserializer)?;
        Self::new(events).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/track.rs"]
mod tests;

use crate::scene::model::SceneScript;

/// One sound cue placed on the absolute timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioScheduleEntry {
    /// Blob uri of the encoded source.
    pub source_uri: String,
    /// Absolute start.
    pub start_sec: f64,
    /// Absolute end of the scheduled window.
    pub end_sec: f64,
    /// Linear gain.
    pub volume: f32,
}

impl AudioScheduleEntry {
    /// Length of the scheduled window.
    pub fn window_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

/// Flatten every character item's sound events onto the absolute timeline, sorted by start.
pub fn extract_audio_schedule(script: &SceneScript) -> Vec<AudioScheduleEntry> {
    let mut out = Vec::new();
    for c in script.items.iter().filter_map(|i| i.as_character()) {
        for ev in c.sequence.sound_events.events() {
            out.push(AudioScheduleEntry {
                source_uri: ev.value.source_uri.clone(),
                start_sec: c.start_time_sec + ev.start_sec,
                end_sec: c.start_time_sec + ev.end_sec,
                volume: ev.value.volume,
            });
        }
    }
    out.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
    out
}

#[cfg(test)]
#[path = "../../tests/unit/audio/schedule.rs"]
mod tests;

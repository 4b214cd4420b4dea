use std::collections::BTreeMap;

use crate::scene::model::{SceneScript, TimedCharacterSequence};
use crate::sequence::pose::CharacterPose;

/// Where an absolute time falls relative to one actor's items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseZone {
    /// Before the actor's first item starts.
    PreRoll,
    /// Inside the item at `item_index` (index into the actor's start-sorted items).
    InWindow {
        /// Index into the start-sorted items.
        item_index: usize,
    },
    /// Between items, or after the last one ends.
    Gap,
}

/// Resolved pose of one actor at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorPose {
    /// Timeline zone the sample came from.
    pub zone: PoseZone,
    /// Visual state to draw.
    pub pose: CharacterPose,
}

/// Resolve one actor's pose at `absolute_time`.
///
/// `items` are that actor's character items in any order; they must not overlap. Before the
/// first item the first sequence is sampled at local time 0. Between and after items every track
/// is at its default. Tracks never carry values across item boundaries.
pub fn sample_actor_pose(items: &[&TimedCharacterSequence], absolute_time: f64) -> ActorPose {
    let mut sorted: Vec<&TimedCharacterSequence> = items.to_vec();
    sorted.sort_by(|a, b| a.start_time_sec.total_cmp(&b.start_time_sec));
    resolve_sorted(&sorted, absolute_time)
}

fn resolve_sorted(sorted: &[&TimedCharacterSequence], t: f64) -> ActorPose {
    let Some(first) = sorted.first() else {
        return ActorPose {
            zone: PoseZone::Gap,
            pose: CharacterPose::DEFAULT,
        };
    };
    if t < first.start_time_sec {
        return ActorPose {
            zone: PoseZone::PreRoll,
            pose: first.sequence.sample_pose(0.0),
        };
    }

    // Last item starting at or before t; windows are disjoint so it is the only candidate.
    let idx = sorted.partition_point(|c| c.start_time_sec <= t);
    let item_index = idx - 1;
    let item = sorted[item_index];
    if t < item.end_time_sec {
        return ActorPose {
            zone: PoseZone::InWindow { item_index },
            pose: item.sequence.sample_pose(t - item.start_time_sec),
        };
    }
    ActorPose {
        zone: PoseZone::Gap,
        pose: CharacterPose::DEFAULT,
    }
}

/// Per-actor, start-sorted character items of one script.
#[derive(Debug)]
pub struct ActorTimelines<'a> {
    by_actor: BTreeMap<&'a str, Vec<&'a TimedCharacterSequence>>,
}

impl<'a> ActorTimelines<'a> {
    /// Group the script's character items by actor id.
    pub fn from_script(script: &'a SceneScript) -> Self {
        let mut by_actor: BTreeMap<&'a str, Vec<&'a TimedCharacterSequence>> = BTreeMap::new();
        for c in script.items.iter().filter_map(|i| i.as_character()) {
            by_actor.entry(c.actor_id.as_str()).or_default().push(c);
        }
        for items in by_actor.values_mut() {
            items.sort_by(|a, b| a.start_time_sec.total_cmp(&b.start_time_sec));
        }
        Self { by_actor }
    }

    /// Actor ids, sorted.
    pub fn actor_ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_actor.keys().copied()
    }

    /// Start-sorted items of `actor_id`.
    pub fn items(&self, actor_id: &str) -> &[&'a TimedCharacterSequence] {
        self.by_actor.get(actor_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pose of `actor_id` at `absolute_time`.
    pub fn pose_at(&self, actor_id: &str, absolute_time: f64) -> ActorPose {
        resolve_sorted(self.items(actor_id), absolute_time)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/actor/resolver.rs"]
mod tests;

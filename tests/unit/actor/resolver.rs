use super::*;
use crate::character::asset::CharacterAssetDef;
use crate::foundation::core::{Canvas, SceneRect};
use crate::scene::model::TimedItem;
use crate::sequence::pose::MouthState;
use crate::sequence::posable::PosableCharacterSequence;
use crate::sequence::track::{EventTrack, TimedEvent};

fn item(start: f64, end: f64, seq: PosableCharacterSequence) -> TimedCharacterSequence {
    TimedCharacterSequence {
        start_time_sec: start,
        end_time_sec: end,
        z_index: 0,
        rect: SceneRect::new(0.0, 0.0, 50.0, 50.0),
        actor_id: "a".to_string(),
        character: CharacterAssetDef::from_layout("fox", 50, 50, "fox"),
        sequence: seq,
    }
}

fn mouth_seq(events: Vec<TimedEvent<MouthState>>, dur: f64) -> PosableCharacterSequence {
    PosableCharacterSequence {
        id: "m".to_string(),
        duration_sec: dur,
        mouth: EventTrack::new(events).unwrap(),
        ..PosableCharacterSequence::default()
    }
}

#[test]
fn pre_roll_samples_first_sequence_at_zero() {
    let first = item(
        2.0,
        4.0,
        mouth_seq(vec![TimedEvent::new(0.0, 1.0, MouthState::O)], 2.0),
    );
    let p = sample_actor_pose(&[&first], 0.5);
    assert_eq!(p.zone, PoseZone::PreRoll);
    assert_eq!(p.pose.mouth, MouthState::O);
}

#[test]
fn gaps_and_after_last_use_defaults() {
    let a = item(
        0.0,
        1.0,
        mouth_seq(vec![TimedEvent::new(0.0, 1.0, MouthState::Open)], 1.0),
    );
    let b = item(
        2.0,
        3.0,
        mouth_seq(vec![TimedEvent::new(0.0, 1.0, MouthState::Open)], 1.0),
    );
    let gap = sample_actor_pose(&[&b, &a], 1.5);
    assert_eq!(gap.zone, PoseZone::Gap);
    assert_eq!(gap.pose, CharacterPose::DEFAULT);
    let after = sample_actor_pose(&[&a, &b], 3.0);
    assert_eq!(after.zone, PoseZone::Gap);
    assert_eq!(after.pose, CharacterPose::DEFAULT);
}

#[test]
fn in_window_uses_local_time() {
    let a = item(
        1.0,
        3.0,
        mouth_seq(vec![TimedEvent::new(0.5, 1.0, MouthState::Open)], 2.0),
    );
    assert_eq!(sample_actor_pose(&[&a], 1.4).pose.mouth, MouthState::Closed);
    let p = sample_actor_pose(&[&a], 1.5);
    assert_eq!(p.zone, PoseZone::InWindow { item_index: 0 });
    assert_eq!(p.pose.mouth, MouthState::Open);
}

#[test]
fn tracks_reset_when_crossing_into_next_item() {
    let a = item(
        0.0,
        1.0,
        mouth_seq(vec![TimedEvent::new(0.0, 1.0, MouthState::Open)], 1.0),
    );
    let b = item(1.0, 2.0, PosableCharacterSequence::idle("idle", 1.0));
    assert_eq!(sample_actor_pose(&[&a, &b], 0.99).pose.mouth, MouthState::Open);
    let p = sample_actor_pose(&[&a, &b], 1.0);
    assert_eq!(p.zone, PoseZone::InWindow { item_index: 1 });
    assert_eq!(p.pose, CharacterPose::DEFAULT);
}

#[test]
fn no_items_is_a_gap() {
    let p = sample_actor_pose(&[], 0.0);
    assert_eq!(p.zone, PoseZone::Gap);
}

#[test]
fn timelines_group_script_items_by_actor() {
    let mut other = item(0.0, 1.0, PosableCharacterSequence::idle("i", 1.0));
    other.actor_id = "b".to_string();
    let script = SceneScript {
        canvas: Canvas {
            width: 8,
            height: 8,
        },
        items: vec![
            TimedItem::CharacterSequence(item(
                1.0,
                2.0,
                mouth_seq(vec![TimedEvent::new(0.0, 1.0, MouthState::O)], 1.0),
            )),
            TimedItem::CharacterSequence(other),
            TimedItem::CharacterSequence(item(
                0.0,
                1.0,
                PosableCharacterSequence::idle("i", 1.0),
            )),
        ],
        duration_sec: 2.0,
        subtitles: None,
    };
    let timelines = ActorTimelines::from_script(&script);
    assert_eq!(timelines.actor_ids().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(timelines.items("a").len(), 2);
    assert_eq!(timelines.items("a")[0].start_time_sec, 0.0);
    assert_eq!(timelines.pose_at("a", 1.2).pose.mouth, MouthState::O);
    assert!(timelines.items("missing").is_empty());
}

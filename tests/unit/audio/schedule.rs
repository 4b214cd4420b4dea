use super::*;
use crate::character::asset::CharacterAssetDef;
use crate::foundation::core::{Canvas, SceneRect};
use crate::scene::model::{TimedCharacterSequence, TimedItem};
use crate::sequence::posable::{PosableCharacterSequence, SoundCue};
use crate::sequence::track::{EventTrack, TimedEvent};

fn speaking(actor: &str, start: f64, cues: Vec<(f64, f64, &str)>) -> TimedItem {
    let events = cues
        .into_iter()
        .map(|(s, e, uri)| {
            TimedEvent::new(
                s,
                e,
                SoundCue {
                    source_uri: uri.to_string(),
                    volume: 0.5,
                },
            )
        })
        .collect();
    TimedItem::CharacterSequence(TimedCharacterSequence {
        start_time_sec: start,
        end_time_sec: start + 2.0,
        z_index: 0,
        rect: SceneRect::new(0.0, 0.0, 10.0, 10.0),
        actor_id: actor.to_string(),
        character: CharacterAssetDef::from_layout("fox", 10, 10, "fox"),
        sequence: PosableCharacterSequence {
            id: "talk".to_string(),
            duration_sec: 2.0,
            sound_events: EventTrack::new(events).unwrap(),
            ..PosableCharacterSequence::default()
        },
    })
}

#[test]
fn sound_events_are_offset_by_item_start_and_sorted() {
    let script = SceneScript {
        canvas: Canvas {
            width: 8,
            height: 8,
        },
        items: vec![
            speaking("a", 3.0, vec![(0.5, 1.0, "a.wav")]),
            speaking("b", 1.0, vec![(0.0, 0.25, "b1.wav"), (1.0, 1.5, "b2.wav")]),
        ],
        duration_sec: 5.0,
        subtitles: None,
    };
    let entries = extract_audio_schedule(&script);
    let got: Vec<(&str, f64, f64)> = entries
        .iter()
        .map(|e| (e.source_uri.as_str(), e.start_sec, e.end_sec))
        .collect();
    assert_eq!(
        got,
        vec![
            ("b1.wav", 1.0, 1.25),
            ("b2.wav", 2.0, 2.5),
            ("a.wav", 3.5, 4.0)
        ]
    );
    assert_eq!(entries[0].volume, 0.5);
    assert_eq!(entries[2].window_sec(), 0.5);
}

#[test]
fn image_only_script_has_no_audio() {
    let script = SceneScript {
        canvas: Canvas {
            width: 8,
            height: 8,
        },
        items: vec![],
        duration_sec: 1.0,
        subtitles: None,
    };
    assert!(extract_audio_schedule(&script).is_empty());
}

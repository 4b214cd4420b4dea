use std::io::Cursor;
use std::sync::Mutex;

use super::*;
use crate::assets::media::AudioPcm;
use crate::assets::store::MemoryBlobStore;
use crate::encode::ffmpeg::is_ffmpeg_on_path;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::{Canvas, SceneRect};
use crate::scene::model::{TimedCharacterSequence, TimedImage};
use crate::sequence::posable::{PosableCharacterSequence, SoundCue};
use crate::sequence::track::{EventTrack, TimedEvent};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Store that records every uri read through it.
struct CountingStore {
    inner: MemoryBlobStore,
    reads: Mutex<Vec<String>>,
}

impl BlobStore for CountingStore {
    fn get_bytes(&self, uri: &str) -> PosereelResult<Vec<u8>> {
        self.reads.lock().unwrap().push(uri.to_string());
        self.inner.get_bytes(uri)
    }

    fn put_bytes(&self, uri: &str, bytes: &[u8]) -> PosereelResult<()> {
        self.inner.put_bytes(uri, bytes)
    }
}

/// Decoder whose "encoded" bytes are a single f32 amplitude; yields 0.1s of it.
struct ConstDecoder;

impl AudioDecoder for ConstDecoder {
    fn decode(&self, _uri: &str, bytes: &[u8]) -> PosereelResult<AudioPcm> {
        let amp = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(AudioPcm {
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
            interleaved_f32: vec![amp; 4_800 * usize::from(MIX_CHANNELS)],
        })
    }
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
}

fn store() -> CountingStore {
    let mut inner = MemoryBlobStore::new()
        .with("red.png", png(4, 4, RED))
        .unwrap()
        .with("blue.png", png(4, 4, BLUE))
        .unwrap()
        .with("c/head.png", png(4, 4, GREEN))
        .unwrap()
        .with("pop.raw", 0.5f32.to_le_bytes().to_vec())
        .unwrap();
    for part in [
        "mouth_closed",
        "mouth_open",
        "mouth_o",
        "left_eye_open",
        "left_eye_closed",
        "right_eye_open",
        "right_eye_closed",
        "left_hand",
        "right_hand",
    ] {
        inner = inner.with(&format!("c/{part}.png"), png(4, 4, CLEAR)).unwrap();
    }
    CountingStore {
        inner,
        reads: Mutex::new(Vec::new()),
    }
}

fn image_item(uri: &str, start: f64, end: f64, z: i32) -> TimedItem {
    TimedItem::Image(TimedImage {
        start_time_sec: start,
        end_time_sec: end,
        z_index: z,
        rect: SceneRect::new(0.0, 0.0, 8.0, 8.0),
        source_uri: uri.to_string(),
        fit_mode: FitMode::Fill,
    })
}

fn actor_item(actor_id: &str, sequence: PosableCharacterSequence) -> TimedItem {
    TimedItem::CharacterSequence(TimedCharacterSequence {
        start_time_sec: 0.0,
        end_time_sec: 2.0,
        z_index: 5,
        rect: SceneRect::new(0.0, 0.0, 8.0, 8.0),
        actor_id: actor_id.to_string(),
        character: CharacterAssetDef::from_layout("c", 4, 4, "c"),
        sequence,
    })
}

fn script() -> SceneScript {
    SceneScript {
        canvas: Canvas {
            width: 8,
            height: 8,
        },
        items: vec![
            actor_item("a", PosableCharacterSequence::idle("idle", 2.0)),
            image_item("red.png", 0.0, 1.0, 10),
            image_item("blue.png", 1.0, 2.0, 10),
        ],
        duration_sec: 2.0,
        subtitles: None,
    }
}

fn renderer(store: Arc<CountingStore>, opts: RenderOpts) -> SceneRenderer {
    SceneRenderer::new(store, Arc::new(ConstDecoder), opts)
}

#[test]
fn image_above_actor_wins_then_switches_at_boundary() {
    let r = renderer(Arc::new(store()), RenderOpts::default());
    let s = script();
    assert_eq!(r.render_still(&s, 0.5).unwrap().pixel(4, 4), RED);
    assert_eq!(r.render_still(&s, 1.0).unwrap().pixel(4, 4), BLUE);
}

#[test]
fn actor_shows_once_images_end() {
    let mut s = script();
    s.items.truncate(1);
    let r = renderer(Arc::new(store()), RenderOpts::default());
    assert!(close(r.render_still(&s, 0.5).unwrap().pixel(4, 4), GREEN));
}

fn placed_actor(start: f64, end: f64, x: f64, z: i32) -> TimedItem {
    TimedItem::CharacterSequence(TimedCharacterSequence {
        start_time_sec: start,
        end_time_sec: end,
        z_index: z,
        rect: SceneRect::new(x, 0.0, 4.0, 8.0),
        actor_id: "a".to_string(),
        character: CharacterAssetDef::from_layout("c", 4, 4, "c"),
        sequence: PosableCharacterSequence::idle("idle", end - start),
    })
}

fn late_actor_script() -> SceneScript {
    SceneScript {
        canvas: Canvas {
            width: 8,
            height: 8,
        },
        items: vec![placed_actor(3.0, 4.0, 4.0, 5), placed_actor(1.0, 2.0, 0.0, 5)],
        duration_sec: 5.0,
        subtitles: None,
    }
}

#[test]
fn actor_is_drawn_before_its_first_item() {
    let r = renderer(Arc::new(store()), RenderOpts::default());
    let f = r.render_still(&late_actor_script(), 0.5).unwrap();
    assert!(close(f.pixel(1, 4), GREEN));
    assert_eq!(f.pixel(5, 4), CLEAR);
}

#[test]
fn actor_keeps_its_last_rect_between_and_after_items() {
    let r = renderer(Arc::new(store()), RenderOpts::default());
    let plan = r.prepare(&late_actor_script()).unwrap();
    assert_eq!(plan.layers.len(), 1);

    for t in [1.5, 2.5] {
        let f = render_frame(&plan, t).unwrap();
        assert!(close(f.pixel(1, 4), GREEN), "t = {t}");
        assert_eq!(f.pixel(5, 4), CLEAR, "t = {t}");
    }
    for t in [3.0, 4.5] {
        let f = render_frame(&plan, t).unwrap();
        assert!(close(f.pixel(5, 4), GREEN), "t = {t}");
        assert_eq!(f.pixel(1, 4), CLEAR, "t = {t}");
    }
}

#[test]
fn actor_depth_follows_the_current_item() {
    let mut s = late_actor_script();
    s.items = vec![placed_actor(0.0, 1.0, 0.0, 20), placed_actor(1.0, 2.0, 0.0, 1)];
    s.items.push(TimedItem::Image(TimedImage {
        start_time_sec: 0.0,
        end_time_sec: 2.0,
        z_index: 10,
        rect: SceneRect::new(0.0, 0.0, 8.0, 8.0),
        source_uri: "red.png".to_string(),
        fit_mode: FitMode::Fill,
    }));
    let plan = renderer(Arc::new(store()), RenderOpts::default())
        .prepare(&s)
        .unwrap();
    assert!(close(render_frame(&plan, 0.5).unwrap().pixel(1, 4), GREEN));
    assert_eq!(render_frame(&plan, 1.5).unwrap().pixel(1, 4), RED);
}

#[test]
fn shared_character_parts_are_fetched_once() {
    let mut s = script();
    s.items
        .push(actor_item("b", PosableCharacterSequence::idle("idle", 2.0)));
    let st = Arc::new(store());
    let plan = renderer(Arc::clone(&st), RenderOpts::default())
        .prepare(&s)
        .unwrap();
    assert_eq!(plan.layers.len(), 4);

    let reads = st.reads.lock().unwrap();
    assert_eq!(reads.iter().filter(|u| *u == "c/head.png").count(), 1);
    assert_eq!(reads.len(), 12);
}

#[test]
fn missing_image_is_an_asset_error() {
    let mut s = script();
    s.items.push(image_item("nope.png", 0.0, 1.0, 0));
    let err = renderer(Arc::new(store()), RenderOpts::default())
        .prepare(&s)
        .unwrap_err();
    assert!(matches!(err, PosereelError::Asset(_)));
}

#[test]
fn invalid_script_is_rejected_before_any_fetch() {
    let mut s = script();
    s.items.push(image_item("red.png", 1.0, 1.0, 0));
    let st = Arc::new(store());
    let err = renderer(Arc::clone(&st), RenderOpts::default())
        .prepare(&s)
        .unwrap_err();
    assert!(matches!(err, PosereelError::Validation(_)));
    assert!(st.reads.lock().unwrap().is_empty());
}

#[test]
fn sink_receives_every_frame_in_order() {
    let r = renderer(Arc::new(store()), RenderOpts::default());
    let mut sink = InMemorySink::new();
    let stats = r
        .render_to_sink(&script(), Fps::whole(5).unwrap(), &mut sink, None)
        .unwrap();

    assert_eq!(stats.frames, 10);
    assert_eq!(stats.distinct_actors, 1);
    assert!(sink.is_finished());
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height), (8, 8));
    let indices: Vec<u64> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
    // Frame 5 is sampled at exactly t = 1.0.
    assert_eq!(sink.frames()[4].1.pixel(0, 0), RED);
    assert_eq!(sink.frames()[5].1.pixel(0, 0), BLUE);
}

#[test]
fn chunked_parallel_matches_sequential() {
    let fps = Fps::whole(5).unwrap();
    let mut seq = InMemorySink::new();
    renderer(Arc::new(store()), RenderOpts::default())
        .render_to_sink(&script(), fps, &mut seq, None)
        .unwrap();

    let par_opts = RenderOpts {
        parallel: true,
        chunk_size: 3,
        threads: Some(2),
        ..RenderOpts::default()
    };
    let mut par = InMemorySink::new();
    renderer(Arc::new(store()), par_opts)
        .render_to_sink(&script(), fps, &mut par, None)
        .unwrap();

    assert_eq!(seq.frames(), par.frames());
}

#[test]
fn silent_script_has_no_soundtrack() {
    let r = renderer(Arc::new(store()), RenderOpts::default());
    assert!(r.build_mixed_audio(&script()).unwrap().is_none());
}

#[test]
fn sound_events_are_mixed_at_absolute_time() {
    let mut seq = PosableCharacterSequence::idle("pop", 2.0);
    seq.sound_events = EventTrack::new(vec![TimedEvent::new(
        1.0,
        1.5,
        SoundCue {
            source_uri: "pop.raw".to_string(),
            volume: 1.0,
        },
    )])
    .unwrap();
    let mut s = script();
    s.items[0] = actor_item("a", seq);

    let mixed = renderer(Arc::new(store()), RenderOpts::default())
        .build_mixed_audio(&s)
        .unwrap()
        .unwrap();
    let ch = usize::from(MIX_CHANNELS);
    assert_eq!(mixed.interleaved_f32.len(), 96_000 * ch);
    assert_eq!(mixed.interleaved_f32[47_999 * ch], 0.0);
    assert_eq!(mixed.interleaved_f32[48_000 * ch], 0.5);
    assert_eq!(mixed.interleaved_f32[52_800 * ch], 0.0);
}

#[test]
fn sound_before_scene_start_is_cut_not_delayed() {
    let mut seq = PosableCharacterSequence::idle("pop", 2.0);
    seq.sound_events = EventTrack::new(vec![TimedEvent::new(
        0.0,
        0.1,
        SoundCue {
            source_uri: "pop.raw".to_string(),
            volume: 1.0,
        },
    )])
    .unwrap();
    let mut s = script();
    s.items[0] = actor_item("a", seq);
    if let TimedItem::CharacterSequence(c) = &mut s.items[0] {
        c.start_time_sec = -0.05;
        c.end_time_sec = 1.95;
    }

    let mixed = renderer(Arc::new(store()), RenderOpts::default())
        .build_mixed_audio(&s)
        .unwrap()
        .unwrap();
    let ch = usize::from(MIX_CHANNELS);
    assert_eq!(mixed.interleaved_f32[960 * ch], 0.5);
    assert_eq!(mixed.interleaved_f32[3_360 * ch], 0.0);
}

#[test]
fn zero_threads_is_a_configuration_error() {
    assert!(matches!(
        build_thread_pool(Some(0)),
        Err(PosereelError::Configuration(_))
    ));
    assert!(build_thread_pool(Some(1)).is_ok());
    assert_eq!(normalized_chunk_size(0), 1);
    assert_eq!(normalized_chunk_size(64), 64);
}

#[test]
fn opts_deserialize_partially() {
    let o: RenderOpts = serde_json::from_str(r#"{"parallel":true}"#).unwrap();
    assert!(o.parallel);
    assert_eq!(o.chunk_size, 64);
    assert_eq!(o.bg_rgba, [0, 0, 0, 255]);
}

#[test]
fn generated_video_lands_in_store() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let st = Arc::new(store());
    let r = renderer(Arc::clone(&st), RenderOpts::default());
    let (uri, usage) = r
        .generate_scene_video(&script(), "out/scene.mp4", "demo", Fps::whole(10).unwrap())
        .unwrap();
    assert_eq!(uri, "out/scene.mp4");
    assert_eq!(usage.frames, 20);
    assert_eq!(usage.label, "demo");
    assert_eq!(usage.audio_clips, 0);
    assert!(!st.inner.get_bytes("out/scene.mp4").unwrap().is_empty());
}

//! Posereel composes timeline scenes of posable 2D characters into video.
//!
//! A [`SceneScript`] places still images and character sequences on a shared timeline. The
//! crate turns scripts into frames and a soundtrack:
//!
//! - Build a script from dialogue with a [`ScriptBuilder`], or load one from JSON
//! - Prepare it once with a [`SceneRenderer`], decoding every asset up front
//! - Render single frames with [`render_frame`] or stream them into a [`FrameSink`]
//! - Encode MP4 through the system `ffmpeg` with [`SceneRenderer::generate_scene_video`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod actor;
mod assets;
mod audio;
mod builder;
mod character;
/// Frame encoding sinks.
pub mod encode;
mod foundation;
mod render;
mod scene;
mod sequence;

pub use crate::foundation::core::{Affine, Canvas, Fps, SceneRect, TimeWindow, Vec2};
pub use crate::foundation::error::{PosereelError, PosereelResult};

pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::media::{
    AudioDecoder, AudioPcm, FfmpegAudioDecoder, MIX_CHANNELS, MIX_SAMPLE_RATE,
    decode_audio_f32_stereo,
};
pub use crate::assets::store::{BlobStore, FsBlobStore, MemoryBlobStore};

pub use crate::sequence::library::{BlobSequenceLibrary, MemorySequenceLibrary, SequenceLibrary};
pub use crate::sequence::posable::{PosableCharacterSequence, SoundCue};
pub use crate::sequence::pose::{CharacterPose, MouthState, PartTransform};
pub use crate::sequence::track::{EventTrack, TimedEvent};

pub use crate::character::asset::CharacterAssetDef;
pub use crate::character::voice::{Voice, VoiceGender, VoiceInfo};

pub use crate::scene::model::{
    FitMode, SceneScript, SubtitleEntry, SubtitleStyle, SubtitleTrack, TimedCharacterSequence,
    TimedImage, TimedItem,
};

pub use crate::actor::resolver::{ActorPose, ActorTimelines, PoseZone, sample_actor_pose};

pub use crate::render::compositor::{
    LayerRaster, PreparedActorItem, PreparedActorLayer, PreparedImageLayer, PreparedLayer, PreparedSubtitles,
    RenderPlan, render_frame,
};
pub use crate::render::fit::{ContainPlacement, contain_placement, fill, scale_to_contain};
pub use crate::render::pipeline::{RenderOpts, RenderStats, RenderUsage, SceneRenderer};
pub use crate::render::raster::FrameRGBA;
pub use crate::render::sprite::CharacterSprite;
pub use crate::render::subtitle::{SubtitleRenderer, ink_bounds, wrap_words};

pub use crate::audio::clips::{AudioClip, build_audio_clips};
pub use crate::audio::mix::{MixedAudio, mix_clips};
pub use crate::audio::schedule::{AudioScheduleEntry, extract_audio_schedule};

pub use crate::builder::director::{
    ActorSpec, BuiltScene, DialogueTurn, ImagePair, SceneContent, ScriptBuilder,
    ScriptBuilderOpts,
};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::assets::media::{AudioDecoder, MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::assets::store::BlobStore;
use crate::audio::clips::build_audio_clips;
use crate::audio::mix::{MixedAudio, mix_clips, write_mix_to_f32le_file};
use crate::audio::schedule::extract_audio_schedule;
use crate::character::asset::CharacterAssetDef;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, Vec2};
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::render::compositor::{
    PreparedActorItem, PreparedActorLayer, PreparedImageLayer, PreparedLayer, PreparedSubtitles,
    RenderPlan, render_frame,
};
use crate::render::fit::{contain_placement, fill, scale_to_contain};
use crate::render::raster::{FrameRGBA, snap};
use crate::render::sprite::CharacterSprite;
use crate::render::subtitle::SubtitleRenderer;
use crate::scene::model::{FitMode, SceneScript, TimedItem};

/// Threading and output controls for [`SceneRenderer`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Render frames of a chunk in parallel.
    pub parallel: bool,
    /// Frames per chunk in parallel mode.
    pub chunk_size: usize,
    /// Worker thread count for decoding and rendering; rayon's default when unset.
    pub threads: Option<usize>,
    /// Background color alpha is flattened over when encoding (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Counters from streaming one script into a sink.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Scene length in seconds.
    pub duration_sec: f64,
    /// Number of distinct actor ids in the script.
    pub distinct_actors: usize,
}

/// Usage record of one finished video, for cost tracking and logs.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderUsage {
    /// Caller-supplied label.
    pub label: String,
    /// Number of distinct actor ids in the script.
    pub distinct_actors: usize,
    /// Encoded frame count.
    pub frames: u64,
    /// Scene length in seconds.
    pub duration_sec: f64,
    /// Sound clips mixed into the soundtrack.
    pub audio_clips: usize,
}

/// Turns scene scripts into frames, soundtracks and stored videos.
pub struct SceneRenderer {
    store: Arc<dyn BlobStore>,
    decoder: Arc<dyn AudioDecoder>,
    opts: RenderOpts,
}

impl SceneRenderer {
    /// Renderer reading assets from and writing videos to `store`.
    pub fn new(
        store: Arc<dyn BlobStore>,
        decoder: Arc<dyn AudioDecoder>,
        opts: RenderOpts,
    ) -> Self {
        Self {
            store,
            decoder,
            opts,
        }
    }

    /// Options in use.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Validate `script` and decode every asset it needs, once.
    #[tracing::instrument(skip_all, fields(items = script.items.len()))]
    pub fn prepare(&self, script: &SceneScript) -> PosereelResult<RenderPlan> {
        script.validate()?;
        let images = self.decode_images(script)?;

        let mut sprites: Vec<(CharacterAssetDef, Arc<CharacterSprite>)> = Vec::new();
        let mut layers = Vec::with_capacity(script.items.len());
        // Per-actor items, collected into the layer slot where the actor first appears.
        let mut actor_slots: Vec<(String, usize, Vec<PreparedActorItem>)> = Vec::new();
        for item in &script.items {
            match item {
                TimedItem::Image(img) => {
                    let window = item.time_window();
                    let src = images.get(&img.source_uri).ok_or_else(|| {
                        PosereelError::asset(format!("image '{}' was not prepared", img.source_uri))
                    })?;
                    let origin = Vec2::new(img.rect.x_px, img.rect.y_px);
                    let (image, top_left) = match img.fit_mode {
                        FitMode::Fill => {
                            (fill(src, img.rect.width_px, img.rect.height_px)?, origin)
                        }
                        FitMode::Contain => {
                            let (scaled, offset) = scale_to_contain(
                                src,
                                origin,
                                img.rect.width_px,
                                img.rect.height_px,
                            )?;
                            (scaled, origin + offset)
                        }
                    };
                    layers.push(Some(PreparedLayer::Image(PreparedImageLayer {
                        window,
                        z_index: img.z_index,
                        image,
                        x: snap(top_left.x),
                        y: snap(top_left.y),
                    })));
                }
                TimedItem::CharacterSequence(c) => {
                    let cached = sprites
                        .iter()
                        .find(|(def, _)| *def == c.character)
                        .map(|(_, s)| Arc::clone(s));
                    let sprite = match cached {
                        Some(s) => s,
                        None => {
                            let s = Arc::new(CharacterSprite::new(c.character.clone(), &images)?);
                            sprites.push((c.character.clone(), Arc::clone(&s)));
                            s
                        }
                    };
                    let placement = contain_placement(
                        c.character.width_px,
                        c.character.height_px,
                        Vec2::new(c.rect.x_px, c.rect.y_px),
                        c.rect.width_px,
                        c.rect.height_px,
                    )?;
                    let prepared = PreparedActorItem {
                        item: Arc::new(c.clone()),
                        sprite,
                        placement,
                    };
                    match actor_slots.iter_mut().find(|(id, _, _)| *id == c.actor_id) {
                        Some((_, _, items)) => items.push(prepared),
                        None => {
                            actor_slots.push((c.actor_id.clone(), layers.len(), vec![prepared]));
                            layers.push(None);
                        }
                    }
                }
            }
        }
        for (actor_id, slot, items) in actor_slots {
            layers[slot] = Some(PreparedLayer::Actor(PreparedActorLayer::new(actor_id, items)));
        }
        let layers: Vec<PreparedLayer> = layers.into_iter().flatten().collect();

        let subtitles = match &script.subtitles {
            Some(track) if !track.entries.is_empty() => {
                let font = self.store.get_bytes(&track.style.font_uri)?;
                Some(PreparedSubtitles {
                    track: track.clone(),
                    renderer: SubtitleRenderer::new(track.style.clone(), font)?,
                })
            }
            _ => None,
        };

        tracing::debug!(
            images = images.len(),
            characters = sprites.len(),
            layers = layers.len(),
            "render plan prepared"
        );
        Ok(RenderPlan {
            canvas: script.canvas,
            duration_sec: script.duration_sec,
            layers,
            subtitles,
        })
    }

    fn decode_images(&self, script: &SceneScript) -> PosereelResult<HashMap<String, PreparedImage>> {
        let mut uris = BTreeSet::new();
        for item in &script.items {
            match item {
                TimedItem::Image(img) => {
                    uris.insert(img.source_uri.as_str());
                }
                TimedItem::CharacterSequence(c) => uris.extend(c.character.part_uris()),
            }
        }
        let uris: Vec<&str> = uris.into_iter().collect();
        let pool = build_thread_pool(self.opts.threads)?;
        pool.install(|| {
            uris.par_iter()
                .map(|uri| -> PosereelResult<(String, PreparedImage)> {
                    let bytes = self.store.get_bytes(uri)?;
                    let image = decode_image(&bytes)
                        .map_err(|e| PosereelError::asset(format!("image '{uri}': {e}")))?;
                    Ok((uri.to_string(), image))
                })
                .collect()
        })
    }

    /// Render one frame of `script` at `time_sec`.
    pub fn render_still(&self, script: &SceneScript, time_sec: f64) -> PosereelResult<FrameRGBA> {
        let plan = self.prepare(script)?;
        render_frame(&plan, time_sec)
    }

    /// Stream every frame of `script` into `sink`, in order.
    ///
    /// Frame `i` is sampled at `i / fps`; frames are produced while that time is before the scene
    /// end.
    #[tracing::instrument(skip_all, fields(fps = fps.as_f64()))]
    pub fn render_to_sink(
        &self,
        script: &SceneScript,
        fps: Fps,
        sink: &mut dyn FrameSink,
        audio: Option<AudioInputConfig>,
    ) -> PosereelResult<RenderStats> {
        let plan = self.prepare(script)?;
        let frames = self.render_plan_to_sink(&plan, fps, sink, audio)?;
        Ok(RenderStats {
            frames,
            duration_sec: script.duration_sec,
            distinct_actors: script.actor_ids().len(),
        })
    }

    fn render_plan_to_sink(
        &self,
        plan: &RenderPlan,
        fps: Fps,
        sink: &mut dyn FrameSink,
        audio: Option<AudioInputConfig>,
    ) -> PosereelResult<u64> {
        let total = fps.frame_count(plan.duration_sec);
        sink.begin(SinkConfig {
            width: plan.canvas.width,
            height: plan.canvas.height,
            fps,
            audio,
        })?;

        if self.opts.parallel {
            let pool = build_thread_pool(self.opts.threads)?;
            let chunk_size = normalized_chunk_size(self.opts.chunk_size);
            let mut chunk_start = 0u64;
            while chunk_start < total {
                let chunk_end = (chunk_start + chunk_size).min(total);
                let rendered: Vec<PosereelResult<FrameRGBA>> = pool.install(|| {
                    (chunk_start..chunk_end)
                        .into_par_iter()
                        .map(|i| render_frame(plan, fps.frame_time_secs(i)))
                        .collect()
                });
                for (i, frame) in (chunk_start..chunk_end).zip(rendered) {
                    sink.push_frame(i, &frame?)?;
                }
                chunk_start = chunk_end;
            }
        } else {
            for i in 0..total {
                let frame = render_frame(plan, fps.frame_time_secs(i))?;
                sink.push_frame(i, &frame)?;
            }
        }

        sink.end()?;
        tracing::debug!(frames = total, "frames streamed");
        Ok(total)
    }

    /// Decode, trim and mix every scheduled sound; `None` when the script is silent.
    #[tracing::instrument(skip_all)]
    pub fn build_mixed_audio(&self, script: &SceneScript) -> PosereelResult<Option<MixedAudio>> {
        Ok(self.mix(script)?.map(|(mixed, _)| mixed))
    }

    fn mix(&self, script: &SceneScript) -> PosereelResult<Option<(MixedAudio, usize)>> {
        let entries = extract_audio_schedule(script);
        if entries.is_empty() {
            return Ok(None);
        }
        let pool = build_thread_pool(self.opts.threads)?;
        let clips = pool.install(|| {
            build_audio_clips(&entries, self.store.as_ref(), self.decoder.as_ref())
        })?;
        let interleaved_f32 = mix_clips(&clips, script.duration_sec, MIX_SAMPLE_RATE, MIX_CHANNELS);
        tracing::debug!(clips = clips.len(), "audio mixed");
        Ok(Some((
            MixedAudio {
                sample_rate: MIX_SAMPLE_RATE,
                channels: MIX_CHANNELS,
                interleaved_f32,
            },
            clips.len(),
        )))
    }

    /// Render `script` to MP4 with its soundtrack and store it at `destination`.
    ///
    /// The video is encoded to a temporary file by the system `ffmpeg` and written to the store
    /// only after encoding succeeded. Returns the destination uri and the usage record.
    #[tracing::instrument(skip_all, fields(destination = %destination, label = %label))]
    pub fn generate_scene_video(
        &self,
        script: &SceneScript,
        destination: &str,
        label: &str,
        fps: Fps,
    ) -> PosereelResult<(String, RenderUsage)> {
        let plan = self.prepare(script)?;

        let mut audio_tmp = TempFileGuard(None);
        let mut audio_clips = 0;
        let audio = match self.mix(script)? {
            None => None,
            Some((mixed, clips)) => {
                audio_clips = clips;
                let path = temp_path("mix", "f32le");
                write_mix_to_f32le_file(&mixed.interleaved_f32, &path)?;
                audio_tmp.0 = Some(path.clone());
                Some(AudioInputConfig {
                    path,
                    sample_rate: mixed.sample_rate,
                    channels: mixed.channels,
                })
            }
        };

        let video_path = temp_path("video", "mp4");
        let video_tmp = TempFileGuard(Some(video_path.clone()));
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            out_path: video_path.clone(),
            overwrite: true,
            bg_rgba: self.opts.bg_rgba,
        });
        let frames = self.render_plan_to_sink(&plan, fps, &mut sink, audio)?;
        drop(audio_tmp);

        let bytes = std::fs::read(&video_path).map_err(|e| {
            PosereelError::encode(format!(
                "failed to read encoded video '{}': {e}",
                video_path.display()
            ))
        })?;
        self.store.put_bytes(destination, &bytes)?;
        drop(video_tmp);

        let usage = RenderUsage {
            label: label.to_string(),
            distinct_actors: script.actor_ids().len(),
            frames,
            duration_sec: script.duration_sec,
            audio_clips,
        };
        tracing::info!(
            destination,
            label,
            frames,
            bytes = bytes.len(),
            "scene video stored"
        );
        Ok((destination.to_string(), usage))
    }
}

fn temp_path(kind: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "posereel_{kind}_{}_{}.{ext}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> PosereelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PosereelError::configuration(
            "render 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PosereelError::configuration(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use posereel::{
    BlobSequenceLibrary, FfmpegAudioDecoder, Fps, FsBlobStore, RenderOpts, SceneContent,
    SceneRenderer, SceneScript, ScriptBuilder, ScriptBuilderOpts,
};

#[derive(Parser, Debug)]
#[command(name = "posereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a scene script.
    Validate(ValidateArgs),
    /// Build a scene script from dialogue content.
    Build(BuildArgs),
    /// Render a single instant as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video with soundtrack (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Scene script JSON.
    #[arg(long)]
    script: PathBuf,
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Scene content JSON (canvas, images, actors, turns).
    #[arg(long)]
    content: PathBuf,

    /// Directory holding `<id>.json` sequence documents.
    #[arg(long)]
    library: PathBuf,

    /// Builder options JSON; defaults apply to missing fields.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Output script JSON path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Scene script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Asset root; defaults to the script's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Absolute scene time in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Scene script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Asset root; defaults to the script's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Output MP4 uri, relative to the asset root.
    #[arg(long)]
    out: String,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Label recorded in the usage report.
    #[arg(long, default_value = "render")]
    label: String,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size (parallel mode only).
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Build(args) => cmd_build(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn assets_root(script: &Path, assets: Option<PathBuf>) -> PathBuf {
    assets.unwrap_or_else(|| {
        script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

fn scene_renderer(root: PathBuf, opts: RenderOpts) -> SceneRenderer {
    SceneRenderer::new(
        Arc::new(FsBlobStore::new(root)),
        Arc::new(FfmpegAudioDecoder),
        opts,
    )
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let script = SceneScript::from_path(&args.script)?;
    eprintln!(
        "ok: {} items, {} actors, {:.3}s",
        script.items.len(),
        script.actor_ids().len(),
        script.duration_sec
    );
    Ok(())
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let content_json = std::fs::read_to_string(&args.content)
        .with_context(|| format!("read content '{}'", args.content.display()))?;
    let content: SceneContent = serde_json::from_str(&content_json)
        .with_context(|| format!("parse content '{}'", args.content.display()))?;

    let opts = match &args.opts {
        Some(p) => {
            let s = std::fs::read_to_string(p)
                .with_context(|| format!("read builder opts '{}'", p.display()))?;
            serde_json::from_str::<ScriptBuilderOpts>(&s)
                .with_context(|| format!("parse builder opts '{}'", p.display()))?
        }
        None => ScriptBuilderOpts::default(),
    };

    let library = BlobSequenceLibrary::new(Arc::new(FsBlobStore::new(&args.library)), "");
    let built = ScriptBuilder::new(Arc::new(library), opts).build(&content)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&built.script).context("serialize script")?;
    std::fs::write(&args.out, json)
        .with_context(|| format!("write script '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} turns, {:.3}s)",
        args.out.display(),
        built.turn_windows.len(),
        built.script.duration_sec
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let script = SceneScript::from_path(&args.script)?;
    let renderer = scene_renderer(assets_root(&args.script, args.assets), RenderOpts::default());
    let frame = renderer.render_still(&script, args.time)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let script = SceneScript::from_path(&args.script)?;
    let opts = RenderOpts {
        parallel: args.parallel,
        chunk_size: args.chunk_size,
        threads: args.threads,
        ..RenderOpts::default()
    };
    let renderer = scene_renderer(assets_root(&args.script, args.assets), opts);
    let (uri, usage) =
        renderer.generate_scene_video(&script, &args.out, &args.label, Fps::whole(args.fps)?)?;

    eprintln!(
        "wrote {uri}: {} frames, {} actors, {} audio clips",
        usage.frames, usage.distinct_actors, usage.audio_clips
    );
    Ok(())
}

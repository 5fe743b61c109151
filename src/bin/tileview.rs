use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tileview", version)]
struct Cli {
    #[command(flatten)]
    opts: OptionArgs,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project a single RGB image (PNG, JPEG, ...) and write the view as an image.
    Still(StillArgs),
    /// Project a video file into an MP4 (requires `ffmpeg` on PATH and the `media-ffmpeg` feature).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct OptionArgs {
    /// Options JSON file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output width expression.
    #[arg(long, global = true)]
    w: Option<String>,

    /// Output height expression.
    #[arg(long, global = true)]
    h: Option<String>,

    /// Horizontal field of view in degrees.
    #[arg(long, global = true)]
    fovx: Option<f64>,

    /// Vertical field of view in degrees.
    #[arg(long, global = true)]
    fovy: Option<f64>,

    /// Default rotation about x, in degrees.
    #[arg(long, global = true, allow_hyphen_values = true)]
    xr: Option<f64>,

    /// Default rotation about y, in degrees.
    #[arg(long, global = true, allow_hyphen_values = true)]
    yr: Option<f64>,

    /// Default rotation about z, in degrees.
    #[arg(long, global = true, allow_hyphen_values = true)]
    zr: Option<f64>,

    /// Orientation track file.
    #[arg(long, global = true)]
    orfile: Option<PathBuf>,

    /// Tile layout file (defaults to the built-in cube).
    #[arg(long, global = true)]
    lofile: Option<PathBuf>,

    /// Set any option as `key=value`; may be repeated.
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,
}

#[derive(Args, Debug)]
struct StillArgs {
    /// Input atlas image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Presentation time in seconds used for the orientation lookup.
    #[arg(long)]
    time: Option<f64>,

    /// Intermediate planar format.
    #[arg(long, default_value = "yuv444p")]
    pix_fmt: tileview::PixFmt,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = true)]
    overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let opts = build_options(&cli.opts)?;
    match cli.cmd {
        Command::Still(args) => cmd_still(opts, args),
        Command::Render(args) => cmd_render(opts, args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_options(args: &OptionArgs) -> anyhow::Result<tileview::ProjectOptions> {
    let mut opts = match &args.config {
        Some(path) => tileview::ProjectOptions::from_path(path)
            .with_context(|| format!("load options '{}'", path.display()))?,
        None => tileview::ProjectOptions::default(),
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut push = |key: &str, value: Option<String>| {
        if let Some(v) = value {
            pairs.push((key.to_owned(), v));
        }
    };
    push("w", args.w.clone());
    push("h", args.h.clone());
    push("fovx", args.fovx.map(|v| v.to_string()));
    push("fovy", args.fovy.map(|v| v.to_string()));
    push("xr", args.xr.map(|v| v.to_string()));
    push("yr", args.yr.map(|v| v.to_string()));
    push("zr", args.zr.map(|v| v.to_string()));
    push("orfile", args.orfile.as_ref().map(|p| p.display().to_string()));
    push("lofile", args.lofile.as_ref().map(|p| p.display().to_string()));
    for kv in &args.set {
        let (k, v) = kv
            .split_once('=')
            .with_context(|| format!("--set expects KEY=VALUE, got '{kv}'"))?;
        pairs.push((k.trim().to_owned(), v.to_owned()));
    }

    for (k, v) in &pairs {
        opts.set(k, v).with_context(|| format!("option '{k}'"))?;
    }
    Ok(opts)
}

fn cmd_still(opts: tileview::ProjectOptions, args: StillArgs) -> anyhow::Result<()> {
    let img = image::open(&args.in_path)
        .with_context(|| format!("open image '{}'", args.in_path.display()))?
        .to_rgb8();
    let mut frame = tileview::rgb_to_frame(&img, args.pix_fmt)?;
    let time_base = tileview::Rational::new(1, 1000)?;
    frame.time_base = time_base;
    frame.pts = args.time.map(|t| (t * 1000.0).round() as i64);

    let mut filter = tileview::ProjectFilter::new(opts)?;
    filter.configure(tileview::StreamProps::new(
        frame.format,
        frame.resolution(),
        time_base,
    ))?;
    let out = filter.filter_frame(&frame)?;
    let rgb = tileview::frame_to_rgb(&out)?;

    tileview::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    rgb.save(&args.out)
        .with_context(|| format!("write image '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(opts: tileview::ProjectOptions, args: RenderArgs) -> anyhow::Result<()> {
    let mut source = tileview::FfmpegSource::open(&args.in_path)
        .with_context(|| format!("open video '{}'", args.in_path.display()))?;
    let mut sink = tileview::FfmpegSink::new(tileview::FfmpegSinkOpts {
        overwrite: args.overwrite,
        ..tileview::FfmpegSinkOpts::new(&args.out)
    });
    let mut filter = tileview::ProjectFilter::new(opts)?;

    let stats = tileview::project_stream(&mut filter, &mut source, &mut sink)?;
    eprintln!(
        "wrote {} ({} frames)",
        args.out.display(),
        stats.frames_out
    );
    Ok(())
}

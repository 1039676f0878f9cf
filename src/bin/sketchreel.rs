use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sketchreel", version)]
struct Cli {
    /// Log scheduler internals (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every sketch in a directory (requires the external renderer).
    Render(RenderArgs),
    /// List the sketches a render would pick up, without rendering.
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory containing sketch files.
    #[arg(short, long)]
    sketches_dir: Option<PathBuf>,

    /// File suffix of renderable sketches.
    #[arg(long)]
    suffix: Option<String>,

    /// JSON config file; flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Video format (mp4 or webm).
    #[arg(short, long)]
    format: Option<String>,

    /// Frames per second.
    #[arg(short = 'r', long)]
    fps: Option<u32>,

    /// Total number of frames to render.
    #[arg(short = 't', long)]
    total_frames: Option<u32>,

    /// Output directory for the video files.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Device scale factor for higher resolution output.
    #[arg(short, long)]
    device_scale_factor: Option<f64>,

    /// Maximum number of concurrent renders.
    #[arg(short = 'c', long, allow_negative_numbers = true)]
    max_concurrent: Option<i64>,

    /// Renderer program launched once per sketch.
    #[arg(long)]
    renderer: Option<String>,

    /// Argument placed before the per-sketch flags (repeatable; replaces the default).
    #[arg(long = "renderer-arg", allow_hyphen_values = true)]
    renderer_args: Vec<String>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    #[command(flatten)]
    source: SourceArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let res = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Scan(args) => cmd_scan(args),
    };
    match res {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "sketchreel=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(source: &SourceArgs) -> anyhow::Result<sketchreel::BatchConfig> {
    let mut cfg = match &source.config {
        Some(path) => sketchreel::BatchConfig::from_path(path)?,
        None => sketchreel::BatchConfig::default(),
    };
    if let Some(dir) = &source.sketches_dir {
        cfg.sketches_dir = dir.clone();
    }
    if let Some(suffix) = &source.suffix {
        cfg.suffix = suffix.clone();
    }
    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<ExitCode> {
    let mut cfg = load_config(&args.source)?;
    if let Some(v) = args.format {
        cfg.format = v;
    }
    if let Some(v) = args.fps {
        cfg.fps = v;
    }
    if let Some(v) = args.total_frames {
        cfg.total_frames = v;
    }
    if let Some(v) = args.output_dir {
        cfg.output_dir = v;
    }
    if let Some(v) = args.device_scale_factor {
        cfg.device_scale_factor = v;
    }
    if let Some(v) = args.max_concurrent {
        cfg.max_concurrent = v;
    }
    if let Some(v) = args.renderer {
        cfg.renderer = v;
    }
    if !args.renderer_args.is_empty() {
        cfg.renderer_args = args.renderer_args;
    }

    let validated = cfg.validate()?;
    let mut reporter = sketchreel::ConsoleReporter::stderr();
    let report = sketchreel::run_batch(&validated, &mut reporter)
        .with_context(|| format!("render '{}'", cfg.sketches_dir.display()))?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_scan(args: ScanArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&args.source)?;
    let validated = cfg.validate()?;
    let items = sketchreel::plan(&validated)
        .with_context(|| format!("scan '{}'", cfg.sketches_dir.display()))?;

    for item in &items {
        println!("{}\t{}", item.input().display(), item.output_path().display());
    }
    eprintln!("{} sketches found", items.len());
    Ok(ExitCode::SUCCESS)
}

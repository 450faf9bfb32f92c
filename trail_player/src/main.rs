mod video;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use motion_trails::{BackgroundModel, RunningAverageModel, TrailConfig, TrailKind, TrailPipeline};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use video::{Mog2Background, VideoInput, VideoOutput};

#[derive(Parser, Debug)]
#[command(name = "trail_player", about = "Paint motion trails onto a video")]
struct Cli {
    /// Video file to read.
    input: String,
    /// Encode the composited video to this path (mp4v).
    #[arg(long, short)]
    output: Option<String>,
    /// Trail style; prompts interactively when omitted.
    #[arg(long, short)]
    style: Option<TrailKind>,
    /// JSON file overriding any subset of the default settings.
    #[arg(long, value_name = "FILE.json")]
    config: Option<PathBuf>,
    /// Particles spawned per frame (particle style).
    #[arg(long)]
    particles: Option<usize>,
    /// Seed for reproducible particle sampling.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = BackgroundChoice::Mog2)]
    background: BackgroundChoice,
    /// Skip the live window; requires --output to produce anything.
    #[arg(long)]
    no_display: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackgroundChoice {
    Mog2,
    RunningAverage,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // --- 1. Argument Parsing & Setup ---
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let kind = match cli.style {
        Some(kind) => kind,
        None => prompt_for_style()?,
    };

    // --- 2. Video I/O Initialization ---
    let mut input = VideoInput::open(&cli.input)?;
    let mut output = VideoOutput::new();
    if let Some(path) = cli.output.as_deref() {
        output = output.record_to(path, input.fps()?, input.frame_size()?)?;
    }
    if !cli.no_display {
        output = output.display_as(kind.title())?;
    }

    // --- 3. Trail Pipeline Initialization ---
    let background: Box<dyn BackgroundModel> = match cli.background {
        BackgroundChoice::Mog2 => Box::new(Mog2Background::new()?),
        BackgroundChoice::RunningAverage => Box::new(RunningAverageModel::new(config.background)?),
    };
    let mut pipeline = TrailPipeline::with_background(kind, &config, background)
        .context("building trail pipeline")?;

    // --- 4. Main Processing Loop ---
    info!(input = %cli.input, style = %kind, "processing video");
    let summary = pipeline.run(&mut input, &mut output)?;

    match cli.output.as_deref() {
        Some(path) => info!(frames = summary.frames_processed, "output saved to {path}"),
        None => info!(frames = summary.frames_processed, "processing complete"),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<TrailConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => TrailConfig::default(),
    };
    if let Some(particles) = cli.particles {
        config.particle.num_particles = particles;
    }
    if cli.seed.is_some() {
        config.particle.seed = cli.seed;
    }
    config.validate()?;
    Ok(config)
}

fn prompt_for_style() -> Result<TrailKind> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Choose tracking method:")?;
    for (number, kind) in TrailKind::ALL.iter().enumerate() {
        writeln!(stdout, "{}. {}", number + 1, kind.menu_label())?;
    }
    write!(stdout, "Enter choice (1-3): ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("reading menu choice")?;
    Ok(TrailKind::from_menu_choice(&answer))
}

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

use panelscan::{PanelDetector, PanelLayout, load_image};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "panelscan")]
#[command(about = "Extract knob, label and meter geometry from a control panel image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON layout overriding the calibrated regions and thresholds
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let layout = match &args.layout {
        Some(path) => PanelLayout::from_json_file(path)?,
        None => PanelLayout::default(),
    };

    log::info!("Loading image: {}", args.image_path.display());
    let img = load_image(&args.image_path)?;

    let mut detector = PanelDetector::new(layout)?;
    if let Some(debug_dir) = args.debug_out {
        detector = detector.with_debug(debug_dir)?;
    }

    let report = detector
        .detect(&img)
        .with_context(|| format!("analysis of {} failed", args.image_path.display()))?;

    match args.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}

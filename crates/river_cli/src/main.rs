//! Riverflow CLI
//!
//! Run the data river choreography headlessly and inspect configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use river_scene::{FileDataset, RiverConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod simulate;

use simulate::{simulate, SimulationOptions};

#[derive(Parser)]
#[command(name = "riverflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Data river flow choreography", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the scene on a fixed-rate clock and print a JSON summary
    Run {
        /// Dataset file
        data: PathBuf,

        /// Configuration file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Simulated duration in seconds
        #[arg(short, long, default_value = "60")]
        seconds: f64,

        /// Override the configured frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Camera direction applied halfway through, as x,y,z
        #[arg(long, value_parser = parse_direction)]
        nudge: Option<[f32; 3]>,
    },

    /// Print the default configuration as TOML
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file and dataset
    Check {
        /// Dataset file
        data: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            data,
            config,
            seconds,
            fps,
            nudge,
        } => cmd_run(&data, config.as_deref(), seconds, fps, nudge),

        Commands::Config { output } => cmd_config(output.as_deref()),

        Commands::Check { data, config } => cmd_check(&data, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<RiverConfig> {
    match path {
        Some(path) => RiverConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(RiverConfig::default()),
    }
}

fn cmd_run(
    data: &Path,
    config: Option<&Path>,
    seconds: f64,
    fps: Option<u32>,
    nudge: Option<[f32; 3]>,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(fps) = fps {
        config.clock.target_fps = fps;
    }
    if !(seconds.is_finite() && seconds > 0.0) {
        anyhow::bail!("--seconds must be positive, got {}", seconds);
    }

    info!(
        "Simulating {} for {}s at {} fps",
        data.display(),
        seconds,
        config.clock.target_fps
    );

    let options = SimulationOptions {
        duration_ms: seconds * 1000.0,
        nudge: nudge.map(Into::into),
    };
    let summary = simulate(&FileDataset::new(data), &config, &options)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_config(output: Option<&Path>) -> Result<()> {
    let text = RiverConfig::default()
        .to_toml_string()
        .context("Failed to serialize configuration")?;

    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote default configuration to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn cmd_check(data: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let summary = simulate(
        &FileDataset::new(data),
        &config,
        &SimulationOptions {
            duration_ms: 0.0,
            nudge: None,
        },
    )?;

    info!(
        "OK: {} segments, footprint {}, camera path {}ms",
        summary.segments.len(),
        summary.footprint,
        summary.camera_path_ms
    );
    Ok(())
}

fn parse_direction(value: &str) -> std::result::Result<[f32; 3], String> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid direction '{}': {}", value, e))?;

    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("expected x,y,z, got '{}'", value)),
    }
}

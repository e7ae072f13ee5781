//! chcli - render MIDI performances into keyframe streams
//!
//! Subcommands:
//! - `chcli render <midi> --scene <toml>` - Animate every scene group
//! - `chcli tracks <midi>` - List the tracks a MIDI file ingests to
//! - `chcli config` - Print the effective configuration

use anyhow::Result;
use choreoconf::{ChoreoConfig, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "chcli")]
#[command(about = "Render MIDI performances into keyframe streams")]
#[command(version)]
struct Cli {
    /// Config file used in place of ./choreo.toml
    #[arg(short, long, global = true, env = "CHOREO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate every group of a scene from a MIDI file
    Render {
        /// Standard MIDI file (format 0 or 1)
        midi: PathBuf,

        /// Scene description (TOML)
        #[arg(short, long)]
        scene: PathBuf,

        /// Track for each group without a `track` key or a same-named track, in order
        #[arg(short, long = "track")]
        tracks: Vec<String>,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// json or csv; defaults to the configured format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// List ingested tracks with their note counts
    Tracks {
        /// Standard MIDI file (format 0 or 1)
        midi: PathBuf,
    },

    /// Print the effective configuration and where it came from
    Config,
}

fn init_logging(config: &ChoreoConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ChoreoConfig::load_with_sources_from(cli.config.as_deref())?;
    init_logging(&config);
    tracing::debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    match cli.command {
        Commands::Render {
            midi,
            scene,
            tracks,
            output,
            format,
        } => {
            commands::render(
                &config,
                commands::RenderArgs {
                    midi,
                    scene,
                    tracks,
                    output,
                    format: format.unwrap_or(config.output.format),
                },
            )?;
        }
        Commands::Tracks { midi } => {
            commands::tracks(&midi)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}

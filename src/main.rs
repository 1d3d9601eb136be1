//! asmr-organizer - ASMR audio and subtitle library organizer
//!
//! Normalizes subtitles, transcodes WAV to FLAC, numbers audio/subtitle
//! groups per folder, translates names and writes audio tags.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use asmr_organizer::cli::{Args, Commands};
use asmr_organizer::config::Config;
use asmr_organizer::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting asmr-organizer");

    if let Commands::InitConfig { output } = &args.command {
        Config::default().save_to_file(output)?;
        println!("Default configuration written to {}", output.display());
        return Ok(());
    }

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Run { root, translation_dir } => {
            if let Some(root) = root {
                config.library.root_dir = Some(root);
            }
            if let Some(dir) = translation_dir {
                config.library.translation_dir = Some(dir);
            }
            Workflow::new(config).run().await?;
        }
        Commands::Preprocess { root } => {
            if let Some(root) = root {
                config.library.root_dir = Some(root);
            }
            let summary = Workflow::new(config).preprocess().await?;
            println!(
                "Processed {} folders: {} files numbered, {} transcoded, {} problems",
                summary.folders, summary.numbered, summary.transcoded, summary.problems
            );
        }
        Commands::Translate { dir } => {
            if let Some(dir) = dir {
                config.library.translation_dir = Some(dir);
            }
            let summary = Workflow::new(config).translate().await?;
            println!(
                "Renamed {} files and {} folders, skipped {}",
                summary.files_renamed, summary.dirs_renamed, summary.skipped
            );
        }
        Commands::Tag { root } => {
            if let Some(root) = root {
                config.library.root_dir = Some(root);
            }
            let summary = Workflow::new(config).tag()?;
            println!("Tagged {} files, {} failed", summary.tagged, summary.failed);
        }
        Commands::InitConfig { .. } => {}
    }

    info!("asmr-organizer completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".asmr-organizer").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "asmr-organizer.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("asmr-organizer.log").display());

    Ok(())
}

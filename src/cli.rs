use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Preprocess, translate and tag the whole library
    Run {
        /// Library root directory
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Directory whose file and folder names get translated
        #[arg(short, long)]
        translation_dir: Option<PathBuf>,
    },

    /// Normalize subtitles, transcode audio and number every folder
    Preprocess {
        /// Library root directory
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Translate file and folder names
    Translate {
        /// Directory to translate
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Write title, album and cover tags
    Tag {
        /// Library root directory
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_overrides() {
        let args = Args::try_parse_from([
            "asmr-organizer",
            "-v",
            "run",
            "--root",
            "/lib",
            "--translation-dir",
            "/lib/jp",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Run { root, translation_dir } => {
                assert_eq!(root, Some(PathBuf::from("/lib")));
                assert_eq!(translation_dir, Some(PathBuf::from("/lib/jp")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_init_config_default_output() {
        let args = Args::try_parse_from(["asmr-organizer", "init-config"]).unwrap();
        match args.command {
            Commands::InitConfig { output } => assert_eq!(output, PathBuf::from("config.toml")),
            _ => panic!("expected init-config"),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Args::try_parse_from(["asmr-organizer"]).is_err());
    }
}

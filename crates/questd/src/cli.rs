//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from the frame loop.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Questline headless companion driver
#[derive(Parser, Debug)]
#[command(name = "questd")]
#[command(about = "Questline - drive the companion from a session transcript", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/questline/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for reward rolls (reproducible chests)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Walk instead of idling while events keep coming
    #[arg(long, global = true)]
    pub walk: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Live-tail the newest transcript of a project
    Watch {
        /// Project directory (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Replay a transcript file
    Replay {
        file: PathBuf,

        /// Delay between events in milliseconds
        #[arg(long)]
        speed: Option<u64>,
    },

    /// Show the career profile
    Profile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_defaults() {
        let cli = Cli::try_parse_from(["questd", "watch"]).unwrap();
        assert_eq!(cli.command, Commands::Watch { dir: None });
        assert!(!cli.walk);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn test_replay_with_globals() {
        let cli = Cli::try_parse_from([
            "questd", "replay", "s.jsonl", "--speed", "50", "--seed", "3", "--walk",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Replay { file: PathBuf::from("s.jsonl"), speed: Some(50) }
        );
        assert_eq!(cli.seed, Some(3));
        assert!(cli.walk);
    }

    #[test]
    fn test_replay_requires_file() {
        assert!(Cli::try_parse_from(["questd", "replay"]).is_err());
    }
}

//! questd - headless Questline companion
//!
//! Watches or replays a session transcript and drives the companion's
//! animation and career profile from it.

use anyhow::{Context, Result};
use clap::Parser;
use quest_common::{
    AnimationSystem, CompanionSession, EventSource, ItemRegistry, ProfileStore, QuestConfig,
    RewardEngine,
};
use questd::{profile_summary, run, Cli, Commands, FrameLoop};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = QuestConfig::load(cli.config.as_deref());
    if cli.walk {
        config.companion.walk_mode = true;
    }

    let registry = ItemRegistry::builtin();
    let store = ProfileStore::new(config.profile_path());

    let (source, stop_when_finished) = match cli.command {
        Commands::Profile => {
            let profile = store.load(&registry);
            print!("{}", profile_summary(&profile, &registry));
            return Ok(());
        }
        Commands::Watch { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("Failed to resolve current directory")?,
            };
            let source = EventSource::start_live_watch(&dir, &config.watcher)
                .with_context(|| format!("No transcript to watch for {}", dir.display()))?;
            (source, false)
        }
        Commands::Replay { file, speed } => {
            let delay = match speed {
                Some(ms) => Duration::from_millis(ms),
                None => config.watcher.replay_delay(),
            };
            let source = EventSource::start_replay(
                PathBuf::from(&file),
                delay,
                config.watcher.effective_queue_capacity(),
            )
            .with_context(|| format!("Cannot replay {}", file.display()))?;
            (source, true)
        }
    };

    info!("questd v{} following {}", env!("CARGO_PKG_VERSION"), source.path().display());

    let rewards = match cli.seed {
        Some(seed) => RewardEngine::with_seed(registry, seed),
        None => RewardEngine::new(registry),
    };
    let session = CompanionSession::start(store, rewards, &config.companion);
    let animation = AnimationSystem::new().with_walk_mode(config.companion.walk_mode);
    let frame_loop = FrameLoop::new(animation, session);

    run(
        source,
        frame_loop,
        config.companion.frame_interval(),
        stop_when_finished,
    )
    .await?;

    info!("Shutting down gracefully");
    Ok(())
}

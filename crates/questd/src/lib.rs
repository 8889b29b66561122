//! questd - headless Questline driver
//!
//! Wires the transcript watcher, animation system and companion session
//! into one frame loop and logs what happens.

pub mod cli;
pub mod report;
pub mod runner;

pub use cli::{Cli, Commands};
pub use report::profile_summary;
pub use runner::{run, FrameLoop};

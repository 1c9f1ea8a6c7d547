//! flavtag Reaper
//!
//! Host process for the tagging engine: reads events from a JSON-lines
//! tuple, runs every configured tag combination on each of them, and writes
//! the augmented events back out.

pub mod cli;
pub mod config;
pub mod exporter;
pub mod runner;
pub mod store;

pub use cli::Cli;
pub use config::ReaperConfig;
pub use runner::{Reaper, RunSummary};
pub use store::{InputLine, JsonLinesStore, JsonRow};

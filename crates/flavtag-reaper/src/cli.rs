//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "flavtag-reaper")]
#[command(about = "Combine flavour-tagger outputs of an event tuple", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FLAVTAG_CONFIG", default_value = "reaper.yaml")]
    pub config: String,

    /// Input tuple (JSON lines)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output tuple (JSON lines)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tagging configuration file
    #[arg(short, long)]
    pub tagging: Option<PathBuf>,

    /// Write run counters to this file in Prometheus text format
    #[arg(short, long)]
    pub metrics: Option<PathBuf>,

    /// Print the tagging performance table when done
    #[arg(short, long)]
    pub summary: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

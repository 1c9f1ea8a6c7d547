//! Reaper configuration

use flavtag_combiner::TaggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Reaper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    /// Input tuple
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Output tuple; defaults to `<input stem>_tagged.jsonl` next to the input
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Tagging configuration file, takes precedence over `tagging`
    #[serde(default)]
    pub tagging_path: Option<PathBuf>,

    /// Inline tagging configuration
    #[serde(default)]
    pub tagging: Option<TaggingConfig>,

    /// Per-event diagnostics logged at warn level before going quiet
    #[serde(default = "default_max_diagnostics_logged")]
    pub max_diagnostics_logged: usize,

    /// Print the tagging performance table when done
    #[serde(default)]
    pub summary: bool,

    /// Write run counters here in Prometheus text format
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

impl ReaperConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(input) = &cli.input {
            config.input = Some(input.clone());
        }

        if let Some(output) = &cli.output {
            config.output = Some(output.clone());
        }

        if let Some(tagging) = &cli.tagging {
            config.tagging_path = Some(tagging.clone());
        }

        if let Some(metrics) = &cli.metrics {
            config.metrics_path = Some(metrics.clone());
        }

        config.summary |= cli.summary;

        Ok(config)
    }

    /// Resolve the tagging configuration
    pub fn tagging_config(&self) -> flavtag_core::Result<TaggingConfig> {
        match (&self.tagging_path, &self.tagging) {
            (Some(path), _) => TaggingConfig::from_file(path),
            (None, Some(inline)) => Ok(inline.clone()),
            (None, None) => Ok(TaggingConfig::default()),
        }
    }

    /// Output path, derived from the input when not set
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "events".to_string());
                input.with_file_name(format!("{}_tagged.jsonl", stem))
            }
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            tagging_path: None,
            tagging: None,
            max_diagnostics_logged: default_max_diagnostics_logged(),
            summary: false,
            metrics_path: None,
        }
    }
}

fn default_max_diagnostics_logged() -> usize {
    20
}

//! flavtag Reaper
//!
//! Adds combined flavour-tag columns to every event of a tuple.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use flavtag_reaper::exporter::{init_metrics, write_textfile};
use flavtag_reaper::{Cli, Reaper, ReaperConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Load configuration
    let config = ReaperConfig::load(&cli.config, &cli)?;
    let input = config
        .input
        .clone()
        .context("no input tuple given (use --input or set `input` in the config file)")?;
    let output = config.output_path(&input);
    let tagging = config
        .tagging_config()
        .context("failed to load tagging configuration")?;
    info!(
        combinations = tagging.combinations.len(),
        recombination = tagging.recombination.is_some(),
        copies = tagging.copies.len(),
        "Configuration loaded successfully"
    );

    let mut reaper = Reaper::new(tagging, config.max_diagnostics_logged)?;
    let summary = reaper.run(&input, &output).await?;

    info!(
        events = summary.metrics.events_written,
        output = %output.display(),
        "Output written"
    );

    if let Some(path) = &config.metrics_path {
        write_textfile(&metrics_handle, path)
            .await
            .context("failed to write metrics")?;
    }

    if config.summary {
        print!("{}", reaper.tally().render_table());
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("flavtag=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flavtag=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

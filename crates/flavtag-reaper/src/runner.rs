//! Streaming a tuple through the tagging pipeline

use flavtag_combiner::{TaggingConfig, TaggingPipeline};
use flavtag_core::Result;
use flavtag_telemetry::{MetricsCollector, MetricsSnapshot, PerformanceTally, TaggingPerformance};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::store::{InputLine, JsonLinesStore};

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub metrics: MetricsSnapshot,
    pub performance: Vec<TaggingPerformance>,
}

/// Drives events from a store through the tagging pipeline
pub struct Reaper {
    pipeline: TaggingPipeline,
    metrics: MetricsCollector,
    tally: Arc<PerformanceTally>,
    max_diagnostics_logged: usize,
}

impl Reaper {
    pub fn new(tagging: TaggingConfig, max_diagnostics_logged: usize) -> Result<Self> {
        Ok(Self {
            pipeline: TaggingPipeline::from_config(tagging)?,
            metrics: MetricsCollector::new(),
            tally: Arc::new(PerformanceTally::new()),
            max_diagnostics_logged,
        })
    }

    pub fn tally(&self) -> Arc<PerformanceTally> {
        Arc::clone(&self.tally)
    }

    /// Process every event of `input` into `output`.
    ///
    /// Per-event problems are counted and logged; only I/O failures and
    /// an input lacking the required tagger columns end the run early. A
    /// run that ends on missing columns leaves no output file behind.
    pub async fn run(&mut self, input: &Path, output: &Path) -> Result<RunSummary> {
        info!(input = %input.display(), output = %output.display(), "starting run");

        let mut store = JsonLinesStore::open(input, output).await?;
        let mut prepared = false;
        let mut diagnostics_logged = 0usize;

        while let Some(line) = store.next_line().await? {
            let mut row = match line {
                InputLine::Event(row) => row,
                InputLine::Malformed {
                    line_number,
                    text,
                    reason,
                } => {
                    self.metrics.record_malformed();
                    warn!(line_number, %reason, "malformed event written through unchanged");
                    store.write_raw(&text).await?;
                    self.metrics.record_written();
                    continue;
                }
            };
            self.metrics.record_read();

            if !prepared {
                if let Err(e) = self.pipeline.prepare(&row) {
                    store.discard().await?;
                    return Err(e);
                }
                prepared = true;
            }

            let tags = self.pipeline.apply(&mut row);

            for output in &tags.outputs {
                self.tally.record(&output.name, &output.tag);
            }

            self.metrics.record_diagnostics(tags.diagnostics.len() as u64);
            for diagnostic in &tags.diagnostics {
                if diagnostics_logged < self.max_diagnostics_logged {
                    warn!(
                        output = %diagnostic.output,
                        error = %diagnostic.error,
                        "output degraded to untagged"
                    );
                } else if diagnostics_logged == self.max_diagnostics_logged {
                    warn!("further diagnostics suppressed");
                }
                diagnostics_logged += 1;
            }

            store.write_row(&row).await?;
            self.metrics.record_written();
        }

        store.finish().await?;

        let summary = RunSummary {
            metrics: self.metrics.snapshot(),
            performance: self.tally.report(),
        };

        info!(
            events = summary.metrics.events_read,
            malformed = summary.metrics.malformed_events,
            diagnostics = summary.metrics.diagnostics,
            "run complete"
        );
        for p in &summary.performance {
            debug!(
                output = %p.output,
                efficiency = p.efficiency,
                effective_power = p.effective_power,
                "tagging performance"
            );
        }

        Ok(summary)
    }
}

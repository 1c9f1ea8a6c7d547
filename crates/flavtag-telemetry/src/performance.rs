//! Tagging performance of each output over a sample
//!
//! For N events of which N_tag are tagged with mistags ω_i:
//! - efficiency ε = N_tag / N
//! - mean dilution ⟨D⟩ = Σ (1 - 2ω_i) / N_tag
//! - effective tagging power ε_eff = Σ (1 - 2ω_i)² / N

use flavtag_core::CombinedTag;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    events: u64,
    tagged: u64,
    sum_dilution: f64,
    sum_dilution_sq: f64,
}

impl Accumulator {
    fn add(&mut self, tag: &CombinedTag) {
        self.events += 1;
        if tag.is_tagged() {
            let dilution = 1.0 - 2.0 * tag.mistag();
            self.tagged += 1;
            self.sum_dilution += dilution;
            self.sum_dilution_sq += dilution * dilution;
        }
    }
}

/// Thread-safe per-output tally
#[derive(Debug, Default)]
pub struct PerformanceTally {
    outputs: Mutex<BTreeMap<String, Accumulator>>,
}

/// Tagging performance of one output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggingPerformance {
    pub output: String,
    pub events: u64,
    pub tagged: u64,
    pub efficiency: f64,
    pub mean_dilution: f64,
    pub effective_power: f64,
}

impl PerformanceTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tag an output produced for one event
    pub fn record(&self, output: &str, tag: &CombinedTag) {
        let mut outputs = self.outputs.lock();
        if let Some(acc) = outputs.get_mut(output) {
            acc.add(tag);
            return;
        }

        let mut acc = Accumulator::default();
        acc.add(tag);
        outputs.insert(output.to_string(), acc);
    }

    /// Performance of every output seen so far, sorted by name
    pub fn report(&self) -> Vec<TaggingPerformance> {
        self.outputs
            .lock()
            .iter()
            .map(|(output, acc)| {
                let events = acc.events as f64;
                TaggingPerformance {
                    output: output.clone(),
                    events: acc.events,
                    tagged: acc.tagged,
                    efficiency: ratio(acc.tagged as f64, events),
                    mean_dilution: ratio(acc.sum_dilution, acc.tagged as f64),
                    effective_power: ratio(acc.sum_dilution_sq, events),
                }
            })
            .collect()
    }

    /// Human-readable table of [`report`](Self::report)
    pub fn render_table(&self) -> String {
        let report = self.report();
        let width = report
            .iter()
            .map(|p| p.output.len())
            .max()
            .unwrap_or(0)
            .max("output".len());

        let mut table = format!(
            "{:<width$}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}\n",
            "output", "events", "tagged", "eff[%]", "<D>", "eff_eff[%]"
        );
        for p in &report {
            // Writing to a String cannot fail
            let _ = writeln!(
                table,
                "{:<width$}  {:>10}  {:>10}  {:>10.3}  {:>10.4}  {:>10.4}",
                p.output,
                p.events,
                p.tagged,
                100.0 * p.efficiency,
                p.mean_dilution,
                100.0 * p.effective_power,
            );
        }
        table
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

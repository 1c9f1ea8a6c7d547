//! Per-event tagging pipeline
//!
//! The pipeline reads the OS and SS pion taggers once per event and runs
//! every configured output from them:
//! - the classic OS/SS pion combinations, one per policy
//! - the recombined OS tagger and its combinations with the SS pion tagger
//! - plain copies of individual taggers
//! - derived bookkeeping columns
//!
//! Per-event failures never abort the event. The affected output falls back
//! to the untagged sentinel and a [`Diagnostic`] is recorded.

use flavtag_core::{ColumnValue, CombinedTag, Error, EventRecord, Result, TaggerSignal};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::{CombinationSpec, TaggingConfig};
use crate::derived::DerivedAvailability;
use crate::recombiner::MultiInputRecombiner;
use crate::tagger::TaggerColumns;
use crate::writer::{OutputColumns, ResultWriter};

/// A per-event problem attributed to one output or input
#[derive(Debug)]
pub struct Diagnostic {
    /// Output (or tagger label) the problem was found on
    pub output: String,

    /// Event-local failure that degraded the output
    pub error: Error,
}

impl Diagnostic {
    pub fn new(output: impl Into<String>, error: Error) -> Self {
        Self {
            output: output.into(),
            error,
        }
    }
}

/// One named combined tag
#[derive(Debug, Clone, PartialEq)]
pub struct TagOutput {
    pub name: String,
    pub tag: CombinedTag,
}

impl TagOutput {
    fn new(name: &str, tag: CombinedTag) -> Self {
        Self {
            name: name.to_string(),
            tag,
        }
    }
}

/// Everything the pipeline computed for one event
#[derive(Debug, Default)]
pub struct EventTags {
    /// Combined tags in configuration order
    pub outputs: Vec<TagOutput>,

    /// Derived bookkeeping columns
    pub derived: Vec<(String, ColumnValue)>,

    /// Problems encountered while processing the event
    pub diagnostics: Vec<Diagnostic>,
}

impl EventTags {
    /// Combined tag of a named output
    pub fn get(&self, name: &str) -> Option<&CombinedTag> {
        self.outputs
            .iter()
            .find(|output| output.name == name)
            .map(|output| &output.tag)
    }

    /// Whether any output had to be degraded
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Which optional pathways the input schema supports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnAvailability {
    recombination: bool,
    copies: Vec<bool>,
    derived: DerivedAvailability,
}

/// Combines the taggers of each event into every configured output
#[derive(Debug, Clone)]
pub struct TaggingPipeline {
    config: TaggingConfig,
    recombiner: Option<MultiInputRecombiner>,
    writers: BTreeMap<String, ResultWriter>,
    availability: Option<ColumnAvailability>,
}

impl TaggingPipeline {
    /// Build a pipeline from a validated configuration
    pub fn from_config(config: TaggingConfig) -> Result<Self> {
        config.validate()?;

        let recombiner = config
            .recombination
            .as_ref()
            .map(|spec| MultiInputRecombiner::new(spec.calibration))
            .transpose()?;

        let mut writers = BTreeMap::new();
        for spec in combination_specs(&config) {
            writers.insert(spec.name.clone(), ResultWriter::new(spec.output_columns()));
        }
        if let Some(spec) = &config.recombination {
            writers.insert(
                spec.name.clone(),
                ResultWriter::new(OutputColumns::for_suffix(&spec.name)),
            );
        }
        for copy in &config.copies {
            writers.insert(
                copy.label.clone(),
                ResultWriter::new(OutputColumns::for_suffix(&copy.label)),
            );
        }

        Ok(Self {
            config,
            recombiner,
            writers,
            availability: None,
        })
    }

    /// Names of all outputs the pipeline can produce
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.writers.keys().map(String::as_str)
    }

    /// Output columns of a named output
    pub fn output_columns(&self, name: &str) -> Option<&OutputColumns> {
        self.writers.get(name).map(ResultWriter::columns)
    }

    /// Whether the recombination pathway is active for the prepared schema
    pub fn recombination_enabled(&self) -> bool {
        match &self.availability {
            Some(availability) => availability.recombination,
            None => self.recombiner.is_some(),
        }
    }

    /// Resolve column existence once from the first record of a sample.
    ///
    /// Fails if the OS or SS pion columns are missing. Optional pathways
    /// whose inputs are absent are switched off.
    pub fn prepare<R: EventRecord + ?Sized>(&mut self, record: &R) -> Result<()> {
        for tagger in [&self.config.os, &self.config.ss_pion] {
            for column in [&tagger.decision, &tagger.mistag] {
                if !record.has_column(column) {
                    return Err(Error::config(format!(
                        "required column '{}' of tagger {} is absent from the input",
                        column, tagger.label
                    )));
                }
            }
        }

        let availability = self.resolve(record);

        if let Some(spec) = &self.config.recombination {
            if availability.recombination {
                info!(
                    name = %spec.name,
                    inputs = spec.inputs.len(),
                    "recombination enabled"
                );
            } else {
                info!(
                    name = %spec.name,
                    "recombination inputs absent, skipping recombined outputs"
                );
            }
        }

        let copies = availability.copies.iter().filter(|a| **a).count();
        info!(
            combinations = self.config.combinations.len(),
            copies,
            final_state = availability.derived.final_state,
            simulation = availability.derived.true_tag,
            "tagging pipeline prepared"
        );

        self.availability = Some(availability);
        Ok(())
    }

    /// Compute all tags of one event without touching the record
    pub fn process<R: EventRecord + ?Sized>(&self, record: &R) -> EventTags {
        let resolved;
        let availability = match &self.availability {
            Some(availability) => availability,
            None => {
                resolved = self.resolve(record);
                &resolved
            }
        };

        let mut tags = EventTags::default();

        let os = read_signal(&self.config.os, record, &mut tags.diagnostics);
        let ss = read_signal(&self.config.ss_pion, record, &mut tags.diagnostics);

        for spec in &self.config.combinations {
            let tag = resolve_combination(spec, os.as_ref(), ss.as_ref(), &mut tags.diagnostics);
            tags.outputs.push(TagOutput::new(&spec.name, tag));
        }

        if let (Some(spec), Some(recombiner)) = (&self.config.recombination, &self.recombiner) {
            if availability.recombination {
                let recombined = self.recombine(recombiner, record, &mut tags.diagnostics);

                let tag = recombined.as_ref().map_or_else(CombinedTag::untagged, |signal| {
                    CombinedTag::pass_through(signal, i32::from(signal.is_tagged()))
                });
                tags.outputs.push(TagOutput::new(&spec.name, tag));

                for combination in &spec.combine_with_ss {
                    let tag = resolve_combination(
                        combination,
                        recombined.as_ref(),
                        ss.as_ref(),
                        &mut tags.diagnostics,
                    );
                    tags.outputs.push(TagOutput::new(&combination.name, tag));
                }
            }
        }

        for (copy, _) in self
            .config
            .copies
            .iter()
            .zip(&availability.copies)
            .filter(|(_, available)| **available)
        {
            let tag = match read_signal(copy, record, &mut tags.diagnostics) {
                Some(signal) => CombinedTag::pass_through(&signal, i32::from(signal.is_tagged())),
                None => CombinedTag::untagged(),
            };
            tags.outputs.push(TagOutput::new(&copy.label, tag));
        }

        let os_ss = os.as_ref().zip(ss.as_ref());
        tags.derived = self.config.derived.compute(
            &availability.derived,
            record,
            os_ss,
            &mut tags.diagnostics,
        );

        for diagnostic in &tags.diagnostics {
            debug!(
                output = %diagnostic.output,
                error = %diagnostic.error,
                "output degraded to untagged"
            );
        }

        tags
    }

    /// Process one event and write all outputs into the record
    pub fn apply<R: EventRecord + ?Sized>(&self, record: &mut R) -> EventTags {
        let tags = self.process(&*record);

        for output in &tags.outputs {
            if let Some(writer) = self.writers.get(&output.name) {
                writer.write(record, &output.tag);
            }
        }
        for (column, value) in &tags.derived {
            record.set(column, *value);
        }

        tags
    }

    fn resolve<R: EventRecord + ?Sized>(&self, record: &R) -> ColumnAvailability {
        ColumnAvailability {
            recombination: self.config.recombination.as_ref().is_some_and(|spec| {
                spec.inputs.iter().all(|input| input.is_available(record))
            }),
            copies: self
                .config
                .copies
                .iter()
                .map(|copy| copy.is_available(record))
                .collect(),
            derived: self.config.derived.resolve(record),
        }
    }

    /// Recombined signal, or `None` if an input was unreadable or the
    /// probabilities were degenerate
    fn recombine<R: EventRecord + ?Sized>(
        &self,
        recombiner: &MultiInputRecombiner,
        record: &R,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<TaggerSignal> {
        let spec = self.config.recombination.as_ref()?;

        let mut inputs = Vec::with_capacity(spec.inputs.len());
        let mut readable = true;
        for input in &spec.inputs {
            match read_signal(input, record, diagnostics) {
                Some(signal) => inputs.push(signal),
                None => readable = false,
            }
        }
        if !readable {
            return None;
        }

        match recombiner.recombine(&inputs) {
            Ok(recombination) => Some(recombination.signal),
            Err(error) => {
                diagnostics.push(Diagnostic::new(&spec.name, error));
                None
            }
        }
    }
}

fn combination_specs(config: &TaggingConfig) -> impl Iterator<Item = &CombinationSpec> {
    config.combinations.iter().chain(
        config
            .recombination
            .iter()
            .flat_map(|spec| spec.combine_with_ss.iter()),
    )
}

fn read_signal<R: EventRecord + ?Sized>(
    tagger: &TaggerColumns,
    record: &R,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TaggerSignal> {
    match tagger.read(record) {
        Ok(signal) => Some(signal),
        Err(error) => {
            diagnostics.push(Diagnostic::new(&tagger.label, error));
            None
        }
    }
}

/// Combined tag of one combination; untagged when an input was unreadable
fn resolve_combination(
    spec: &CombinationSpec,
    os: Option<&TaggerSignal>,
    ss: Option<&TaggerSignal>,
    diagnostics: &mut Vec<Diagnostic>,
) -> CombinedTag {
    let (Some(os), Some(ss)) = (os, ss) else {
        return CombinedTag::untagged();
    };

    match spec.policy.resolve(os, ss) {
        Ok(tag) => tag,
        Err(error) => {
            diagnostics.push(Diagnostic::new(&spec.name, error));
            CombinedTag::untagged()
        }
    }
}

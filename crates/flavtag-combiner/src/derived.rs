//! Bookkeeping columns derived alongside the tag combinations

use flavtag_core::{ColumnValue, Decision, Error, EventRecord, Result, TaggerSignal};
use serde::{Deserialize, Serialize};

use crate::pipeline::Diagnostic;

/// Which derived columns to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedSpec {
    /// Product of the OS and SS pion decisions
    #[serde(default = "default_tag_comparison")]
    pub tag_comparison: Option<String>,

    /// Final-state flavour and mixing products
    #[serde(default = "default_final_state")]
    pub final_state: Option<FinalStateSpec>,

    /// Monte-Carlo true production flavour
    #[serde(default = "default_true_tag")]
    pub true_tag: Option<TrueTagSpec>,

    /// Integer columns copied verbatim when present in the input
    #[serde(default = "default_int_copies")]
    pub int_copies: Vec<IntCopySpec>,
}

/// Final-state flavour from the sign of the candidate ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStateSpec {
    /// Signed particle ID column
    pub id: String,

    /// Output column
    pub output: String,

    /// Products of the final state with tag decisions
    #[serde(default)]
    pub mixing: Vec<MixingSpec>,
}

/// `output = final_state * decision`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixingSpec {
    pub output: String,
    pub decision: String,
}

/// `output = input` for an integer bookkeeping column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntCopySpec {
    pub input: String,
    pub output: String,
}

impl IntCopySpec {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// True tag, only written for simulated samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueTagSpec {
    /// Signed true particle ID column
    pub true_id: String,

    /// Background category column; its presence marks simulation
    pub background_category: String,

    pub output: String,
    pub output_babar: String,
}

impl Default for DerivedSpec {
    fn default() -> Self {
        Self {
            tag_comparison: default_tag_comparison(),
            final_state: default_final_state(),
            true_tag: default_true_tag(),
            int_copies: default_int_copies(),
        }
    }
}

fn default_tag_comparison() -> Option<String> {
    Some("catTagCompOSvsSSPion".to_string())
}

fn default_final_state() -> Option<FinalStateSpec> {
    Some(FinalStateSpec {
        id: "B0_ID".to_string(),
        output: "catFinalState".to_string(),
        mixing: vec![
            MixingSpec {
                output: "catXiAll".to_string(),
                decision: "B0_TAGDECISION".to_string(),
            },
            MixingSpec {
                output: "catXiOS".to_string(),
                decision: "B0_TAGDECISION_OS".to_string(),
            },
        ],
    })
}

fn default_true_tag() -> Option<TrueTagSpec> {
    Some(TrueTagSpec {
        true_id: "B0_TRUEID".to_string(),
        background_category: "B0_BKGCAT".to_string(),
        output: "obsTag_True".to_string(),
        output_babar: "obsTag_BaBar_True".to_string(),
    })
}

fn default_int_copies() -> Vec<IntCopySpec> {
    vec![
        IntCopySpec::new("B0_TAGGER", "catTagger"),
        IntCopySpec::new("B0_TAGCAT", "catEtaAll"),
        IntCopySpec::new("B0_TAGCAT_OS", "catEtaOS"),
    ]
}

/// Which derived columns can be computed for the current input schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedAvailability {
    pub final_state: bool,
    pub mixing: Vec<bool>,
    pub true_tag: bool,
    pub int_copies: Vec<bool>,
}

impl DerivedSpec {
    /// Resolve which derived columns the record supports
    pub fn resolve<R: EventRecord + ?Sized>(&self, record: &R) -> DerivedAvailability {
        let (final_state, mixing) = match &self.final_state {
            Some(spec) => {
                let available = record.has_column(&spec.id);
                let mixing = spec
                    .mixing
                    .iter()
                    .map(|m| available && record.has_column(&m.decision))
                    .collect();
                (available, mixing)
            }
            None => (false, Vec::new()),
        };

        let true_tag = self.true_tag.as_ref().is_some_and(|spec| {
            record.has_column(&spec.true_id) && record.has_column(&spec.background_category)
        });

        let int_copies = self
            .int_copies
            .iter()
            .map(|copy| record.has_column(&copy.input))
            .collect();

        DerivedAvailability {
            final_state,
            mixing,
            true_tag,
            int_copies,
        }
    }

    /// Compute the derived columns of one event.
    ///
    /// Columns whose inputs are unreadable are written as 0 and reported.
    pub fn compute<R: EventRecord + ?Sized>(
        &self,
        availability: &DerivedAvailability,
        record: &R,
        os_ss: Option<(&TaggerSignal, &TaggerSignal)>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<(String, ColumnValue)> {
        let mut columns = Vec::new();

        if let Some(name) = &self.tag_comparison {
            let product = os_ss
                .map(|(os, ss)| os.decision().as_i32() * ss.decision().as_i32())
                .unwrap_or(0);
            let babar = os_ss
                .map(|(os, ss)| {
                    os.decision().babar().as_i32() * ss.decision().babar().as_i32()
                })
                .unwrap_or(0);
            columns.push((name.clone(), ColumnValue::from(product)));
            columns.push((format!("{}_BaBar", name), ColumnValue::from(babar)));
        }

        if let Some(spec) = self.final_state.as_ref().filter(|_| availability.final_state) {
            let final_state = match record.get_int(&spec.id) {
                Ok(id) => Decision::from_sign(id),
                Err(error) => {
                    diagnostics.push(Diagnostic::new(&spec.output, error));
                    Decision::Untagged
                }
            };
            columns.push((spec.output.clone(), ColumnValue::from(final_state.as_i32())));

            for (mixing, _) in spec
                .mixing
                .iter()
                .zip(&availability.mixing)
                .filter(|(_, available)| **available)
            {
                let xi = match read_decision(record, &mixing.decision) {
                    Ok(decision) => final_state.as_i32() * decision.as_i32(),
                    Err(error) => {
                        diagnostics.push(Diagnostic::new(&mixing.output, error));
                        0
                    }
                };
                columns.push((mixing.output.clone(), ColumnValue::from(xi)));
            }
        }

        if let Some(spec) = self.true_tag.as_ref().filter(|_| availability.true_tag) {
            let truth = match record.get_int(&spec.true_id) {
                Ok(id) => Decision::from_sign(id),
                Err(error) => {
                    diagnostics.push(Diagnostic::new(&spec.output, error));
                    Decision::Untagged
                }
            };
            columns.push((spec.output.clone(), ColumnValue::from(truth.as_i32())));
            columns.push((
                spec.output_babar.clone(),
                ColumnValue::from(truth.babar().as_i32()),
            ));
        }

        for (copy, _) in self
            .int_copies
            .iter()
            .zip(&availability.int_copies)
            .filter(|(_, available)| **available)
        {
            let value = record.get_int(&copy.input).unwrap_or_else(|error| {
                diagnostics.push(Diagnostic::new(&copy.output, error));
                0
            });
            columns.push((copy.output.clone(), ColumnValue::Int(value)));
        }

        columns
    }
}

fn read_decision<R: EventRecord + ?Sized>(record: &R, column: &str) -> Result<Decision> {
    let raw = record.get_int(column)?;
    Decision::from_raw(raw).ok_or_else(|| Error::InvalidDecision {
        column: column.to_string(),
        value: raw,
    })
}

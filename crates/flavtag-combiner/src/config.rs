//! Configuration of the tagging combinations and their column bindings

use flavtag_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::derived::DerivedSpec;
use crate::policy::ExclusivityPolicy;
use crate::recombiner::CalibrationConfig;
use crate::tagger::TaggerColumns;
use crate::writer::OutputColumns;

/// Configuration for all tag combinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggingConfig {
    /// Opposite-side combined tagger
    #[serde(default = "default_os")]
    pub os: TaggerColumns,

    /// Same-side pion tagger
    #[serde(default = "default_ss_pion")]
    pub ss_pion: TaggerColumns,

    /// Combinations of the OS and SS pion taggers
    #[serde(default = "default_combinations")]
    pub combinations: Vec<CombinationSpec>,

    /// Recombined OS tagger built from sub-taggers; skipped when its inputs are absent
    #[serde(default = "default_recombination")]
    pub recombination: Option<RecombinationSpec>,

    /// Individual taggers copied to output columns
    #[serde(default = "default_copies")]
    pub copies: Vec<TaggerColumns>,

    /// Bookkeeping columns
    #[serde(default)]
    pub derived: DerivedSpec,
}

/// One named combination of two taggers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationSpec {
    /// Output suffix, e.g. `OSSSPion`
    pub name: String,

    /// Arbitration policy
    pub policy: ExclusivityPolicy,

    /// Optional 0/1 tagged flag column
    #[serde(default)]
    pub tagged_column: Option<String>,

    /// Optional duplicate of the category code
    #[serde(default)]
    pub exclusive_column: Option<String>,
}

impl CombinationSpec {
    /// Combination with the standard output columns only
    pub fn new(name: impl Into<String>, policy: ExclusivityPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            tagged_column: None,
            exclusive_column: None,
        }
    }

    /// Output columns of this combination
    pub fn output_columns(&self) -> OutputColumns {
        let mut columns = OutputColumns::for_suffix(&self.name);
        if let Some(tagged) = &self.tagged_column {
            columns = columns.with_tagged(tagged.clone());
        }
        if let Some(exclusive) = &self.exclusive_column {
            columns = columns.with_exclusive(exclusive.clone());
        }
        columns
    }
}

/// Recombination of sub-taggers into a synthetic OS tagger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecombinationSpec {
    /// Output suffix of the synthetic tagger, e.g. `OSwNNKaon`
    pub name: String,

    /// Sub-taggers, in combination order
    pub inputs: Vec<TaggerColumns>,

    /// Calibration of the recombined probability
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Combinations of the synthetic tagger (as OS) with the SS pion tagger
    #[serde(default)]
    pub combine_with_ss: Vec<CombinationSpec>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            os: default_os(),
            ss_pion: default_ss_pion(),
            combinations: default_combinations(),
            recombination: default_recombination(),
            copies: default_copies(),
            derived: DerivedSpec::default(),
        }
    }
}

impl TaggingConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();

        for spec in self.output_specs() {
            if spec.name.is_empty() {
                return Err(Error::config("combination name must not be empty"));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(Error::config(format!(
                    "duplicate output name '{}'",
                    spec.name
                )));
            }
        }

        if let Some(recombination) = &self.recombination {
            if recombination.inputs.is_empty() {
                return Err(Error::config(format!(
                    "recombination '{}' has no inputs",
                    recombination.name
                )));
            }
            if !names.insert(recombination.name.as_str()) {
                return Err(Error::config(format!(
                    "duplicate output name '{}'",
                    recombination.name
                )));
            }
            recombination.calibration.validate()?;
        }

        for copy in &self.copies {
            if !names.insert(copy.label.as_str()) {
                return Err(Error::config(format!(
                    "duplicate output name '{}'",
                    copy.label
                )));
            }
        }

        Ok(())
    }

    /// All combinations, classic ones first
    fn output_specs(&self) -> impl Iterator<Item = &CombinationSpec> {
        self.combinations.iter().chain(
            self.recombination
                .iter()
                .flat_map(|r| r.combine_with_ss.iter()),
        )
    }
}

fn default_os() -> TaggerColumns {
    TaggerColumns::new("OS", "B0_TAGDECISION_OS", "B0_TAGOMEGA_OS")
}

fn default_ss_pion() -> TaggerColumns {
    TaggerColumns::from_prefix("SSPion", "B0_SS_Pion")
}

fn default_combinations() -> Vec<CombinationSpec> {
    vec![
        CombinationSpec {
            tagged_column: Some("catTaggedOSorSSPion".to_string()),
            ..CombinationSpec::new("OSSSPion", ExclusivityPolicy::Inclusive)
        },
        CombinationSpec::new("OSExclSSPion", ExclusivityPolicy::OsExclusive),
        CombinationSpec::new("ExclOSSSPion", ExclusivityPolicy::SsExclusive),
    ]
}

fn default_recombination() -> Option<RecombinationSpec> {
    Some(RecombinationSpec {
        name: "OSwNNKaon".to_string(),
        inputs: vec![
            TaggerColumns::from_prefix("OSMuon", "B0_OS_Muon"),
            TaggerColumns::from_prefix("OSElectron", "B0_OS_Electron"),
            TaggerColumns::from_prefix("OSNNKaon", "B0_OS_nnetKaon"),
            TaggerColumns::from_prefix("VtxQ", "B0_VtxCharge"),
        ],
        calibration: CalibrationConfig::default(),
        combine_with_ss: vec![CombinationSpec {
            tagged_column: Some("catTaggedOSwNNKaonorSSPion".to_string()),
            exclusive_column: Some("catTaggedOSwNNKaonxorSSPion".to_string()),
            ..CombinationSpec::new("OSwNNKaonSSPion", ExclusivityPolicy::OsPrecedence)
        }],
    })
}

fn default_copies() -> Vec<TaggerColumns> {
    vec![
        TaggerColumns::new("All", "B0_TAGDECISION", "B0_TAGOMEGA"),
        TaggerColumns::new("OS", "B0_TAGDECISION_OS", "B0_TAGOMEGA_OS"),
        TaggerColumns::from_prefix("OSMuon", "B0_OS_Muon"),
        TaggerColumns::from_prefix("OSElectron", "B0_OS_Electron"),
        TaggerColumns::from_prefix("OSKaon", "B0_OS_Kaon"),
        TaggerColumns::from_prefix("OSNNKaon", "B0_OS_nnetKaon"),
        TaggerColumns::from_prefix("OSCharm", "B0_OS_Charm"),
        TaggerColumns::from_prefix("SSKaon", "B0_SS_Kaon"),
        TaggerColumns::from_prefix("SSNNKaon", "B0_SS_nnetKaon"),
        TaggerColumns::from_prefix("SSPion", "B0_SS_Pion"),
        TaggerColumns::from_prefix("SSProton", "B0_SS_Proton"),
        TaggerColumns::from_prefix("VtxQ", "B0_VtxCharge"),
    ]
}

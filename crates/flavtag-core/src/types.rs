//! Core types for flavtag

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mistag written for any output that carries no tagging information
pub const UNTAGGED_MISTAG: f64 = 0.5;

/// Discrete flavour decision of a tagger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Decision {
    /// Antiparticle hypothesis (-1)
    Antiparticle,
    /// No opinion (0)
    Untagged,
    /// Particle hypothesis (+1)
    Particle,
}

impl Decision {
    /// Interpret a raw column value; anything but -1, 0, +1 is rejected
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Antiparticle),
            0 => Some(Self::Untagged),
            1 => Some(Self::Particle),
            _ => None,
        }
    }

    /// Decision carrying the sign of `value`
    pub fn from_sign(value: i64) -> Self {
        match value.signum() {
            1 => Self::Particle,
            -1 => Self::Antiparticle,
            _ => Self::Untagged,
        }
    }

    /// Signed integer encoding (+1, 0, -1)
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Antiparticle => -1,
            Self::Untagged => 0,
            Self::Particle => 1,
        }
    }

    /// Signed encoding as a float, for probability arithmetic
    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i32())
    }

    /// Mirror decision in the BaBar sign convention
    pub fn babar(self) -> Self {
        match self {
            Self::Antiparticle => Self::Particle,
            Self::Untagged => Self::Untagged,
            Self::Particle => Self::Antiparticle,
        }
    }

    /// Whether the tagger expressed an opinion
    pub fn is_tagged(self) -> bool {
        self != Self::Untagged
    }
}

impl From<Decision> for i64 {
    fn from(decision: Decision) -> Self {
        i64::from(decision.as_i32())
    }
}

impl TryFrom<i64> for Decision {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_raw(value).ok_or_else(|| Error::InvalidDecision {
            column: "decision".to_string(),
            value,
        })
    }
}

/// Decision and mistag probability of one tagger for one event
///
/// Only constructed through [`TaggerSignal::new`]; deserialization runs
/// the same validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSignal")]
pub struct TaggerSignal {
    decision: Decision,
    mistag: f64,
}

#[derive(Deserialize)]
struct RawSignal {
    decision: Decision,
    mistag: f64,
}

impl TryFrom<RawSignal> for TaggerSignal {
    type Error = Error;

    fn try_from(raw: RawSignal) -> Result<Self> {
        Self::new(raw.decision, raw.mistag)
    }
}

impl TaggerSignal {
    /// Create a validated signal.
    ///
    /// Untagged signals ignore `mistag` and carry [`UNTAGGED_MISTAG`].
    /// Tagged signals must have a finite mistag in `[0, 1]`.
    pub fn new(decision: Decision, mistag: f64) -> Result<Self> {
        if !decision.is_tagged() {
            return Ok(Self::untagged());
        }
        check_mistag(mistag)?;
        Ok(Self { decision, mistag })
    }

    /// Signal without tagging information
    pub fn untagged() -> Self {
        Self {
            decision: Decision::Untagged,
            mistag: UNTAGGED_MISTAG,
        }
    }

    /// Flavour decision
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Probability that the decision is wrong
    pub fn mistag(&self) -> f64 {
        self.mistag
    }

    /// Whether this tagger fired
    pub fn is_tagged(&self) -> bool {
        self.decision.is_tagged()
    }
}

/// Consensus decision of a combination policy for one event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCombinedTag")]
pub struct CombinedTag {
    decision: Decision,
    babar_decision: Decision,
    mistag: f64,
    category: i32,
}

#[derive(Deserialize)]
struct RawCombinedTag {
    decision: Decision,
    babar_decision: Decision,
    mistag: f64,
    category: i32,
}

impl TryFrom<RawCombinedTag> for CombinedTag {
    type Error = Error;

    fn try_from(raw: RawCombinedTag) -> Result<Self> {
        if raw.babar_decision != raw.decision.babar() {
            return Err(Error::invalid_input(format!(
                "babar decision {} does not mirror decision {}",
                raw.babar_decision.as_i32(),
                raw.decision.as_i32()
            )));
        }
        Self::new(raw.decision, raw.mistag, raw.category)
    }
}

impl CombinedTag {
    /// Create a combined tag; the BaBar decision is derived.
    ///
    /// The mistag must be a probability, also for untagged decisions.
    pub fn new(decision: Decision, mistag: f64, category: i32) -> Result<Self> {
        check_mistag(mistag)?;
        Ok(Self {
            decision,
            babar_decision: decision.babar(),
            mistag,
            category,
        })
    }

    /// Untagged sentinel: decision 0, mistag 0.5, category 0
    pub fn untagged() -> Self {
        Self::pass_through(&TaggerSignal::untagged(), 0)
    }

    /// Pass a single tagger through under the given category
    pub fn pass_through(signal: &TaggerSignal, category: i32) -> Self {
        Self {
            decision: signal.decision,
            babar_decision: signal.decision.babar(),
            mistag: signal.mistag,
            category,
        }
    }

    /// Combined decision
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Decision in BaBar convention, always `decision().babar()`
    pub fn babar_decision(&self) -> Decision {
        self.babar_decision
    }

    /// Combined mistag probability
    pub fn mistag(&self) -> f64 {
        self.mistag
    }

    /// Policy-specific category code recording which branch produced the tag
    pub fn category(&self) -> i32 {
        self.category
    }

    /// Whether the combination produced a decision
    pub fn is_tagged(&self) -> bool {
        self.decision.is_tagged()
    }
}

fn check_mistag(mistag: f64) -> Result<()> {
    if (0.0..=1.0).contains(&mistag) {
        Ok(())
    } else {
        Err(Error::InvalidMistag { value: mistag })
    }
}

//! Exclusivity policies arbitrating between the OS and SS taggers
//!
//! Every policy shares one decision flow:
//! - neither tagger fired: untagged
//! - exactly one fired: that tagger is passed through unchanged
//! - both fired: Bayesian combination, or OS precedence
//!
//! The policies differ in how the branches are labelled. Downstream fits
//! select on these category codes, so each table is part of the output
//! contract.

use flavtag_core::{CombinedTag, Result, TaggerSignal};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bayes;

/// Combination policy for an (OS, SS) tagger pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusivityPolicy {
    /// OS exclusive, SS exclusive, and genuine combination each get their own code
    Inclusive,

    /// SS is only used on its own; the combination shares the OS code
    OsExclusive,

    /// OS is only used on its own; the combination shares the SS code
    SsExclusive,

    /// OS wins whenever it fired; SS fills in otherwise, no combination
    OsPrecedence,
}

/// Category codes written for each arbitration branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCodes {
    pub untagged: i32,
    pub os_only: i32,
    pub ss_only: i32,
    pub both: i32,
}

impl ExclusivityPolicy {
    /// All policies, in configuration order
    pub const ALL: [ExclusivityPolicy; 4] = [
        Self::Inclusive,
        Self::OsExclusive,
        Self::SsExclusive,
        Self::OsPrecedence,
    ];

    /// Category code table of this policy
    pub const fn categories(self) -> CategoryCodes {
        match self {
            Self::Inclusive => CategoryCodes {
                untagged: 0,
                os_only: 1,
                ss_only: -1,
                both: 10,
            },
            Self::OsExclusive => CategoryCodes {
                untagged: 0,
                os_only: 1,
                ss_only: -1,
                both: 1,
            },
            Self::SsExclusive => CategoryCodes {
                untagged: 0,
                os_only: 1,
                ss_only: -1,
                both: -1,
            },
            Self::OsPrecedence => CategoryCodes {
                untagged: 0,
                os_only: 1,
                ss_only: -1,
                both: 1,
            },
        }
    }

    /// Whether events where both taggers fired go through the Bayesian combiner
    pub const fn combines_both(self) -> bool {
        !matches!(self, Self::OsPrecedence)
    }

    /// Configuration name of the policy
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inclusive => "inclusive",
            Self::OsExclusive => "os_exclusive",
            Self::SsExclusive => "ss_exclusive",
            Self::OsPrecedence => "os_precedence",
        }
    }

    /// Arbitrate one event's OS and SS signals into a combined tag
    pub fn resolve(self, os: &TaggerSignal, ss: &TaggerSignal) -> Result<CombinedTag> {
        let codes = self.categories();

        let tag = match (os.is_tagged(), ss.is_tagged()) {
            (false, false) => {
                CombinedTag::pass_through(&TaggerSignal::untagged(), codes.untagged)
            }
            (true, false) => CombinedTag::pass_through(os, codes.os_only),
            (false, true) => CombinedTag::pass_through(ss, codes.ss_only),
            (true, true) if !self.combines_both() => CombinedTag::pass_through(os, codes.both),
            (true, true) => {
                let comb = bayes::combine(os, ss)?;
                if comb.decision.is_tagged() {
                    CombinedTag::new(comb.decision, comb.mistag, codes.both)?
                } else {
                    CombinedTag::pass_through(&TaggerSignal::untagged(), codes.untagged)
                }
            }
        };

        Ok(tag)
    }
}

impl fmt::Display for ExclusivityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flavtag_core::Decision;

    fn signal(decision: Decision, mistag: f64) -> TaggerSignal {
        TaggerSignal::new(decision, mistag).unwrap()
    }

    #[test]
    fn test_untagged_for_every_policy() {
        let none = TaggerSignal::untagged();
        for policy in ExclusivityPolicy::ALL {
            let tag = policy.resolve(&none, &none).unwrap();
            assert_eq!(tag, CombinedTag::untagged(), "policy {}", policy);
        }
    }

    #[test]
    fn test_ss_only_pass_through() {
        let ss = signal(Decision::Particle, 0.3);
        for policy in ExclusivityPolicy::ALL {
            let tag = policy.resolve(&TaggerSignal::untagged(), &ss).unwrap();
            assert_eq!(tag.decision(), Decision::Particle);
            assert_eq!(tag.babar_decision(), Decision::Antiparticle);
            assert_eq!(tag.mistag(), 0.3);
            assert_eq!(tag.category(), -1);
        }
    }

    #[test]
    fn test_os_only_pass_through() {
        let os = signal(Decision::Antiparticle, 0.38);
        for policy in ExclusivityPolicy::ALL {
            let tag = policy.resolve(&os, &TaggerSignal::untagged()).unwrap();
            assert_eq!(tag.decision(), Decision::Antiparticle);
            assert_eq!(tag.mistag(), 0.38);
            assert_eq!(tag.category(), 1);
        }
    }

    #[test]
    fn test_both_fired_category_tables() {
        let os = signal(Decision::Particle, 0.1);
        let ss = signal(Decision::Antiparticle, 0.2);

        let inclusive = ExclusivityPolicy::Inclusive.resolve(&os, &ss).unwrap();
        let os_excl = ExclusivityPolicy::OsExclusive.resolve(&os, &ss).unwrap();
        let ss_excl = ExclusivityPolicy::SsExclusive.resolve(&os, &ss).unwrap();

        assert_eq!(inclusive.category(), 10);
        assert_eq!(os_excl.category(), 1);
        assert_eq!(ss_excl.category(), -1);

        // Same combiner underneath
        for tag in [inclusive, os_excl, ss_excl] {
            assert_eq!(tag.decision(), Decision::Particle);
            assert_relative_eq!(tag.mistag(), 0.08 / 0.26, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_os_precedence_skips_combination() {
        let os = signal(Decision::Particle, 0.4);
        let ss = signal(Decision::Antiparticle, 0.1);

        let tag = ExclusivityPolicy::OsPrecedence.resolve(&os, &ss).unwrap();
        assert_eq!(tag.decision(), Decision::Particle);
        assert_eq!(tag.mistag(), 0.4);
        assert_eq!(tag.category(), 1);
    }

    #[test]
    fn test_tie_reports_untagged_category() {
        let os = signal(Decision::Particle, 0.25);
        let ss = signal(Decision::Antiparticle, 0.25);

        let tag = ExclusivityPolicy::Inclusive.resolve(&os, &ss).unwrap();
        assert_eq!(tag, CombinedTag::untagged());
    }

    #[test]
    fn test_degenerate_propagates() {
        let os = signal(Decision::Particle, 0.0);
        let ss = signal(Decision::Antiparticle, 0.0);

        assert!(ExclusivityPolicy::Inclusive.resolve(&os, &ss).is_err());
        // Precedence never reaches the combiner
        assert!(ExclusivityPolicy::OsPrecedence.resolve(&os, &ss).is_ok());
    }

    #[test]
    fn test_policy_names() {
        let policy: ExclusivityPolicy = serde_yaml::from_str("os_exclusive").unwrap();
        assert_eq!(policy, ExclusivityPolicy::OsExclusive);
        assert_eq!(ExclusivityPolicy::SsExclusive.to_string(), "ss_exclusive");
    }
}

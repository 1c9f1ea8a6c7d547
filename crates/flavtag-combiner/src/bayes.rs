//! Pairwise Bayesian combination of two fired taggers
//!
//! Both taggers are treated as independent measurements of the production
//! flavour. Each one implies a probability for either flavour hypothesis;
//! the joint probabilities are multiplied and renormalised to the two
//! possible outcomes.
//!
//! Note on signs: `p_flavour1` is the probability the tagger assigns to the
//! flavour *opposite* to a `+1` decision, so the combined decision is `+1`
//! when `Q1 < Q2`. This matches the reference combination used for the
//! calibrated tuples and must not be flipped.

use flavtag_core::{Decision, Error, Result, TaggerSignal, UNTAGGED_MISTAG};

/// Result of combining two fired taggers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCombination {
    /// Combined decision; `Untagged` only when both hypotheses are equally likely
    pub decision: Decision,

    /// Combined mistag probability
    pub mistag: f64,

    /// Normalised probability of the first flavour hypothesis (`Q1`)
    pub q1: f64,
}

/// Flavour probabilities `(p_flavour1, p_flavour2)` implied by one tagger
pub fn flavour_probabilities(signal: &TaggerSignal) -> (f64, f64) {
    let dec = signal.decision().as_f64();
    let right = 1.0 - signal.mistag();
    (
        (1.0 + dec) / 2.0 - dec * right,
        (1.0 - dec) / 2.0 + dec * right,
    )
}

/// Combine two taggers into one decision and mistag.
///
/// Fails with `DegenerateProbability` when the joint probabilities vanish,
/// which happens when one tagger is certain (mistag 0) and the other
/// contradicts it with certainty.
pub fn combine(a: &TaggerSignal, b: &TaggerSignal) -> Result<PairCombination> {
    let (a1, a2) = flavour_probabilities(a);
    let (b1, b2) = flavour_probabilities(b);

    let p1 = a1 * b1;
    let p2 = a2 * b2;
    let norm = p1 + p2;
    if !(norm > 0.0) {
        return Err(Error::degenerate("pairwise combination"));
    }

    let q1 = p1 / norm;
    let q2 = 1.0 - q1;

    let decision = if q1 < q2 {
        Decision::Particle
    } else if q1 > q2 {
        Decision::Antiparticle
    } else {
        Decision::Untagged
    };

    let mistag = if decision.is_tagged() {
        1.0 - q1.max(q2) / (q1 + q2)
    } else {
        UNTAGGED_MISTAG
    };

    Ok(PairCombination {
        decision,
        mistag,
        q1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn signal(decision: Decision, mistag: f64) -> TaggerSignal {
        TaggerSignal::new(decision, mistag).unwrap()
    }

    #[test]
    fn test_flavour_probabilities() {
        let (p1, p2) = flavour_probabilities(&signal(Decision::Particle, 0.1));
        assert_relative_eq!(p1, 0.1, epsilon = 1e-12);
        assert_relative_eq!(p2, 0.9, epsilon = 1e-12);

        let (p1, p2) = flavour_probabilities(&signal(Decision::Antiparticle, 0.2));
        assert_relative_eq!(p1, 0.8, epsilon = 1e-12);
        assert_relative_eq!(p2, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_disagreeing_taggers() {
        // OS says +1 with 10% mistag, SS says -1 with 20% mistag.
        // P1 = 0.1 * 0.8 = 0.08, P2 = 0.9 * 0.2 = 0.18
        let os = signal(Decision::Particle, 0.1);
        let ss = signal(Decision::Antiparticle, 0.2);

        let comb = combine(&os, &ss).unwrap();
        assert_relative_eq!(comb.q1, 0.08 / 0.26, epsilon = 1e-12);
        assert_eq!(comb.decision, Decision::Particle);
        assert_relative_eq!(comb.mistag, 0.08 / 0.26, epsilon = 1e-12);
    }

    #[test]
    fn test_agreeing_taggers_sharpen() {
        let os = signal(Decision::Antiparticle, 0.3);
        let ss = signal(Decision::Antiparticle, 0.4);

        let comb = combine(&os, &ss).unwrap();
        assert_eq!(comb.decision, Decision::Antiparticle);
        // 0.3 * 0.4 / (0.3 * 0.4 + 0.7 * 0.6)
        assert_relative_eq!(comb.mistag, 0.12 / 0.54, epsilon = 1e-12);
        assert!(comb.mistag < 0.3);
    }

    #[test]
    fn test_tie_is_untagged() {
        let os = signal(Decision::Particle, 0.25);
        let ss = signal(Decision::Antiparticle, 0.25);

        let comb = combine(&os, &ss).unwrap();
        assert_eq!(comb.decision, Decision::Untagged);
        assert_eq!(comb.mistag, UNTAGGED_MISTAG);
    }

    #[test]
    fn test_certain_contradiction_is_degenerate() {
        let os = signal(Decision::Particle, 0.0);
        let ss = signal(Decision::Antiparticle, 0.0);

        assert!(matches!(
            combine(&os, &ss),
            Err(Error::DegenerateProbability { .. })
        ));
    }

    #[test]
    fn test_certain_tagger_dominates() {
        let os = signal(Decision::Particle, 0.0);
        let ss = signal(Decision::Antiparticle, 0.35);

        let comb = combine(&os, &ss).unwrap();
        assert_eq!(comb.decision, Decision::Particle);
        assert_relative_eq!(comb.mistag, 0.0);
    }
}

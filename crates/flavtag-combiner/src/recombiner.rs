//! Multi-input recombination of sub-taggers into one calibrated tagger
//!
//! The opposite-side sub-taggers (muon, electron, neural-net kaon, vertex
//! charge) are multiplied together under both flavour hypotheses, the
//! winning probability is linearly recalibrated, and poorly significant
//! results are thrown away.

use flavtag_core::{Decision, Error, Result, TaggerSignal};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Linear mistag calibration `ω' = p0 + p1 (ω - η)` and rejection threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Calibration offset
    #[serde(default = "default_p0")]
    pub p0: f64,

    /// Calibration slope
    #[serde(default = "default_p1")]
    pub p1: f64,

    /// Mean mistag the calibration is expanded around
    #[serde(default = "default_eta")]
    pub eta: f64,

    /// Calibrated probabilities at or below this value are rejected
    #[serde(default = "default_prob_min")]
    pub prob_min: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            p0: default_p0(),
            p1: default_p1(),
            eta: default_eta(),
            prob_min: default_prob_min(),
        }
    }
}

impl CalibrationConfig {
    /// Check that all constants are usable
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("p0", self.p0),
            ("p1", self.p1),
            ("eta", self.eta),
            ("prob_min", self.prob_min),
        ] {
            if !value.is_finite() {
                return Err(Error::config(format!(
                    "calibration constant {} is not finite: {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.prob_min) {
            return Err(Error::config(format!(
                "prob_min must lie in [0, 1], got {}",
                self.prob_min
            )));
        }
        Ok(())
    }

    /// Calibrated probability of a right decision, capped at 1
    pub fn calibrate(&self, probability: f64) -> f64 {
        let calibrated = 1.0 - self.p0 - self.p1 * ((1.0 - probability) - self.eta);
        calibrated.min(1.0)
    }
}

// Reco14 calibration of the opposite-side combination (2011 and 2012 data)
fn default_p0() -> f64 {
    0.423
}

fn default_p1() -> f64 {
    0.875
}

fn default_eta() -> f64 {
    0.403
}

fn default_prob_min() -> f64 {
    0.5
}

/// Output of one recombination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recombination {
    /// Synthetic tagger; untagged when rejected
    pub signal: TaggerSignal,

    /// Whether the result survived the significance cut
    pub accepted: bool,

    /// Normalised probability before calibration
    pub raw_probability: f64,

    /// Probability after calibration
    pub calibrated_probability: f64,
}

/// Combines a fixed list of sub-taggers into one calibrated pseudo-tagger
#[derive(Debug, Clone)]
pub struct MultiInputRecombiner {
    calibration: CalibrationConfig,
}

impl MultiInputRecombiner {
    /// Create a recombiner with validated calibration constants
    pub fn new(calibration: CalibrationConfig) -> Result<Self> {
        calibration.validate()?;
        Ok(Self { calibration })
    }

    /// Recombine the sub-taggers of one event.
    ///
    /// Sub-taggers without a decision are skipped. Fails with
    /// `DegenerateProbability` if both hypotheses end up with zero weight.
    pub fn recombine(&self, inputs: &[TaggerSignal]) -> Result<Recombination> {
        // a: true flavour +1, b: true flavour -1
        let mut a = 0.5;
        let mut b = 0.5;

        for input in inputs.iter().filter(|s| s.is_tagged()) {
            let dec = input.decision().as_f64();
            let right = 1.0 - input.mistag();
            a *= (1.0 - dec) / 2.0 + dec * right;
            b *= (1.0 + dec) / 2.0 - dec * right;
        }

        let norm = a + b;
        if !(norm > 0.0) {
            return Err(Error::degenerate("multi-input recombination"));
        }

        let decision = if a > b {
            Decision::Particle
        } else if a < b {
            Decision::Antiparticle
        } else {
            Decision::Untagged
        };

        let raw_probability = a.max(b) / norm;
        let calibrated_probability = self.calibration.calibrate(raw_probability);

        let accepted =
            decision.is_tagged() && calibrated_probability > self.calibration.prob_min;

        trace!(
            a,
            b,
            raw_probability,
            calibrated_probability,
            accepted,
            "recombined sub-taggers"
        );

        let signal = if accepted {
            TaggerSignal::new(decision, 1.0 - calibrated_probability)?
        } else {
            TaggerSignal::untagged()
        };

        Ok(Recombination {
            signal,
            accepted,
            raw_probability,
            calibrated_probability,
        })
    }
}

impl Default for MultiInputRecombiner {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn signal(decision: Decision, mistag: f64) -> TaggerSignal {
        TaggerSignal::new(decision, mistag).unwrap()
    }

    fn identity() -> CalibrationConfig {
        CalibrationConfig {
            p0: 0.0,
            p1: 1.0,
            eta: 0.0,
            prob_min: 0.5,
        }
    }

    #[test]
    fn test_all_untagged() {
        let recombiner = MultiInputRecombiner::default();
        let result = recombiner
            .recombine(&[TaggerSignal::untagged(); 4])
            .unwrap();

        assert!(!result.accepted);
        assert_eq!(result.signal, TaggerSignal::untagged());
    }

    #[test]
    fn test_single_input_with_reference_calibration() {
        let recombiner = MultiInputRecombiner::default();
        let inputs = [
            TaggerSignal::untagged(),
            TaggerSignal::untagged(),
            signal(Decision::Particle, 0.3),
            TaggerSignal::untagged(),
        ];

        let result = recombiner.recombine(&inputs).unwrap();
        assert!(result.accepted);
        assert_eq!(result.signal.decision(), Decision::Particle);
        assert_relative_eq!(result.raw_probability, 0.7, epsilon = 1e-12);
        // 1 - 0.423 - 0.875 * (0.3 - 0.403)
        assert_relative_eq!(result.calibrated_probability, 0.667125, epsilon = 1e-12);
        assert_relative_eq!(result.signal.mistag(), 0.332875, epsilon = 1e-12);
    }

    #[test]
    fn test_identity_calibration_multiplies() {
        let recombiner = MultiInputRecombiner::new(identity()).unwrap();
        let inputs = [
            signal(Decision::Antiparticle, 0.3),
            signal(Decision::Antiparticle, 0.4),
            TaggerSignal::untagged(),
            signal(Decision::Particle, 0.45),
        ];

        let result = recombiner.recombine(&inputs).unwrap();
        // a = 0.5 * 0.3 * 0.4 * 0.55, b = 0.5 * 0.7 * 0.6 * 0.45
        let a = 0.3 * 0.4 * 0.55;
        let b = 0.7 * 0.6 * 0.45;
        assert_eq!(result.signal.decision(), Decision::Antiparticle);
        assert_relative_eq!(result.signal.mistag(), a / (a + b), epsilon = 1e-12);
    }

    #[test]
    fn test_rejection_boundary_is_inclusive() {
        // One +1 tagger with mistag 0.25 gives exactly p = 0.75
        let inputs = [signal(Decision::Particle, 0.25)];

        let at_threshold = MultiInputRecombiner::new(CalibrationConfig {
            prob_min: 0.75,
            ..identity()
        })
        .unwrap();
        let result = at_threshold.recombine(&inputs).unwrap();
        assert_eq!(result.calibrated_probability, 0.75);
        assert!(!result.accepted);
        assert_eq!(result.signal, TaggerSignal::untagged());

        let below_threshold = MultiInputRecombiner::new(CalibrationConfig {
            prob_min: 0.7499,
            ..identity()
        })
        .unwrap();
        let result = below_threshold.recombine(&inputs).unwrap();
        assert!(result.accepted);
        assert_eq!(result.signal.decision(), Decision::Particle);
        assert_relative_eq!(result.signal.mistag(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_weak_tags_rejected_by_reference_calibration() {
        // p = 0.505 calibrates to 1 - 0.423 - 0.875 * 0.092 < 0.5
        let recombiner = MultiInputRecombiner::default();
        let result = recombiner
            .recombine(&[signal(Decision::Particle, 0.495)])
            .unwrap();

        assert!(result.calibrated_probability < 0.5);
        assert!(!result.accepted);
        assert_eq!(result.signal.mistag(), 0.5);
    }

    #[test]
    fn test_calibration_capped() {
        let calibration = CalibrationConfig {
            p0: -0.5,
            ..CalibrationConfig::default()
        };
        assert_eq!(calibration.calibrate(1.0), 1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let recombiner = MultiInputRecombiner::default();
        let inputs = [
            signal(Decision::Particle, 0.0),
            signal(Decision::Antiparticle, 0.0),
        ];
        assert!(matches!(
            recombiner.recombine(&inputs),
            Err(Error::DegenerateProbability { .. })
        ));
    }

    #[test]
    fn test_invalid_calibration() {
        let config = CalibrationConfig {
            prob_min: 1.5,
            ..CalibrationConfig::default()
        };
        assert!(MultiInputRecombiner::new(config).is_err());

        let config = CalibrationConfig {
            p1: f64::NAN,
            ..CalibrationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Property tests for the combination invariants

use flavtag_combiner::{bayes, ExclusivityPolicy, MultiInputRecombiner};
use flavtag_core::{CombinedTag, Decision, TaggerSignal};
use proptest::prelude::*;

fn decision() -> impl Strategy<Value = Decision> {
    prop_oneof![
        Just(Decision::Antiparticle),
        Just(Decision::Untagged),
        Just(Decision::Particle),
    ]
}

fn tagged_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Antiparticle), Just(Decision::Particle)]
}

/// Signals away from the degenerate corners where both mistags are 0 or 1
fn signal() -> impl Strategy<Value = TaggerSignal> {
    (decision(), 0.01f64..0.99).prop_map(|(d, w)| TaggerSignal::new(d, w).unwrap())
}

fn tagged_signal() -> impl Strategy<Value = TaggerSignal> {
    (tagged_decision(), 0.01f64..0.99).prop_map(|(d, w)| TaggerSignal::new(d, w).unwrap())
}

fn policy() -> impl Strategy<Value = ExclusivityPolicy> {
    prop::sample::select(ExclusivityPolicy::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_bayes_is_commutative(a in tagged_signal(), b in tagged_signal()) {
        let ab = bayes::combine(&a, &b).unwrap();
        let ba = bayes::combine(&b, &a).unwrap();

        prop_assert_eq!(ab.decision, ba.decision);
        prop_assert!((ab.mistag - ba.mistag).abs() < 1e-12);
    }

    #[test]
    fn prop_bayes_mistag_in_range(a in tagged_signal(), b in tagged_signal()) {
        let comb = bayes::combine(&a, &b).unwrap();
        prop_assert!((0.0..=0.5).contains(&comb.mistag));
    }

    #[test]
    fn prop_agreeing_taggers_sharpen(
        d in tagged_decision(),
        w1 in 0.01f64..0.5,
        w2 in 0.01f64..0.5,
    ) {
        let a = TaggerSignal::new(d, w1).unwrap();
        let b = TaggerSignal::new(d, w2).unwrap();
        let comb = bayes::combine(&a, &b).unwrap();

        prop_assert_eq!(comb.decision, d);
        prop_assert!(comb.mistag <= w1.min(w2) + 1e-12);
    }

    #[test]
    fn prop_babar_is_negated(policy in policy(), os in signal(), ss in signal()) {
        let tag = policy.resolve(&os, &ss).unwrap();
        prop_assert_eq!(tag.babar_decision().as_i32(), -tag.decision().as_i32());
        prop_assert!((0.0..=1.0).contains(&tag.mistag()));
    }

    #[test]
    fn prop_untagged_outputs_are_sentinel(policy in policy(), os in signal(), ss in signal()) {
        let tag = policy.resolve(&os, &ss).unwrap();
        if !tag.is_tagged() {
            prop_assert_eq!(tag, CombinedTag::untagged());
        }
    }

    #[test]
    fn prop_single_tagger_passes_through(
        policy in policy(),
        s in tagged_signal(),
        os_side in any::<bool>(),
    ) {
        let none = TaggerSignal::untagged();
        let tag = if os_side {
            policy.resolve(&s, &none).unwrap()
        } else {
            policy.resolve(&none, &s).unwrap()
        };

        prop_assert_eq!(tag.decision(), s.decision());
        prop_assert_eq!(tag.mistag(), s.mistag());
        prop_assert_eq!(tag.category(), if os_side { 1 } else { -1 });
    }

    #[test]
    fn prop_untagged_inputs_do_not_change_recombination(
        inputs in prop::collection::vec(signal(), 1..6),
    ) {
        let recombiner = MultiInputRecombiner::default();
        let tagged: Vec<TaggerSignal> = inputs.iter().copied().filter(|s| s.is_tagged()).collect();

        let with_untagged = recombiner.recombine(&inputs).unwrap();
        let without = recombiner.recombine(&tagged).unwrap();

        prop_assert_eq!(with_untagged.signal, without.signal);
        prop_assert_eq!(with_untagged.accepted, without.accepted);
    }

    #[test]
    fn prop_rejected_recombination_is_untagged(inputs in prop::collection::vec(signal(), 0..6)) {
        let result = MultiInputRecombiner::default().recombine(&inputs).unwrap();
        if !result.accepted {
            prop_assert_eq!(result.signal, TaggerSignal::untagged());
        } else {
            prop_assert!(result.signal.mistag() < 0.5);
        }
    }
}

//! Event builders for combiner tests
//!
//! Produces records laid out like the reference B0 → J/ψ K_S ntuples.

#![allow(dead_code)]

use flavtag_core::MemoryRecord;

/// Builder for a single event
pub struct MockEvent {
    record: MemoryRecord,
}

impl MockEvent {
    /// Event with the OS and SS pion columns set
    pub fn new(os: (i64, f64), ss_pion: (i64, f64)) -> Self {
        let record = MemoryRecord::new()
            .with("B0_TAGDECISION_OS", os.0)
            .with("B0_TAGOMEGA_OS", os.1)
            .with("B0_SS_Pion_DEC", ss_pion.0)
            .with("B0_SS_Pion_PROB", ss_pion.1);
        Self { record }
    }

    /// Event where neither tagger fired
    pub fn untagged() -> Self {
        Self::new((0, 0.5), (0, 0.5))
    }

    /// Set a `<prefix>_DEC` / `<prefix>_PROB` tagger
    pub fn with_tagger(mut self, prefix: &str, decision: i64, mistag: f64) -> Self {
        self.record = self
            .record
            .with(format!("{}_DEC", prefix), decision)
            .with(format!("{}_PROB", prefix), mistag);
        self
    }

    /// Set the four OS sub-taggers used by the recombination
    pub fn with_sub_taggers(
        self,
        muon: (i64, f64),
        electron: (i64, f64),
        kaon: (i64, f64),
        vertex_charge: (i64, f64),
    ) -> Self {
        self.with_tagger("B0_OS_Muon", muon.0, muon.1)
            .with_tagger("B0_OS_Electron", electron.0, electron.1)
            .with_tagger("B0_OS_nnetKaon", kaon.0, kaon.1)
            .with_tagger("B0_VtxCharge", vertex_charge.0, vertex_charge.1)
    }

    /// Set the candidate ID
    pub fn with_id(mut self, id: i64) -> Self {
        self.record = self.record.with("B0_ID", id);
        self
    }

    /// Set the Monte-Carlo truth columns
    pub fn with_truth(mut self, true_id: i64, background_category: i64) -> Self {
        self.record = self
            .record
            .with("B0_TRUEID", true_id)
            .with("B0_BKGCAT", background_category);
        self
    }

    pub fn build(self) -> MemoryRecord {
        self.record
    }
}

//! Tagger column bindings and per-event signal reading

use flavtag_core::{Decision, Error, EventRecord, Result, TaggerSignal};
use serde::{Deserialize, Serialize};

/// The pair of input columns carrying one tagger's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggerColumns {
    /// Short label used for output column names (e.g. `OSMuon`)
    pub label: String,

    /// Decision column (-1, 0, +1)
    pub decision: String,

    /// Mistag probability column
    pub mistag: String,
}

impl TaggerColumns {
    /// Bind a tagger to its decision and mistag columns
    pub fn new(
        label: impl Into<String>,
        decision: impl Into<String>,
        mistag: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            decision: decision.into(),
            mistag: mistag.into(),
        }
    }

    /// Bind a tagger following the `<prefix>_DEC` / `<prefix>_PROB` naming
    pub fn from_prefix(label: impl Into<String>, prefix: &str) -> Self {
        Self::new(label, format!("{}_DEC", prefix), format!("{}_PROB", prefix))
    }

    /// Whether both columns exist in the record
    pub fn is_available<R: EventRecord + ?Sized>(&self, record: &R) -> bool {
        record.has_column(&self.decision) && record.has_column(&self.mistag)
    }

    /// Read and normalise this tagger's signal for the current event.
    ///
    /// The mistag column is only consulted when the tagger fired.
    pub fn read<R: EventRecord + ?Sized>(&self, record: &R) -> Result<TaggerSignal> {
        let raw = record.get_int(&self.decision)?;
        let decision = Decision::from_raw(raw).ok_or_else(|| Error::InvalidDecision {
            column: self.decision.clone(),
            value: raw,
        })?;

        if !decision.is_tagged() {
            return Ok(TaggerSignal::untagged());
        }

        let mistag = record.get_float(&self.mistag)?;
        TaggerSignal::new(decision, mistag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flavtag_core::MemoryRecord;

    fn muon() -> TaggerColumns {
        TaggerColumns::from_prefix("OSMuon", "B0_OS_Muon")
    }

    #[test]
    fn test_from_prefix() {
        let columns = muon();
        assert_eq!(columns.decision, "B0_OS_Muon_DEC");
        assert_eq!(columns.mistag, "B0_OS_Muon_PROB");
    }

    #[test]
    fn test_read_tagged() {
        let record = MemoryRecord::new()
            .with("B0_OS_Muon_DEC", -1i64)
            .with("B0_OS_Muon_PROB", 0.27);

        let signal = muon().read(&record).unwrap();
        assert_eq!(signal.decision(), Decision::Antiparticle);
        assert_eq!(signal.mistag(), 0.27);
    }

    #[test]
    fn test_read_untagged_ignores_mistag() {
        let record = MemoryRecord::new().with("B0_OS_Muon_DEC", 0i64);

        let signal = muon().read(&record).unwrap();
        assert_eq!(signal, TaggerSignal::untagged());
        assert!(!muon().is_available(&record));
    }

    #[test]
    fn test_read_rejects_bad_inputs() {
        let record = MemoryRecord::new()
            .with("B0_OS_Muon_DEC", 2i64)
            .with("B0_OS_Muon_PROB", 0.3);
        match muon().read(&record) {
            Err(Error::InvalidDecision { column, value }) => {
                assert_eq!(column, "B0_OS_Muon_DEC");
                assert_eq!(value, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let record = MemoryRecord::new()
            .with("B0_OS_Muon_DEC", 1i64)
            .with("B0_OS_Muon_PROB", -0.1);
        assert!(matches!(
            muon().read(&record),
            Err(Error::InvalidMistag { .. })
        ));

        let record = MemoryRecord::new().with("B0_OS_Muon_DEC", 1i64);
        assert!(matches!(muon().read(&record), Err(Error::MissingInput(_))));
    }
}

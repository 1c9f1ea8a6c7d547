//! flavtag Core
//!
//! Core types, traits, and utilities shared across the flavour-tagging reducer.
//!
//! This crate provides:
//! - Tagger decisions, per-tagger signals, and combined tags
//! - Error types and result handling
//! - The per-event record interface the host's columnar store implements

pub mod error;
pub mod record;
pub mod types;

pub use error::{Error, Result};
pub use record::{ColumnValue, EventRecord, MemoryRecord};
pub use types::{CombinedTag, Decision, TaggerSignal, UNTAGGED_MISTAG};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::record::{ColumnValue, EventRecord};
    pub use crate::types::{CombinedTag, Decision, TaggerSignal};
}

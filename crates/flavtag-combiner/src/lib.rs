//! flavtag Combiner
//!
//! Combination of flavour-tagger outputs into per-event consensus tags.
//!
//! The building blocks are layered bottom-up:
//! - [`tagger`] binds a tagger to its input columns and reads its signal
//! - [`bayes`] combines two taggers with a naive-Bayes product
//! - [`policy`] arbitrates OS and SS taggers and assigns category codes
//! - [`recombiner`] folds several sub-taggers into one calibrated tagger
//! - [`writer`] and [`derived`] produce the output columns
//! - [`pipeline`] drives all of the above for each event

pub mod bayes;
pub mod config;
pub mod derived;
pub mod pipeline;
pub mod policy;
pub mod recombiner;
pub mod tagger;
pub mod writer;

pub use bayes::{combine, PairCombination};
pub use config::{CombinationSpec, RecombinationSpec, TaggingConfig};
pub use derived::{DerivedSpec, FinalStateSpec, IntCopySpec, MixingSpec, TrueTagSpec};
pub use pipeline::{Diagnostic, EventTags, TagOutput, TaggingPipeline};
pub use policy::{CategoryCodes, ExclusivityPolicy};
pub use recombiner::{CalibrationConfig, MultiInputRecombiner, Recombination};
pub use tagger::TaggerColumns;
pub use writer::{OutputColumns, ResultWriter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::TaggingConfig;
    pub use crate::pipeline::{EventTags, TaggingPipeline};
    pub use crate::policy::ExclusivityPolicy;
    pub use crate::recombiner::{CalibrationConfig, MultiInputRecombiner};
    pub use crate::tagger::TaggerColumns;
    pub use flavtag_core::prelude::*;
}

//! Output column naming and writing of combined tags

use flavtag_core::{ColumnValue, CombinedTag, EventRecord};
use serde::{Deserialize, Serialize};

/// Names of the columns one combined tag is written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputColumns {
    /// Decision column
    pub tag: String,

    /// Decision column in BaBar convention
    pub tag_babar: String,

    /// Mistag column
    pub eta: String,

    /// Category code column
    pub category: String,

    /// Optional 0/1 "tagged by anything" flag column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagged: Option<String>,

    /// Optional second copy of the category code under an exclusivity name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<String>,
}

impl OutputColumns {
    /// Standard naming: `obsTag<S>`, `obsTag<S>_BaBar`, `obsEta<S>`, `catTagged<S>`
    pub fn for_suffix(suffix: &str) -> Self {
        Self {
            tag: format!("obsTag{}", suffix),
            tag_babar: format!("obsTag{}_BaBar", suffix),
            eta: format!("obsEta{}", suffix),
            category: format!("catTagged{}", suffix),
            tagged: None,
            exclusive: None,
        }
    }

    /// Also write a tagged flag column
    pub fn with_tagged(mut self, column: impl Into<String>) -> Self {
        self.tagged = Some(column.into());
        self
    }

    /// Also write the category under an exclusivity column name
    pub fn with_exclusive(mut self, column: impl Into<String>) -> Self {
        self.exclusive = Some(column.into());
        self
    }

    /// All column names this output produces
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![
            self.tag.as_str(),
            self.tag_babar.as_str(),
            self.eta.as_str(),
            self.category.as_str(),
        ];
        names.extend(self.tagged.as_deref());
        names.extend(self.exclusive.as_deref());
        names
    }
}

/// Writes combined tags into event records
#[derive(Debug, Clone)]
pub struct ResultWriter {
    columns: OutputColumns,
}

impl ResultWriter {
    /// Create a writer for the given columns
    pub fn new(columns: OutputColumns) -> Self {
        Self { columns }
    }

    /// Columns this writer fills
    pub fn columns(&self) -> &OutputColumns {
        &self.columns
    }

    /// Write one combined tag under both sign conventions
    pub fn write<R: EventRecord + ?Sized>(&self, record: &mut R, tag: &CombinedTag) {
        record.set(&self.columns.tag, ColumnValue::from(tag.decision().as_i32()));
        record.set(
            &self.columns.tag_babar,
            ColumnValue::from(tag.babar_decision().as_i32()),
        );
        record.set(&self.columns.eta, ColumnValue::Float(tag.mistag()));
        record.set(&self.columns.category, ColumnValue::from(tag.category()));

        if let Some(column) = &self.columns.tagged {
            record.set(column, ColumnValue::from(i32::from(tag.is_tagged())));
        }
        if let Some(column) = &self.columns.exclusive {
            record.set(column, ColumnValue::from(tag.category()));
        }
    }
}

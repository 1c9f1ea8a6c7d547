//! Per-event record interface
//!
//! The columnar store that owns the event tuple lives in the host process.
//! Everything the tagging engine needs from it is "get column value for this
//! row" and "set column value for this row", expressed by [`EventRecord`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// A scalar column value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    /// Integer column (decisions, categories, identifiers)
    Int(i64),
    /// Floating-point column (mistags, masses)
    Float(f64),
}

impl ColumnValue {
    /// Read as an integer; integral floats are accepted
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i64),
            Self::Float(_) => None,
        }
    }

    /// Read as a float
    pub fn as_float(&self) -> f64 {
        match *self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// One row of the host's columnar event store
pub trait EventRecord {
    /// Whether the row carries a column with this name
    fn has_column(&self, name: &str) -> bool;

    /// Get a column value for this row
    fn get(&self, name: &str) -> Option<ColumnValue>;

    /// Set a column value for this row, creating the column if needed
    fn set(&mut self, name: &str, value: ColumnValue);

    /// Get an integer column, failing with `MissingInput` when absent
    fn get_int(&self, name: &str) -> Result<i64> {
        let value = self.get(name).ok_or_else(|| Error::missing_input(name))?;
        value.as_int().ok_or_else(|| {
            Error::invalid_input(format!(
                "column {} holds non-integral value {}",
                name,
                value.as_float()
            ))
        })
    }

    /// Get a float column, failing with `MissingInput` when absent
    fn get_float(&self, name: &str) -> Result<f64> {
        self.get(name)
            .map(|v| v.as_float())
            .ok_or_else(|| Error::missing_input(name))
    }
}

/// In-memory event record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    columns: BTreeMap<String, ColumnValue>,
}

impl MemoryRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column insertion
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    /// Number of columns in the record
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the record has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over columns in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl EventRecord for MemoryRecord {
    fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<ColumnValue> {
        self.columns.get(name).copied()
    }

    fn set(&mut self, name: &str, value: ColumnValue) {
        self.columns.insert(name.to_string(), value);
    }
}

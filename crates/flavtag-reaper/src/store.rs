//! JSON-lines event store
//!
//! One event per line, each a JSON object mapping column names to numbers.
//! Rows keep their input column order and new columns are appended.

use flavtag_core::{ColumnValue, Error, EventRecord, Result};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};

/// One event row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRow {
    columns: Map<String, Value>,
}

impl JsonRow {
    pub fn new(columns: Map<String, Value>) -> Self {
        Self { columns }
    }

    /// Column names in row order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl EventRecord for JsonRow {
    fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Non-numeric values read as absent
    fn get(&self, name: &str) -> Option<ColumnValue> {
        let Value::Number(number) = self.columns.get(name)? else {
            return None;
        };
        match number.as_i64() {
            Some(value) => Some(ColumnValue::Int(value)),
            None => number.as_f64().map(ColumnValue::Float),
        }
    }

    fn set(&mut self, name: &str, value: ColumnValue) {
        let value = match value {
            ColumnValue::Int(v) => Value::from(v),
            ColumnValue::Float(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
        };
        match self.columns.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.columns.insert(name.to_string(), value);
            }
        }
    }
}

/// A line of the input tuple
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    /// A well-formed event
    Event(JsonRow),

    /// A line that is not a JSON object; written through unchanged
    Malformed {
        line_number: u64,
        text: String,
        reason: String,
    },
}

impl InputLine {
    /// Classify one non-empty line
    pub fn parse(line_number: u64, text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(columns)) => Self::Event(JsonRow::new(columns)),
            Ok(_) => Self::Malformed {
                line_number,
                text: text.to_string(),
                reason: "not a JSON object".to_string(),
            },
            Err(e) => Self::Malformed {
                line_number,
                text: text.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

/// Streaming reader and writer over a pair of JSON-lines files
pub struct JsonLinesStore {
    lines: Lines<BufReader<File>>,
    writer: BufWriter<File>,
    output: PathBuf,
    line_number: u64,
}

impl JsonLinesStore {
    /// Open the input for reading and create (or truncate) the output.
    ///
    /// Refuses an output that resolves to the input file.
    pub async fn open(input: &Path, output: &Path) -> Result<Self> {
        let reader = File::open(input).await?;
        if is_same_file(input, output).await? {
            return Err(Error::config(format!(
                "output {} would overwrite the input",
                output.display()
            )));
        }
        let writer = File::create(output).await?;

        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer: BufWriter::new(writer),
            output: output.to_path_buf(),
            line_number: 0,
        })
    }

    /// Next non-empty input line, or `None` at end of input
    pub async fn next_line(&mut self) -> Result<Option<InputLine>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            return Ok(Some(InputLine::parse(self.line_number, text)));
        }
        Ok(None)
    }

    /// Append one event row to the output
    pub async fn write_row(&mut self, row: &JsonRow) -> Result<()> {
        let mut line = serde_json::to_vec(&row.columns)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        Ok(())
    }

    /// Append a raw line to the output
    pub async fn write_raw(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Flush all buffered output
    pub async fn finish(mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Drop buffered output and remove the partially written file
    pub async fn discard(self) -> Result<()> {
        let Self { writer, output, .. } = self;
        drop(writer);
        tokio::fs::remove_file(&output).await?;
        Ok(())
    }
}

async fn is_same_file(input: &Path, output: &Path) -> Result<bool> {
    if !tokio::fs::try_exists(output).await? {
        return Ok(false);
    }
    let input = tokio::fs::canonicalize(input).await?;
    let output = tokio::fs::canonicalize(output).await?;
    Ok(input == output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(json: &str) -> JsonRow {
        match InputLine::parse(1, json) {
            InputLine::Event(row) => row,
            other => panic!("expected an event, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_columns() {
        let row = row(r#"{"B0_TAGDECISION_OS": -1, "B0_TAGOMEGA_OS": 0.35, "runNumber": "x"}"#);

        assert_eq!(row.get_int("B0_TAGDECISION_OS").unwrap(), -1);
        assert_eq!(row.get_float("B0_TAGOMEGA_OS").unwrap(), 0.35);
        assert!(row.has_column("runNumber"));
        assert!(row.get("runNumber").is_none());
    }

    #[test]
    fn test_set_preserves_order() {
        let mut row = row(r#"{"b": 1, "a": 2}"#);
        row.set("obsTagOS", ColumnValue::Int(-1));
        row.set("b", ColumnValue::Float(0.5));

        assert_eq!(row.column_names().collect::<Vec<_>>(), vec!["b", "a", "obsTagOS"]);
        assert_eq!(row.get_float("b").unwrap(), 0.5);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            InputLine::parse(3, "[1, 2, 3]"),
            InputLine::Malformed { line_number: 3, .. }
        ));
        assert!(matches!(
            InputLine::parse(4, "{\"B0_ID\": 511"),
            InputLine::Malformed { line_number: 4, .. }
        ));
    }

    #[test]
    fn test_non_finite_written_as_null() {
        let mut row = JsonRow::default();
        row.set("x", ColumnValue::Float(f64::NAN));
        assert!(row.has_column("x"));
        assert!(row.get("x").is_none());
    }
}

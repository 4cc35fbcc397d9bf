//! Tabular query results
//!
//! A `ResultSet` is a header of column names plus value rows aligned
//! positionally to it. The constructor is the only way to build one, so every
//! row is guaranteed to have the header's arity.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Returned when a row does not match the header arity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArityMismatch {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for ArityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} has {} values but the header has {} columns",
            self.row, self.found, self.expected
        )
    }
}

impl std::error::Error for ArityMismatch {}

/// Column names and value rows of one executed query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSet {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Build a result set, rejecting any row whose length differs from the header
    pub fn new(header: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ArityMismatch> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != header.len())
        {
            return Err(ArityMismatch {
                row: index,
                expected: header.len(),
                found: row.len(),
            });
        }
        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Value rows, header excluded
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of value rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header-first view: row 0 holds the column names, rows 1..n the values.
    pub fn to_table(&self) -> Vec<Vec<Value>> {
        let mut table = Vec::with_capacity(self.rows.len() + 1);
        table.push(self.header.iter().cloned().map(Value::String).collect());
        table.extend(self.rows.iter().cloned());
        table
    }

    /// Value of `column` in the row at `index`
    pub fn get(&self, index: usize, column: &str) -> Option<&Value> {
        let position = self.header.iter().position(|c| c == column)?;
        self.rows.get(index).and_then(|row| row.get(position))
    }

    /// Render value rows as comma-joined text, one row per line.
    pub fn render_rows(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(display_value)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Strings are shown bare, everything else in JSON notation.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

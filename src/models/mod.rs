//! Domain models for the PNZED conversion pipeline.
//!
//! This module contains the core data structures used throughout the
//! pipeline:
//!
//! - [`RecordTable`] - an ordered tabular dataset (headers + rows)
//! - [`CrsId`] - an opaque coordinate reference system identifier

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// CRS Identifier
// =============================================================================

/// An opaque coordinate reference system code, e.g. `EPSG:4326`.
///
/// A bare numeric code is normalized to the `EPSG:` authority, so `6543`
/// and `EPSG:6543` name the same system. The code is configuration, not
/// data: fixed per conversion, never per row. Interpretation of the code is
/// entirely delegated to the projection engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrsId(String);

impl CrsId {
    /// Create a CRS identifier, normalizing bare numeric codes.
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let trimmed = code.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            CrsId(format!("EPSG:{trimmed}"))
        } else {
            CrsId(trimmed.to_string())
        }
    }

    /// The code as handed to the projection engine.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CrsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CrsId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CrsId::new(s))
    }
}

impl From<&str> for CrsId {
    fn from(s: &str) -> Self {
        CrsId::new(s)
    }
}

// =============================================================================
// Record Table
// =============================================================================

/// An ordered sequence of rows, each a column → value mapping.
///
/// Invariant: every row carries the same column set as `headers`, in
/// particular after column augmentation. The table is created by the
/// parser, inspected by the validator, and mutated only by the
/// transformer's column-append step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl RecordTable {
    /// Create an empty table with the given column set.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Assemble a table from parsed parts.
    pub fn from_parts(headers: Vec<String>, rows: Vec<Map<String, Value>>) -> Self {
        Self { headers, rows }
    }

    /// Column names, in input order (appended columns last).
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows, in input order.
    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a column exists in the table schema.
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Append a row.
    ///
    /// The caller (the parser) is responsible for keying the row by this
    /// table's headers.
    pub fn push_row(&mut self, row: Map<String, Value>) {
        self.rows.push(row);
    }

    /// Append a column with one value per row, preserving row order.
    ///
    /// If the column already exists, its values are replaced and the schema
    /// is left unchanged, so the same-column-set invariant holds either
    /// way.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the row count; the transformer
    /// produces exactly one projected value per row, so a mismatch is a
    /// bug, not an input condition.
    pub fn push_column(&mut self, name: &str, values: Vec<Value>) {
        assert_eq!(
            values.len(),
            self.rows.len(),
            "column '{name}' must carry one value per row"
        );
        if !self.has_column(name) {
            self.headers.push(name.to_string());
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(name.to_string(), value);
        }
    }
}

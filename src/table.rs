//! Tabular data: CSV ingestion, indexed access, and regex pre-cleaning.
//!
//! A [`Dataframe`] is an ordered sequence of rows, each an ordered map from
//! column name to cell value. Every row carries a synthetic `index` column
//! holding its zero-based ordinal as a string; downstream code uses it to
//! refer back to reference rows from postings and result tuples.

use bytes::Bytes;
use csv::ReaderBuilder;
use indexmap::IndexMap;
use log::warn;
use regex::Regex;

use crate::error::{Error, Result};
use crate::utils::file_io;

/// One table row: ordered column name → cell value.
pub type Row = IndexMap<String, String>;

/// Name of the synthetic ordinal column injected at load time.
pub const INDEX_COLUMN: &str = "index";

/// An ordered table with a known column list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataframe {
    rows: Vec<Row>,
    column_labels: Vec<String>,
}

impl Dataframe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from explicit columns and rows. The `index` column is
    /// injected (or overwritten) with each row's ordinal, exactly as the CSV
    /// loader does.
    pub fn from_rows(column_labels: Vec<String>, rows: Vec<Row>) -> Self {
        let mut labels = column_labels;
        if !labels.iter().any(|c| c == INDEX_COLUMN) {
            labels.insert(0, INDEX_COLUMN.to_string());
        }
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(ordinal, mut row)| {
                row.insert(INDEX_COLUMN.to_string(), ordinal.to_string());
                row
            })
            .collect();
        Self {
            rows,
            column_labels: labels,
        }
    }

    /// Parses CSV text with a header row into a table.
    ///
    /// Cell values are trimmed; a BOM on the first header is stripped. Short
    /// records leave the missing trailing cells as empty strings. A CSV
    /// column literally named `index` is ignored in favour of the injected
    /// ordinal.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::Input(format!("cannot read CSV headers: {e}")))?
            .iter()
            .map(|h| h.trim_matches('\u{feff}').trim().to_string())
            .collect();

        let mut column_labels: Vec<String> = vec![INDEX_COLUMN.to_string()];
        for header in &headers {
            if header == INDEX_COLUMN {
                warn!("CSV column '{INDEX_COLUMN}' is shadowed by the injected ordinal");
                continue;
            }
            column_labels.push(header.clone());
        }

        let mut rows: Vec<Row> = Vec::new();
        for (ordinal, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| Error::Input(format!("cannot read CSV record: {e}")))?;
            let mut row: Row = Row::new();
            row.insert(INDEX_COLUMN.to_string(), ordinal.to_string());
            for (pos, header) in headers.iter().enumerate() {
                if header == INDEX_COLUMN {
                    continue;
                }
                let value = record.get(pos).unwrap_or("").trim().to_string();
                row.insert(header.clone(), value);
            }
            rows.push(row);
        }

        Ok(Self {
            rows,
            column_labels,
        })
    }

    /// Loads a CSV table from a local path, `s3://` URI, or `memory://` test
    /// path.
    pub async fn from_csv_path(path: &str) -> Result<Self> {
        let bytes: Bytes = file_io::read_bytes(path)
            .await
            .map_err(|e| Error::Input(format!("cannot read table '{path}': {e}")))?;
        Self::from_csv_bytes(&bytes)
    }

    /// Applies configured regex transformations column by column.
    ///
    /// For each (header, pattern) pair, every non-empty cell under that
    /// header is replaced by the first capture group of the first match;
    /// cells with no match are left unchanged. Unknown headers are skipped
    /// with a warning and produce no counter entry.
    ///
    /// Returns header → number of replaced cells.
    pub fn pre_process_regex(
        &mut self,
        column_patterns: &IndexMap<String, String>,
    ) -> Result<IndexMap<String, usize>> {
        let mut capture_counter: IndexMap<String, usize> = IndexMap::new();

        for (column, pattern) in column_patterns {
            if !self.column_labels.iter().any(|c| c == column) {
                warn!("regex pre-processing: column '{column}' does not exist, skipping");
                continue;
            }

            let regex = Regex::new(pattern).map_err(|e| {
                Error::Config(format!("regex for column '{column}' is invalid: {e}"))
            })?;

            let mut matching_cells = 0usize;
            for row in &mut self.rows {
                let replacement = match row.get(column) {
                    Some(value) if !value.is_empty() => regex
                        .captures(value)
                        .and_then(|captures| captures.get(1))
                        .map(|group| group.as_str().to_string()),
                    _ => None,
                };
                if let Some(replacement) = replacement {
                    row.insert(column.clone(), replacement);
                    matching_cells += 1;
                }
            }
            capture_counter.insert(column.clone(), matching_cells);
        }

        Ok(capture_counter)
    }

    /// The i-th row, if in range.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Clones the rows at the given indices, annotating each with
    /// `matchedByID = "1"`. Used by the exact-key fast path.
    pub fn subset(&self, indices: &[usize]) -> Vec<Row> {
        indices
            .iter()
            .filter_map(|&index| self.rows.get(index))
            .map(|row| {
                let mut row = row.clone();
                row.insert("matchedByID".to_string(), "1".to_string());
                row
            })
            .collect()
    }

    /// Column labels in order, `index` first.
    pub fn columns(&self) -> &[String] {
        &self.column_labels
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a Dataframe {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// Link to test module (only compiled during tests)
#[cfg(test)]
#[path = "table/tests/mod.rs"]
mod tests;

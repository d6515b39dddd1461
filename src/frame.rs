//! In-memory CSV table with the column operations the reconcilers need.
//!
//! Cells are kept as raw strings; nothing here interprets values. Missing
//! cells are represented by the empty string, which is also what gets written
//! back out.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};

use crate::io_utils::{self, CsvFormat};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// A frame with the given header and no data rows.
    pub fn empty(headers: &[String]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn read(path: &Path, format: &CsvFormat) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, format.delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, format.encoding)
            .with_context(|| format!("Reading headers from {path:?}"))?;
        let mut rows = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {} in {path:?}", idx + 2))?;
            let mut row = io_utils::decode_record(&record, format.encoding)?;
            // ragged rows are padded with empty cells or cut to the header width
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if self.headers.is_empty() {
            fs::write(path, "").with_context(|| format!("Creating output file {path:?}"))?;
            return Ok(());
        }
        let mut writer = io_utils::open_csv_writer(path)?;
        writer
            .write_record(&self.headers)
            .with_context(|| format!("Writing headers to {path:?}"))?;
        for (idx, row) in self.rows.iter().enumerate() {
            writer
                .write_record(row)
                .with_context(|| format!("Writing row {} to {path:?}", idx + 2))?;
        }
        io_utils::flush_writer(&mut writer, path)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn rename_columns(&mut self, renames: &BTreeMap<String, String>) {
        for header in &mut self.headers {
            if let Some(target) = renames.get(header.as_str()) {
                *header = target.clone();
            }
        }
    }

    /// Removes every column called `name`. Returns whether anything was removed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let keep = self
            .headers
            .iter()
            .map(|h| h != name)
            .collect::<Vec<_>>();
        if keep.iter().all(|k| *k) {
            return false;
        }
        self.headers = retain_by_mask(std::mem::take(&mut self.headers), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
        true
    }

    /// Appends an empty-filled column unless one with that name already exists.
    pub fn add_column(&mut self, name: &str) {
        if self.has_column(name) {
            return;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// Rebuilds the frame with exactly `order` as its columns. Columns not in
    /// `order` are discarded; columns of `order` the frame lacks are filled
    /// with empty strings. When a name occurs twice the first occurrence wins.
    pub fn reindex_columns(&mut self, order: &[String]) {
        let sources = order
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Vec<_>>();
        for row in &mut self.rows {
            let reordered = sources
                .iter()
                .map(|source| {
                    source
                        .and_then(|idx| row.get(idx).cloned())
                        .unwrap_or_default()
                })
                .collect();
            *row = reordered;
        }
        self.headers = order.to_vec();
    }

    /// Values of the first column, in row order.
    pub fn key_column(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.first().cloned().unwrap_or_default())
            .collect()
    }
}

fn retain_by_mask(values: Vec<String>, keep: &[bool]) -> Vec<String> {
    values
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| keep.get(*idx).copied().unwrap_or(true))
        .map(|(_, value)| value)
        .collect()
}

//! In-memory string table used for every intermediate and final result.
//!
//! All cells are text. Census extracts keep leading zeros in geography codes
//! and the wrangler never needs arithmetic, so nothing is typed. An absent cell
//! (for example a group column outside its own rows after a row-wise concat)
//! is an empty string and is written as an empty CSV field.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::warn;

use crate::{error::WrangleError, io_utils};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_csv(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading headers from {path:?}"))?;
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {path:?}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {} in {path:?}", row_idx + 2))?;
            rows.push(decoded);
        }
        Ok(Self { headers, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = io_utils::open_csv_writer(path)?;
        writer
            .write_record(&self.headers)
            .with_context(|| format!("Writing headers to {path:?}"))?;
        for (idx, row) in self.rows.iter().enumerate() {
            writer
                .write_record(row)
                .with_context(|| format!("Writing row {} to {path:?}", idx + 2))?;
        }
        writer
            .flush()
            .with_context(|| format!("Flushing output {path:?}"))?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| cell(row, idx)).collect())
    }

    /// Keeps `columns` (by source index) in the given order, under new names.
    pub fn select(&self, columns: &[(usize, String)]) -> Frame {
        let headers = columns.iter().map(|(_, name)| name.clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|(idx, _)| cell(row, *idx).to_string())
                    .collect()
            })
            .collect();
        Frame { headers, rows }
    }

    /// Fails with [`WrangleError::DuplicateKey`] on the first repeated key.
    pub fn ensure_unique_key(&self, key: &str, source: &Path) -> Result<()> {
        self.key_lookup(key, source).map(|_| ())
    }

    fn key_lookup(&self, key: &str, source: &Path) -> Result<HashMap<&str, usize>> {
        let key_idx = self
            .column_index(key)
            .ok_or_else(|| WrangleError::MissingKeyColumn {
                path: source.to_path_buf(),
                column: key.to_string(),
            })?;
        let mut lookup = HashMap::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            let value = cell(row, key_idx);
            if lookup.insert(value, row_idx).is_some() {
                return Err(WrangleError::DuplicateKey {
                    path: source.to_path_buf(),
                    key: value.to_string(),
                }
                .into());
            }
        }
        Ok(lookup)
    }

    /// Inner equality join on `key` where both sides hold at most one row per
    /// key value. Rows keep this frame's order; `other`'s key column is not
    /// repeated in the output.
    pub fn join_one_to_one(&self, other: &Frame, key: &str, other_source: &Path) -> Result<Frame> {
        let left_key = self
            .column_index(key)
            .ok_or_else(|| WrangleError::MissingKeyColumn {
                path: other_source.to_path_buf(),
                column: key.to_string(),
            })?;
        let right_key = other
            .column_index(key)
            .ok_or_else(|| WrangleError::MissingKeyColumn {
                path: other_source.to_path_buf(),
                column: key.to_string(),
            })?;
        let lookup = other.key_lookup(key, other_source)?;

        let right_columns = (0..other.headers.len())
            .filter(|idx| *idx != right_key)
            .collect::<Vec<_>>();
        let mut headers = self.headers.clone();
        for idx in &right_columns {
            let name = &other.headers[*idx];
            if headers.contains(name) {
                return Err(WrangleError::ColumnCollision {
                    path: other_source.to_path_buf(),
                    column: name.clone(),
                }
                .into());
            }
            headers.push(name.clone());
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let Some(right_idx) = lookup.get(cell(row, left_key)) else {
                continue;
            };
            let right_row = &other.rows[*right_idx];
            let mut combined = row.clone();
            combined.extend(right_columns.iter().map(|idx| cell(right_row, *idx).to_string()));
            rows.push(combined);
        }

        let dropped = self.rows.len() - rows.len();
        if dropped > 0 {
            warn!(
                "{} key(s) had no match in {:?} and were dropped from the merge",
                dropped, other_source
            );
        }
        Ok(Frame { headers, rows })
    }

    /// Unpivots `value_columns` (source column, category label) into long
    /// form: one row per (row, column) pair, all rows of the first column
    /// before the next.
    pub fn melt(
        &self,
        id_column: &str,
        value_columns: &[(String, String)],
        var_name: &str,
        value_name: &str,
    ) -> Result<Frame> {
        let id_idx = self
            .column_index(id_column)
            .with_context(|| format!("Melt id column '{id_column}' not found"))?;
        let mut rows = Vec::with_capacity(self.rows.len() * value_columns.len());
        for (column, label) in value_columns {
            let value_idx = self
                .column_index(column)
                .with_context(|| format!("Melt value column '{column}' not found"))?;
            for row in &self.rows {
                rows.push(vec![
                    cell(row, id_idx).to_string(),
                    label.clone(),
                    cell(row, value_idx).to_string(),
                ]);
            }
        }
        let headers = vec![
            id_column.to_string(),
            var_name.to_string(),
            value_name.to_string(),
        ];
        Ok(Frame { headers, rows })
    }

    /// Row-wise concatenation over the union of headers, in first-seen order.
    /// Cells for headers a frame does not carry are left empty.
    pub fn concat(frames: &[Frame]) -> Frame {
        let mut headers: Vec<String> = Vec::new();
        for frame in frames {
            for header in &frame.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
        }
        let mut rows = Vec::with_capacity(frames.iter().map(Frame::row_count).sum());
        for frame in frames {
            let positions = frame
                .headers
                .iter()
                .map(|h| headers.iter().position(|u| u == h).unwrap_or_default())
                .collect::<Vec<_>>();
            for row in &frame.rows {
                let mut out = vec![String::new(); headers.len()];
                for (idx, value) in row.iter().enumerate() {
                    if let Some(pos) = positions.get(idx) {
                        out[*pos] = value.clone();
                    }
                }
                rows.push(out);
            }
        }
        Frame { headers, rows }
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

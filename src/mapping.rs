//! The config file: which datapack tables and fields to keep, and how they
//! are named and grouped in the outputs.
//!
//! A config is a CSV with (at least) the columns `DATA_FILE_CODE`,
//! `FIELD_SHORT`, `FIELD_LONG`, `VALUE_DESC` and `GROUP`. Any other column is
//! ignored and every value is kept as text, so codes such as `01` survive
//! untouched.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;

use crate::{error::WrangleError, io_utils};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MappingColumn {
    DataFileCode,
    FieldShort,
    FieldLong,
    ValueDesc,
    Group,
}

impl MappingColumn {
    pub const ALL: [MappingColumn; 5] = [
        MappingColumn::DataFileCode,
        MappingColumn::FieldShort,
        MappingColumn::FieldLong,
        MappingColumn::ValueDesc,
        MappingColumn::Group,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            MappingColumn::DataFileCode => "DATA_FILE_CODE",
            MappingColumn::FieldShort => "FIELD_SHORT",
            MappingColumn::FieldLong => "FIELD_LONG",
            MappingColumn::ValueDesc => "VALUE_DESC",
            MappingColumn::Group => "GROUP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MappingRow {
    pub data_file_code: String,
    pub field_short: String,
    pub field_long: String,
    pub value_desc: String,
    pub group: String,
}

impl MappingRow {
    pub fn new(
        data_file_code: impl Into<String>,
        field_short: impl Into<String>,
        field_long: impl Into<String>,
        value_desc: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            data_file_code: data_file_code.into(),
            field_short: field_short.into(),
            field_long: field_long.into(),
            value_desc: value_desc.into(),
            group: group.into(),
        }
    }

    pub fn value(&self, column: MappingColumn) -> &str {
        match column {
            MappingColumn::DataFileCode => &self.data_file_code,
            MappingColumn::FieldShort => &self.field_short,
            MappingColumn::FieldLong => &self.field_long,
            MappingColumn::ValueDesc => &self.value_desc,
            MappingColumn::Group => &self.group,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingTable {
    path: PathBuf,
    rows: Vec<MappingRow>,
    file_codes: HashSet<String>,
}

impl MappingTable {
    pub fn load(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Self> {
        if !path.is_file() {
            return Err(WrangleError::ConfigNotFound(path.to_path_buf()).into());
        }
        let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading config headers from {path:?}"))?;

        let mut indices = [0usize; 5];
        for (slot, column) in indices.iter_mut().zip(MappingColumn::ALL) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == column.header())
                .ok_or_else(|| WrangleError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.header().to_string(),
                })?;
        }

        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record
                .with_context(|| format!("Reading config row {} in {path:?}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, encoding)?;
            let field = |idx: usize| decoded.get(idx).cloned().unwrap_or_default();
            rows.push(MappingRow {
                data_file_code: field(indices[0]),
                field_short: field(indices[1]),
                field_long: field(indices[2]),
                value_desc: field(indices[3]),
                group: field(indices[4]),
            });
        }

        let table = Self::from_rows(path, rows);
        if table.row_count() != table.unique_row_count() {
            warn!(
                "Duplicate rows found in config file {:?} ({} row(s), {} distinct); duplicates will be ignored",
                path,
                table.row_count(),
                table.unique_row_count()
            );
        }
        info!(
            "Loaded {} config row(s) covering {} data file code(s) from {:?}",
            table.row_count(),
            table.file_codes.len(),
            path
        );
        Ok(table)
    }

    pub fn from_rows(path: &Path, rows: Vec<MappingRow>) -> Self {
        let file_codes = rows.iter().map(|r| r.data_file_code.clone()).collect();
        Self {
            path: path.to_path_buf(),
            rows,
            file_codes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn unique_row_count(&self) -> usize {
        self.rows.iter().unique().count()
    }

    /// Distinct values of `column`, in first-seen order.
    pub fn distinct(&self, column: MappingColumn) -> Vec<&str> {
        self.rows.iter().map(|r| r.value(column)).unique().collect()
    }

    pub fn distinct_count(&self, column: MappingColumn) -> usize {
        self.distinct(column).len()
    }

    pub fn file_codes(&self) -> Vec<&str> {
        self.distinct(MappingColumn::DataFileCode)
    }

    pub fn contains_file_code(&self, code: &str) -> bool {
        self.file_codes.contains(code)
    }

    /// Distinct rows for one data file code, in first-seen order.
    pub fn rows_for(&self, file_code: &str) -> Vec<&MappingRow> {
        self.rows
            .iter()
            .filter(|r| r.data_file_code == file_code)
            .unique()
            .collect()
    }
}

use std::{fmt::Write as _, path::PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    datapack::{CatalogEntry, Datapack},
    mapping::{MappingColumn, MappingTable},
    table,
};

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub distinct_count: usize,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub config_path: PathBuf,
    pub config_path_abs: PathBuf,
    pub row_count: usize,
    pub unique_row_count: usize,
    pub columns: Vec<ColumnSummary>,
}

impl ConfigSummary {
    pub fn from_mapping(mapping: &MappingTable) -> Self {
        let config_path = mapping.path().to_path_buf();
        let config_path_abs = std::path::absolute(&config_path).unwrap_or(config_path.clone());
        let columns = MappingColumn::ALL
            .iter()
            .map(|column| {
                let values = mapping
                    .distinct(*column)
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>();
                ColumnSummary {
                    column: column.header(),
                    distinct_count: values.len(),
                    values,
                }
            })
            .collect();
        Self {
            config_path,
            config_path_abs,
            row_count: mapping.row_count(),
            unique_row_count: mapping.unique_row_count(),
            columns,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Config file summary");
        let _ = writeln!(out, "  path:        {}", self.config_path.display());
        let _ = writeln!(out, "  absolute:    {}", self.config_path_abs.display());
        let _ = writeln!(out, "  rows:        {}", self.row_count);
        let _ = writeln!(out, "  unique rows: {}", self.unique_row_count);
        let _ = writeln!(out);
        let headers = vec![
            "column".to_string(),
            "distinct".to_string(),
            "values".to_string(),
        ];
        let rows = self
            .columns
            .iter()
            .map(|c| {
                vec![
                    c.column.to_string(),
                    c.distinct_count.to_string(),
                    c.values.join(", "),
                ]
            })
            .collect::<Vec<_>>();
        out.push_str(&table::render_table(&headers, &rows));
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatapackEntrySummary<'a> {
    #[serde(flatten)]
    pub entry: &'a CatalogEntry,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatapackSummary<'a> {
    pub root: PathBuf,
    pub geo_type: String,
    pub scanned: usize,
    pub selected: usize,
    pub entries: Vec<DatapackEntrySummary<'a>>,
}

impl<'a> DatapackSummary<'a> {
    /// Summarises the selection for `geo_type`; `include_all` keeps the files
    /// the selection skips as well.
    pub fn new(
        datapack: &'a Datapack,
        mapping: &MappingTable,
        geo_type: &str,
        include_all: bool,
    ) -> Self {
        let entries = datapack
            .entries()
            .iter()
            .map(|entry| DatapackEntrySummary {
                entry,
                selected: entry.is_selected(mapping, geo_type),
            })
            .filter(|e| include_all || e.selected)
            .collect::<Vec<_>>();
        Self {
            root: datapack.root().to_path_buf(),
            geo_type: geo_type.to_string(),
            scanned: datapack.entries().len(),
            selected: datapack.select(mapping, geo_type).len(),
            entries,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Datapack {} : {} of {} file(s) selected for '{}'",
            self.root.display(),
            self.selected,
            self.scanned,
            self.geo_type
        );
        let headers = ["selected", "file_code", "country", "geo_type", "census_desc", "path"]
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let rows = self
            .entries
            .iter()
            .map(|e| {
                vec![
                    if e.selected { "*" } else { "" }.to_string(),
                    e.entry.file_code.clone(),
                    e.entry.country.clone(),
                    e.entry.geo_type.clone(),
                    e.entry.census_desc.clone(),
                    e.entry.full_path.display().to_string(),
                ]
            })
            .collect::<Vec<_>>();
        out.push_str(&table::render_table(&headers, &rows));
        out
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Serializing summary to JSON")
}

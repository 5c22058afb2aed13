use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    cli::{AffixMode, NamingMode, OutputMode},
    datapack::{CatalogEntry, Datapack},
    error::WrangleError,
    frame::Frame,
    io_utils,
    mapping::MappingTable,
    output::{self, OutputKind},
    wrangle::{self, ColumnDetail, ColumnPlan},
};

#[derive(Debug, Clone)]
pub struct CensusOptions {
    pub datapack: PathBuf,
    pub config: PathBuf,
    pub geo_type: String,
    pub year: i32,
    pub col_type: NamingMode,
    pub affix: AffixMode,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl CensusOptions {
    pub fn new(
        datapack: impl Into<PathBuf>,
        config: impl Into<PathBuf>,
        geo_type: impl Into<String>,
        year: i32,
    ) -> Self {
        Self {
            datapack: datapack.into(),
            config: config.into(),
            geo_type: geo_type.into(),
            year,
            col_type: NamingMode::default(),
            affix: AffixMode::default(),
            delimiter: None,
            encoding: UTF_8,
        }
    }

    pub fn primary_key_column(&self) -> String {
        wrangle::primary_key_column(&self.geo_type, self.year)
    }
}

/// Outputs of a [`Census::wrangle`] call. The merged table is built for every
/// mode because the pivot is derived from it.
#[derive(Debug, Clone, Default)]
pub struct Wrangled {
    pub merged: Option<Frame>,
    pub pivoted: Option<Frame>,
}

#[derive(Debug)]
pub struct Census {
    options: CensusOptions,
    mapping: MappingTable,
    datapack: Datapack,
    wrangled: Wrangled,
}

impl Census {
    /// Loads the config and scans the datapack; nothing is reshaped yet.
    pub fn new(options: CensusOptions) -> Result<Self> {
        let mapping = MappingTable::load(&options.config, options.delimiter, options.encoding)
            .with_context(|| format!("Loading config from {:?}", options.config))?;
        let datapack = Datapack::scan(&options.datapack)
            .with_context(|| format!("Scanning datapack {:?}", options.datapack))?;
        Ok(Self {
            options,
            mapping,
            datapack,
            wrangled: Wrangled::default(),
        })
    }

    pub fn options(&self) -> &CensusOptions {
        &self.options
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    pub fn datapack(&self) -> &Datapack {
        &self.datapack
    }

    pub fn selection(&self) -> Vec<&CatalogEntry> {
        self.datapack.select(&self.mapping, &self.options.geo_type)
    }

    pub fn merged(&self) -> Option<&Frame> {
        self.wrangled.merged.as_ref()
    }

    pub fn pivoted(&self) -> Option<&Frame> {
        self.wrangled.pivoted.as_ref()
    }

    /// Reads, projects and merges every selected table, then pivots when
    /// `mode` asks for it. Replaces the outputs of any earlier call.
    pub fn wrangle(&mut self, mode: OutputMode) -> Result<&Wrangled> {
        let selection = self.selection();
        if selection.is_empty() {
            return Err(WrangleError::EmptySelection {
                root: self.datapack.root().to_path_buf(),
                geo_type: self.options.geo_type.clone(),
            }
            .into());
        }
        info!(
            "Wrangling {} '{}' table(s) in {} mode",
            selection.len(),
            self.options.geo_type,
            mode
        );

        let key = self.options.primary_key_column();
        let mut projected = Vec::with_capacity(selection.len());
        let mut details: Vec<ColumnDetail> = Vec::new();
        for entry in &selection {
            let (table, plan) = self.prepare(entry, &key)?;
            details.extend_from_slice(plan.details());
            projected.push((entry.full_path.clone(), table));
        }

        let merged = wrangle::merge(&projected, &key)?;
        let pivoted = if mode.includes_pivot() {
            Some(wrangle::pivot(&merged, &key, &details)?)
        } else {
            None
        };
        self.wrangled = Wrangled {
            merged: Some(merged),
            pivoted,
        };
        Ok(&self.wrangled)
    }

    fn prepare(&self, entry: &CatalogEntry, key: &str) -> Result<(Frame, ColumnPlan)> {
        let path = &entry.full_path;
        let delimiter = io_utils::resolve_input_delimiter(path, self.options.delimiter);
        let source = Frame::from_csv(path, delimiter, self.options.encoding)
            .with_context(|| format!("Loading datapack table {path:?}"))?;
        let rows = self.mapping.rows_for(&entry.file_code);
        let plan = ColumnPlan::build(
            &entry.file_code,
            &rows,
            self.options.col_type,
            self.options.affix,
        );
        debug!(
            "{}: keeping {} of {} column(s)",
            entry.filename,
            plan.renames().len(),
            source.headers().len()
        );
        let table = wrangle::project(&source, path, key, &plan)?;
        Ok((table, plan))
    }

    /// Writes the outputs `mode` names into `directory`, stamped with the
    /// current local time.
    pub fn to_csv(&self, mode: OutputMode, directory: &Path) -> Result<Vec<PathBuf>> {
        self.to_csv_at(mode, directory, Local::now().naive_local())
    }

    pub fn to_csv_at(
        &self,
        mode: OutputMode,
        directory: &Path,
        timestamp: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        output::ensure_directory(directory)?;
        let mut targets = Vec::with_capacity(2);
        if mode.includes_merge() {
            let merged = self.merged().ok_or(WrangleError::OutputNotReady {
                kind: "merge",
                mode: mode.as_str(),
            })?;
            targets.push((OutputKind::Merge, merged));
        }
        if mode.includes_pivot() {
            let pivoted = self.pivoted().ok_or(WrangleError::OutputNotReady {
                kind: "pivot",
                mode: mode.as_str(),
            })?;
            targets.push((OutputKind::Pivot, pivoted));
        }

        let mut written = Vec::with_capacity(targets.len());
        for (kind, frame) in targets {
            let name = output::output_file_name(
                kind,
                &self.options.geo_type,
                self.options.col_type,
                self.options.affix,
                timestamp,
            );
            written.push(output::write_frame(frame, directory, &name)?);
        }
        Ok(written)
    }
}

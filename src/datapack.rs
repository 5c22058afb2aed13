//! Scanning a census datapack directory into a catalog of parsed filenames.
//!
//! DataPack extracts are named `{census_desc}_{file_code}_{country}_{geo_type}.csv`,
//! e.g. `2021Census_G01_AUS_LGA.csv`. The catalog is built in a single sorted
//! walk of the tree and filtered once per geography level.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, info};
use serde::Serialize;
use walkdir::WalkDir;

use crate::{error::WrangleError, mapping::MappingTable};

const SELECTED_EXTENSION: &str = ".csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub filename: String,
    pub census_desc: String,
    pub file_code: String,
    pub country: String,
    pub geo_type: String,
    pub file_extension: String,
    pub directory: PathBuf,
    pub full_path: PathBuf,
}

impl CatalogEntry {
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let parts = filename.split('_').collect::<Vec<_>>();
        let [census_desc, file_code, country, geo_type] = parts.as_slice() else {
            return Err(WrangleError::MalformedFilename {
                path: path.to_path_buf(),
                found: parts.len(),
            }
            .into());
        };
        Ok(Self {
            census_desc: census_desc.to_string(),
            file_code: file_code.to_string(),
            country: country.to_string(),
            geo_type: geo_type.to_string(),
            filename: filename.clone(),
            file_extension,
            directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            full_path: path.to_path_buf(),
        })
    }

    pub fn is_selected(&self, mapping: &MappingTable, geo_type: &str) -> bool {
        self.geo_type == geo_type
            && mapping.contains_file_code(&self.file_code)
            && self.file_extension == SELECTED_EXTENSION
    }
}

#[derive(Debug, Clone)]
pub struct Datapack {
    root: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl Datapack {
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(WrangleError::DirectoryNotFound(root.to_path_buf()).into());
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            entries.push(CatalogEntry::from_path(entry.path())?);
        }
        info!("Scanned {} file(s) under {:?}", entries.len(), root);
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entries for `geo_type` whose file code appears in the config, in walk order.
    pub fn select(&self, mapping: &MappingTable, geo_type: &str) -> Vec<&CatalogEntry> {
        let selected = self
            .entries
            .iter()
            .filter(|entry| entry.is_selected(mapping, geo_type))
            .collect::<Vec<_>>();
        for entry in &selected {
            debug!("Selected {:?} ({})", entry.full_path, entry.file_code);
        }
        selected
    }
}

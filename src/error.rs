//! Domain errors raised while loading the config, scanning a datapack, and
//! reshaping the selected tables.
//!
//! Operations return `anyhow::Result` and raise these variants inside it, so a
//! caller can recover the precise failure with
//! `err.downcast_ref::<WrangleError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WrangleError {
    #[error("Config file not found at {0:?}")]
    ConfigNotFound(PathBuf),

    #[error("Missing required column '{column}' in config file {path:?}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid {option} '{value}': expected one of {expected}")]
    InvalidOption {
        option: &'static str,
        value: String,
        expected: String,
    },

    #[error("Datapack directory {0:?} does not exist or is not a directory")]
    DirectoryNotFound(PathBuf),

    #[error(
        "Malformed datapack filename {path:?}: expected 4 '_'-delimited segments \
         (census_desc_filecode_country_geotype), found {found}"
    )]
    MalformedFilename { path: PathBuf, found: usize },

    #[error("No '{geo_type}' CSV files under {root:?} match a DATA_FILE_CODE in the config")]
    EmptySelection { root: PathBuf, geo_type: String },

    #[error("Primary key column '{column}' not found in {path:?}")]
    MissingKeyColumn { path: PathBuf, column: String },

    #[error("Column '{column}' listed in the config is not present in {path:?}")]
    MissingSourceColumn { path: PathBuf, column: String },

    #[error("Duplicate primary key '{key}' in {path:?}; tables must join one-to-one")]
    DuplicateKey { path: PathBuf, key: String },

    #[error(
        "Column '{column}' from {path:?} collides with an existing column; \
         use a prefix or suffix affix to keep names distinct"
    )]
    ColumnCollision { path: PathBuf, column: String },

    #[error("The path {0:?} is not a directory or does not exist")]
    NotADirectory(PathBuf),

    #[error("No {kind} output available; first run wrangle with mode '{mode}'")]
    OutputNotReady {
        kind: &'static str,
        mode: &'static str,
    },
}

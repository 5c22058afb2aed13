use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::info;

use crate::{
    cli::{AffixMode, NamingMode},
    error::WrangleError,
    frame::Frame,
};

const FILE_PREFIX: &str = "Census Data";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Merge,
    Pivot,
}

impl OutputKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::Merge => "Merge",
            OutputKind::Pivot => "Pivot",
        }
    }
}

/// `Census Data - {Merge|Pivot}-{geo}_{col_type}_{affix}-{YYYY-MM-DD HH-MM}.csv`.
/// Runs with the same options in the same minute overwrite each other.
pub fn output_file_name(
    kind: OutputKind,
    geo_type: &str,
    naming: NamingMode,
    affix: AffixMode,
    timestamp: NaiveDateTime,
) -> String {
    format!(
        "{FILE_PREFIX} - {}-{geo_type}_{naming}_{affix}-{}.csv",
        kind.label(),
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(WrangleError::NotADirectory(path.to_path_buf()).into())
    }
}

/// Writes `frame` as `file_name` inside `directory`, returning the full path.
pub fn write_frame(frame: &Frame, directory: &Path, file_name: &str) -> Result<PathBuf> {
    ensure_directory(directory)?;
    let path = directory.join(file_name);
    frame
        .write_csv(&path)
        .with_context(|| format!("Writing output {path:?}"))?;
    info!(
        "Wrote {} row(s) x {} column(s) to {:?}",
        frame.row_count(),
        frame.headers().len(),
        path
    );
    Ok(path)
}

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const CONFIG_HEADER: &str = "DATA_FILE_CODE,FIELD_SHORT,FIELD_LONG,VALUE_DESC,GROUP";

/// Scratch directory holding a small datapack, a config file and an output folder.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory with empty `datapack/` and `out/` folders.
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("temp dir");
        fs::create_dir_all(temp_dir.path().join("datapack")).expect("datapack dir");
        fs::create_dir_all(temp_dir.path().join("out")).expect("output dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn datapack(&self) -> PathBuf {
        self.path().join("datapack")
    }

    pub fn output(&self) -> PathBuf {
        self.path().join("out")
    }

    pub fn config(&self) -> PathBuf {
        self.path().join("config.csv")
    }

    /// Writes `contents` under the workspace root, creating parent folders.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file");
        path
    }

    /// Writes config rows below the standard header.
    pub fn write_config(&self, rows: &[&str]) -> PathBuf {
        let mut contents = String::from(CONFIG_HEADER);
        for row in rows {
            contents.push('\n');
            contents.push_str(row);
        }
        contents.push('\n');
        self.write("config.csv", &contents)
    }

    /// Writes a datapack table at `datapack/{relative}`.
    pub fn write_table(&self, relative: &str, contents: &str) -> PathBuf {
        self.write(&format!("datapack/{relative}"), contents)
    }

    /// Lists output file names in sorted order.
    pub fn output_files(&self) -> Vec<String> {
        let mut names = fs::read_dir(self.output())
            .expect("read output dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}

/// A two-table LGA datapack (G01 sex counts, G04 age counts) plus an STE table
/// that must never be selected for LGA runs.
pub fn sample_workspace() -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.write_config(&[
        "G01,Tot_P_M,Total_Persons_Males,Males,Sex",
        "G01,Tot_P_F,Total_Persons_Females,Females,Sex",
        "G04,Age_0_4,Persons aged 0-4,0-4 years,Age",
        "G04,Age_5_9,Persons aged 5-9,5-9 years,Age",
        "G04,Age_5_9,Persons aged 5-9,5-9 years,Age",
    ]);
    ws.write_table(
        "LGA/AUS/2021Census_G01_AUS_LGA.csv",
        "LGA_CODE_2021,Tot_P_M,Tot_P_F,Tot_P_P\n\
         LGA10050,100,110,210\n\
         LGA10180,200,190,390\n\
         LGA10250,05,07,12\n",
    );
    ws.write_table(
        "LGA/AUS/2021Census_G04_AUS_LGA.csv",
        "LGA_CODE_2021,Age_0_4,Age_5_9,Age_10_14\n\
         LGA10180,20,21,22\n\
         LGA10050,10,11,12\n\
         LGA10250,1,2,3\n",
    );
    ws.write_table(
        "LGA/AUS/2021Census_G02_AUS_LGA.csv",
        "LGA_CODE_2021,Median_age_persons\nLGA10050,40\n",
    );
    ws.write_table(
        "STE/AUS/2021Census_G01_AUS_STE.csv",
        "STE_CODE_2021,Tot_P_M,Tot_P_F\n1,1000,1100\n",
    );
    ws
}

pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("open csv");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

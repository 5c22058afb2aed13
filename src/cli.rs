use std::{fmt, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::WrangleError;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Select, rename, merge and pivot census DataPack tables",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge and/or pivot the datapack tables selected by a config file
    Wrangle(WrangleArgs),
    /// Summarise a config (field mapping) file
    Config(ConfigArgs),
    /// List the datapack files selected for a geography level
    Datapack(DatapackArgs),
}

#[derive(Debug, Args)]
pub struct WrangleArgs {
    /// Root directory of the census datapack
    #[arg(short = 'd', long = "datapack")]
    pub datapack: PathBuf,
    /// Config CSV mapping data file codes and fields to groups
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Geography level to target, e.g. LGA, SA2, STE
    #[arg(short = 'g', long = "geo-type")]
    pub geo_type: String,
    /// Census year, used to build the `{geo}_CODE_{year}` key column
    #[arg(short = 'y', long, default_value_t = 2021)]
    pub year: i32,
    /// Use the short or long field name for output columns
    #[arg(long = "col-type", value_enum, default_value = "short")]
    pub col_type: NamingMode,
    /// Affix the table's file code to every output column
    #[arg(long = "affix", value_enum, default_value = "prefix")]
    pub affix: AffixMode,
    /// Which outputs to produce
    #[arg(short = 'm', long = "mode", value_enum, default_value = "all")]
    pub mode: OutputMode,
    /// Directory receiving the output CSV files
    #[arg(short = 'o', long = "output", default_value = ".")]
    pub output: PathBuf,
    /// CSV delimiter character for datapack and config files
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print the first N rows of each output instead of writing files
    #[arg(long)]
    pub preview: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config CSV file to summarise
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Emit the summary as JSON
    #[arg(long)]
    pub json: bool,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the config file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DatapackArgs {
    /// Root directory of the census datapack
    #[arg(short = 'd', long = "datapack")]
    pub datapack: PathBuf,
    /// Config CSV whose data file codes drive the selection
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Geography level to target
    #[arg(short = 'g', long = "geo-type")]
    pub geo_type: String,
    /// List every scanned file, not only the selected ones
    #[arg(long)]
    pub all: bool,
    /// Emit the listing as JSON
    #[arg(long)]
    pub json: bool,
    /// CSV delimiter character for the config file
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the config file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

/// Which field name a mapping row contributes to the output column.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum NamingMode {
    #[default]
    Short,
    Long,
}

/// Where the table's file code is attached to an output column name.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum AffixMode {
    #[default]
    Prefix,
    Suffix,
    None,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputMode {
    Merge,
    Pivot,
    #[default]
    All,
}

impl NamingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingMode::Short => "short",
            NamingMode::Long => "long",
        }
    }
}

impl AffixMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AffixMode::Prefix => "prefix",
            AffixMode::Suffix => "suffix",
            AffixMode::None => "none",
        }
    }
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Merge => "merge",
            OutputMode::Pivot => "pivot",
            OutputMode::All => "all",
        }
    }

    pub fn includes_merge(&self) -> bool {
        matches!(self, OutputMode::Merge | OutputMode::All)
    }

    pub fn includes_pivot(&self) -> bool {
        matches!(self, OutputMode::Pivot | OutputMode::All)
    }
}

fn parse_value_enum<T: ValueEnum>(option: &'static str, value: &str) -> Result<T, WrangleError> {
    <T as ValueEnum>::from_str(value, false).map_err(|_| WrangleError::InvalidOption {
        option,
        value: value.to_string(),
        expected: T::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| format!("'{}'", v.get_name()))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

impl FromStr for NamingMode {
    type Err = WrangleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_value_enum("col_type", value)
    }
}

impl FromStr for AffixMode {
    type Err = WrangleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_value_enum("affix_type", value)
    }
}

impl FromStr for OutputMode {
    type Err = WrangleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_value_enum("mode", value)
    }
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AffixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_mode_rejects_unsupported_values() {
        assert_eq!("long".parse::<NamingMode>().unwrap(), NamingMode::Long);
        let err = "median".parse::<NamingMode>().unwrap_err();
        match err {
            WrangleError::InvalidOption {
                option,
                value,
                expected,
            } => {
                assert_eq!(option, "col_type");
                assert_eq!(value, "median");
                assert_eq!(expected, "'short', 'long'");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn affix_and_output_modes_parse_exact_names() {
        assert_eq!("none".parse::<AffixMode>().unwrap(), AffixMode::None);
        assert!("Prefix".parse::<AffixMode>().is_err());
        assert!("both".parse::<OutputMode>().is_err());
        let all = "all".parse::<OutputMode>().unwrap();
        assert!(all.includes_merge() && all.includes_pivot());
        assert!(!OutputMode::Merge.includes_pivot());
    }

    #[test]
    fn parse_delimiter_accepts_named_tokens() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }
}

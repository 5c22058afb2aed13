pub mod census;
pub mod cli;
pub mod datapack;
pub mod error;
pub mod frame;
pub mod io_utils;
pub mod mapping;
pub mod output;
pub mod summary;
pub mod table;
pub mod wrangle;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    census::{Census, CensusOptions},
    cli::{Cli, Commands},
    datapack::Datapack,
    mapping::MappingTable,
    summary::{ConfigSummary, DatapackSummary},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("census_wrangler", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Wrangle(args) => handle_wrangle(&args),
        Commands::Config(args) => handle_config(&args),
        Commands::Datapack(args) => handle_datapack(&args),
    }
}

fn handle_wrangle(args: &cli::WrangleArgs) -> Result<()> {
    let options = CensusOptions {
        datapack: args.datapack.clone(),
        config: args.config.clone(),
        geo_type: args.geo_type.clone(),
        year: args.year,
        col_type: args.col_type,
        affix: args.affix,
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    if args.preview.is_none() {
        output::ensure_directory(&args.output)?;
    }
    info!(
        "Wrangling '{}' with key column '{}' (col_type {}, affix {})",
        args.datapack.display(),
        options.primary_key_column(),
        options.col_type,
        options.affix
    );
    let mut census = Census::new(options)?;
    census.wrangle(args.mode)?;

    if let Some(limit) = args.preview {
        if args.mode.includes_merge() {
            if let Some(merged) = census.merged() {
                println!("Merge");
                print!("{}", table::render_frame(merged, limit));
            }
        }
        if let Some(pivoted) = census.pivoted() {
            println!("Pivot");
            print!("{}", table::render_frame(pivoted, limit));
        }
        return Ok(());
    }

    let written = census
        .to_csv(args.mode, &args.output)
        .with_context(|| format!("Writing outputs to {:?}", args.output))?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_config(args: &cli::ConfigArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mapping = MappingTable::load(&args.config, args.delimiter, encoding)
        .with_context(|| format!("Loading config from {:?}", args.config))?;
    let report = ConfigSummary::from_mapping(&mapping);
    if args.json {
        println!("{}", summary::to_json(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

fn handle_datapack(args: &cli::DatapackArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mapping = MappingTable::load(&args.config, args.delimiter, encoding)
        .with_context(|| format!("Loading config from {:?}", args.config))?;
    let datapack = Datapack::scan(&args.datapack)
        .with_context(|| format!("Scanning datapack {:?}", args.datapack))?;
    let report = DatapackSummary::new(&datapack, &mapping, &args.geo_type, args.all);
    if args.json {
        println!("{}", summary::to_json(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

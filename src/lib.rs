pub mod address;
pub mod classify;
pub mod clean;
pub mod cli;
pub mod district;
pub mod divisions;
pub mod enrich;
pub mod io_utils;
pub mod mapping;
pub mod normalize;
pub mod phone;
pub mod record;
pub mod rows;
pub mod settings;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    mapping::suggest_mapping,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("customer_cleaner", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Suggest(args) => handle_suggest(&args),
        Commands::Clean(args) => clean::execute(&args),
        Commands::States => {
            handle_states();
            Ok(())
        }
    }
}

fn handle_suggest(args: &cli::SuggestArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {:?}", args.input))?;
    let mapping = suggest_mapping(&headers);
    let mapped = mapping
        .entries()
        .iter()
        .filter(|entry| !entry.target.is_ignore())
        .count();

    match &args.output {
        Some(path) => {
            mapping.save(path)?;
            info!(
                "Mapping for {} column(s) ({} mapped, {} ignored) written to {:?}",
                headers.len(),
                mapped,
                headers.len() - mapped,
                path
            );
        }
        None => print!("{}", mapping.to_yaml()?),
    }
    Ok(())
}

fn handle_states() {
    for state in divisions::states_by_name() {
        println!("{}  {}", state.code, state.name);
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b';' => ";".to_string(),
        other => (other as char).to_string(),
    }
}

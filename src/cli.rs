use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::phone::PhoneFormat;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean customer CSV exports into importable and rejected rows",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Suggest a column mapping from a CSV header row
    Suggest(SuggestArgs),
    /// Normalize customer rows and split them into valid and invalid outputs
    Clean(CleanArgs),
    /// List Brazilian state codes accepted as --default-state
    States,
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Input CSV file whose headers should be mapped
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination mapping YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Customer CSV file to clean
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column mapping YAML file (a suggested mapping is used if omitted)
    #[arg(short = 'm', long = "mapping")]
    pub mapping: Option<PathBuf>,
    /// Settings YAML file; individual flags below override its values
    #[arg(short = 's', long = "settings")]
    pub settings: Option<PathBuf>,
    /// Reference CSV of known districts (columns Cidade, Bairro, Estado)
    #[arg(long = "districts")]
    pub districts: Option<PathBuf>,
    /// Offline postal-code directory (.csv or .json) used to prefill empty address fields
    #[arg(long = "postal-codes")]
    pub postal_codes: Option<PathBuf>,
    /// Output CSV for valid rows
    #[arg(long = "valid-output")]
    pub valid_output: Option<PathBuf>,
    /// Output CSV for rejected rows
    #[arg(long = "invalid-output")]
    pub invalid_output: Option<PathBuf>,
    /// Write a JSON run summary to this path
    #[arg(long = "summary")]
    pub summary: Option<PathBuf>,
    /// Store identifier appended to every output row
    #[arg(long = "store-id")]
    pub store_id: Option<String>,
    /// City used when a row has none
    #[arg(long = "default-city")]
    pub default_city: Option<String>,
    /// State code used when a row has none
    #[arg(long = "default-state")]
    pub default_state: Option<String>,
    /// Two-digit area code prepended to 8 or 9 digit phone numbers
    #[arg(long = "default-ddd")]
    pub default_ddd: Option<String>,
    /// Phone output representation
    #[arg(long = "phone-format", value_enum)]
    pub phone_format: Option<PhoneFormat>,
    /// Reject rows whose address is neither validated nor complete
    #[arg(long = "discard-rows-without-address")]
    pub discard_rows_without_address: bool,
    /// Rows classified between progress reports
    #[arg(long = "chunk-size")]
    pub chunk_size: Option<usize>,
    /// CSV delimiter character for reading inputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for outputs (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output files (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
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

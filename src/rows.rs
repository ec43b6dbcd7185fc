//! Whole-file record reading and writing.
//!
//! The cleaning pipeline works on fully materialized rows: reference data must
//! be complete before classification starts, and outputs are written only
//! once both partitions are known.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use itertools::Itertools;
use log::debug;

use crate::{io_utils, record::Record};

pub fn read_records(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<(Vec<String>, Vec<Record>)> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;

    let mut records = Vec::new();
    for (idx, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("Reading row {}", idx + 2))?;
        let values = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", idx + 2))?;
        records.push(Record::from_row(&headers, &values));
    }
    debug!(
        "Read {} row(s) with {} column(s) from {:?}",
        records.len(),
        headers.len(),
        path
    );
    Ok((headers, records))
}

/// Output header: every column any row carries, in first-seen order.
pub fn union_headers(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.columns())
        .unique()
        .map(str::to_string)
        .collect()
}

/// Writes `records` under the union header. An empty slice yields an empty file.
pub fn write_records(
    path: Option<&Path>,
    records: &[Record],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<usize> {
    let mut writer = io_utils::open_csv_writer(path, delimiter, encoding)?;
    if records.is_empty() {
        writer.flush().context("Flushing output")?;
        return Ok(0);
    }

    let headers = union_headers(records);
    writer
        .write_record(headers.iter())
        .context("Writing output headers")?;
    for (idx, record) in records.iter().enumerate() {
        writer
            .write_record(headers.iter().map(|column| record.value(column)))
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(records.len())
}

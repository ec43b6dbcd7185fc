//! Reference index of known (city, district) pairs.
//!
//! Built once from an optional reference CSV (columns located by name,
//! case-insensitively: `cidade`, `bairro`/`bairros`, `estado`, or their English
//! equivalents) and read-only afterwards.

use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{normalize::normalize, record::Record, rows};

const CITY_COLUMNS: &[&str] = &["cidade", "city"];
const DISTRICT_COLUMNS: &[&str] = &["bairro", "bairros", "district", "neighborhood"];
const STATE_COLUMNS: &[&str] = &["estado", "uf", "state"];

#[derive(Debug, Clone, Default)]
pub struct DistrictIndex {
    keys: HashSet<String>,
    states: HashSet<String>,
}

impl DistrictIndex {
    pub fn build<'a, I>(reference_rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut index = DistrictIndex::default();
        for row in reference_rows {
            let city = locate(row, CITY_COLUMNS);
            let district = locate(row, DISTRICT_COLUMNS);
            if city.trim().is_empty() && district.trim().is_empty() {
                continue;
            }
            index.keys.insert(composite_key(city, district));
            let state = normalize(locate(row, STATE_COLUMNS));
            if !state.is_empty() {
                index.states.insert(state);
            }
        }
        index
    }

    pub fn load(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let (headers, records) = rows::read_records(path, delimiter, encoding)
            .with_context(|| format!("Reading district reference {path:?}"))?;
        debug!("District reference headers: {headers:?}");
        Ok(Self::build(&records))
    }

    pub fn contains(&self, city: &str, district: &str) -> bool {
        self.keys.contains(&composite_key(city, district))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of distinct states named by the reference rows.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

fn composite_key(city: &str, district: &str) -> String {
    format!("{}|{}", normalize(city), normalize(district))
}

fn locate<'a>(row: &'a Record, candidates: &[&str]) -> &'a str {
    row.iter()
        .find(|(column, _)| {
            candidates
                .iter()
                .any(|candidate| column.trim().eq_ignore_ascii_case(candidate))
        })
        .map(|(_, value)| value)
        .unwrap_or("")
}

//! Postal-code (CEP) enrichment ahead of classification.
//!
//! Lookups go through the [`PostalLookup`] trait. Results are memoized in a
//! caller-owned [`PostalCache`]; a code the source does not know is cached as
//! a miss, while a failed lookup is logged and retried on the next row. The
//! offline [`PostalDirectory`] serves lookups from a CSV or JSON export.
//!
//! Enrichment only fills values that are empty, and never fails a run.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    mapping::{CanonicalField, FieldMapping},
    phone::digits,
    record::Record,
    rows,
};

const POSTAL_CODE_LEN: usize = 8;

/// Address attributes known for one postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub cep: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub street: String,
}

pub trait PostalLookup {
    /// `Ok(None)` means the code is unknown; `Err` means the source could not answer.
    fn lookup(&self, cep: &str) -> Result<Option<PostalAddress>>;
}

/// Cleans a raw postal code to its 8 digits, or `None` when it has another length.
pub fn clean_postal_code(raw: &str) -> Option<String> {
    let cleaned = digits(raw);
    (cleaned.len() == POSTAL_CODE_LEN).then_some(cleaned)
}

#[derive(Debug, Default)]
pub struct PostalCache {
    entries: HashMap<String, Option<PostalAddress>>,
}

impl PostalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<L>(&mut self, lookup: &L, raw_cep: &str) -> Option<&PostalAddress>
    where
        L: PostalLookup + ?Sized,
    {
        let cep = clean_postal_code(raw_cep)?;
        if !self.entries.contains_key(&cep) {
            match lookup.lookup(&cep) {
                Ok(found) => {
                    self.entries.insert(cep.clone(), found);
                }
                Err(err) => {
                    warn!("Postal lookup for {cep} failed: {err:#}");
                    return None;
                }
            }
        }
        self.entries.get(&cep).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Offline postal directory keyed by 8-digit code.
#[derive(Debug, Clone, Default)]
pub struct PostalDirectory {
    by_cep: HashMap<String, PostalAddress>,
}

impl PostalDirectory {
    pub fn from_addresses<I>(addresses: I) -> Self
    where
        I: IntoIterator<Item = PostalAddress>,
    {
        let by_cep = addresses
            .into_iter()
            .filter_map(|mut address| {
                let cep = clean_postal_code(&address.cep)?;
                address.cep = cep.clone();
                Some((cep, address))
            })
            .collect();
        Self { by_cep }
    }

    /// Loads a `.json` array of lookup responses, or a CSV with
    /// `cep,state,city,neighborhood,street` columns.
    pub fn load(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Reading postal directory {path:?}"))?;
            let addresses: Vec<PostalAddress> = serde_json::from_str(&raw)
                .with_context(|| format!("Parsing postal directory {path:?}"))?;
            return Ok(Self::from_addresses(addresses));
        }

        let (_, records) = rows::read_records(path, delimiter, encoding)
            .with_context(|| format!("Reading postal directory {path:?}"))?;
        Ok(Self::from_addresses(records.iter().map(|record| {
            PostalAddress {
                cep: record.value("cep").to_string(),
                state: record.value("state").to_string(),
                city: record.value("city").to_string(),
                neighborhood: record.value("neighborhood").to_string(),
                street: record.value("street").to_string(),
            }
        })))
    }

    pub fn len(&self) -> usize {
        self.by_cep.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cep.is_empty()
    }
}

impl PostalLookup for PostalDirectory {
    fn lookup(&self, cep: &str) -> Result<Option<PostalAddress>> {
        Ok(self.by_cep.get(cep).cloned())
    }
}

/// Fills empty street, district, city, and state values from the postal code.
///
/// A field mapped to an input column is filled in that column; an unmapped one
/// is added under its canonical name. Returns the number of rows touched.
pub fn prefill_from_postal_codes<L>(
    rows: &mut [Record],
    mapping: &FieldMapping,
    lookup: &L,
    cache: &mut PostalCache,
) -> usize
where
    L: PostalLookup + ?Sized,
{
    let Some(zip_column) = mapping.column_for(CanonicalField::AddressZipcode) else {
        debug!("No column is mapped to address_zipcode; skipping postal enrichment");
        return 0;
    };
    let zip_column = zip_column.to_string();

    let mut touched = 0usize;
    for row in rows.iter_mut() {
        let Some(found) = cache.resolve(lookup, row.value(&zip_column)) else {
            continue;
        };
        let fills = [
            (CanonicalField::Address, found.street.as_str()),
            (CanonicalField::DescDistrict, found.neighborhood.as_str()),
            (CanonicalField::DescCity, found.city.as_str()),
            (CanonicalField::ShortDescState, found.state.as_str()),
        ];
        let mut changed = false;
        for (field, value) in fills {
            if value.trim().is_empty() {
                continue;
            }
            let column = mapping.column_for(field).unwrap_or(field.as_str());
            if row.value(column).trim().is_empty() {
                row.set(column, value.trim());
                changed = true;
            }
        }
        if changed {
            touched += 1;
        }
    }
    touched
}

//! Row classification: project, derive, validate, and partition customer rows.
//!
//! Per row, in order:
//!
//! 1. project mapped columns onto canonical field names ([`project_row`]);
//! 2. decompose the combined address, replacing the raw text with the seven
//!    derived fields;
//! 3. normalize the phone number (`invalid phone` when it cannot be);
//! 4. corroborate (city, district) against the [`DistrictIndex`];
//! 5. backfill default city/state and stamp the store identifier;
//! 6. when configured, reject rows whose address was neither corroborated
//!    nor reasonably complete (`unvalidated or incomplete address`).
//!
//! Only the first failing check is recorded. Multi-address rows are fanned
//! out beforehand by [`expand_rows`]. Nothing here fails: malformed input
//! ends up as an invalidation reason or an empty derived field.

use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    address::parse_address,
    district::DistrictIndex,
    mapping::{CanonicalField, FieldMapping},
    phone::{digits, normalize_phone},
    record::Record,
    settings::Settings,
};

pub const INVALID_REASON_COLUMN: &str = "motivo_invalidacao";
pub const STORE_ID_COLUMN: &str = "id_store";

const MIN_PHONE_DIGITS: usize = 10;
const MIN_STREET_CHARS: usize = 3;
const MIN_DISTRICT_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    InvalidPhone,
    IncompleteAddress,
}

impl InvalidReason {
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::InvalidPhone => "invalid phone",
            InvalidReason::IncompleteAddress => "unvalidated or incomplete address",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRow {
    pub fields: Record,
    /// (city, district) was found in the district index.
    pub address_validated: bool,
    pub invalid_reason: Option<InvalidReason>,
}

impl ProcessedRow {
    pub fn is_valid(&self) -> bool {
        self.invalid_reason.is_none()
    }

    /// The row as written out; rejected rows carry their reason column.
    pub fn to_output(&self) -> Record {
        let mut output = self.fields.clone();
        if let Some(reason) = self.invalid_reason {
            output.set(INVALID_REASON_COLUMN, reason.as_str());
        }
        output
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub valid: Vec<ProcessedRow>,
    pub invalid: Vec<ProcessedRow>,
}

impl Partition {
    pub fn push(&mut self, row: ProcessedRow) {
        if row.is_valid() {
            self.valid.push(row);
        } else {
            self.invalid.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn valid_records(&self) -> Vec<Record> {
        self.valid.iter().map(ProcessedRow::to_output).collect()
    }

    pub fn invalid_records(&self) -> Vec<Record> {
        self.invalid.iter().map(ProcessedRow::to_output).collect()
    }
}

/// Snapshot passed to the progress callback after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            (self.processed * 100 / self.total).min(100)
        }
    }
}

/// Fans out rows whose address column holds a `;`-separated list: one row per
/// non-empty segment, every other column copied unchanged. A list with no
/// non-empty segment keeps the row once, with the address cleared.
pub fn expand_rows(rows: &[Record], mapping: &FieldMapping) -> Vec<Record> {
    let Some(column) = mapping.expansion_column() else {
        return rows.to_vec();
    };
    let mut expanded = Vec::with_capacity(rows.len());
    for row in rows {
        let value = row.value(column);
        if !value.contains(';') {
            expanded.push(row.clone());
            continue;
        }
        let before = expanded.len();
        for segment in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let mut copy = row.clone();
            copy.set(column, segment);
            expanded.push(copy);
        }
        if expanded.len() == before {
            warn!(
                "Address '{value}' in column '{column}' has no segments; \
                 keeping the row with an empty address"
            );
            let mut copy = row.clone();
            copy.set(column, "");
            expanded.push(copy);
            continue;
        }
        debug!(
            "Expanded one row into {} address row(s)",
            expanded.len() - before
        );
    }
    expanded
}

/// Builds the canonical view of a raw row.
///
/// Canonical fields come first, in mapping order; a mapped column missing from
/// the row yields an empty value. Unmapped columns follow under their own
/// names unless a canonical field already took that name. Ignored and
/// renamed columns are dropped.
pub fn project_row(raw: &Record, mapping: &FieldMapping) -> Record {
    let mut projected = Record::with_capacity(raw.len());
    for entry in mapping.entries() {
        if entry.target.is_ignore() {
            continue;
        }
        projected.set(entry.target.as_str(), raw.value(&entry.column));
    }
    for (column, value) in raw.iter() {
        if mapping.target(column).is_none() && !projected.contains(column) {
            projected.set(column, value);
        }
    }
    projected
}

pub struct Classifier<'a> {
    mapping: &'a FieldMapping,
    settings: &'a Settings,
    districts: &'a DistrictIndex,
}

impl<'a> Classifier<'a> {
    pub fn new(
        mapping: &'a FieldMapping,
        settings: &'a Settings,
        districts: &'a DistrictIndex,
    ) -> Self {
        Self {
            mapping,
            settings,
            districts,
        }
    }

    pub fn classify_row(&self, raw: &Record) -> ProcessedRow {
        let mut row = project_row(raw, self.mapping);
        let mut reason: Option<InvalidReason> = None;

        let combined = CanonicalField::EnderecoCompleto.as_str();
        if let Some(full_address) = row.remove(combined) {
            if !full_address.trim().is_empty() {
                for (field, value) in parse_address(&full_address).fields() {
                    row.set(field, value);
                }
            }
        }

        let phone_field = CanonicalField::Phone.as_str();
        let normalized = normalize_phone(row.value(phone_field), self.settings.default_ddd());
        if digits(&normalized).len() < MIN_PHONE_DIGITS {
            reason = Some(InvalidReason::InvalidPhone);
        } else {
            row.set(phone_field, self.settings.phone_format.render(&normalized));
        }

        let city_field = CanonicalField::DescCity.as_str();
        let district_field = CanonicalField::DescDistrict.as_str();
        let address_validated = !self.districts.is_empty()
            && self
                .districts
                .contains(row.value(city_field), row.value(district_field));

        self.apply_defaults(&mut row);

        if self.settings.discard_rows_without_address
            && reason.is_none()
            && !address_validated
            && !has_basic_address(&row)
        {
            reason = Some(InvalidReason::IncompleteAddress);
        }

        ProcessedRow {
            fields: row,
            address_validated,
            invalid_reason: reason,
        }
    }

    pub fn classify_into(&self, rows: &[Record], partition: &mut Partition) {
        for raw in rows {
            partition.push(self.classify_row(raw));
        }
    }

    /// Classifies `rows` in chunks of `chunk_size`, reporting after each chunk.
    pub fn classify_with_progress<F>(
        &self,
        rows: &[Record],
        chunk_size: usize,
        mut on_progress: F,
    ) -> Partition
    where
        F: FnMut(Progress),
    {
        let total = rows.len();
        let mut partition = Partition::default();
        for chunk in rows.chunks(chunk_size.max(1)) {
            self.classify_into(chunk, &mut partition);
            on_progress(Progress {
                processed: partition.len(),
                total,
            });
        }
        partition
    }

    fn apply_defaults(&self, row: &mut Record) {
        let defaults = [
            (CanonicalField::DescCity, self.settings.default_city()),
            (CanonicalField::ShortDescState, self.settings.default_state()),
        ];
        for (field, default) in defaults {
            if !default.is_empty() && row.value(field.as_str()).is_empty() {
                row.set(field.as_str(), default);
            }
        }
        let store_id = self.settings.store_id();
        if !store_id.is_empty() {
            row.set(STORE_ID_COLUMN, store_id);
        }
    }
}

fn has_basic_address(row: &Record) -> bool {
    let street = row.value(CanonicalField::Address.as_str());
    let district = row.value(CanonicalField::DescDistrict.as_str());
    street.chars().count() > MIN_STREET_CHARS && district.chars().count() > MIN_DISTRICT_CHARS
}

/// Expands and classifies `rows` in one pass.
pub fn classify(
    rows: &[Record],
    mapping: &FieldMapping,
    settings: &Settings,
    districts: &DistrictIndex,
) -> Partition {
    let expanded = expand_rows(rows, mapping);
    let mut partition = Partition::default();
    Classifier::new(mapping, settings, districts).classify_into(&expanded, &mut partition);
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phone::PhoneFormat;

    fn row(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    fn mapping() -> FieldMapping {
        FieldMapping::from_pairs([
            ("Nome", CanonicalField::FullName),
            ("Telefone", CanonicalField::Phone),
            ("Endereço", CanonicalField::EnderecoCompleto),
            ("Obs", CanonicalField::Ignore),
        ])
        .unwrap()
    }

    #[test]
    fn projection_renames_and_drops_ignored_columns() {
        let raw = row(&[
            ("Nome", "Ana"),
            ("Telefone", "11987654321"),
            ("Obs", "vip"),
            ("Loja", "centro"),
        ]);
        let projected = project_row(&raw, &mapping());
        let pairs: Vec<_> = projected.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("full_name", "Ana"),
                ("phone", "11987654321"),
                ("endereco_completo", ""),
                ("Loja", "centro"),
            ]
        );
    }

    #[test]
    fn projection_keeps_canonical_value_over_colliding_remnant() {
        let mapping = FieldMapping::from_pairs([("Celular", CanonicalField::Phone)]).unwrap();
        let raw = row(&[("phone", "old"), ("Celular", "11987654321")]);
        let projected = project_row(&raw, &mapping);
        assert_eq!(projected.value("phone"), "11987654321");
        assert_eq!(projected.len(), 1);
    }

    #[test]
    fn expansion_splits_semicolon_lists() {
        let rows = vec![
            row(&[("Nome", "Ana"), ("Endereço", "Rua A 1;Rua B 2")]),
            row(&[("Nome", "Bia"), ("Endereço", "Rua C 3")]),
            row(&[("Nome", "Caio"), ("Endereço", "Rua D 4; ;")]),
        ];
        let expanded = expand_rows(&rows, &mapping());
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].value("Endereço"), "Rua A 1");
        assert_eq!(expanded[1].value("Endereço"), "Rua B 2");
        assert_eq!(expanded[1].value("Nome"), "Ana");
        assert_eq!(expanded[3].value("Endereço"), "Rua D 4");
    }

    #[test]
    fn separator_only_address_keeps_the_row() {
        let rows = vec![row(&[
            ("Nome", "Ana"),
            ("Telefone", "11987654321"),
            ("Endereço", " ; ;"),
        ])];
        let expanded = expand_rows(&rows, &mapping());
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].value("Endereço"), "");
        assert_eq!(expanded[0].value("Nome"), "Ana");

        let partition = classify(
            &rows,
            &mapping(),
            &Settings::default(),
            &DistrictIndex::default(),
        );
        assert_eq!(partition.len(), 1);
    }

    #[test]
    fn blank_combined_address_leaves_structured_fields_alone() {
        let mapping = FieldMapping::from_pairs([
            ("Telefone", CanonicalField::Phone),
            ("Endereço", CanonicalField::EnderecoCompleto),
            ("Bairro", CanonicalField::DescDistrict),
        ])
        .unwrap();
        let settings = Settings::default();
        let districts = DistrictIndex::default();
        let classifier = Classifier::new(&mapping, &settings, &districts);
        let out = classifier.classify_row(&row(&[
            ("Telefone", "11987654321"),
            ("Endereço", "   "),
            ("Bairro", "Centro"),
        ]));
        assert!(!out.fields.contains("endereco_completo"));
        assert_eq!(out.fields.value("desc_district"), "Centro");
        assert!(!out.fields.contains("address"));
    }

    #[test]
    fn combined_address_is_replaced_by_derived_fields() {
        let mapping = mapping();
        let settings = Settings::default();
        let districts = DistrictIndex::default();
        let classifier = Classifier::new(&mapping, &settings, &districts);
        let out = classifier.classify_row(&row(&[
            ("Nome", "Ana"),
            ("Telefone", "11987654321"),
            ("Endereço", "Rua João, 234, Jardim Primavera, Sorocaba - SP, 18000000"),
        ]));
        assert!(out.is_valid());
        assert!(!out.fields.contains("endereco_completo"));
        assert_eq!(out.fields.value("address"), "Rua João");
        assert_eq!(out.fields.value("desc_city"), "Sorocaba");
        assert_eq!(out.fields.value("phone"), "(11) 98765-4321");
    }

    #[test]
    fn invalid_phone_keeps_raw_value_and_wins_precedence() {
        let mapping = mapping();
        let settings = Settings {
            discard_rows_without_address: true,
            ..Settings::default()
        };
        let districts = DistrictIndex::default();
        let classifier = Classifier::new(&mapping, &settings, &districts);
        let out = classifier.classify_row(&row(&[("Nome", "Ana"), ("Telefone", "12-3")]));
        assert_eq!(out.invalid_reason, Some(InvalidReason::InvalidPhone));
        assert_eq!(out.fields.value("phone"), "12-3");
        assert_eq!(out.to_output().value(INVALID_REASON_COLUMN), "invalid phone");
    }

    #[test]
    fn numbers_only_format_and_default_area_code() {
        let mapping = mapping();
        let settings = Settings {
            default_ddd: Some("15".into()),
            phone_format: PhoneFormat::NumbersOnly,
            ..Settings::default()
        };
        let districts = DistrictIndex::default();
        let classifier = Classifier::new(&mapping, &settings, &districts);
        let out = classifier.classify_row(&row(&[("Telefone", "98765-4321")]));
        assert_eq!(out.fields.value("phone"), "15987654321");
    }

    #[test]
    fn defaults_backfill_only_empty_fields() {
        let mapping = mapping();
        let settings = Settings {
            store_id: Some("loja-1".into()),
            default_city: Some("Sorocaba".into()),
            default_state: Some("SP".into()),
            ..Settings::default()
        };
        let districts = DistrictIndex::default();
        let classifier = Classifier::new(&mapping, &settings, &districts);
        let out = classifier.classify_row(&row(&[
            ("Telefone", "11987654321"),
            ("Endereço", "Rua A 10, Itu/SP"),
        ]));
        assert_eq!(out.fields.value("desc_city"), "Itu");
        assert_eq!(out.fields.value("short_desc_state"), "SP");
        assert_eq!(out.fields.value(STORE_ID_COLUMN), "loja-1");

        let out = classifier.classify_row(&row(&[("Telefone", "11987654321")]));
        assert_eq!(out.fields.value("desc_city"), "Sorocaba");
    }

    #[test]
    fn completeness_policy_requires_street_and_district() {
        let mapping = mapping();
        let settings = Settings {
            discard_rows_without_address: true,
            ..Settings::default()
        };
        let districts = DistrictIndex::default();
        let classifier = Classifier::new(&mapping, &settings, &districts);

        let incomplete = classifier.classify_row(&row(&[
            ("Telefone", "11987654321"),
            ("Endereço", "Rua A 10"),
        ]));
        assert_eq!(incomplete.invalid_reason, Some(InvalidReason::IncompleteAddress));

        let complete = classifier.classify_row(&row(&[
            ("Telefone", "11987654321"),
            ("Endereço", "Rua das Flores 10, casa 2, Centro"),
        ]));
        assert!(complete.is_valid());
    }

    #[test]
    fn progress_reports_every_chunk() {
        let mapping = mapping();
        let settings = Settings::default();
        let districts = DistrictIndex::default();
        let classifier = Classifier::new(&mapping, &settings, &districts);
        let rows: Vec<Record> = (0..5)
            .map(|_| row(&[("Telefone", "11987654321")]))
            .collect();
        let mut seen = Vec::new();
        let partition = classifier.classify_with_progress(&rows, 2, |p| seen.push(p.percent()));
        assert_eq!(seen, vec![40, 80, 100]);
        assert_eq!(partition.valid.len(), 5);
    }
}

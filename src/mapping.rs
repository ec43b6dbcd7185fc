//! Column mapping: which input column feeds which canonical field.
//!
//! A [`FieldMapping`] is either suggested from the input headers with
//! [`suggest_mapping`] or loaded from a YAML file the user edited:
//!
//! ```yaml
//! columns:
//!   - column: Nome do Cliente
//!     target: full_name
//!   - column: Endereço
//!     target: endereco_completo
//!   - column: Observações
//!     target: ignore
//! ```
//!
//! Construction rejects two columns feeding the same canonical field, so the
//! projection step never has to choose between competing values.

use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::{Context, Result};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    FullName,
    Phone,
    Email,
    CpfCnpj,
    BirthDate,
    CountSales,
    EnderecoCompleto,
    Address,
    AddressNumber,
    DescDistrict,
    DescCity,
    ShortDescState,
    AddressZipcode,
    AddressComplement,
    #[serde(alias = "ignorar")]
    Ignore,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 15] = [
        CanonicalField::FullName,
        CanonicalField::Phone,
        CanonicalField::Email,
        CanonicalField::CpfCnpj,
        CanonicalField::BirthDate,
        CanonicalField::CountSales,
        CanonicalField::EnderecoCompleto,
        CanonicalField::Address,
        CanonicalField::AddressNumber,
        CanonicalField::DescDistrict,
        CanonicalField::DescCity,
        CanonicalField::ShortDescState,
        CanonicalField::AddressZipcode,
        CanonicalField::AddressComplement,
        CanonicalField::Ignore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::FullName => "full_name",
            CanonicalField::Phone => "phone",
            CanonicalField::Email => "email",
            CanonicalField::CpfCnpj => "cpf_cnpj",
            CanonicalField::BirthDate => "birth_date",
            CanonicalField::CountSales => "count_sales",
            CanonicalField::EnderecoCompleto => "endereco_completo",
            CanonicalField::Address => "address",
            CanonicalField::AddressNumber => "address_number",
            CanonicalField::DescDistrict => "desc_district",
            CanonicalField::DescCity => "desc_city",
            CanonicalField::ShortDescState => "short_desc_state",
            CanonicalField::AddressZipcode => "address_zipcode",
            CanonicalField::AddressComplement => "address_complement",
            CanonicalField::Ignore => "ignore",
        }
    }

    pub fn is_ignore(self) -> bool {
        self == CanonicalField::Ignore
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = MappingError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("ignorar") {
            return Ok(CanonicalField::Ignore);
        }
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| MappingError::UnknownTarget(value.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Column '{0}' appears more than once in the mapping")]
    DuplicateColumn(String),

    #[error("Columns '{first}' and '{second}' are both mapped to '{target}'")]
    DuplicateTarget {
        target: CanonicalField,
        first: String,
        second: String,
    },

    #[error("Unknown canonical field '{0}'")]
    UnknownTarget(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub column: String,
    pub target: CanonicalField,
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingFile {
    columns: Vec<MappingEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<MappingEntry>,
}

impl FieldMapping {
    pub fn new(entries: Vec<MappingEntry>) -> std::result::Result<Self, MappingError> {
        for (idx, entry) in entries.iter().enumerate() {
            for earlier in &entries[..idx] {
                if earlier.column == entry.column {
                    return Err(MappingError::DuplicateColumn(entry.column.clone()));
                }
                if !entry.target.is_ignore() && earlier.target == entry.target {
                    return Err(MappingError::DuplicateTarget {
                        target: entry.target,
                        first: earlier.column.clone(),
                        second: entry.column.clone(),
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn from_pairs<'a, I>(pairs: I) -> std::result::Result<Self, MappingError>
    where
        I: IntoIterator<Item = (&'a str, CanonicalField)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(column, target)| MappingEntry {
                    column: column.to_string(),
                    target,
                })
                .collect(),
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading mapping file {path:?}"))?;
        let file: MappingFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing mapping file {path:?}"))?;
        Ok(Self::new(file.columns)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        let file = MappingFile {
            columns: self.entries.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Writing mapping file {path:?}"))
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn target(&self, column: &str) -> Option<CanonicalField> {
        self.entries
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.target)
    }

    pub fn column_for(&self, field: CanonicalField) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.target == field)
            .map(|entry| entry.column.as_str())
    }

    /// Column whose `;`-separated values fan out into one row per address.
    pub fn expansion_column(&self) -> Option<&str> {
        self.column_for(CanonicalField::EnderecoCompleto)
            .or_else(|| self.column_for(CanonicalField::Address))
    }

    /// Mapped columns that the input does not provide.
    pub fn missing_columns<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        self.entries
            .iter()
            .filter(|entry| !headers.iter().any(|header| *header == entry.column))
            .map(|entry| entry.column.as_str())
            .collect()
    }
}

/// Keyword rules tried in order against the accent-folded header.
const KEYWORD_RULES: &[(&[&str], CanonicalField)] = &[
    (&["nome", "name"], CanonicalField::FullName),
    (&["tel", "cel", "fone", "phone", "whats"], CanonicalField::Phone),
    (&["mail"], CanonicalField::Email),
    (&["cpf", "cnpj"], CanonicalField::CpfCnpj),
    (&["nasc", "birth"], CanonicalField::BirthDate),
    (&["pedido", "compra", "sales"], CanonicalField::CountSales),
    (&["bairro", "district"], CanonicalField::DescDistrict),
    (&["cidade", "city"], CanonicalField::DescCity),
    (&["estado", "state"], CanonicalField::ShortDescState),
    (&["cep", "zip"], CanonicalField::AddressZipcode),
    (&["complemento"], CanonicalField::AddressComplement),
    (&["numero"], CanonicalField::AddressNumber),
    (&["end", "address", "logradouro"], CanonicalField::EnderecoCompleto),
];

/// Guesses a mapping for `headers`. Each canonical field is claimed at most once;
/// later headers that would repeat a claim fall back to `ignore`.
pub fn suggest_mapping(headers: &[String]) -> FieldMapping {
    let mut entries: Vec<MappingEntry> = Vec::with_capacity(headers.len());
    for header in headers {
        if entries.iter().any(|entry| entry.column == *header) {
            continue;
        }
        let target = guess_target(header)
            .filter(|target| !entries.iter().any(|entry| entry.target == *target))
            .unwrap_or(CanonicalField::Ignore);
        entries.push(MappingEntry {
            column: header.clone(),
            target,
        });
    }
    FieldMapping { entries }
}

fn guess_target(header: &str) -> Option<CanonicalField> {
    let folded = normalize(header);
    let snake = folded.to_snake_case();
    if let Some(exact) = CanonicalField::ALL
        .into_iter()
        .filter(|field| !field.is_ignore())
        .find(|field| field.as_str() == snake)
    {
        return Some(exact);
    }
    if snake == "uf" || snake.split('_').any(|word| word == "uf") {
        return Some(CanonicalField::ShortDescState);
    }
    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| folded.contains(keyword)))
        .map(|(_, field)| *field)
}

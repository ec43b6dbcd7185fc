//! Run settings: defaults for missing fields and the validity policy.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags. Empty strings count as unset.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{divisions, phone::PhoneFormat};

pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Default area code '{0}' must be exactly two digits")]
    InvalidAreaCode(String),

    #[error("Default state '{0}' is not a Brazilian state code")]
    UnknownState(String),

    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Store identifier written to every output row as `id_store`.
    #[serde(alias = "idStore")]
    pub store_id: Option<String>,
    #[serde(alias = "defaultCity")]
    pub default_city: Option<String>,
    #[serde(alias = "defaultState")]
    pub default_state: Option<String>,
    #[serde(alias = "defaultDDD")]
    pub default_ddd: Option<String>,
    #[serde(alias = "phoneFormat")]
    pub phone_format: PhoneFormat,
    #[serde(alias = "discardRowsWithoutAddress")]
    pub discard_rows_without_address: bool,
    #[serde(alias = "chunkSize")]
    pub chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_id: None,
            default_city: None,
            default_state: None,
            default_ddd: None,
            phone_format: PhoneFormat::default(),
            discard_rows_without_address: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading settings file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing settings file {path:?}"))
    }

    pub fn store_id(&self) -> &str {
        non_empty(&self.store_id)
    }

    pub fn default_city(&self) -> &str {
        non_empty(&self.default_city)
    }

    pub fn default_state(&self) -> &str {
        non_empty(&self.default_state)
    }

    pub fn default_ddd(&self) -> &str {
        non_empty(&self.default_ddd)
    }

    /// Checks the settings and canonicalizes the state code to upper case.
    pub fn validated(mut self) -> std::result::Result<Self, SettingsError> {
        let ddd = self.default_ddd().to_string();
        if !ddd.is_empty() && !(ddd.len() == 2 && ddd.chars().all(|ch| ch.is_ascii_digit())) {
            return Err(SettingsError::InvalidAreaCode(ddd));
        }
        let state = self.default_state().to_string();
        if !state.is_empty() {
            let known = divisions::state_by_code(&state)
                .ok_or_else(|| SettingsError::UnknownState(state.clone()))?;
            self.default_state = Some(known.code.to_string());
        }
        if self.chunk_size == 0 {
            return Err(SettingsError::ZeroChunkSize);
        }
        Ok(self)
    }
}

fn non_empty(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

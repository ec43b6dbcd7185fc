//! Brazilian phone number normalization.
//!
//! [`normalize_phone`] never fails: a number that cannot be brought to ten or
//! eleven digits comes back as its bare digit string, which callers detect with
//! [`is_normalized`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

const COUNTRY_CODE: &str = "55";

/// Output representation for a successfully normalized phone number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "snake_case")]
pub enum PhoneFormat {
    /// `(11) 98765-4321`
    #[default]
    Formatted,
    /// `11987654321`
    #[serde(alias = "numbers-only")]
    NumbersOnly,
}

impl PhoneFormat {
    pub fn render(self, normalized: &str) -> String {
        match self {
            PhoneFormat::Formatted => normalized.to_string(),
            PhoneFormat::NumbersOnly => digits(normalized),
        }
    }
}

pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn normalize_phone(raw: &str, default_area_code: &str) -> String {
    let mut number = digits(raw);

    if number.starts_with(COUNTRY_CODE) && matches!(number.len(), 12 | 13) {
        number = number[COUNTRY_CODE.len()..].to_string();
    }

    let area_code = digits(default_area_code);
    if !area_code.is_empty() && matches!(number.len(), 8 | 9) {
        number.insert_str(0, &area_code);
    }

    match number.len() {
        11 => format!("({}) {}-{}", &number[..2], &number[2..7], &number[7..]),
        10 => format!("({}) {}-{}", &number[..2], &number[2..6], &number[6..]),
        _ => number,
    }
}

/// True when `normalize_phone` output carries a full area code and subscriber number.
pub fn is_normalized(output: &str) -> bool {
    matches!(digits(output).len(), 10 | 11)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_country_code() {
        assert_eq!(normalize_phone("5511987654321", ""), "(11) 98765-4321");
        assert_eq!(normalize_phone("+55 (11) 3456-7890", ""), "(11) 3456-7890");
    }

    #[test]
    fn prepends_default_area_code_to_local_numbers() {
        assert_eq!(normalize_phone("87654321", "11"), "(11) 8765-4321");
        assert_eq!(normalize_phone("9 8765-4321", "15"), "(15) 98765-4321");
        assert_eq!(normalize_phone("87654321", ""), "87654321");
    }

    #[test]
    fn area_code_contributes_only_its_digits() {
        assert_eq!(normalize_phone("87654321", "(15)"), "(15) 8765-4321");
        assert_eq!(normalize_phone("87654321", "1é"), "187654321");
        assert_eq!(normalize_phone("987654321", "é"), "987654321");
    }

    #[test]
    fn leaves_unnormalizable_numbers_as_digits() {
        let output = normalize_phone("123", "");
        assert_eq!(output, "123");
        assert!(!is_normalized(&output));
        assert_eq!(normalize_phone("", "11"), "");
        assert_eq!(normalize_phone("no phone", ""), "");
    }

    #[test]
    fn country_code_only_dropped_for_full_length_numbers() {
        // 11 digits starting with 55 is an area code, not a country prefix.
        assert_eq!(normalize_phone("55987654321", ""), "(55) 98765-4321");
    }

    #[test]
    fn numbers_only_format_drops_punctuation() {
        let normalized = normalize_phone("(11) 98765-4321", "");
        assert_eq!(PhoneFormat::NumbersOnly.render(&normalized), "11987654321");
        assert_eq!(PhoneFormat::Formatted.render(&normalized), "(11) 98765-4321");
    }
}

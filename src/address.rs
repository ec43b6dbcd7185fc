//! Heuristic decomposition of free-text Brazilian addresses.
//!
//! Parsing runs as a fixed sequence of pure stages over an [`AddressDraft`]
//! (the text still unclaimed plus the fields extracted so far). Each stage
//! consumes the draft and returns a new one, so text claimed by an earlier
//! stage is never seen by a later one:
//!
//! 1. [`strip_noise`] drops delivery-instruction boilerplate.
//! 2. [`extract_postal_code`] claims the first 8-digit CEP (`18000-000` or `18000000`).
//! 3. [`extract_city_state`] claims a trailing `, City - UF` / `City/UF` suffix.
//! 4. [`split_on_number`] splits street from the first isolated house number.
//! 5. [`classify_residual`] files what follows the number as complement and/or district.
//!
//! There is no backtracking. Addresses that do not follow the
//! "street, number, locality" convention can be mis-split; the parser trades
//! that for predictability and speed.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)-\s*entrega sem contato.*",
        r"(?i)deixar o pedido.*",
        r"(?i)entrega em m[ãa]os.*",
        r"(?i)\(instru[çc][ãa]o de entrega:.*\)",
        r"(?i)-\s*no-contact delivery.*",
        r"(?i)leave the order.*",
        r"(?i)hand delivery.*",
        r"(?i)\(delivery instruction:.*\)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("noise pattern is a valid regex"))
    .collect()
});

static RE_POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{5}-?[0-9]{3})\b").expect("postal code pattern is a valid regex")
});

static RE_CITY_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        [,\s-] \s*
        ( [a-zÀ-ú\s.]+? )   # city
        \s* [-/,] \s*
        ( [a-z]{2} )        # state
        \s* $
        ",
    )
    .expect("city/state pattern is a valid regex")
});

static RE_ISOLATED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s([0-9]+)(?:[\s,]|$)").expect("house number pattern is a valid regex")
});

const DISTRICT_KEYWORDS: &[&str] = &["bairro", "jd", "jardim", "vila"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAddress {
    pub address: String,
    pub address_number: String,
    pub desc_district: String,
    pub desc_city: String,
    pub short_desc_state: String,
    pub address_zipcode: String,
    pub address_complement: String,
}

impl ParsedAddress {
    /// The seven derived attributes keyed by their canonical column names.
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("address", self.address.as_str()),
            ("address_number", self.address_number.as_str()),
            ("desc_district", self.desc_district.as_str()),
            ("desc_city", self.desc_city.as_str()),
            ("short_desc_state", self.short_desc_state.as_str()),
            ("address_zipcode", self.address_zipcode.as_str()),
            ("address_complement", self.address_complement.as_str()),
        ]
    }
}

/// Intermediate parser state: unclaimed text and the fields extracted so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDraft {
    pub remaining: String,
    pub parsed: ParsedAddress,
}

impl AddressDraft {
    pub fn new(text: &str) -> Self {
        Self {
            remaining: text.to_string(),
            parsed: ParsedAddress::default(),
        }
    }
}

pub type Stage = fn(AddressDraft) -> AddressDraft;

pub const STAGES: [Stage; 5] = [
    strip_noise,
    extract_postal_code,
    extract_city_state,
    split_on_number,
    classify_residual,
];

pub fn parse_address(full_address: &str) -> ParsedAddress {
    if full_address.trim().is_empty() {
        return ParsedAddress::default();
    }
    STAGES
        .iter()
        .fold(AddressDraft::new(full_address), |draft, stage| stage(draft))
        .parsed
}

pub fn strip_noise(draft: AddressDraft) -> AddressDraft {
    let remaining = NOISE_PATTERNS
        .iter()
        .fold(draft.remaining, |text, pattern| {
            pattern.replace_all(&text, "").into_owned()
        })
        .trim()
        .to_string();
    AddressDraft { remaining, ..draft }
}

pub fn extract_postal_code(draft: AddressDraft) -> AddressDraft {
    let Some(found) = RE_POSTAL_CODE.captures(&draft.remaining) else {
        return draft;
    };
    let whole = found.get(0).map(|m| m.range()).unwrap_or_default();
    let code = found[1].replace('-', "");

    let mut remaining = String::with_capacity(draft.remaining.len());
    remaining.push_str(&draft.remaining[..whole.start]);
    remaining.push_str(&draft.remaining[whole.end..]);

    AddressDraft {
        remaining: trim_separators(&remaining).to_string(),
        parsed: ParsedAddress {
            address_zipcode: code,
            ..draft.parsed
        },
    }
}

pub fn extract_city_state(draft: AddressDraft) -> AddressDraft {
    let Some(found) = RE_CITY_STATE.captures(&draft.remaining) else {
        return draft;
    };
    let start = found.get(0).map(|m| m.start()).unwrap_or_default();
    let city = found[1].trim().to_string();
    let state = found[2].to_uppercase();

    AddressDraft {
        remaining: trim_separators(&draft.remaining[..start]).to_string(),
        parsed: ParsedAddress {
            desc_city: city,
            short_desc_state: state,
            ..draft.parsed
        },
    }
}

pub fn split_on_number(draft: AddressDraft) -> AddressDraft {
    let Some(found) = RE_ISOLATED_NUMBER.captures(&draft.remaining) else {
        // No house number: everything left is the street.
        return AddressDraft {
            remaining: String::new(),
            parsed: ParsedAddress {
                address: draft.remaining.trim().to_string(),
                ..draft.parsed
            },
        };
    };
    let whole = found.get(0).map(|m| m.range()).unwrap_or_default();
    let street = draft.remaining[..whole.start]
        .trim()
        .trim_end_matches(',')
        .trim_end()
        .to_string();
    let number = found[1].to_string();
    let rest = trim_separators(&draft.remaining[whole.end..]).to_string();

    AddressDraft {
        remaining: rest,
        parsed: ParsedAddress {
            address: street,
            address_number: number,
            ..draft.parsed
        },
    }
}

pub fn classify_residual(draft: AddressDraft) -> AddressDraft {
    let rest = draft.remaining.trim();
    if rest.is_empty() {
        return AddressDraft {
            remaining: String::new(),
            ..draft
        };
    }

    let mut parsed = draft.parsed;
    if let Some((complement, district)) = rest.split_once(',') {
        parsed.address_complement = complement.trim().to_string();
        parsed.desc_district = district
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .join(", ");
    } else {
        let lowered = rest.to_lowercase();
        if DISTRICT_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            parsed.desc_district = rest.to_string();
        } else {
            parsed.address_complement = rest.to_string();
        }
    }

    AddressDraft {
        remaining: String::new(),
        parsed,
    }
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|ch: char| ch.is_whitespace() || matches!(ch, ',' | ';' | '-'))
}

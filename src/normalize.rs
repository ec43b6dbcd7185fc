use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Folds text for comparison: lowercase, accents stripped, surrounding whitespace trimmed.
///
/// `normalize("  São Paulo ")` and `normalize("SAO PAULO")` both yield `"sao paulo"`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let folded: String = lowered.nfd().filter(|ch| !is_combining_mark(*ch)).collect();
    folded.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_accents() {
        assert_eq!(normalize("São Paulo"), "sao paulo");
        assert_eq!(normalize("sao paulo"), "sao paulo");
        assert_eq!(normalize("  JARDIM AMÉRICA\t"), "jardim america");
        assert_eq!(normalize("Conceição"), "conceicao");
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn is_idempotent_on_accented_text() {
        for sample in ["Ribeirão Preto", "  Itaú ", "ÁGUA BRANCA", "a \u{301}"] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }
}

//! Locale code helpers.
//!
//! Locale codes are stored exactly as callers hand them in. Comparisons go
//! through [`to_language`] so that `en_US`, `en-US` and `en-us` name the same
//! locale. No code is checked against a list of known locales.

/// Normalize a locale code for comparison: lowercase, `_` replaced by `-`.
///
/// # Example
/// ```
/// use translation_store::locale::to_language;
///
/// assert_eq!(to_language("en_US"), "en-us");
/// assert_eq!(to_language("pt-BR"), "pt-br");
/// ```
pub fn to_language(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}

/// True when both codes name the same locale after normalization.
pub fn same_locale(a: &str, b: &str) -> bool {
    to_language(a) == to_language(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_language_lowercases() {
        assert_eq!(to_language("EN-US"), "en-us");
    }

    #[test]
    fn test_to_language_underscore() {
        assert_eq!(to_language("zh_TW"), "zh-tw");
    }

    #[test]
    fn test_to_language_plain_code_unchanged() {
        assert_eq!(to_language("de"), "de");
    }

    #[test]
    fn test_same_locale_variants() {
        assert!(same_locale("en-US", "en_us"));
        assert!(same_locale("fr", "FR"));
        assert!(!same_locale("en-US", "en-GB"));
        assert!(!same_locale("en", "en-US"));
    }
}

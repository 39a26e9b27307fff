//! Name-level rules: junk detection and canonical casing

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::tag::normalize_name;

/// Why a tag name was judged junk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunkReason {
    /// Normalized name is in the blocklist
    Blocklist,
    /// Two characters or fewer and not an upper-case acronym
    TooShort,
    /// No letter or digit at all
    NoAlphanumeric,
    /// Only digits
    AllDigits,
}

impl JunkReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocklist => "blocklist",
            Self::TooShort => "too_short",
            Self::NoAlphanumeric => "no_alphanumeric",
            Self::AllDigits => "all_digits",
        }
    }
}

impl std::fmt::Display for JunkReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply the junk rules in order; the first rule that fires wins.
///
/// Protected acronyms skip the length rule only. The blocklist still applies
/// to them.
pub fn junk_reason(name: &str, config: &Config) -> Option<JunkReason> {
    let trimmed = name.trim();
    let normalized = normalize_name(trimmed);

    if config.is_blocklisted(&normalized) {
        return Some(JunkReason::Blocklist);
    }

    if !config.is_protected_acronym(&normalized)
        && trimmed.chars().count() <= 2
        && !is_uppercase_acronym(trimmed)
    {
        return Some(JunkReason::TooShort);
    }

    if !trimmed.chars().any(char::is_alphanumeric) {
        return Some(JunkReason::NoAlphanumeric);
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(JunkReason::AllDigits);
    }

    None
}

/// At least two characters, at least one letter, and every letter upper-case.
fn is_uppercase_acronym(name: &str) -> bool {
    name.chars().count() >= 2
        && name.chars().any(char::is_alphabetic)
        && name.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase)
}

/// Canonical casing for a name: Title Case per word, protected acronyms
/// upper-case.
///
/// A pure function of the name, independent of usage, so repeated runs
/// always converge on the same target.
pub fn canonical_form(name: &str, config: &Config) -> String {
    let trimmed = name.trim();
    let normalized = normalize_name(trimmed);
    if config.is_protected_acronym(&normalized) {
        return trimmed.to_uppercase();
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut word = String::new();
    for c in trimmed.chars() {
        if c.is_alphanumeric() || c == '\'' {
            word.push(c);
        } else {
            push_word(&mut out, &word, config);
            word.clear();
            out.push(c);
        }
    }
    push_word(&mut out, &word, config);
    out
}

fn push_word(out: &mut String, word: &str, config: &Config) {
    if word.is_empty() {
        return;
    }
    let lower = word.to_lowercase();
    if config.is_protected_acronym(&lower) {
        out.push_str(&word.to_uppercase());
        return;
    }
    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn single_letter_is_junk() {
        let config = config().with_blocklist(Vec::<String>::new());
        assert_eq!(junk_reason("a", &config), Some(JunkReason::TooShort));
        assert_eq!(junk_reason("X", &config), Some(JunkReason::TooShort));
    }

    #[test]
    fn blocklist_takes_priority() {
        assert_eq!(junk_reason("a", &config()), Some(JunkReason::Blocklist));
        assert_eq!(junk_reason("  Stuff ", &config()), Some(JunkReason::Blocklist));
    }

    #[test]
    fn digits_and_symbols_are_junk() {
        assert_eq!(junk_reason("123", &config()), Some(JunkReason::AllDigits));
        assert_eq!(junk_reason("42", &config()), Some(JunkReason::TooShort));
        assert_eq!(junk_reason("---", &config()), Some(JunkReason::NoAlphanumeric));
        assert_eq!(junk_reason("", &config()), Some(JunkReason::TooShort));
    }

    #[test]
    fn short_uppercase_acronym_survives() {
        let config = config().with_protected_acronyms(Vec::<String>::new());
        assert_eq!(junk_reason("ML", &config), None);
        assert_eq!(junk_reason("ml", &config), Some(JunkReason::TooShort));
    }

    #[test]
    fn protected_acronym_exempt_from_length_rule() {
        assert_eq!(junk_reason("ml", &config()), None);
        assert_eq!(junk_reason("ai", &config()), None);
        assert_eq!(junk_reason("Ui", &config()), None);
    }

    #[test]
    fn ordinary_names_are_not_junk() {
        assert_eq!(junk_reason("Rust", &config()), None);
        assert_eq!(junk_reason("3d printing", &config()), None);
        assert_eq!(junk_reason("c++", &config()), None);
    }

    #[test]
    fn canonical_form_title_cases_words() {
        assert_eq!(canonical_form("machine learning", &config()), "Machine Learning");
        assert_eq!(canonical_form("MUSIC", &config()), "Music");
        assert_eq!(canonical_form("e-commerce", &config()), "E-Commerce");
        assert_eq!(canonical_form("  jazz  ", &config()), "Jazz");
    }

    #[test]
    fn canonical_form_uppercases_acronyms() {
        assert_eq!(canonical_form("api", &config()), "API");
        assert_eq!(canonical_form("Aws lambda", &config()), "AWS Lambda");
        assert_eq!(canonical_form("rest api design", &config()), "REST API Design");
    }

    #[test]
    fn canonical_form_is_idempotent() {
        for name in ["machine learning", "AI tools", "don't panic", "web3", "Node.js"] {
            let once = canonical_form(name, &config());
            assert_eq!(canonical_form(&once, &config()), once, "for {:?}", name);
        }
    }
}

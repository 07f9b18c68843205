//! Biblical citation heuristic.
//!
//! A loose shape test, not a citation grammar: short, single-line, a handful
//! of tokens, with both letters and digits ("Rz 8, 31-39", "Łk 1, 26-38").

use lekcjonarz_shared::SiglaRules;

/// Whether `text` looks like a citation under the default thresholds.
pub fn is_sigla(text: &str) -> bool {
    matches_sigla(text, &SiglaRules::default())
}

/// Whether `text` looks like a citation under the given thresholds.
pub fn matches_sigla(text: &str, rules: &SiglaRules) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.contains('\n') {
        return false;
    }
    if trimmed.chars().count() > rules.max_chars {
        return false;
    }
    if trimmed.split_whitespace().count() > rules.max_tokens {
        return false;
    }

    let has_digit = trimmed.chars().any(|c| c.is_ascii_digit());
    let has_letter = trimmed.chars().any(char::is_alphabetic);
    has_digit && has_letter
}

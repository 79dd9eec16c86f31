//! Text normalization: the single source of truth for matching.
//!
//! Every join between user vocabulary (symptoms, goals, conditions) and
//! catalogue vocabulary (indications, agents, populations) goes through
//! [`normalize_token`]. Both functions are pure and total: malformed or
//! empty input yields an empty string, never an error.

use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Words carrying no matching signal, dropped before picking the token.
/// French articles/connectives plus their English counterparts; single
/// letters cover elided forms ("l'appetit" folds to "l appetit").
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "au", "aux", "d", "de", "des", "du", "en", "et", "for", "in", "l", "la",
    "le", "les", "ma", "mes", "mon", "my", "of", "on", "pour", "sur", "the", "to", "un", "une",
];

/// Lowercase, strip accents, collapse non-alphanumeric runs to single
/// spaces, trim. Keeps every word: used for goal-alias keys.
pub fn fold_text(input: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    for ch in input.to_lowercase().chars() {
        fold_char(ch, &mut folded);
    }
    NON_ALNUM.replace_all(&folded, " ").trim().to_string()
}

/// The matching token of a label: [`fold_text`] minus stopwords, first
/// remaining word. Empty input (or stopwords only) yields an empty token.
pub fn normalize_token(input: &str) -> String {
    fold_text(input)
        .split(' ')
        .find(|word| !word.is_empty() && !STOPWORDS.contains(word))
        .unwrap_or_default()
        .to_string()
}

/// Accent fold for the French/Latin range the catalogue uses.
fn fold_char(ch: char, out: &mut String) {
    let replacement = match ch {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => "a",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'î' | 'ï' | 'í' | 'ì' => "i",
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => "o",
        'ù' | 'û' | 'ü' | 'ú' => "u",
        'ÿ' | 'ý' => "y",
        'ç' => "c",
        'ñ' => "n",
        'œ' => "oe",
        'æ' => "ae",
        _ => {
            out.push(ch);
            return;
        }
    };
    out.push_str(replacement);
}

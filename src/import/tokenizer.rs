//! Text-chunk tokenizer for the XML importer.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Word tokens keep inner apostrophes ("dog's") and absorb trailing
/// whitespace; punctuation runs form their own tokens, also absorbing
/// trailing whitespace. Leading whitespace with no preceding token in the
/// same chunk is dropped.
fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w']+\s*|[^\w\s]+\s*").expect("token regex is valid"))
}

/// Split a text chunk into token strings.
///
/// Chunk boundaries always coincide with markup boundaries, so tokens never
/// span chunks.
pub fn tokenize(text: &str) -> Vec<String> {
    token_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

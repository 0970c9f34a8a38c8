//! Token normalization for cross-witness comparison.
//!
//! ## Purpose
//!
//! Two tokens from different witnesses are content-equal when their
//! **normalized** forms are equal. The normalized form is computed once at
//! token construction and never recomputed, so this module is the single
//! definition of what "the same word" means across witnesses.
//!
//! ## Normalization Specification
//!
//! ```text
//! normalize(raw) = trim(collapse_whitespace(casefold(raw)))
//! ```
//!
//! Where:
//! - `casefold`: Unicode lowercasing
//! - `collapse_whitespace`: every run of whitespace becomes a single space
//! - `trim`: remove leading and trailing whitespace
//!
//! A milestone token (empty raw content) normalizes to the empty string and
//! is never content-matched; it is matched structurally by its parent tag.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Version of the normalization specification.
///
/// Increment when the normalization algorithm changes. A change here shifts
/// which tokens are considered equal, and therefore every downstream match
/// set and collation fingerprint.
pub const NORMALIZATION_VERSION: &str = "1.0.0";

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"))
}

/// Normalize raw token content to its comparison form.
///
/// Deterministic: same input, same output.
///
/// # Example
///
/// ```rust
/// use collation_kernel::normalize::normalize_token;
///
/// assert_eq!(normalize_token("The  \tDog's "), "the dog's");
/// assert_eq!(normalize_token(""), "");
/// ```
pub fn normalize_token(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let collapsed = whitespace_run().replace_all(&lowered, " ");
    collapsed.trim().to_string()
}

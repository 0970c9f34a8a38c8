//! Witness sigils.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short human-readable witness identifier (e.g. `"A"`, `"F"`).
///
/// Wraps a string and implements `Ord` so that every per-sigil map and
/// sigil-set label in the kernel iterates in a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sigil(String);

impl Sigil {
    /// Create a new sigil.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the sigil as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sigil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Sigil {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Sigil {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigil_ordering() {
        let a = Sigil::from("A");
        let f = Sigil::from("F");
        assert!(a < f);
    }

    #[test]
    fn test_display() {
        assert_eq!(Sigil::from("Q").to_string(), "Q");
    }
}

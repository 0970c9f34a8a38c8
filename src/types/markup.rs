//! Markup spans recorded during import.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dense markup span identifier within one witness graph's registry.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkupId(u32);

impl MarkupId {
    /// Create a `MarkupId` from a raw registry index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw registry index.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MarkupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// One markup span: the element tag plus its attributes.
///
/// Attributes use a `BTreeMap` so spans serialize and hash deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markup {
    /// Element tag name.
    pub tag: String,
    /// Element attributes in key order.
    pub attributes: BTreeMap<String, String>,
}

impl Markup {
    /// Create a markup span with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Create a markup span with attributes.
    pub fn with_attributes(tag: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            tag: tag.into(),
            attributes,
        }
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (k, v) in &self.attributes {
            write!(f, " {}={:?}", k, v)?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let m = Markup::with_attributes(
            "add",
            BTreeMap::from([("place".to_string(), "above".to_string())]),
        );
        assert_eq!(m.to_string(), "<add place=\"above\">");
    }
}

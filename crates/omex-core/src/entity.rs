//! Entity identifiers and CURIE prefix handling
//!
//! Entities are identified by IRI-like strings. A given IRI denotes the
//! same logical entity everywhere in a graph; identifiers are immutable
//! and cheap to clone.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// IRI
// ============================================================================

/// A globally unique entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    /// Create a new IRI from any string-like value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The full identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the IRI, returning the underlying string
    pub fn into_string(self) -> String {
        self.0
    }

    /// The namespace portion: everything up to and including the last
    /// `#` or `/` separator. Empty if the IRI has no separator.
    pub fn namespace(&self) -> &str {
        match self.0.rfind(|c| c == '#' || c == '/') {
            Some(idx) => &self.0[..=idx],
            None => "",
        }
    }

    /// The local name: everything after the last `#` or `/` separator,
    /// or the whole identifier if there is none.
    pub fn local_name(&self) -> &str {
        match self.0.rfind(|c| c == '#' || c == '/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Entity Kinds
// ============================================================================

/// The kind of a named entity in a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    ObjectProperty,
    DataProperty,
    AnnotationProperty,
    Individual,
}

impl EntityKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::ObjectProperty => "object_property",
            Self::DataProperty => "data_property",
            Self::AnnotationProperty => "annotation_property",
            Self::Individual => "individual",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Prefix Table
// ============================================================================

/// Pattern for short-code (CURIE) tokens such as `GO:0005634`
static CURIE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9._-]*:[A-Za-z0-9._-]+$").expect("valid regex"));

/// Pattern for absolute IRI tokens such as `http://example.com/x`
static IRI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://\S+$").expect("valid regex"));

/// Immutable CURIE prefix expansion table.
///
/// Built explicitly and passed into the term resolver; never ambient
/// state, so batch jobs cannot couple through it.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    prefixes: HashMap<String, String>,
}

impl PrefixTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the well-known default prefixes
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.insert("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        table.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        table.insert("owl", "http://www.w3.org/2002/07/owl#");
        table.insert("xsd", "http://www.w3.org/2001/XMLSchema#");
        table
    }

    /// Register a prefix expansion
    pub fn insert(&mut self, prefix: impl Into<String>, expansion: impl Into<String>) {
        self.prefixes.insert(prefix.into(), expansion.into());
    }

    /// Number of registered prefixes
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Whether the table has no registered prefixes
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Expand a short-code token to a full IRI.
    ///
    /// A registered prefix wins; any other well-formed `PREFIX:LOCAL`
    /// token falls back to the OBO Foundry convention
    /// `http://purl.obolibrary.org/obo/PREFIX_LOCAL`. Tokens that are
    /// not CURIE-shaped (including absolute IRIs) expand to nothing.
    pub fn expand(&self, token: &str) -> Option<Iri> {
        if is_absolute_iri(token) || !CURIE_PATTERN.is_match(token) {
            return None;
        }

        let (prefix, local) = token.split_once(':')?;
        if let Some(expansion) = self.prefixes.get(prefix) {
            return Some(Iri::new(format!("{expansion}{local}")));
        }

        Some(Iri::new(format!("{}{}_{}", crate::vocab::OBO_BASE, prefix, local)))
    }
}

/// Check whether a token is an absolute IRI (optionally `<>`-wrapped)
pub fn is_absolute_iri(token: &str) -> bool {
    let token = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')).unwrap_or(token);
    IRI_PATTERN.is_match(token)
}

/// Strip optional `<>` wrapping from an IRI token
pub fn unwrap_iri_token(token: &str) -> &str {
    token.strip_prefix('<').and_then(|t| t.strip_suffix('>')).unwrap_or(token)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iri_namespace_split() {
        let iri = Iri::new("http://purl.obolibrary.org/obo/GO_0005634");
        assert_eq!(iri.namespace(), "http://purl.obolibrary.org/obo/");
        assert_eq!(iri.local_name(), "GO_0005634");

        let hash = Iri::new("http://www.w3.org/2000/01/rdf-schema#label");
        assert_eq!(hash.local_name(), "label");

        let bare = Iri::new("nucleus");
        assert_eq!(bare.namespace(), "");
        assert_eq!(bare.local_name(), "nucleus");
    }

    #[test]
    fn test_prefix_expansion() {
        let table = PrefixTable::with_defaults();
        assert_eq!(
            table.expand("rdfs:label").unwrap().as_str(),
            "http://www.w3.org/2000/01/rdf-schema#label"
        );
    }

    #[test]
    fn test_obo_fallback_expansion() {
        let table = PrefixTable::with_defaults();
        assert_eq!(
            table.expand("GO:0005634").unwrap().as_str(),
            "http://purl.obolibrary.org/obo/GO_0005634"
        );
    }

    #[test]
    fn test_expand_rejects_non_curies() {
        let table = PrefixTable::with_defaults();
        assert!(table.expand("http://example.com/x").is_none());
        assert!(table.expand("nucleus").is_none());
        assert!(table.expand("has space:x").is_none());
    }

    #[test]
    fn test_absolute_iri_detection() {
        assert!(is_absolute_iri("http://example.com/x"));
        assert!(is_absolute_iri("<http://example.com/x>"));
        assert!(!is_absolute_iri("GO:0005634"));
        assert!(!is_absolute_iri("nucleus"));
    }
}

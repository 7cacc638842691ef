//! Omex Core - Ontology data model, errors, and collaborator traits
//!
//! This crate defines the shared abstractions of the omex extraction
//! toolkit:
//! - Entity identifiers, kinds, and CURIE prefix tables
//! - Axioms and graphs (immutable facts; graphs are axiom sets)
//! - Extraction strategies and per-job policies
//! - The error taxonomy surfaced to callers
//! - Trait seams for graph IO and module computation

pub mod axiom;
pub mod entity;
pub mod graph;
pub mod policy;

pub use axiom::{AnnotationValue, Axiom, ClassExpression};
pub use entity::{is_absolute_iri, unwrap_iri_token, EntityKind, Iri, PrefixTable};
pub use graph::{AxiomView, Graph};
pub use policy::{ImportsPolicy, IndividualsPolicy, IntermediatesPolicy, ModuleStrategy};

use std::collections::BTreeSet;

use thiserror::Error;

// ============================================================================
// Vocabulary
// ============================================================================

/// Well-known annotation property IRIs and namespaces
pub mod vocab {
    /// `rdfs:label`
    pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

    /// `rdfs:isDefinedBy`, the source-provenance property
    pub const RDFS_IS_DEFINED_BY: &str = "http://www.w3.org/2000/01/rdf-schema#isDefinedBy";

    /// OBO Foundry base namespace used for short-code fallback expansion
    pub const OBO_BASE: &str = "http://purl.obolibrary.org/obo/";
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by the extraction toolkit.
///
/// Every variant carries enough context (offending token, line, job) to
/// locate the cause; only `EmptyTerms` has a documented override (the
/// force flag).
#[derive(Error, Debug)]
pub enum OmexError {
    /// A term token matched no entity
    #[error("unresolved term: '{0}'")]
    UnresolvedTerm(String),

    /// A label matched more than one entity
    #[error("ambiguous label '{label}' matches {count} entities")]
    AmbiguousTerm { label: String, count: usize },

    /// No seed term exists in the source vocabulary
    #[error("none of the input terms exist in the source ontology (use force to override)")]
    EmptyTerms,

    /// MIREOT invoked without lower or branch-from terms
    #[error("MIREOT extraction requires lower or branch-from terms")]
    MissingLowerTerm,

    /// Upper terms given without a traversal start
    #[error("upper terms require lower or branch-from terms")]
    MissingUpperDependent,

    /// Unrecognized module strategy token
    #[error("invalid module strategy: '{0}' (expected star, top, bot, or mireot)")]
    InvalidModuleStrategy(String),

    /// Options combined in an unsupported way
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Unrecognized individuals policy token
    #[error("invalid individuals policy: '{0}' (expected include, minimal, definitions, or exclude)")]
    InvalidIndividualsPolicy(String),

    /// Unrecognized imports policy token
    #[error("invalid imports policy: '{0}' (expected include or exclude)")]
    InvalidImportsPolicy(String),

    /// Unrecognized intermediates policy token
    #[error("invalid intermediates policy: '{0}' (expected all, minimal, or none)")]
    InvalidIntermediatesPolicy(String),

    /// A graph could not be loaded
    #[error("failed to load '{spec}': {message}")]
    Load { spec: String, message: String },

    /// A graph could not be saved
    #[error("failed to save '{spec}': {message}")]
    Save { spec: String, message: String },

    /// An error located at a line of an input document
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<OmexError>,
    },

    /// An error wrapped with the batch job it occurred in
    #[error("job '{id}': {source}")]
    Job {
        id: String,
        #[source]
        source: Box<OmexError>,
    },
}

impl OmexError {
    /// Wrap this error with the input line it was caused by
    pub fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// Wrap this error with the batch job it belongs to
    pub fn in_job(self, id: impl Into<String>) -> Self {
        Self::Job {
            id: id.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, OmexError>;

// ============================================================================
// Signatures
// ============================================================================

/// A set of entity identifiers: the seed of an extraction, or the
/// vocabulary of its result.
pub type Signature = BTreeSet<Iri>;

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Loads a graph from a source specification (path or IRI)
pub trait GraphLoader {
    /// Load and fully materialize a graph, including its import closure
    fn load(&self, spec: &str) -> Result<Graph>;
}

/// Writes a graph to a destination specification
pub trait GraphWriter {
    /// Persist a graph; fails on unsupported output formats
    fn save(&self, graph: &Graph, spec: &str) -> Result<()>;
}

/// Computes a logic-preserving module for a seed signature.
///
/// Implementations guarantee that the result's entailments over the
/// seed signature (plus entities syntactically required to interconnect
/// it) match those of the full axiom set, per the chosen strategy.
/// Deterministic for a given (axioms, seed, strategy) triple.
pub trait ModuleProvider {
    fn compute_module(
        &self,
        view: &AxiomView<'_>,
        seed: &Signature,
        strategy: ModuleStrategy,
    ) -> Result<Graph>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_wrapping() {
        let err = OmexError::UnresolvedTerm("'nucleus'".to_string())
            .at_line(7)
            .in_job("imports/go.json");

        let message = err.to_string();
        assert!(message.contains("job 'imports/go.json'"));
        assert!(message.contains("line 7"));
    }

    #[test]
    fn test_empty_terms_mentions_force() {
        assert!(OmexError::EmptyTerms.to_string().contains("force"));
    }
}

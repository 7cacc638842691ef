//! Annotation Augmenter
//!
//! Stamps extracted terms with source provenance and applies
//! configured annotation copy/map/replace directives against the
//! source graph. Stamping is idempotent: terms already carrying an
//! `rdfs:isDefinedBy` annotation are left untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use omex_core::{
    is_absolute_iri, unwrap_iri_token, AnnotationValue, Axiom, AxiomView, Graph, Iri, OmexError,
    PrefixTable, Result, Signature, vocab,
};

// ============================================================================
// Source Map
// ============================================================================

/// Mapping from entity identifier to a source-ontology identifier,
/// used when stamping provenance. Entities without an entry fall back
/// to a base-namespace derivation.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    sources: HashMap<Iri, Iri>,
}

impl SourceMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping
    pub fn insert(&mut self, entity: Iri, source: Iri) {
        self.sources.insert(entity, source);
    }

    /// The mapped source for an entity, if any
    pub fn get(&self, entity: &Iri) -> Option<&Iri> {
        self.sources.get(entity)
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Parse a source-map document: tab-separated `term<TAB>source`
    /// lines, blank lines and `#` comments ignored. Both columns accept
    /// full IRIs or short codes.
    pub fn parse(text: &str, prefixes: &PrefixTable) -> Result<Self> {
        let mut map = Self::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            map.parse_line(line, prefixes).map_err(|e| e.at_line(i + 1))?;
        }
        Ok(map)
    }

    /// Parse one `term<TAB>source` entry into the map
    pub fn parse_line(&mut self, line: &str, prefixes: &PrefixTable) -> Result<()> {
        let Some((term, source)) = line.split_once('\t') else {
            return Err(OmexError::InvalidOption(format!(
                "source map entry '{}' must have two tab-separated columns",
                line.trim()
            )));
        };
        let entity = resolve_identifier(term.trim(), prefixes)?;
        let source = resolve_identifier(source.trim(), prefixes)?;
        self.insert(entity, source);
        Ok(())
    }
}

/// Resolve a non-label identifier token (full IRI or short code)
fn resolve_identifier(token: &str, prefixes: &PrefixTable) -> Result<Iri> {
    if is_absolute_iri(token) {
        return Ok(Iri::new(unwrap_iri_token(token)));
    }
    prefixes
        .expand(token)
        .ok_or_else(|| OmexError::UnresolvedTerm(token.to_string()))
}

// ============================================================================
// Annotation Directives
// ============================================================================

/// What to do with annotations under one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveAction {
    /// Copy matching annotations to the output unchanged
    Copy,
    /// Copy, and additionally assert the value under a second property
    CopyTo(Iri),
    /// Assert the value under a second property only
    MapTo(Iri),
}

/// Governs post-extraction rewriting of one annotation property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDirective {
    /// The annotation property to match in the source graph
    pub property: Iri,

    /// The rewriting action
    pub action: DirectiveAction,
}

impl AnnotationDirective {
    /// Plain copy directive
    pub fn copy(property: Iri) -> Self {
        Self {
            property,
            action: DirectiveAction::Copy,
        }
    }

    /// Copy plus duplicate under a target property
    pub fn copy_to(property: Iri, target: Iri) -> Self {
        Self {
            property,
            action: DirectiveAction::CopyTo(target),
        }
    }

    /// Replace the property on the retained annotation
    pub fn map_to(property: Iri, target: Iri) -> Self {
        Self {
            property,
            action: DirectiveAction::MapTo(target),
        }
    }
}

/// Apply every directive: matching annotations of retained subjects
/// are copied, duplicated, or re-asserted under a target property.
pub fn apply_directives(
    output: &mut Graph,
    source: &AxiomView<'_>,
    directives: &[AnnotationDirective],
) {
    if directives.is_empty() {
        return;
    }
    let retained: Signature = output.signature();

    for directive in directives {
        for axiom in source.axioms() {
            let Axiom::AnnotationAssertion { subject, property, value } = axiom else {
                continue;
            };
            if *property != directive.property || !retained.contains(subject) {
                continue;
            }
            match &directive.action {
                DirectiveAction::Copy => {
                    output.insert(axiom.clone());
                }
                DirectiveAction::CopyTo(target) => {
                    output.insert(axiom.clone());
                    output.insert(Axiom::AnnotationAssertion {
                        subject: subject.clone(),
                        property: target.clone(),
                        value: value.clone(),
                    });
                }
                DirectiveAction::MapTo(target) => {
                    output.insert(Axiom::AnnotationAssertion {
                        subject: subject.clone(),
                        property: target.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }
}

// ============================================================================
// Source Stamping
// ============================================================================

/// Stamp every declared entity that does not already carry an
/// `rdfs:isDefinedBy` annotation. The stamped value is the source-map
/// entry when present, else a base-namespace derivation; entities with
/// no derivable source are skipped.
pub fn annotate_with_source(output: &mut Graph, sources: &SourceMap) {
    let stamped: Signature = output
        .axioms()
        .filter_map(|axiom| match axiom {
            Axiom::AnnotationAssertion { subject, property, .. }
                if property.as_str() == vocab::RDFS_IS_DEFINED_BY =>
            {
                Some(subject.clone())
            }
            _ => None,
        })
        .collect();

    let mut additions = Vec::new();
    for entity in output.declared_entities() {
        if stamped.contains(&entity) {
            continue;
        }
        let source = sources.get(&entity).cloned().or_else(|| derive_source(&entity));
        if let Some(source) = source {
            additions.push(Axiom::AnnotationAssertion {
                subject: entity,
                property: Iri::new(vocab::RDFS_IS_DEFINED_BY),
                value: AnnotationValue::Iri(source),
            });
        }
    }
    output.extend(additions);
}

/// Derive a conventional source locator from an entity identifier:
/// OBO-style local names (`GO_0005634`) map to `<namespace>go.owl`,
/// anything else with a namespace maps to the bare namespace.
pub fn derive_source(entity: &Iri) -> Option<Iri> {
    let namespace = entity.namespace();
    if namespace.is_empty() {
        return None;
    }
    let local = entity.local_name();
    if let Some(idx) = local.find('_') {
        if idx > 0 {
            let prefix = local[..idx].to_lowercase();
            return Some(Iri::new(format!("{namespace}{prefix}.owl")));
        }
    }
    Some(Iri::new(namespace.trim_end_matches(|c| c == '#' || c == '/')))
}

/// Copy graph-level annotations from the source; off by default and
/// only invoked when explicitly enabled.
pub fn copy_ontology_annotations(output: &mut Graph, source: &Graph) {
    let annotations: Vec<Axiom> = source
        .axioms()
        .filter(|axiom| matches!(axiom, Axiom::OntologyAnnotation { .. }))
        .cloned()
        .collect();
    output.extend(annotations);
}

// ============================================================================
// Tests
// ============================================================================

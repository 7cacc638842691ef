//! Graphs and axiom views
//!
//! A `Graph` is a set of axioms plus an optional identifying IRI and an
//! import closure. Source graphs are loaded once and treated as
//! read-only; every transformation constructs a new graph. An
//! `AxiomView` is the effective, imports-policy-resolved axiom set one
//! extraction job works against.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::axiom::Axiom;
use crate::entity::{EntityKind, Iri};
use crate::policy::ImportsPolicy;
use crate::vocab;

// ============================================================================
// Graph
// ============================================================================

/// An ontology graph: a deduplicated axiom set, an optional IRI, and
/// zero or more imported graphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Identifying IRI, if any
    iri: Option<Iri>,

    /// The asserted axioms of this graph (imports excluded)
    axioms: BTreeSet<Axiom>,

    /// Directly imported graphs
    imports: Vec<Graph>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifying IRI
    pub fn with_iri(mut self, iri: impl Into<Iri>) -> Self {
        self.iri = Some(iri.into());
        self
    }

    /// The identifying IRI, if any
    pub fn iri(&self) -> Option<&Iri> {
        self.iri.as_ref()
    }

    /// Replace the identifying IRI
    pub fn set_iri(&mut self, iri: Option<Iri>) {
        self.iri = iri;
    }

    /// Insert one axiom; duplicates collapse
    pub fn insert(&mut self, axiom: Axiom) -> bool {
        self.axioms.insert(axiom)
    }

    /// Insert many axioms
    pub fn extend(&mut self, axioms: impl IntoIterator<Item = Axiom>) {
        self.axioms.extend(axioms);
    }

    /// Whether the graph asserts the given axiom
    pub fn contains(&self, axiom: &Axiom) -> bool {
        self.axioms.contains(axiom)
    }

    /// Keep only the axioms matching the predicate
    pub fn retain(&mut self, keep: impl FnMut(&Axiom) -> bool) {
        self.axioms.retain(keep);
    }

    /// The asserted axioms, in deterministic order
    pub fn axioms(&self) -> impl Iterator<Item = &Axiom> {
        self.axioms.iter()
    }

    /// Number of asserted axioms (imports excluded)
    pub fn axiom_count(&self) -> usize {
        self.axioms.len()
    }

    /// Whether the graph asserts no axioms of its own
    pub fn is_empty(&self) -> bool {
        self.axioms.is_empty()
    }

    /// Attach an imported graph
    pub fn add_import(&mut self, import: Graph) {
        self.imports.push(import);
    }

    /// The directly imported graphs
    pub fn imports(&self) -> &[Graph] {
        &self.imports
    }

    /// The effective axiom view under the given imports policy
    pub fn view(&self, policy: ImportsPolicy) -> AxiomView<'_> {
        let mut axioms: Vec<&Axiom> = Vec::with_capacity(self.axioms.len());
        match policy {
            ImportsPolicy::Exclude => axioms.extend(self.axioms.iter()),
            ImportsPolicy::Include => collect_with_imports(self, &mut axioms),
        }
        AxiomView { axioms }
    }

    /// The entities referenced by this graph's own axioms
    pub fn signature(&self) -> BTreeSet<Iri> {
        let mut sig = BTreeSet::new();
        for axiom in &self.axioms {
            sig.extend(axiom.signature());
        }
        sig
    }

    /// The entities declared by this graph's own axioms
    pub fn declared_entities(&self) -> BTreeSet<Iri> {
        self.axioms
            .iter()
            .filter_map(|axiom| match axiom {
                Axiom::Declaration { entity, .. } => Some(entity.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Depth-first collection over the transitive import closure
fn collect_with_imports<'a>(graph: &'a Graph, into: &mut Vec<&'a Axiom>) {
    into.extend(graph.axioms.iter());
    for import in &graph.imports {
        collect_with_imports(import, into);
    }
}

// ============================================================================
// Axiom View
// ============================================================================

/// A read view over the effective axiom set of one extraction job.
///
/// Borrow-only: the underlying graph is never copied or mutated. Axiom
/// visibility is fixed at construction, so it stays consistent for the
/// lifetime of the job.
#[derive(Debug, Clone)]
pub struct AxiomView<'a> {
    axioms: Vec<&'a Axiom>,
}

impl<'a> AxiomView<'a> {
    /// The visible axioms
    pub fn axioms(&self) -> impl Iterator<Item = &'a Axiom> + '_ {
        self.axioms.iter().copied()
    }

    /// Number of visible axioms
    pub fn len(&self) -> usize {
        self.axioms.len()
    }

    /// Whether the view is empty
    pub fn is_empty(&self) -> bool {
        self.axioms.is_empty()
    }

    /// Every entity referenced by a visible axiom
    pub fn signature(&self) -> BTreeSet<Iri> {
        let mut sig = BTreeSet::new();
        for axiom in &self.axioms {
            sig.extend(axiom.signature());
        }
        sig
    }

    /// All visible SubClassOf edges as (child, parent) pairs
    pub fn subclass_edges(&self) -> impl Iterator<Item = (&'a Iri, &'a Iri)> + '_ {
        self.axioms.iter().filter_map(|axiom| match axiom {
            Axiom::SubClassOf { child, parent } => Some((child, parent)),
            _ => None,
        })
    }

    /// Direct named superclasses of an entity
    pub fn superclasses_of(&self, entity: &Iri) -> Vec<&'a Iri> {
        self.subclass_edges()
            .filter(|(child, _)| *child == entity)
            .map(|(_, parent)| parent)
            .collect()
    }

    /// Direct named subclasses of an entity
    pub fn subclasses_of(&self, entity: &Iri) -> Vec<&'a Iri> {
        self.subclass_edges()
            .filter(|(_, parent)| *parent == entity)
            .map(|(child, _)| child)
            .collect()
    }

    /// The declared kind of an entity, if a declaration is visible
    pub fn declared_kind(&self, entity: &Iri) -> Option<EntityKind> {
        self.axioms.iter().find_map(|axiom| match axiom {
            Axiom::Declaration { kind, entity: declared } if declared == entity => Some(*kind),
            _ => None,
        })
    }

    /// All visible `rdfs:label` assertions as (subject, label) pairs
    pub fn labels(&self) -> impl Iterator<Item = (&'a Iri, &'a str)> + '_ {
        self.axioms.iter().filter_map(|axiom| match axiom {
            Axiom::AnnotationAssertion { subject, property, value }
                if property.as_str() == vocab::RDFS_LABEL =>
            {
                value.as_literal().map(|label| (subject, label))
            }
            _ => None,
        })
    }

    /// All visible annotation assertions on a subject
    pub fn annotations_of(&self, subject: &Iri) -> Vec<&'a Axiom> {
        self.axioms
            .iter()
            .copied()
            .filter(|axiom| {
                matches!(axiom, Axiom::AnnotationAssertion { subject: s, .. } if s == subject)
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

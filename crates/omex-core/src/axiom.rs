//! Axioms: typed statements over entities
//!
//! A graph is a set of axioms; duplicates collapse and no axiom is ever
//! mutated in place. The kinds here are the ones the extraction engine
//! reasons about: subsumption, class assertions, equivalences with a
//! compact class-expression language, annotations, and declarations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, Iri};

// ============================================================================
// Annotation Values
// ============================================================================

/// The object of an annotation assertion: a literal or an IRI
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationValue {
    Literal(String),
    Iri(Iri),
}

impl AnnotationValue {
    /// The literal string, if this value is a literal
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Iri(_) => None,
        }
    }

    /// The IRI, if this value is one
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Literal(_) => None,
            Self::Iri(iri) => Some(iri),
        }
    }
}

impl std::fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "\"{text}\""),
            Self::Iri(iri) => write!(f, "{iri}"),
        }
    }
}

// ============================================================================
// Class Expressions
// ============================================================================

/// A compact class-expression language, sufficient for logical
/// definitions that reference individuals and interconnect signatures.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassExpression {
    /// A named class
    Class(Iri),
    /// Existential restriction over an object property
    SomeValuesFrom {
        property: Iri,
        filler: Box<ClassExpression>,
    },
    /// Intersection of expressions
    IntersectionOf(Vec<ClassExpression>),
    /// Enumeration of individuals
    OneOf(Vec<Iri>),
    /// Property value restriction to a single individual
    HasValue { property: Iri, individual: Iri },
}

impl ClassExpression {
    /// Collect every entity the expression references
    pub fn collect_signature(&self, into: &mut BTreeSet<Iri>) {
        match self {
            Self::Class(iri) => {
                into.insert(iri.clone());
            }
            Self::SomeValuesFrom { property, filler } => {
                into.insert(property.clone());
                filler.collect_signature(into);
            }
            Self::IntersectionOf(parts) => {
                for part in parts {
                    part.collect_signature(into);
                }
            }
            Self::OneOf(individuals) => {
                into.extend(individuals.iter().cloned());
            }
            Self::HasValue { property, individual } => {
                into.insert(property.clone());
                into.insert(individual.clone());
            }
        }
    }

    /// Collect the individuals the expression references
    pub fn collect_individuals(&self, into: &mut BTreeSet<Iri>) {
        match self {
            Self::Class(_) => {}
            Self::SomeValuesFrom { filler, .. } => filler.collect_individuals(into),
            Self::IntersectionOf(parts) => {
                for part in parts {
                    part.collect_individuals(into);
                }
            }
            Self::OneOf(individuals) => {
                into.extend(individuals.iter().cloned());
            }
            Self::HasValue { individual, .. } => {
                into.insert(individual.clone());
            }
        }
    }
}

// ============================================================================
// Axioms
// ============================================================================

/// A typed, immutable statement over one or more entities
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Axiom {
    /// Declares an entity and its kind
    Declaration { kind: EntityKind, entity: Iri },

    /// `child` is a subclass of `parent`
    SubClassOf { child: Iri, parent: Iri },

    /// A named class is logically defined by an expression
    EquivalentClasses {
        class: Iri,
        expression: ClassExpression,
    },

    /// An individual is asserted to be an instance of a class
    ClassAssertion { individual: Iri, class: Iri },

    /// An annotation on a named subject
    AnnotationAssertion {
        subject: Iri,
        property: Iri,
        value: AnnotationValue,
    },

    /// An annotation on the graph itself
    OntologyAnnotation {
        property: Iri,
        value: AnnotationValue,
    },
}

impl Axiom {
    /// Every entity the axiom references
    pub fn signature(&self) -> BTreeSet<Iri> {
        let mut sig = BTreeSet::new();
        match self {
            Self::Declaration { entity, .. } => {
                sig.insert(entity.clone());
            }
            Self::SubClassOf { child, parent } => {
                sig.insert(child.clone());
                sig.insert(parent.clone());
            }
            Self::EquivalentClasses { class, expression } => {
                sig.insert(class.clone());
                expression.collect_signature(&mut sig);
            }
            Self::ClassAssertion { individual, class } => {
                sig.insert(individual.clone());
                sig.insert(class.clone());
            }
            Self::AnnotationAssertion { subject, property, value } => {
                sig.insert(subject.clone());
                sig.insert(property.clone());
                if let Some(iri) = value.as_iri() {
                    sig.insert(iri.clone());
                }
            }
            Self::OntologyAnnotation { property, value } => {
                sig.insert(property.clone());
                if let Some(iri) = value.as_iri() {
                    sig.insert(iri.clone());
                }
            }
        }
        sig
    }

    /// Whether the axiom references the given entity
    pub fn references(&self, entity: &Iri) -> bool {
        self.signature().contains(entity)
    }

    /// Whether this is a logical axiom (as opposed to a declaration or
    /// an annotation)
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            Self::SubClassOf { .. } | Self::EquivalentClasses { .. } | Self::ClassAssertion { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

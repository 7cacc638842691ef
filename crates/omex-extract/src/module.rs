//! Module Extraction Orchestrator
//!
//! Builds a seed signature from resolved terms, applies the
//! import-inclusion policy (upstream, via `Graph::view`), invokes the
//! module-computation provider, and applies the individual-inclusion
//! policy to the result.
//!
//! The built-in `SyntacticProvider` implements the documented strategy
//! semantics as deterministic signature closures; a reasoning-library
//! backed provider can be swapped in through the `ModuleProvider` seam
//! without touching the orchestration.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use omex_core::{
    Axiom, AxiomView, EntityKind, Graph, IndividualsPolicy, ModuleProvider, ModuleStrategy,
    OmexError, Result, Signature,
};

use crate::resolve::TermSpec;
use crate::ExtractOptions;

// ============================================================================
// Orchestration
// ============================================================================

/// Validate seeds against the effective vocabulary, compute the module,
/// and post-filter individuals.
pub fn extract_module(
    view: &AxiomView<'_>,
    seeds: &[TermSpec],
    options: &ExtractOptions,
    provider: &dyn ModuleProvider,
) -> Result<Graph> {
    let vocabulary = view.signature();

    let mut seed: Signature = Signature::new();
    for spec in seeds {
        if vocabulary.contains(&spec.term) {
            seed.insert(spec.term.clone());
        } else {
            warn!("seed term {} not found in the source vocabulary, skipping", spec.term);
        }
    }

    if seed.is_empty() && !options.force {
        return Err(OmexError::EmptyTerms);
    }

    let module = provider.compute_module(view, &seed, options.strategy)?;
    debug!(
        axioms = module.axiom_count(),
        strategy = %options.strategy,
        "computed module"
    );

    Ok(apply_individuals_policy(module, options.individuals))
}

// ============================================================================
// Individuals Policy
// ============================================================================

/// Post-filter the candidate module's class assertions, then drop
/// declarations and annotations of individuals nothing references
/// anymore.
pub fn apply_individuals_policy(module: Graph, policy: IndividualsPolicy) -> Graph {
    if policy == IndividualsPolicy::Include {
        return module;
    }

    let retained_classes = class_signature(&module);
    let definition_individuals = definition_individuals(&module);

    let mut filtered = Graph::new();
    filtered.set_iri(module.iri().cloned());
    for axiom in module.axioms() {
        if let Axiom::ClassAssertion { individual, class } = axiom {
            let keep = match policy {
                IndividualsPolicy::Include => true,
                IndividualsPolicy::Minimal => retained_classes.contains(class),
                IndividualsPolicy::Definitions => definition_individuals.contains(individual),
                IndividualsPolicy::Exclude => false,
            };
            if !keep {
                continue;
            }
        }
        filtered.insert(axiom.clone());
    }

    drop_unreferenced_individuals(filtered)
}

/// Entities used as classes by the module's logical axioms and
/// declarations
fn class_signature(module: &Graph) -> Signature {
    let mut classes = Signature::new();
    for axiom in module.axioms() {
        match axiom {
            Axiom::Declaration { kind: EntityKind::Class, entity } => {
                classes.insert(entity.clone());
            }
            Axiom::SubClassOf { child, parent } => {
                classes.insert(child.clone());
                classes.insert(parent.clone());
            }
            Axiom::EquivalentClasses { class, .. } => {
                classes.insert(class.clone());
            }
            _ => {}
        }
    }
    classes
}

/// Individuals referenced by logical class-definition axioms
fn definition_individuals(module: &Graph) -> Signature {
    let mut individuals = Signature::new();
    for axiom in module.axioms() {
        if let Axiom::EquivalentClasses { expression, .. } = axiom {
            expression.collect_individuals(&mut individuals);
        }
    }
    individuals
}

/// Remove declarations and annotations of individuals no remaining
/// logical axiom references
fn drop_unreferenced_individuals(module: Graph) -> Graph {
    let declared_individuals: Signature = module
        .axioms()
        .filter_map(|axiom| match axiom {
            Axiom::Declaration { kind: EntityKind::Individual, entity } => Some(entity.clone()),
            _ => None,
        })
        .collect();

    let mut referenced = Signature::new();
    for axiom in module.axioms() {
        match axiom {
            Axiom::ClassAssertion { individual, .. } => {
                referenced.insert(individual.clone());
            }
            Axiom::EquivalentClasses { expression, .. } => {
                expression.collect_individuals(&mut referenced);
            }
            _ => {}
        }
    }

    let orphaned: Signature = declared_individuals
        .difference(&referenced)
        .cloned()
        .collect();
    if orphaned.is_empty() {
        return module;
    }

    let mut cleaned = Graph::new();
    cleaned.set_iri(module.iri().cloned());
    for axiom in module.axioms() {
        let drop = match axiom {
            Axiom::Declaration { entity, .. } => orphaned.contains(entity),
            Axiom::AnnotationAssertion { subject, .. } => orphaned.contains(subject),
            _ => false,
        };
        if !drop {
            cleaned.insert(axiom.clone());
        }
    }
    cleaned
}

// ============================================================================
// Syntactic Module Provider
// ============================================================================

/// Built-in module computation via deterministic signature closures.
///
/// BOT: seed plus full superclass closure and their interrelations.
/// TOP: seed plus full subclass closure and their interrelations.
/// STAR: alternating BOT/TOP restriction of the axiom set to a
/// fixpoint, yielding the minimal interconnecting signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntacticProvider;

impl SyntacticProvider {
    /// Create a provider
    pub fn new() -> Self {
        Self
    }
}

impl ModuleProvider for SyntacticProvider {
    fn compute_module(
        &self,
        view: &AxiomView<'_>,
        seed: &Signature,
        strategy: ModuleStrategy,
    ) -> Result<Graph> {
        let axioms: Vec<Axiom> = view.axioms().cloned().collect();
        let kept = match strategy {
            ModuleStrategy::Bot => restrict(&axioms, &close_upward(&axioms, seed)),
            ModuleStrategy::Top => restrict(&axioms, &close_downward(&axioms, seed)),
            ModuleStrategy::Star => star_fixpoint(axioms, seed),
            ModuleStrategy::Mireot => {
                return Err(OmexError::InvalidOption(
                    "MIREOT is not a module-provider strategy".to_string(),
                ))
            }
        };

        let mut module = Graph::new();
        module.extend(kept);

        // Seed preservation: the module carries every seed entity even
        // when no kept axiom mentions it.
        let signature = module.signature();
        for term in seed {
            if !signature.contains(term) {
                module.insert(Axiom::Declaration {
                    kind: view.declared_kind(term).unwrap_or(EntityKind::Class),
                    entity: term.clone(),
                });
            }
        }
        Ok(module)
    }
}

/// Superclass closure: grow the signature along SubClassOf edges
/// upward and through the definitions of retained classes.
fn close_upward(axioms: &[Axiom], seed: &Signature) -> Signature {
    let mut signature = seed.clone();
    loop {
        let before = signature.len();
        for axiom in axioms {
            match axiom {
                Axiom::SubClassOf { child, parent } if signature.contains(child) => {
                    signature.insert(parent.clone());
                }
                Axiom::EquivalentClasses { class, expression } if signature.contains(class) => {
                    expression.collect_signature(&mut signature);
                }
                _ => {}
            }
        }
        if signature.len() == before {
            return signature;
        }
    }
}

/// Subclass closure: grow the signature along SubClassOf edges
/// downward, through asserted instances, and through the definitions
/// of retained classes.
fn close_downward(axioms: &[Axiom], seed: &Signature) -> Signature {
    let mut signature = seed.clone();
    loop {
        let before = signature.len();
        for axiom in axioms {
            match axiom {
                Axiom::SubClassOf { child, parent } if signature.contains(parent) => {
                    signature.insert(child.clone());
                }
                Axiom::ClassAssertion { individual, class } if signature.contains(class) => {
                    signature.insert(individual.clone());
                }
                Axiom::EquivalentClasses { class, expression } if signature.contains(class) => {
                    expression.collect_signature(&mut signature);
                }
                _ => {}
            }
        }
        if signature.len() == before {
            return signature;
        }
    }
}

/// Keep only the axioms whose full signature is retained. Declarations
/// and annotations ride along with their entity; ontology annotations
/// are not module content.
fn restrict(axioms: &[Axiom], signature: &Signature) -> Vec<Axiom> {
    axioms
        .iter()
        .filter(|axiom| match axiom {
            Axiom::Declaration { entity, .. } => signature.contains(entity),
            Axiom::AnnotationAssertion { subject, .. } => signature.contains(subject),
            Axiom::OntologyAnnotation { .. } => false,
            logical => logical.signature().is_subset(signature),
        })
        .cloned()
        .collect()
}

/// Alternate BOT and TOP restriction until the axiom set is stable.
/// Each pass keeps a subset of the previous one, so this terminates.
fn star_fixpoint(mut axioms: Vec<Axiom>, seed: &Signature) -> Vec<Axiom> {
    loop {
        let bot = restrict(&axioms, &close_upward(&axioms, seed));
        let top = restrict(&bot, &close_downward(&bot, seed));
        if top.len() == axioms.len() {
            return top;
        }
        axioms = top;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use omex_core::{AnnotationValue, ClassExpression, ImportsPolicy, Iri, vocab};

    fn iri(s: &str) -> Iri {
        Iri::new(s)
    }

    fn sub(child: &str, parent: &str) -> Axiom {
        Axiom::SubClassOf {
            child: iri(child),
            parent: iri(parent),
        }
    }

    fn seed(terms: &[&str]) -> Signature {
        terms.iter().map(|t| iri(t)).collect()
    }

    /// a -> b -> c, with sibling s -> b and instance i : a
    fn fixture() -> Graph {
        let mut graph = Graph::new();
        graph.insert(sub("a", "b"));
        graph.insert(sub("b", "c"));
        graph.insert(sub("s", "b"));
        graph.insert(Axiom::ClassAssertion {
            individual: iri("i"),
            class: iri("a"),
        });
        graph
    }

    #[test]
    fn test_bot_module_keeps_superclass_closure() {
        let graph = fixture();
        let view = graph.view(ImportsPolicy::Exclude);
        let module = SyntacticProvider::new()
            .compute_module(&view, &seed(&["a"]), ModuleStrategy::Bot)
            .unwrap();

        assert!(module.contains(&sub("a", "b")));
        assert!(module.contains(&sub("b", "c")));
        // The sibling is below the seed, not in its superclass closure.
        assert!(!module.contains(&sub("s", "b")));
    }

    #[test]
    fn test_top_module_keeps_subclass_closure() {
        let graph = fixture();
        let view = graph.view(ImportsPolicy::Exclude);
        let module = SyntacticProvider::new()
            .compute_module(&view, &seed(&["b"]), ModuleStrategy::Top)
            .unwrap();

        assert!(module.contains(&sub("a", "b")));
        assert!(module.contains(&sub("s", "b")));
        assert!(!module.contains(&sub("b", "c")));
        // Instances of retained classes come along.
        assert!(module.contains(&Axiom::ClassAssertion {
            individual: iri("i"),
            class: iri("a"),
        }));
    }

    #[test]
    fn test_module_signature_contains_seed() {
        let graph = fixture();
        let view = graph.view(ImportsPolicy::Exclude);
        for strategy in [ModuleStrategy::Star, ModuleStrategy::Top, ModuleStrategy::Bot] {
            let module = SyntacticProvider::new()
                .compute_module(&view, &seed(&["a"]), strategy)
                .unwrap();
            assert!(
                module.signature().contains(&iri("a")),
                "seed lost under {strategy}"
            );
        }
    }

    #[test]
    fn test_star_reaches_fixpoint() {
        let graph = fixture();
        let view = graph.view(ImportsPolicy::Exclude);
        let module = SyntacticProvider::new()
            .compute_module(&view, &seed(&["a"]), ModuleStrategy::Star)
            .unwrap();

        // Upward closure of a, then downward restriction: the sibling
        // branch stays out.
        assert!(module.contains(&sub("a", "b")));
        assert!(!module.contains(&sub("s", "b")));
    }

    #[test]
    fn test_empty_terms_requires_force() {
        let graph = fixture();
        let view = graph.view(ImportsPolicy::Exclude);
        let seeds = vec![TermSpec::new(iri("not-in-graph"))];

        let options = ExtractOptions::default();
        assert!(matches!(
            extract_module(&view, &seeds, &options, &SyntacticProvider::new()),
            Err(OmexError::EmptyTerms)
        ));

        let forced = ExtractOptions {
            force: true,
            ..ExtractOptions::default()
        };
        let module = extract_module(&view, &seeds, &forced, &SyntacticProvider::new()).unwrap();
        assert!(module.is_empty());
    }

    #[test]
    fn test_individuals_exclude_drops_assertions_and_orphans() {
        let mut module = fixture();
        module.insert(Axiom::Declaration {
            kind: EntityKind::Individual,
            entity: iri("i"),
        });
        module.insert(Axiom::AnnotationAssertion {
            subject: iri("i"),
            property: Iri::new(vocab::RDFS_LABEL),
            value: AnnotationValue::Literal("instance".to_string()),
        });

        let out = apply_individuals_policy(module, IndividualsPolicy::Exclude);

        assert!(!out.axioms().any(|a| matches!(a, Axiom::ClassAssertion { .. })));
        assert!(!out.signature().contains(&iri("i")));
    }

    #[test]
    fn test_individuals_minimal_requires_retained_class() {
        let mut module = Graph::new();
        module.insert(sub("a", "b"));
        module.insert(Axiom::ClassAssertion {
            individual: iri("i"),
            class: iri("a"),
        });
        module.insert(Axiom::ClassAssertion {
            individual: iri("j"),
            class: iri("outside"),
        });

        let out = apply_individuals_policy(module, IndividualsPolicy::Minimal);

        assert!(out.contains(&Axiom::ClassAssertion {
            individual: iri("i"),
            class: iri("a"),
        }));
        assert!(!out.contains(&Axiom::ClassAssertion {
            individual: iri("j"),
            class: iri("outside"),
        }));
    }

    #[test]
    fn test_individuals_definitions_keeps_defined_only() {
        let mut module = Graph::new();
        module.insert(Axiom::EquivalentClasses {
            class: iri("sample-set"),
            expression: ClassExpression::OneOf(vec![iri("i")]),
        });
        module.insert(Axiom::ClassAssertion {
            individual: iri("i"),
            class: iri("sample-set"),
        });
        module.insert(Axiom::ClassAssertion {
            individual: iri("j"),
            class: iri("sample-set"),
        });

        let out = apply_individuals_policy(module, IndividualsPolicy::Definitions);

        assert!(out.contains(&Axiom::ClassAssertion {
            individual: iri("i"),
            class: iri("sample-set"),
        }));
        assert!(!out.contains(&Axiom::ClassAssertion {
            individual: iri("j"),
            class: iri("sample-set"),
        }));
    }
}

//! MIREOT Traversal Engine
//!
//! Computes the bounded ancestor/descendant hierarchy for a set of
//! lower (and optional upper / branch-from) terms. Upper terms are
//! included and stop the upward walk on their path; paths that never
//! meet an upper term run to the hierarchy root. Branch-from terms
//! contribute their full descendant subtree, with the branch term
//! itself as the included stop point. Multiple inheritance is
//! preserved.
//!
//! Author: hephaex@gmail.com

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use omex_core::{AnnotationValue, Axiom, AxiomView, EntityKind, Graph, Iri, OmexError, Result, vocab};

use crate::hierarchy::Hierarchy;

/// Compute the MIREOT hierarchy for the given bounds.
///
/// Fails with `MissingUpperDependent` when upper terms are supplied
/// without any traversal start, and with `MissingLowerTerm` when
/// neither lower nor branch-from terms are given.
pub fn hierarchy(
    view: &AxiomView<'_>,
    lower: &[Iri],
    upper: &[Iri],
    branch: &[Iri],
) -> Result<Hierarchy> {
    if lower.is_empty() && branch.is_empty() {
        if !upper.is_empty() {
            return Err(OmexError::MissingUpperDependent);
        }
        return Err(OmexError::MissingLowerTerm);
    }

    // Adjacency in both directions, built once per traversal.
    let mut up: HashMap<&Iri, Vec<&Iri>> = HashMap::new();
    let mut down: HashMap<&Iri, Vec<&Iri>> = HashMap::new();
    for (child, parent) in view.subclass_edges() {
        up.entry(child).or_default().push(parent);
        down.entry(parent).or_default().push(child);
    }

    let mut result = Hierarchy::new();

    // Upper terms are part of the extraction even when no lower path
    // reaches them.
    let stops: BTreeSet<&Iri> = upper.iter().chain(branch.iter()).collect();
    for term in upper {
        result.add_node(term);
    }

    collect_ancestors(&mut result, &up, lower, &stops);

    for term in branch {
        result.add_node(term);
        collect_descendants(&mut result, &down, term);
        // The branch term acts as its own ancestor stop point: walk up
        // from its direct subtree no further.
    }

    debug!(
        nodes = result.node_count(),
        lower = lower.len(),
        upper = upper.len(),
        branch = branch.len(),
        "computed MIREOT hierarchy"
    );

    Ok(result)
}

/// Walk child→parent edges from every lower term, collecting each
/// visited node and edge. Stop points are included but never expanded.
fn collect_ancestors(
    result: &mut Hierarchy,
    up: &HashMap<&Iri, Vec<&Iri>>,
    lower: &[Iri],
    stops: &BTreeSet<&Iri>,
) {
    let mut visited: BTreeSet<Iri> = BTreeSet::new();
    let mut stack: Vec<Iri> = Vec::new();

    for term in lower {
        result.add_node(term);
        stack.push(term.clone());
    }

    while let Some(node) = stack.pop() {
        if !visited.insert(node.clone()) {
            continue;
        }
        if stops.contains(&node) {
            continue;
        }
        if let Some(parents) = up.get(&node) {
            for parent in parents {
                result.add_edge(&node, parent);
                if !visited.contains(*parent) {
                    stack.push((*parent).clone());
                }
            }
        }
    }
}

/// Walk parent→child edges from a branch term, collecting the whole
/// subtree beneath it.
fn collect_descendants(result: &mut Hierarchy, down: &HashMap<&Iri, Vec<&Iri>>, branch: &Iri) {
    let mut visited: BTreeSet<Iri> = BTreeSet::new();
    let mut stack: Vec<Iri> = vec![branch.clone()];

    while let Some(node) = stack.pop() {
        if !visited.insert(node.clone()) {
            continue;
        }
        if let Some(children) = down.get(&node) {
            for child in children {
                result.add_edge(child, &node);
                if !visited.contains(*child) {
                    stack.push((*child).clone());
                }
            }
        }
    }
}

/// Render a hierarchy into an output graph: one declaration per
/// retained term, the retained SubClassOf edges, and the term's
/// `rdfs:label` annotations from the source view.
pub fn hierarchy_graph(hierarchy: &Hierarchy, view: &AxiomView<'_>) -> Graph {
    let mut labels: HashMap<&Iri, Vec<&str>> = HashMap::new();
    for (subject, label) in view.labels() {
        labels.entry(subject).or_default().push(label);
    }

    let mut graph = Graph::new();
    for node in hierarchy.nodes() {
        let kind = view.declared_kind(&node).unwrap_or(EntityKind::Class);
        graph.insert(Axiom::Declaration {
            kind,
            entity: node.clone(),
        });
        if let Some(texts) = labels.get(&node) {
            for text in texts {
                graph.insert(Axiom::AnnotationAssertion {
                    subject: node.clone(),
                    property: Iri::new(vocab::RDFS_LABEL),
                    value: AnnotationValue::Literal((*text).to_string()),
                });
            }
        }
    }
    graph.extend(hierarchy.to_subclass_axioms());
    graph
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use omex_core::{Graph, ImportsPolicy};

    fn iri(s: &str) -> Iri {
        Iri::new(s)
    }

    fn sub(child: &str, parent: &str) -> Axiom {
        Axiom::SubClassOf {
            child: iri(child),
            parent: iri(parent),
        }
    }

    /// A -> B -> C with D -> B on the side
    fn diamond_free_graph() -> Graph {
        let mut graph = Graph::new();
        graph.insert(sub("a", "b"));
        graph.insert(sub("b", "c"));
        graph.insert(sub("d", "b"));
        graph
    }

    #[test]
    fn test_lower_only_walks_to_root() {
        let graph = diamond_free_graph();
        let view = graph.view(ImportsPolicy::Exclude);

        let h = hierarchy(&view, &[iri("a")], &[], &[]).unwrap();

        assert_eq!(h.nodes(), vec![iri("a"), iri("b"), iri("c")]);
        assert_eq!(h.edges(), vec![(iri("a"), iri("b")), (iri("b"), iri("c"))]);
    }

    #[test]
    fn test_upper_term_stops_traversal() {
        let mut graph = diamond_free_graph();
        graph.insert(sub("c", "root"));
        let view = graph.view(ImportsPolicy::Exclude);

        let h = hierarchy(&view, &[iri("a")], &[iri("c")], &[]).unwrap();

        // c is the furthest retained ancestor; root is excluded.
        assert!(!h.contains(&iri("root")));
        assert_eq!(h.nodes(), vec![iri("a"), iri("b"), iri("c")]);
    }

    #[test]
    fn test_shared_path_bypasses_upper_term() {
        // a -> u -> top and a -> p -> top: nodes above u survive when
        // another retained path reaches them.
        let mut graph = Graph::new();
        graph.insert(sub("a", "u"));
        graph.insert(sub("u", "top"));
        graph.insert(sub("a", "p"));
        graph.insert(sub("p", "top"));
        let view = graph.view(ImportsPolicy::Exclude);

        let h = hierarchy(&view, &[iri("a")], &[iri("u")], &[]).unwrap();

        assert!(h.contains(&iri("top")));
        assert!(h.edges().contains(&(iri("p"), iri("top"))));
        // But no edge above u itself.
        assert!(!h.edges().contains(&(iri("u"), iri("top"))));
    }

    #[test]
    fn test_unreached_upper_term_is_still_included() {
        let graph = diamond_free_graph();
        let view = graph.view(ImportsPolicy::Exclude);

        let h = hierarchy(&view, &[iri("a")], &[iri("unrelated")], &[]).unwrap();
        assert!(h.contains(&iri("unrelated")));
    }

    #[test]
    fn test_branch_collects_subtree() {
        let graph = diamond_free_graph();
        let view = graph.view(ImportsPolicy::Exclude);

        let h = hierarchy(&view, &[], &[], &[iri("b")]).unwrap();

        // b plus everything beneath it, nothing above it.
        assert_eq!(h.nodes(), vec![iri("a"), iri("b"), iri("d")]);
        assert!(!h.contains(&iri("c")));
    }

    #[test]
    fn test_multiple_inheritance_is_preserved() {
        let mut graph = Graph::new();
        graph.insert(sub("a", "b"));
        graph.insert(sub("a", "c"));
        let view = graph.view(ImportsPolicy::Exclude);

        let h = hierarchy(&view, &[iri("a")], &[], &[]).unwrap();
        assert_eq!(h.parents_of(&iri("a")), vec![iri("b"), iri("c")]);
    }

    #[test]
    fn test_missing_bounds_errors() {
        let graph = diamond_free_graph();
        let view = graph.view(ImportsPolicy::Exclude);

        assert!(matches!(
            hierarchy(&view, &[], &[], &[]),
            Err(OmexError::MissingLowerTerm)
        ));
        assert!(matches!(
            hierarchy(&view, &[], &[iri("c")], &[]),
            Err(OmexError::MissingUpperDependent)
        ));
    }

    #[test]
    fn test_traversal_is_deterministic() {
        let graph = diamond_free_graph();
        let view = graph.view(ImportsPolicy::Exclude);

        let first = hierarchy(&view, &[iri("a")], &[iri("c")], &[]).unwrap();
        let second = hierarchy(&view, &[iri("a")], &[iri("c")], &[]).unwrap();
        assert_eq!(first.nodes(), second.nodes());
        assert_eq!(first.edges(), second.edges());
    }

    #[test]
    fn test_hierarchy_graph_carries_declarations_and_labels() {
        let mut graph = diamond_free_graph();
        graph.insert(Axiom::AnnotationAssertion {
            subject: iri("a"),
            property: Iri::new(vocab::RDFS_LABEL),
            value: AnnotationValue::Literal("alpha".to_string()),
        });
        let view = graph.view(ImportsPolicy::Exclude);

        let h = hierarchy(&view, &[iri("a")], &[], &[]).unwrap();
        let out = hierarchy_graph(&h, &view);

        assert!(out.contains(&Axiom::Declaration {
            kind: EntityKind::Class,
            entity: iri("a"),
        }));
        assert!(out.contains(&Axiom::AnnotationAssertion {
            subject: iri("a"),
            property: Iri::new(vocab::RDFS_LABEL),
            value: AnnotationValue::Literal("alpha".to_string()),
        }));
        assert!(out.contains(&sub("a", "b")));
    }
}

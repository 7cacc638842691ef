//! Property tests for traversal and pruning invariants
//!
//! Random DAGs are generated by only drawing child→parent edges from a
//! lower node id to a higher one, so acyclicity holds by construction.

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use omex_core::{
    Axiom, Graph, ImportsPolicy, IntermediatesPolicy, Iri, ModuleStrategy, ModuleProvider,
    Signature,
};
use omex_extract::{mireot, prune, Hierarchy, SyntacticProvider};

fn node(id: usize) -> Iri {
    Iri::new(format!("http://example.com/n{id:02}"))
}

/// Edges (child, parent) with child < parent, deduplicated
fn dag_edges(max_nodes: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..max_nodes, 0..max_nodes), 1..24).prop_map(|pairs| {
        let mut edges: Vec<(usize, usize)> = pairs
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort();
        edges.dedup();
        edges
    })
}

fn graph_from(edges: &[(usize, usize)]) -> Graph {
    let mut graph = Graph::new();
    for (child, parent) in edges {
        graph.insert(Axiom::SubClassOf {
            child: node(*child),
            parent: node(*parent),
        });
    }
    graph
}

fn hierarchy_from(edges: &[(usize, usize)]) -> Hierarchy {
    let mut h = Hierarchy::new();
    for (child, parent) in edges {
        h.add_edge(&node(*child), &node(*parent));
    }
    h
}

/// Transitive ancestor relation over the hierarchy's current edges
fn ancestor_closure(h: &Hierarchy) -> HashMap<Iri, BTreeSet<Iri>> {
    let mut closure: HashMap<Iri, BTreeSet<Iri>> = HashMap::new();
    for start in h.nodes() {
        let mut reach = BTreeSet::new();
        let mut stack = h.parents_of(&start);
        while let Some(next) = stack.pop() {
            if reach.insert(next.clone()) {
                stack.extend(h.parents_of(&next));
            }
        }
        closure.insert(start, reach);
    }
    closure
}

proptest! {
    /// Requested terms survive every pruning policy.
    #[test]
    fn pruning_never_removes_required_terms(
        edges in dag_edges(10),
        picks in prop::collection::btree_set(0..10usize, 1..4),
    ) {
        for policy in [IntermediatesPolicy::Minimal, IntermediatesPolicy::None] {
            let mut h = hierarchy_from(&edges);
            let required: Signature = picks
                .iter()
                .map(|id| node(*id))
                .filter(|iri| h.contains(iri))
                .collect();
            prop_assume!(!required.is_empty());

            prune::prune(&mut h, policy, &required);
            for term in &required {
                prop_assert!(h.contains(term), "{term} removed under {policy}");
            }
        }
    }

    /// Pruning preserves ancestor reachability between surviving nodes.
    #[test]
    fn pruning_preserves_reachability(
        edges in dag_edges(10),
        picks in prop::collection::btree_set(0..10usize, 1..4),
    ) {
        for policy in [IntermediatesPolicy::Minimal, IntermediatesPolicy::None] {
            let mut h = hierarchy_from(&edges);
            let required: Signature = picks
                .iter()
                .map(|id| node(*id))
                .filter(|iri| h.contains(iri))
                .collect();

            let before = ancestor_closure(&h);
            prune::prune(&mut h, policy, &required);
            let after = ancestor_closure(&h);

            for (start, ancestors) in &after {
                for ancestor in ancestors {
                    prop_assert!(
                        before[start].contains(ancestor),
                        "pruning created a new ancestor {ancestor} of {start}"
                    );
                }
            }
            for (start, ancestors) in &before {
                if !h.contains(start) {
                    continue;
                }
                for ancestor in ancestors {
                    if h.contains(ancestor) {
                        prop_assert!(
                            after[start].contains(ancestor),
                            "pruning lost ancestor {ancestor} of {start} under {policy}"
                        );
                    }
                }
            }
        }
    }

    /// Pruning is idempotent: a second pass changes nothing.
    #[test]
    fn pruning_is_idempotent(
        edges in dag_edges(10),
        picks in prop::collection::btree_set(0..10usize, 1..4),
    ) {
        for policy in [IntermediatesPolicy::Minimal, IntermediatesPolicy::None] {
            let mut h = hierarchy_from(&edges);
            let required: Signature = picks.iter().map(|id| node(*id)).collect();

            prune::prune(&mut h, policy, &required);
            let nodes = h.nodes();
            let edges_after = h.edges();

            prune::prune(&mut h, policy, &required);
            prop_assert_eq!(&nodes, &h.nodes());
            prop_assert_eq!(&edges_after, &h.edges());
        }
    }

    /// MIREOT with only lower terms retains every ancestor of each
    /// lower term, and nothing else.
    #[test]
    fn mireot_collects_exactly_the_ancestors(
        edges in dag_edges(10),
        lower_id in 0..10usize,
    ) {
        let graph = graph_from(&edges);
        let view = graph.view(ImportsPolicy::Exclude);
        let lower = node(lower_id);

        let h = mireot::hierarchy(&view, &[lower.clone()], &[], &[]).unwrap();

        let full = hierarchy_from(&edges);
        let mut expected: BTreeSet<Iri> = [lower.clone()].into_iter().collect();
        if full.contains(&lower) {
            expected.extend(ancestor_closure(&full).remove(&lower).unwrap());
        }

        let got: BTreeSet<Iri> = h.nodes().into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    /// Module computation keeps every valid seed in the signature.
    #[test]
    fn module_signature_contains_seed(
        edges in dag_edges(10),
        picks in prop::collection::btree_set(0..10usize, 1..4),
    ) {
        let graph = graph_from(&edges);
        let view = graph.view(ImportsPolicy::Exclude);
        let vocabulary = view.signature();
        let seed: Signature = picks
            .iter()
            .map(|id| node(*id))
            .filter(|iri| vocabulary.contains(iri))
            .collect();
        prop_assume!(!seed.is_empty());

        for strategy in [ModuleStrategy::Star, ModuleStrategy::Top, ModuleStrategy::Bot] {
            let module = SyntacticProvider::new()
                .compute_module(&view, &seed, strategy)
                .unwrap();
            let signature = module.signature();
            for term in &seed {
                prop_assert!(signature.contains(term), "{term} lost under {strategy}");
            }
        }
    }
}

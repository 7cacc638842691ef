//! Intermediate Pruning Engine
//!
//! Post-processes a hierarchy (from MIREOT) or the subsumption
//! structure of an extracted module, removing filler nodes per policy.
//! Explicitly requested terms are never removed. Removing a node
//! reattaches every retained child to every retained parent, so
//! reachability is preserved while the node's other axioms are
//! dropped.

use tracing::debug;

use omex_core::{Axiom, EntityKind, Graph, IntermediatesPolicy, Signature};

use crate::hierarchy::Hierarchy;
use crate::resolve::TermSpec;

/// Apply the intermediates policy to a hierarchy
pub fn prune(hierarchy: &mut Hierarchy, policy: IntermediatesPolicy, required: &Signature) {
    let before = hierarchy.node_count();
    match policy {
        IntermediatesPolicy::All => {}
        IntermediatesPolicy::Minimal => prune_minimal(hierarchy, required),
        IntermediatesPolicy::None => prune_none(hierarchy, required),
    }
    if hierarchy.node_count() != before {
        debug!(
            policy = %policy,
            removed = before - hierarchy.node_count(),
            "pruned intermediate nodes"
        );
    }
}

/// `minimal`: remove a non-required node iff its sole retained parent
/// has it as its only retained child and the node does not branch
/// itself. Iterated to a fixpoint in sorted order so chains collapse
/// deterministically.
fn prune_minimal(hierarchy: &mut Hierarchy, required: &Signature) {
    loop {
        let mut removed = false;
        for node in hierarchy.nodes() {
            if required.contains(&node) || !hierarchy.contains(&node) {
                continue;
            }
            let parents = hierarchy.parents_of(&node);
            if parents.len() != 1 {
                continue;
            }
            if hierarchy.children_of(&parents[0]).len() != 1 {
                continue;
            }
            if hierarchy.children_of(&node).len() >= 2 {
                continue;
            }
            hierarchy.remove_reattach(&node);
            removed = true;
        }
        if !removed {
            return;
        }
    }
}

/// `none`: remove every non-required node that is strictly
/// transitional (at least one retained parent and one retained child),
/// leaving only requested terms plus hierarchy roots and leaves.
fn prune_none(hierarchy: &mut Hierarchy, required: &Signature) {
    loop {
        let mut removed = false;
        for node in hierarchy.nodes() {
            if required.contains(&node) || !hierarchy.contains(&node) {
                continue;
            }
            if hierarchy.parents_of(&node).is_empty() || hierarchy.children_of(&node).is_empty() {
                continue;
            }
            hierarchy.remove_reattach(&node);
            removed = true;
        }
        if !removed {
            return;
        }
    }
}

/// Replace the computed parent set of every override-carrying term,
/// then discard computed ancestors left dangling above the override
/// points.
pub fn apply_overrides(hierarchy: &mut Hierarchy, specs: &[TermSpec], anchors: &Signature) {
    let mut rewired = false;
    for spec in specs {
        if spec.parents.is_empty() {
            continue;
        }
        hierarchy.replace_parents(&spec.term, &spec.parents);
        rewired = true;
    }
    if rewired {
        hierarchy.retain_connected(anchors);
    }
}

/// Rebuild a module graph after its subsumption hierarchy was pruned:
/// subsumption edges come from the pruned hierarchy, axioms touching a
/// removed entity are dropped, and every surviving hierarchy node is
/// declared.
pub fn rewrite_module(module: &Graph, pruned: &Hierarchy, removed: &Signature) -> Graph {
    let mut out = Graph::new();
    out.set_iri(module.iri().cloned());

    for axiom in module.axioms() {
        if matches!(axiom, Axiom::SubClassOf { .. }) {
            continue;
        }
        if axiom.signature().iter().any(|e| removed.contains(e)) {
            continue;
        }
        out.insert(axiom.clone());
    }

    out.extend(pruned.to_subclass_axioms());

    // Override parents may come from outside the module; declare them.
    let declared = out.declared_entities();
    for node in pruned.nodes() {
        if !declared.contains(&node) {
            out.insert(Axiom::Declaration {
                kind: EntityKind::Class,
                entity: node,
            });
        }
    }

    out
}

// ============================================================================
// Tests
// ============================================================================

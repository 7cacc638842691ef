//! Hierarchy DAG
//!
//! A derived, directed acyclic structure of SubClassOf edges restricted
//! to a chosen entity subset. Nodes are addressed by stable indices so
//! removal with reattachment never invalidates live handles; multiple
//! parents per node are legal.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;

use omex_core::{Axiom, Iri, Signature};

/// A SubClassOf hierarchy with child→parent edges
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    dag: StableDiGraph<Iri, ()>,
    index: HashMap<Iri, NodeIndex>,
}

impl Hierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from the SubClassOf axioms of an axiom set
    pub fn from_subclass_axioms<'a>(axioms: impl Iterator<Item = &'a Axiom>) -> Self {
        let mut hierarchy = Self::new();
        for axiom in axioms {
            if let Axiom::SubClassOf { child, parent } = axiom {
                hierarchy.add_edge(child, parent);
            }
        }
        hierarchy
    }

    /// Add a node without any edges
    pub fn add_node(&mut self, iri: &Iri) {
        self.ensure(iri);
    }

    fn ensure(&mut self, iri: &Iri) -> NodeIndex {
        if let Some(ix) = self.index.get(iri) {
            return *ix;
        }
        let ix = self.dag.add_node(iri.clone());
        self.index.insert(iri.clone(), ix);
        ix
    }

    /// Add a child→parent edge; self-loops and duplicates are ignored
    pub fn add_edge(&mut self, child: &Iri, parent: &Iri) {
        let c = self.ensure(child);
        let p = self.ensure(parent);
        if c != p && self.dag.find_edge(c, p).is_none() {
            self.dag.add_edge(c, p, ());
        }
    }

    /// Whether the node is present
    pub fn contains(&self, iri: &Iri) -> bool {
        self.index.contains_key(iri)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.dag.node_count()
    }

    /// Whether the hierarchy has no nodes
    pub fn is_empty(&self) -> bool {
        self.dag.node_count() == 0
    }

    /// All nodes, sorted for deterministic iteration
    pub fn nodes(&self) -> Vec<Iri> {
        let mut nodes: Vec<Iri> = self.dag.node_weights().cloned().collect();
        nodes.sort();
        nodes
    }

    fn neighbors(&self, iri: &Iri, direction: Direction) -> Vec<Iri> {
        let Some(&ix) = self.index.get(iri) else {
            return Vec::new();
        };
        let mut result: Vec<Iri> = self
            .dag
            .neighbors_directed(ix, direction)
            .map(|n| self.dag[n].clone())
            .collect();
        result.sort();
        result
    }

    /// Retained parents of a node (sorted)
    pub fn parents_of(&self, iri: &Iri) -> Vec<Iri> {
        self.neighbors(iri, Direction::Outgoing)
    }

    /// Retained children of a node (sorted)
    pub fn children_of(&self, iri: &Iri) -> Vec<Iri> {
        self.neighbors(iri, Direction::Incoming)
    }

    /// All (child, parent) edges, sorted
    pub fn edges(&self) -> Vec<(Iri, Iri)> {
        let mut edges: Vec<(Iri, Iri)> = self
            .dag
            .edge_references()
            .map(|e| (self.dag[e.source()].clone(), self.dag[e.target()].clone()))
            .collect();
        edges.sort();
        edges
    }

    /// Remove a node, reattaching every retained child directly to
    /// every retained parent so reachability is preserved.
    pub fn remove_reattach(&mut self, iri: &Iri) {
        let Some(&ix) = self.index.get(iri) else {
            return;
        };
        let parents: Vec<NodeIndex> = self.dag.neighbors_directed(ix, Direction::Outgoing).collect();
        let children: Vec<NodeIndex> = self.dag.neighbors_directed(ix, Direction::Incoming).collect();

        for &child in &children {
            for &parent in &parents {
                if child != parent && self.dag.find_edge(child, parent).is_none() {
                    self.dag.add_edge(child, parent, ());
                }
            }
        }

        self.dag.remove_node(ix);
        self.index.remove(iri);
    }

    /// Replace the entire parent set of a term with the given parents
    pub fn replace_parents(&mut self, term: &Iri, parents: &[Iri]) {
        let ix = self.ensure(term);
        let existing: Vec<_> = self
            .dag
            .edges_directed(ix, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        for edge in existing {
            self.dag.remove_edge(edge);
        }
        for parent in parents {
            self.add_edge(term, parent);
        }
    }

    /// Drop every node that is neither an anchor, an ancestor of an
    /// anchor, nor a descendant of an anchor.
    pub fn retain_connected(&mut self, anchors: &Signature) {
        let mut keep: HashSet<NodeIndex> = HashSet::new();
        for direction in [Direction::Outgoing, Direction::Incoming] {
            let mut seen: HashSet<NodeIndex> = HashSet::new();
            let mut stack: Vec<NodeIndex> = anchors
                .iter()
                .filter_map(|iri| self.index.get(iri).copied())
                .collect();
            while let Some(ix) = stack.pop() {
                if !seen.insert(ix) {
                    continue;
                }
                keep.insert(ix);
                for next in self.dag.neighbors_directed(ix, direction) {
                    if !seen.contains(&next) {
                        stack.push(next);
                    }
                }
            }
        }

        let dropped: Vec<(NodeIndex, Iri)> = self
            .dag
            .node_indices()
            .filter(|ix| !keep.contains(ix))
            .map(|ix| (ix, self.dag[ix].clone()))
            .collect();
        for (ix, iri) in dropped {
            self.dag.remove_node(ix);
            self.index.remove(&iri);
        }
    }

    /// The node set as a signature
    pub fn signature(&self) -> Signature {
        self.dag.node_weights().cloned().collect::<BTreeSet<_>>()
    }

    /// Render the retained edges back into SubClassOf axioms
    pub fn to_subclass_axioms(&self) -> Vec<Axiom> {
        self.edges()
            .into_iter()
            .map(|(child, parent)| Axiom::SubClassOf { child, parent })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

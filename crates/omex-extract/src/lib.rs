//! Omex Extract - Ontology module extraction engine
//!
//! Implements the extraction pipeline:
//! - Term resolution (identifiers, short codes, labels)
//! - MIREOT hierarchy traversal between upper/lower/branch boundaries
//! - Logic-preserving module extraction orchestration (STAR/TOP/BOT)
//! - Intermediate-node pruning
//! - Source and annotation augmentation
//! - The batch config driver
//!
//! Each extraction job is a synchronous pipeline over read-only source
//! graphs; every derived structure is newly constructed per job.

pub mod annotate;
pub mod batch;
pub mod hierarchy;
pub mod mireot;
pub mod module;
pub mod prune;
pub mod resolve;

pub use annotate::{AnnotationDirective, DirectiveAction, SourceMap};
pub use batch::{parse_config, BatchDriver, ImportJob, RawLine};
pub use hierarchy::Hierarchy;
pub use module::SyntacticProvider;
pub use resolve::{LabelIndex, Resolver, TermSpec};

use omex_core::{
    Graph, ImportsPolicy, IndividualsPolicy, IntermediatesPolicy, Iri, ModuleProvider,
    ModuleStrategy, OmexError, Result, Signature,
};

// ============================================================================
// Extraction Entry Point
// ============================================================================

/// The resolved seed terms of one extraction job, partitioned by role
#[derive(Debug, Clone, Default)]
pub struct SeedTerms {
    /// Generic seed terms (SLME-family strategies)
    pub terms: Vec<TermSpec>,

    /// Lower-bound terms (MIREOT)
    pub lower: Vec<TermSpec>,

    /// Upper-bound terms (MIREOT)
    pub upper: Vec<TermSpec>,

    /// Branch-from terms (MIREOT)
    pub branch: Vec<TermSpec>,
}

impl SeedTerms {
    /// Create an empty seed set
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed set for an SLME-family extraction
    pub fn from_terms(terms: Vec<TermSpec>) -> Self {
        Self {
            terms,
            ..Self::default()
        }
    }

    /// Whether no terms at all were supplied
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
            && self.lower.is_empty()
            && self.upper.is_empty()
            && self.branch.is_empty()
    }

    fn all(&self) -> impl Iterator<Item = &TermSpec> {
        self.terms
            .iter()
            .chain(self.lower.iter())
            .chain(self.upper.iter())
            .chain(self.branch.iter())
    }

    /// Every explicitly requested term; these are never pruned
    pub fn required(&self) -> Signature {
        self.all().map(|spec| spec.term.clone()).collect()
    }

    /// Terms carrying override parents
    pub fn override_specs(&self) -> Vec<TermSpec> {
        self.all()
            .filter(|spec| !spec.parents.is_empty())
            .cloned()
            .collect()
    }
}

/// Per-job extraction options
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub strategy: ModuleStrategy,
    pub imports: ImportsPolicy,
    pub individuals: IndividualsPolicy,
    pub intermediates: IntermediatesPolicy,
    pub annotate_with_source: bool,
    pub copy_ontology_annotations: bool,
    /// Proceed with whatever valid seeds remain instead of failing on
    /// an empty seed signature
    pub force: bool,
    pub source_map: SourceMap,
    pub annotations: Vec<AnnotationDirective>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strategy: ModuleStrategy::Star,
            imports: ImportsPolicy::default(),
            individuals: IndividualsPolicy::default(),
            intermediates: IntermediatesPolicy::default(),
            annotate_with_source: false,
            copy_ontology_annotations: false,
            force: false,
            source_map: SourceMap::new(),
            annotations: Vec::new(),
        }
    }
}

/// Run one extraction job: resolve the effective axiom view, compute
/// the MIREOT hierarchy or delegate to the module provider, prune
/// intermediates, and augment annotations. The source graph is only
/// read; the result is a newly constructed graph.
pub fn extract(
    source: &Graph,
    seeds: &SeedTerms,
    options: &ExtractOptions,
    provider: &dyn ModuleProvider,
) -> Result<Graph> {
    let bounds_given =
        !(seeds.lower.is_empty() && seeds.upper.is_empty() && seeds.branch.is_empty());
    if options.strategy != ModuleStrategy::Mireot && bounds_given {
        return Err(OmexError::InvalidOption(
            "lower, upper, and branch-from terms can only be combined with the mireot strategy"
                .to_string(),
        ));
    }
    if options.strategy == ModuleStrategy::Mireot && !seeds.terms.is_empty() {
        return Err(OmexError::InvalidOption(
            "generic seed terms cannot be combined with the mireot strategy; use lower, upper, or branch-from terms"
                .to_string(),
        ));
    }

    let view = source.view(options.imports);
    let required = seeds.required();
    let overrides = seeds.override_specs();

    let mut output = match options.strategy {
        ModuleStrategy::Mireot => {
            let lower: Vec<Iri> = seeds.lower.iter().map(|s| s.term.clone()).collect();
            let upper: Vec<Iri> = seeds.upper.iter().map(|s| s.term.clone()).collect();
            let branch: Vec<Iri> = seeds.branch.iter().map(|s| s.term.clone()).collect();

            let mut h = mireot::hierarchy(&view, &lower, &upper, &branch)?;
            prune::apply_overrides(&mut h, &overrides, &required);
            prune::prune(&mut h, options.intermediates, &required);
            mireot::hierarchy_graph(&h, &view)
        }
        _ => {
            let module = module::extract_module(&view, &seeds.terms, options, provider)?;
            if options.intermediates == IntermediatesPolicy::All && overrides.is_empty() {
                module
            } else {
                let mut h = Hierarchy::from_subclass_axioms(module.axioms());
                let module_signature = module.signature();
                for spec in &seeds.terms {
                    if module_signature.contains(&spec.term) {
                        h.add_node(&spec.term);
                    }
                }
                let before = h.signature();
                prune::apply_overrides(&mut h, &overrides, &required);
                prune::prune(&mut h, options.intermediates, &required);
                let after = h.signature();
                let removed: Signature = before.difference(&after).cloned().collect();
                prune::rewrite_module(&module, &h, &removed)
            }
        }
    };

    annotate::apply_directives(&mut output, &view, &options.annotations);
    if options.annotate_with_source {
        annotate::annotate_with_source(&mut output, &options.source_map);
    }
    if options.copy_ontology_annotations {
        annotate::copy_ontology_annotations(&mut output, source);
    }

    Ok(output)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use omex_core::Axiom;

    fn iri(s: &str) -> Iri {
        Iri::new(s)
    }

    fn sub(child: &str, parent: &str) -> Axiom {
        Axiom::SubClassOf {
            child: iri(child),
            parent: iri(parent),
        }
    }

    #[test]
    fn test_bounds_require_mireot_strategy() {
        let mut graph = Graph::new();
        graph.insert(sub("a", "b"));

        let seeds = SeedTerms {
            lower: vec![TermSpec::new(iri("a"))],
            ..SeedTerms::default()
        };
        let options = ExtractOptions {
            strategy: ModuleStrategy::Star,
            ..ExtractOptions::default()
        };

        assert!(matches!(
            extract(&graph, &seeds, &options, &SyntacticProvider::new()),
            Err(OmexError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_generic_terms_rejected_for_mireot() {
        let mut graph = Graph::new();
        graph.insert(sub("a", "b"));

        let seeds = SeedTerms::from_terms(vec![TermSpec::new(iri("a"))]);
        let options = ExtractOptions {
            strategy: ModuleStrategy::Mireot,
            ..ExtractOptions::default()
        };

        assert!(matches!(
            extract(&graph, &seeds, &options, &SyntacticProvider::new()),
            Err(OmexError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_mireot_pipeline_with_minimal_intermediates() {
        // The documented worked example: SubClassOf(A,B), SubClassOf(B,C),
        // SubClassOf(D,B); lower = A, upper = C. B has exactly one
        // retained child, so minimal pruning removes it.
        let mut graph = Graph::new();
        graph.insert(sub("a", "b"));
        graph.insert(sub("b", "c"));
        graph.insert(sub("d", "b"));

        let seeds = SeedTerms {
            lower: vec![TermSpec::new(iri("a"))],
            upper: vec![TermSpec::new(iri("c"))],
            ..SeedTerms::default()
        };
        let options = ExtractOptions {
            strategy: ModuleStrategy::Mireot,
            intermediates: IntermediatesPolicy::Minimal,
            ..ExtractOptions::default()
        };

        let out = extract(&graph, &seeds, &options, &SyntacticProvider::new()).unwrap();

        assert!(out.contains(&sub("a", "c")));
        assert!(!out.signature().contains(&iri("b")));
        assert!(!out.signature().contains(&iri("d")));
    }

    #[test]
    fn test_module_pipeline_with_override_parents() {
        let mut graph = Graph::new();
        graph.insert(sub("a", "b"));
        graph.insert(sub("b", "c"));

        let spec = TermSpec::new(iri("a")).with_parents(vec![iri("target-parent")]);
        let seeds = SeedTerms::from_terms(vec![spec]);
        let options = ExtractOptions {
            strategy: ModuleStrategy::Bot,
            ..ExtractOptions::default()
        };

        let out = extract(&graph, &seeds, &options, &SyntacticProvider::new()).unwrap();

        assert!(out.contains(&sub("a", "target-parent")));
        assert!(!out.signature().contains(&iri("b")));
        assert!(!out.signature().contains(&iri("c")));
    }
}

//! Term Resolver
//!
//! Turns user-supplied tokens (full identifiers, short codes, quoted
//! labels) and term-list files into canonical entity identifiers
//! against a loaded graph. Label lookups fall back to an optional
//! secondary "target" graph, used for override parents and annotation
//! properties that live in the generated import's destination.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use omex_core::{
    is_absolute_iri, unwrap_iri_token, AxiomView, Iri, OmexError, PrefixTable, Result,
};

// ============================================================================
// Term Specs
// ============================================================================

/// A resolved term together with its override parents.
///
/// Override parents, when present, replace the computed parent set for
/// the term entirely. Terms carrying overrides (and pinned terms) are
/// exempt from intermediate pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSpec {
    /// The resolved term
    pub term: Iri,

    /// Override parents from config, replacing computed parents
    pub parents: Vec<Iri>,

    /// Whether the term is explicitly pruning-exempt
    pub pinned: bool,
}

impl TermSpec {
    /// Create a spec with no overrides
    pub fn new(term: Iri) -> Self {
        Self {
            term,
            parents: Vec::new(),
            pinned: false,
        }
    }

    /// Set override parents
    pub fn with_parents(mut self, parents: Vec<Iri>) -> Self {
        self.pinned = self.pinned || !parents.is_empty();
        self.parents = parents;
        self
    }

    /// Mark the term pruning-exempt
    pub fn pin(mut self) -> Self {
        self.pinned = true;
        self
    }
}

// ============================================================================
// Label Index
// ============================================================================

/// Case-sensitive label → entity lookup built from `rdfs:label`
/// annotation assertions. Constructed explicitly per graph; never
/// shared ambient state.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: HashMap<String, Vec<Iri>>,
}

impl LabelIndex {
    /// Build an index over every label visible in the view
    pub fn from_view(view: &AxiomView<'_>) -> Self {
        let mut index = Self::default();
        for (subject, label) in view.labels() {
            let entry = index.labels.entry(label.to_string()).or_default();
            if !entry.contains(subject) {
                entry.push(subject.clone());
            }
        }
        index
    }

    /// Entities carrying the label, in first-seen order
    pub fn lookup(&self, label: &str) -> &[Iri] {
        self.labels.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves raw tokens to entity identifiers.
///
/// Resolution order: exact full identifier, short-code expansion via
/// the prefix table, exact label match (reference graph first, then the
/// target graph when provided). Ambiguity is surfaced, never silently
/// resolved first-seen.
pub struct Resolver<'a> {
    prefixes: &'a PrefixTable,
    labels: LabelIndex,
    target_labels: Option<LabelIndex>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the reference graph's view
    pub fn new(prefixes: &'a PrefixTable, reference: &AxiomView<'_>) -> Self {
        Self {
            prefixes,
            labels: LabelIndex::from_view(reference),
            target_labels: None,
        }
    }

    /// Attach a target graph for label-only fallback lookups
    pub fn with_target(mut self, target: &AxiomView<'_>) -> Self {
        self.target_labels = Some(LabelIndex::from_view(target));
        self
    }

    /// Resolve one raw token to exactly one entity identifier
    pub fn resolve(&self, token: &str) -> Result<Iri> {
        let token = token.trim();
        if token.is_empty() {
            return Err(OmexError::UnresolvedTerm(String::new()));
        }

        // A single-quoted token is always a label.
        if let Some(label) = quoted_label(token) {
            return self.resolve_label(label);
        }

        if is_absolute_iri(token) {
            return Ok(Iri::new(unwrap_iri_token(token)));
        }

        if let Some(iri) = self.prefixes.expand(token) {
            return Ok(iri);
        }

        self.resolve_label(token)
    }

    fn resolve_label(&self, label: &str) -> Result<Iri> {
        match self.labels.lookup(label) {
            [] => {}
            [single] => return Ok(single.clone()),
            many => {
                return Err(OmexError::AmbiguousTerm {
                    label: label.to_string(),
                    count: many.len(),
                })
            }
        }

        if let Some(target) = &self.target_labels {
            match target.lookup(label) {
                [] => {}
                [single] => return Ok(single.clone()),
                many => {
                    return Err(OmexError::AmbiguousTerm {
                        label: label.to_string(),
                        count: many.len(),
                    })
                }
            }
        }

        Err(OmexError::UnresolvedTerm(label.to_string()))
    }

    /// Parse one term line: first column is the term, remaining columns
    /// are override parents.
    pub fn parse_term_line(&self, line: &str) -> Result<TermSpec> {
        let columns = split_columns(line);
        let Some(first) = columns.first() else {
            return Err(OmexError::UnresolvedTerm(line.to_string()));
        };

        let term = self.resolve(first)?;
        let mut parents = Vec::new();
        for column in &columns[1..] {
            if column.trim().is_empty() {
                continue;
            }
            parents.push(self.resolve(column)?);
        }

        Ok(TermSpec::new(term).with_parents(parents))
    }

    /// Parse a term-list document: newline-delimited tokens, blank
    /// lines and `#` full-line comments ignored, tab-separated override
    /// parents, labels single-quoted when they contain a tab.
    pub fn parse_term_list(&self, text: &str) -> Result<Vec<TermSpec>> {
        let mut specs = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let spec = self.parse_term_line(line).map_err(|e| e.at_line(i + 1))?;
            specs.push(spec);
        }
        Ok(specs)
    }
}

/// Strip single-quote wrapping, if present
fn quoted_label(token: &str) -> Option<&str> {
    if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

/// Split a line into tab-separated columns. Tabs inside single-quoted
/// tokens are literal; the quotes themselves stay with the column so
/// resolution still sees a label token.
pub fn split_columns(line: &str) -> Vec<String> {
    let mut columns = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '\'' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '\t' if !in_quotes => {
                columns.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        columns.push(current);
    }

    columns
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use omex_core::{AnnotationValue, Axiom, Graph, ImportsPolicy, vocab};

    fn iri(s: &str) -> Iri {
        Iri::new(s)
    }

    fn label(subject: &str, text: &str) -> Axiom {
        Axiom::AnnotationAssertion {
            subject: iri(subject),
            property: iri(vocab::RDFS_LABEL),
            value: AnnotationValue::Literal(text.to_string()),
        }
    }

    fn labeled_graph(entries: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (subject, text) in entries {
            graph.insert(label(subject, text));
        }
        graph
    }

    #[test]
    fn test_resolution_order() {
        let prefixes = PrefixTable::with_defaults();
        let graph = labeled_graph(&[("http://purl.obolibrary.org/obo/GO_0005634", "nucleus")]);
        let view = graph.view(ImportsPolicy::Exclude);
        let resolver = Resolver::new(&prefixes, &view);

        let full = resolver.resolve("http://purl.obolibrary.org/obo/GO_0005634").unwrap();
        let curie = resolver.resolve("GO:0005634").unwrap();
        let by_label = resolver.resolve("nucleus").unwrap();

        assert_eq!(full, curie);
        assert_eq!(full, by_label);
    }

    #[test]
    fn test_quoted_token_is_always_a_label() {
        let prefixes = PrefixTable::with_defaults();
        // The label itself looks like a CURIE; quoting must force label lookup.
        let graph = labeled_graph(&[("http://example.com/x", "GO:0001")]);
        let view = graph.view(ImportsPolicy::Exclude);
        let resolver = Resolver::new(&prefixes, &view);

        assert_eq!(resolver.resolve("'GO:0001'").unwrap(), iri("http://example.com/x"));
        // Unquoted, the same token expands as a short code instead.
        assert_eq!(
            resolver.resolve("GO:0001").unwrap(),
            iri("http://purl.obolibrary.org/obo/GO_0001")
        );
    }

    #[test]
    fn test_ambiguous_label_is_surfaced() {
        let prefixes = PrefixTable::with_defaults();
        let graph = labeled_graph(&[("http://example.com/a", "cell"), ("http://example.com/b", "cell")]);
        let view = graph.view(ImportsPolicy::Exclude);
        let resolver = Resolver::new(&prefixes, &view);

        match resolver.resolve("cell") {
            Err(OmexError::AmbiguousTerm { label, count }) => {
                assert_eq!(label, "cell");
                assert_eq!(count, 2);
            }
            other => panic!("expected ambiguity error, got {other:?}"),
        }
    }

    #[test]
    fn test_target_graph_fallback() {
        let prefixes = PrefixTable::with_defaults();
        let reference = labeled_graph(&[("http://example.com/a", "alpha")]);
        let target = labeled_graph(&[("http://example.com/t", "material entity")]);
        let ref_view = reference.view(ImportsPolicy::Exclude);
        let target_view = target.view(ImportsPolicy::Exclude);

        let resolver = Resolver::new(&prefixes, &ref_view).with_target(&target_view);
        assert_eq!(
            resolver.resolve("material entity").unwrap(),
            iri("http://example.com/t")
        );
        assert!(matches!(
            resolver.resolve("no such label"),
            Err(OmexError::UnresolvedTerm(_))
        ));
    }

    #[test]
    fn test_term_list_parsing() {
        let prefixes = PrefixTable::with_defaults();
        let graph = labeled_graph(&[
            ("http://purl.obolibrary.org/obo/GO_0005634", "nucleus"),
            ("http://example.com/t", "material entity"),
        ]);
        let view = graph.view(ImportsPolicy::Exclude);
        let resolver = Resolver::new(&prefixes, &view);

        let text = "# seed terms\n\nGO:0005634\tmaterial entity\nnucleus\n";
        let specs = resolver.parse_term_list(text).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].parents, vec![iri("http://example.com/t")]);
        assert!(specs[0].pinned);
        assert!(specs[1].parents.is_empty());
    }

    #[test]
    fn test_term_list_errors_carry_line_numbers() {
        let prefixes = PrefixTable::with_defaults();
        let graph = labeled_graph(&[]);
        let view = graph.view(ImportsPolicy::Exclude);
        let resolver = Resolver::new(&prefixes, &view);

        let err = resolver.parse_term_list("# ok\nmissing label\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_quoted_label_with_tab() {
        let columns = split_columns("'alpha\tbeta'\tGO:0001");
        assert_eq!(columns, vec!["'alpha\tbeta'".to_string(), "GO:0001".to_string()]);
    }
}

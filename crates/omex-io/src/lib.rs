//! Omex IO - Graph documents on disk
//!
//! Loads and saves graphs as JSON documents:
//!
//! ```json
//! {
//!   "iri": "http://example.com/go-import",
//!   "imports": ["upper.json"],
//!   "axioms": [
//!     {"type": "sub_class_of", "child": "...", "parent": "..."}
//!   ]
//! }
//! ```
//!
//! Import references are file paths resolved relative to the document
//! that declares them; the loader materializes the whole closure up
//! front and rejects cycles. Generated imports are self-contained, so
//! the writer emits no import references.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use omex_core::{Axiom, Graph, GraphLoader, GraphWriter, Iri, OmexError, Result};

// ============================================================================
// Document Model
// ============================================================================

/// On-disk shape of a graph document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphDocument {
    /// Identifying IRI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iri: Option<Iri>,

    /// Relative or absolute paths of imported documents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    imports: Vec<String>,

    /// The asserted axioms
    #[serde(default)]
    axioms: Vec<Axiom>,
}

// ============================================================================
// Loader
// ============================================================================

/// Loads JSON graph documents, materializing the import closure
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl JsonLoader {
    /// Create a loader
    pub fn new() -> Self {
        Self
    }

    fn load_document(&self, path: &Path, in_flight: &mut BTreeSet<PathBuf>) -> Result<Graph> {
        let canonical = path
            .canonicalize()
            .map_err(|e| load_error(path, format!("unreachable: {e}")))?;
        if !in_flight.insert(canonical.clone()) {
            return Err(load_error(path, "cyclic import".to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| load_error(path, format!("unreadable: {e}")))?;
        let document: GraphDocument = serde_json::from_str(&content)
            .map_err(|e| load_error(path, format!("malformed document: {e}")))?;

        let mut graph = Graph::new();
        graph.set_iri(document.iri);
        graph.extend(document.axioms);

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for import in &document.imports {
            let import_path = base.join(import);
            let imported = self.load_document(&import_path, in_flight)?;
            graph.add_import(imported);
        }

        in_flight.remove(&canonical);
        debug!(
            path = %path.display(),
            axioms = graph.axiom_count(),
            imports = graph.imports().len(),
            "loaded graph document"
        );
        Ok(graph)
    }
}

impl GraphLoader for JsonLoader {
    fn load(&self, spec: &str) -> Result<Graph> {
        let mut in_flight = BTreeSet::new();
        self.load_document(Path::new(spec), &mut in_flight)
    }
}

fn load_error(path: &Path, message: String) -> OmexError {
    OmexError::Load {
        spec: path.display().to_string(),
        message,
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Writes graphs as pretty-printed JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl JsonWriter {
    /// Create a writer
    pub fn new() -> Self {
        Self
    }
}

impl GraphWriter for JsonWriter {
    fn save(&self, graph: &Graph, spec: &str) -> Result<()> {
        let path = Path::new(spec);
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !extension.eq_ignore_ascii_case("json") {
            return Err(OmexError::Save {
                spec: spec.to_string(),
                message: format!("unsupported output format '{extension}'"),
            });
        }

        let document = GraphDocument {
            iri: graph.iri().cloned(),
            imports: Vec::new(),
            axioms: graph.axioms().cloned().collect(),
        };
        let content = serde_json::to_string_pretty(&document).map_err(|e| OmexError::Save {
            spec: spec.to_string(),
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| OmexError::Save {
                    spec: spec.to_string(),
                    message: e.to_string(),
                })?;
            }
        }
        std::fs::write(path, content).map_err(|e| OmexError::Save {
            spec: spec.to_string(),
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), axioms = graph.axiom_count(), "saved graph document");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a graph from an in-memory JSON document (no import resolution)
pub fn graph_from_str(content: &str) -> Result<Graph> {
    let document: GraphDocument = serde_json::from_str(content).map_err(|e| OmexError::Load {
        spec: "<inline>".to_string(),
        message: format!("malformed document: {e}"),
    })?;
    if let Some(import) = document.imports.first() {
        return Err(OmexError::Load {
            spec: "<inline>".to_string(),
            message: format!("inline documents cannot declare imports ('{import}')"),
        });
    }
    let mut graph = Graph::new();
    graph.set_iri(document.iri);
    graph.extend(document.axioms);
    Ok(graph)
}

/// Serialize a graph to a JSON string
pub fn graph_to_string(graph: &Graph) -> Result<String> {
    let document = GraphDocument {
        iri: graph.iri().cloned(),
        imports: Vec::new(),
        axioms: graph.axioms().cloned().collect(),
    };
    serde_json::to_string_pretty(&document).map_err(|e| OmexError::Save {
        spec: "<inline>".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_document_parsing() {
        let graph = graph_from_str(
            r#"{
                "iri": "http://example.com/x",
                "axioms": [
                    {"type": "sub_class_of", "child": "a", "parent": "b"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(graph.iri().unwrap(), &Iri::new("http://example.com/x"));
        assert_eq!(graph.axiom_count(), 1);
    }

    #[test]
    fn test_inline_document_rejects_imports() {
        let err = graph_from_str(r#"{"imports": ["other.json"], "axioms": []}"#).unwrap_err();
        assert!(matches!(err, OmexError::Load { .. }));
    }

    #[test]
    fn test_writer_rejects_unknown_extension() {
        let err = JsonWriter::new().save(&Graph::new(), "out.owl").unwrap_err();
        assert!(matches!(err, OmexError::Save { .. }));
        assert!(err.to_string().contains("owl"));
    }
}

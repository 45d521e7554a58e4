//! Reading and writing graph documents on disk.
//!
//! The interchange format is the JSON `GraphDocument` shape; parse failures
//! are a [`FormatError`] so callers can keep their in-memory state and show
//! a message instead of dying.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::graph::error::FormatError;
use crate::graph::model::GraphDocument;

pub const DEFAULT_FILE: &str = "factree.json";

/// Resolve the document path an invocation should use.
pub fn document_path(arg: Option<&Path>) -> PathBuf {
    arg.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE))
}

/// The config file lives next to the document it configures.
pub fn config_path(document: &Path) -> PathBuf {
    document.with_extension("config.json")
}

/// Parse document text. Anything that is not our JSON shape is a
/// [`FormatError`]; nothing is partially applied.
pub fn parse_document(text: &str) -> Result<GraphDocument, FormatError> {
    Ok(serde_json::from_str(text)?)
}

/// Pretty-print a document for saving or display.
pub fn format_document(doc: &GraphDocument) -> String {
    // GraphDocument always serializes; the value contains no non-string keys
    // or other constructs serde_json can reject.
    serde_json::to_string_pretty(doc).expect("document serialization cannot fail")
}

pub fn read_document(path: &Path) -> Result<GraphDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = parse_document(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    log::debug!("read {} ({} nodes)", path.display(), doc.nodes.len());
    Ok(doc)
}

pub fn write_document(path: &Path, doc: &GraphDocument) -> Result<()> {
    fs::write(path, format_document(doc))
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote {} ({} nodes)", path.display(), doc.nodes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::demo_document;
    use tempfile::TempDir;

    #[test]
    fn documents_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        let doc = demo_document();
        write_document(&path, &doc).unwrap();
        let read = read_document(&path).unwrap();
        assert_eq!(read, doc);
    }

    #[test]
    fn junk_text_is_a_format_error() {
        assert!(parse_document("not even json").is_err());
        assert!(parse_document(r#"{"nodes": "wrong shape"}"#).is_err());
    }

    #[test]
    fn links_field_is_optional_on_input() {
        let doc = parse_document(
            r#"{"nodes":[{"id":"a","parentId":"","name":"A","fact":""}]}"#,
        )
        .unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.links.is_empty());
    }

    #[test]
    fn config_path_sits_next_to_the_document() {
        let path = config_path(Path::new("maps/food.json"));
        assert_eq!(path, Path::new("maps/food.config.json"));
    }

    #[test]
    fn document_path_defaults_when_unset() {
        assert_eq!(document_path(None), PathBuf::from(DEFAULT_FILE));
        assert_eq!(
            document_path(Some(Path::new("x.json"))),
            PathBuf::from("x.json")
        );
    }
}

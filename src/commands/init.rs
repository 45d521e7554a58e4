//! `factree init` — write a starter document.

use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;

use crate::graph::model::demo_document;
use crate::store;

pub fn run(file: Option<&Path>) -> Result<()> {
    let path = store::document_path(file);
    if path.exists() {
        bail!(
            "{} already exists. Open it with `factree view {}`.",
            path.display(),
            path.display()
        );
    }

    store::write_document(&path, &demo_document())?;
    println!(
        "  {} {} with the starter graph",
        "Created".green().bold(),
        path.display().to_string().cyan()
    );
    println!(
        "  {} factree view {}",
        "Run".green().bold(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_writes_a_loadable_starter_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("factree.json");
        run(Some(&path)).unwrap();
        let doc = store::read_document(&path).unwrap();
        assert_eq!(doc.nodes.len(), 10);
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("factree.json");
        run(Some(&path)).unwrap();
        assert!(run(Some(&path)).is_err());
    }
}

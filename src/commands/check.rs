//! `factree check` — validate a document and report dangling lines.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use crate::graph::model::GraphDocument;
use crate::graph::tree;
use crate::store;

pub fn run(file: Option<&Path>) -> Result<()> {
    let path = store::document_path(file);
    let doc = store::read_document(&path)?;

    tree::build(&doc.nodes)
        .with_context(|| format!("{} does not describe a valid tree", path.display()))?;

    println!(
        "  {} {} nodes, {} lines, single-rooted tree",
        "Ok".green().bold(),
        doc.nodes.len(),
        doc.links.len()
    );

    let dangling = dangling_lines(&doc);
    if dangling.is_empty() {
        return Ok(());
    }
    for (source, target, missing) in dangling {
        println!(
            "  {} line {} ─ {} references missing node '{}'",
            "Warning".yellow().bold(),
            source,
            target,
            missing
        );
    }
    println!("  Dangling lines are kept in the file but never drawn.");
    Ok(())
}

/// Lines whose endpoints do not all resolve, with the missing id.
fn dangling_lines(doc: &GraphDocument) -> Vec<(String, String, String)> {
    let ids: HashSet<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut out = Vec::new();
    for link in &doc.links {
        for end in [&link.source_id, &link.target_id] {
            if !ids.contains(end.as_str()) {
                out.push((link.source_id.clone(), link.target_id.clone(), end.clone()));
            }
        }
    }
    out
}

//! `factree list` — print all extra lines in document order.

use std::path::Path;

use anyhow::Result;

use crate::graph::model::GraphDocument;
use crate::store;

pub fn run(file: Option<&Path>) -> Result<()> {
    let doc = store::read_document(&store::document_path(file))?;

    let lines = list_lines(&doc);
    if lines.is_empty() {
        println!("  No lines.");
    } else {
        for line in lines {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn list_lines(doc: &GraphDocument) -> Vec<String> {
    doc.links
        .iter()
        .map(|link| {
            if link.joining_fact.is_empty() {
                format!("{} ─ {} :", link.source_id, link.target_id)
            } else {
                format!(
                    "{} ─ {} : {}",
                    link.source_id, link.target_id, link.joining_fact
                )
            }
        })
        .collect()
}

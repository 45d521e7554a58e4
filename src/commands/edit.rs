//! `factree edit` — open the document in an editor.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

use crate::store;

pub fn run(file: Option<&Path>) -> Result<()> {
    let path = store::document_path(file);
    if !path.exists() {
        bail!(
            "{} does not exist. Run `factree init` first.",
            path.display()
        );
    }
    let editor = resolve_editor();

    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("no editor configured for `factree edit`"))?;
    let args: Vec<String> = parts.map(ToString::to_string).collect();

    let status = Command::new(program)
        .args(&args)
        .arg(&path)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("failed to launch editor {:?} for {}", editor, path.display()))?;

    if !status.success() {
        bail!("editor exited with status {}", status);
    }

    Ok(())
}

fn resolve_editor() -> String {
    for var in ["FACTREE_EDITOR", "VISUAL", "EDITOR"] {
        if let Some(e) = std::env::var(var).ok().filter(|v| !v.trim().is_empty()) {
            return e;
        }
    }
    if cfg!(windows) {
        "notepad".to_string()
    } else {
        "vi".to_string()
    }
}

//! Editor configuration, persisted as JSON next to the graph document.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::graph::layout::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Canvas width the base layout spreads across.
    pub canvas_width: f64,
    /// Canvas height; the layout uses `canvas_height - top_margin`.
    pub canvas_height: f64,
    pub top_margin: f64,
    /// Draw joining-fact captions on extra lines.
    pub show_captions: bool,
    /// Write the document back automatically when the viewer quits.
    pub autosave: bool,
}

impl Default for Config {
    fn default() -> Self {
        let layout = LayoutConfig::default();
        Self {
            canvas_width: layout.width,
            canvas_height: layout.height,
            top_margin: layout.top_margin,
            show_captions: true,
            autosave: true,
        }
    }
}

impl Config {
    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            width: self.canvas_width,
            height: self.canvas_height,
            top_margin: self.top_margin,
        }
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).expect("config serialization cannot fail");
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }
}

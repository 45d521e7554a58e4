use std::path::Path;

use anyhow::Result;

use crate::tui::canvas;

pub fn run(file: Option<&Path>, demo: bool) -> Result<()> {
    canvas::run(file, demo, false)
}

pub fn run_setup(file: Option<&Path>) -> Result<()> {
    canvas::run(file, false, true)
}

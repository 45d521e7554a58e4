mod commands;
mod config;
mod graph;
mod session;
mod store;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "factree",
    about = "An interactive concept-map editor for the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a starter document
    Init {
        /// Document path (defaults to factree.json)
        file: Option<PathBuf>,
    },
    /// Open the interactive canvas
    View {
        /// Document path (defaults to factree.json)
        file: Option<PathBuf>,
        /// Launch with the built-in sample graph (nothing is written)
        #[arg(long)]
        demo: bool,
    },
    /// Validate a document and report dangling lines
    Check {
        /// Document path (defaults to factree.json)
        file: Option<PathBuf>,
    },
    /// Print all extra lines in document order
    List {
        /// Document path (defaults to factree.json)
        file: Option<PathBuf>,
    },
    /// Open the document in your editor
    Edit {
        /// Document path (defaults to factree.json)
        file: Option<PathBuf>,
    },
    /// Open the canvas with the settings panel up
    Setup {
        /// Document path (defaults to factree.json)
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Init { file } => commands::init::run(file.as_deref()),
        Command::View { file, demo } => commands::view::run(file.as_deref(), demo),
        Command::Check { file } => commands::check::run(file.as_deref()),
        Command::List { file } => commands::list::run(file.as_deref()),
        Command::Edit { file } => commands::edit::run(file.as_deref()),
        Command::Setup { file } => commands::view::run_setup(file.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_accepts_demo_flag() {
        let cli = Cli::try_parse_from(["factree", "view", "--demo"]).expect("should parse");
        match cli.command {
            Command::View { demo, file } => {
                assert!(demo);
                assert!(file.is_none());
            }
            _ => panic!("expected view command"),
        }
    }

    #[test]
    fn subcommands_take_an_optional_file() {
        let cli = Cli::try_parse_from(["factree", "check", "maps/food.json"])
            .expect("should parse");
        match cli.command {
            Command::Check { file } => {
                assert_eq!(file, Some(PathBuf::from("maps/food.json")));
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn unknown_subcommands_are_rejected() {
        assert!(Cli::try_parse_from(["factree", "frobnicate"]).is_err());
    }
}

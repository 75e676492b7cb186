//! CLI for refscope.
//!
//! Commands:
//! - Explore: summary, classes, methods, calls, refs, lexer
//! - Dependencies: file-deps, class-deps
//! - Export: export <report>

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::execute;

#[derive(Parser, Debug)]
#[command(name = "refscope")]
#[command(about = "Query and export entity/reference graphs of code databases")]
pub struct Cli {
    /// Configuration file (default: refscope.toml next to the snapshot)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database snapshot (.json, or bincode for any other extension)
    pub snapshot: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config file to load: the explicit one, else `refscope.toml` beside
    /// the snapshot.
    pub fn config_path(&self) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => self
                .snapshot
                .parent()
                .map(|dir| dir.join("refscope.toml"))
                .unwrap_or_else(|| PathBuf::from("refscope.toml")),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    // ─── Explore ─────────────────────────────────────────────────────
    /// Database name, languages, classes and methods
    Summary,

    /// List classes with their kinds
    Classes,

    /// Methods defined by a class
    Methods {
        /// Class short name
        class: String,
    },

    /// Callees and callers of a method
    Calls {
        /// Method short name
        method: String,
    },

    /// Every reference of a variable
    Refs {
        /// Variable short name
        variable: String,
    },

    /// Meaningful tokens of a file, with the entities they resolve to
    Lexer {
        /// File short name
        file: String,

        /// Max tokens (default: display.token_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    // ─── Dependencies ────────────────────────────────────────────────
    /// File-to-file dependencies
    FileDeps,

    /// Class-to-class dependencies, both directions
    ClassDeps,

    // ─── Export ──────────────────────────────────────────────────────
    /// Export a report as delimited text
    Export {
        /// classes, methods, calls, calledby, depends or refs
        report: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Kind filter for the report scope (default: per report)
        #[arg(short, long)]
        filter: Option<String>,
    },
}

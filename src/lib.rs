//! # refscope
//!
//! Query and export engine for the entity/reference graph of a pre-built
//! code database.
//!
//! refscope does not parse source code. It borrows an open database of
//! entities (classes, methods, files, variables, ...) and typed references
//! between them, and answers structural questions over it.
//!
//! ## Key Features
//!
//! - **Kind filters**: `"class ~unknown ~unresolved"`, `"method, function"`
//! - **Traversal**: one-hop references with synthesized inverses (`call`/`callby`)
//! - **Dependencies**: reference edges grouped by the entity they reach
//! - **Reports**: deterministic CSV for classes, methods, calls and more
//! - **Lexer**: the recorded token stream of a file, with resolved entities
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use refscope::{Exporter, MemoryDatabase, ReportKind, Session};
//! use std::path::Path;
//!
//! let db = MemoryDatabase::open(Path::new("sample.json"))?;
//! let session = Session::open(&db)?;
//!
//! for class in session.ents("class ~unknown ~unresolved")? {
//!     for (target, refs) in session.dependencies(class.id)?.iter() {
//!         println!("{} -> {} ({} references)", class.longname, target.longname, refs.len());
//!     }
//! }
//!
//! let methods = session.ents("method")?;
//! Exporter::new(&session).export_to_path(ReportKind::Calls, &methods, Path::new("calls.csv"))?;
//! # Ok::<(), refscope::GraphError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod lexer;
pub mod report;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-exports for convenience
pub use config::EngineConfig;
pub use error::{GraphError, Result};

// Graph re-exports
pub use graph::{
    CodeDatabase, DatabaseBuilder, DependencyMap, Entity, EntityId, Kind, KindFilter,
    MemoryDatabase, Ref, Reference, Session, Snapshot, Token, TokenCategory,
};
pub use lexer::{Lexeme, Lexer, LexerOptions};
pub use report::{Exporter, ReportKind};

//! refscope CLI - query and export code database snapshots.
//!
//! Usage:
//!   refscope <SNAPSHOT> summary              # Name, languages, classes, methods
//!   refscope <SNAPSHOT> classes              # Class list
//!   refscope <SNAPSHOT> methods <CLASS>      # Methods of a class
//!   refscope <SNAPSHOT> calls <METHOD>       # Callees and callers
//!   refscope <SNAPSHOT> refs <VARIABLE>      # Every reference of a variable
//!   refscope <SNAPSHOT> lexer <FILE>         # Meaningful tokens of a file
//!   refscope <SNAPSHOT> file-deps            # File dependencies
//!   refscope <SNAPSHOT> class-deps           # Class dependencies
//!   refscope <SNAPSHOT> export <REPORT>      # CSV export

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use refscope::cli::{execute, Cli};
use refscope::{EngineConfig, GraphError, MemoryDatabase, Session};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        if let Some(graph_err) = e.downcast_ref::<GraphError>() {
            if graph_err.is_not_found() {
                println!("{graph_err}");
                return;
            }
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = EngineConfig::load(&cli.config_path());

    let mut db = MemoryDatabase::open(&cli.snapshot)
        .with_context(|| format!("opening {}", cli.snapshot.display()))?;
    let result = query(cli, &db, &config);
    db.close();
    result
}

fn query(cli: &Cli, db: &MemoryDatabase, config: &EngineConfig) -> Result<()> {
    let session = Session::with_config(db, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &session, config, &mut out)?;
    out.flush()?;
    Ok(())
}

//! Command handlers. Each one writes human-readable output to `out`.

use std::io::Write;

use anyhow::Result;

use super::Commands;
use crate::config::EngineConfig;
use crate::graph::{DependencyMap, Session};
use crate::report::{Exporter, ReportKind};

/// Run one command against an open session.
pub fn execute<W: Write>(
    command: &Commands,
    session: &Session<'_>,
    config: &EngineConfig,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Summary => summary(session, out),
        Commands::Classes => classes(session, config, out),
        Commands::Methods { class } => methods(session, class, out),
        Commands::Calls { method } => calls(session, method, out),
        Commands::Refs { variable } => refs(session, config, variable, out),
        Commands::Lexer { file, limit } => {
            lexer(session, config, file, limit.unwrap_or(config.display.token_limit), out)
        }
        Commands::FileDeps => file_deps(session, config, out),
        Commands::ClassDeps => class_deps(session, config, out),
        Commands::Export {
            report,
            output,
            filter,
        } => {
            let kind: ReportKind = report.parse()?;
            let exporter = Exporter::new(session).with_delimiter(config.export.delimiter);
            let scope = match filter {
                Some(expr) => session.ents(expr)?,
                None => exporter.scope(kind, &config.filters)?,
            };
            match output {
                Some(path) => {
                    let rows = exporter.export_to_path(kind, &scope, path)?;
                    writeln!(out, "Exported {rows} {kind} rows to {}", path.display())?;
                }
                None => {
                    exporter.write(kind, &scope, out)?;
                }
            }
            Ok(())
        }
    }
}

// ─── Explore ────────────────────────────────────────────────────────

fn summary<W: Write>(session: &Session<'_>, out: &mut W) -> Result<()> {
    let db = session.database();
    writeln!(out, "Database: {}", db.name())?;
    writeln!(out, "Languages: {}", db.languages().join(", "))?;
    writeln!(out, "Entities: {}", session.entity_count())?;

    for (title, filter) in [("Classes", "class"), ("Methods", "method")] {
        writeln!(out)?;
        writeln!(out, "{title}:")?;
        for entity in session.ents(filter)? {
            writeln!(out, "  {} ({})", entity.longname, entity.kind)?;
        }
    }
    Ok(())
}

fn classes<W: Write>(session: &Session<'_>, config: &EngineConfig, out: &mut W) -> Result<()> {
    let classes = session.ents(&config.filters.classes)?;
    writeln!(out, "=== Classes ===")?;
    for class in &classes {
        writeln!(out, "  {} ({})", class.longname, class.kind)?;
    }
    writeln!(out, "Total: {} classes", classes.len())?;
    Ok(())
}

fn methods<W: Write>(session: &Session<'_>, class: &str, out: &mut W) -> Result<()> {
    let class_ent = session.require(class, Some("class"), "class")?;
    writeln!(out, "=== Methods of {class} ===")?;
    for r in session.refs(class_ent.id, Some("define"), Some("method"), true)? {
        let method = r.ent();
        writeln!(
            out,
            "  {} (type: {}, line: {})",
            method.name,
            method.type_annotation(),
            r.line()
        )?;
    }
    Ok(())
}

fn calls<W: Write>(session: &Session<'_>, method: &str, out: &mut W) -> Result<()> {
    let method_ent = session.require(method, Some("method"), "method")?;

    writeln!(out, "=== Methods called by {} ===", method_ent.longname)?;
    for r in session.refs(method_ent.id, Some("call"), Some("method"), true)? {
        writeln!(out, "  -> {} (line: {})", r.ent().longname, r.line())?;
    }
    writeln!(out, "=== Methods calling {} ===", method_ent.longname)?;
    for r in session.refs(method_ent.id, Some("callby"), Some("method"), true)? {
        writeln!(out, "  <- {} (line: {})", r.ent().longname, r.line())?;
    }
    Ok(())
}

fn refs<W: Write>(
    session: &Session<'_>,
    config: &EngineConfig,
    variable: &str,
    out: &mut W,
) -> Result<()> {
    let var = session.require(variable, Some(config.filters.variables.as_str()), "variable")?;
    writeln!(out, "=== References of {} ===", var.longname)?;
    for r in session.refs(var.id, None, None, false)? {
        writeln!(
            out,
            "  {} (kind: {}, file: {}, line: {}, column: {})",
            r.ent().longname,
            r.kind(),
            r.file().name,
            r.line(),
            r.column()
        )?;
    }
    Ok(())
}

fn lexer<W: Write>(
    session: &Session<'_>,
    config: &EngineConfig,
    file: &str,
    limit: usize,
    out: &mut W,
) -> Result<()> {
    let file_ent = session.require(file, Some("file"), "file")?;
    let lexer = session.lexer(file_ent.id, config.lexer)?;

    writeln!(out, "=== Tokens of {file} (first {limit}) ===")?;
    for lexeme in lexer
        .iter()
        .filter(|l| !l.category().is_blank())
        .take(limit)
    {
        let resolved = lexeme
            .entity()
            .map(|e| format!(" -> {}", e.longname))
            .unwrap_or_default();
        writeln!(
            out,
            "  {}:{} {:<12} {:?}{}",
            lexeme.line_begin(),
            lexeme.column_begin(),
            lexeme.category().to_string(),
            lexeme.text(),
            resolved
        )?;
    }
    Ok(())
}

// ─── Dependencies ───────────────────────────────────────────────────

fn file_deps<W: Write>(session: &Session<'_>, config: &EngineConfig, out: &mut W) -> Result<()> {
    writeln!(out, "=== File dependencies ===")?;
    for file in session.ents(&config.filters.files)? {
        let deps = session.dependencies(file.id)?;
        if deps.is_empty() {
            continue;
        }
        writeln!(out, "{} depends on:", file.name)?;
        for (target, refs) in deps.iter() {
            writeln!(out, "  -> {} ({} references)", target.name, refs.len())?;
        }
    }
    Ok(())
}

fn class_deps<W: Write>(session: &Session<'_>, config: &EngineConfig, out: &mut W) -> Result<()> {
    writeln!(out, "=== Class dependencies ===")?;
    for class in session.ents(&config.filters.classes)? {
        let deps = session.dependencies(class.id)?;
        if !deps.is_empty() {
            writeln!(out, "{} depends on:", class.longname)?;
            print_detailed(&deps, config.display.detail_limit, out)?;
        }

        let users = session.dependents(class.id)?;
        if !users.is_empty() {
            writeln!(out, "{} is used by:", class.longname)?;
            for (source, refs) in users.iter() {
                writeln!(out, "  <- {} ({} references)", source.longname, refs.len())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn print_detailed<W: Write>(deps: &DependencyMap<'_>, limit: usize, out: &mut W) -> Result<()> {
    for (target, refs) in deps.iter() {
        writeln!(out, "  -> {} ({} references)", target.longname, refs.len())?;
        for r in refs.iter().take(limit) {
            writeln!(
                out,
                "      {} line {} ({})",
                r.file().name,
                r.line(),
                r.kind()
            )?;
        }
        if refs.len() > limit {
            writeln!(out, "      ... {} more", refs.len() - limit)?;
        }
    }
    Ok(())
}

//! Tabular reports over a session, rendered as delimited text.
//!
//! Every report is a header row followed by one block of rows per scope
//! entity. Blocks are computed in parallel and concatenated in scope order,
//! so the output is a pure function of the scope and the database.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::FilterConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Entity, EntityId, Session};

pub const DEFAULT_DELIMITER: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// `class,kind,file,line`
    Classes,
    /// `class,method,type,file,line`
    Methods,
    /// `caller_class,caller_method,callee_class,callee_method,file,line`
    Calls,
    /// `class,method,caller_class,caller_method,file,line`
    CalledBy,
    /// `source,target,references`
    Depends,
    /// `entity,kind,referenced,file,line,column`
    Refs,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Classes,
        ReportKind::Methods,
        ReportKind::Calls,
        ReportKind::CalledBy,
        ReportKind::Depends,
        ReportKind::Refs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Classes => "classes",
            ReportKind::Methods => "methods",
            ReportKind::Calls => "calls",
            ReportKind::CalledBy => "calledby",
            ReportKind::Depends => "depends",
            ReportKind::Refs => "refs",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            ReportKind::Classes => &["class", "kind", "file", "line"],
            ReportKind::Methods => &["class", "method", "type", "file", "line"],
            ReportKind::Calls => &[
                "caller_class",
                "caller_method",
                "callee_class",
                "callee_method",
                "file",
                "line",
            ],
            ReportKind::CalledBy => &[
                "class",
                "method",
                "caller_class",
                "caller_method",
                "file",
                "line",
            ],
            ReportKind::Depends => &["source", "target", "references"],
            ReportKind::Refs => &["entity", "kind", "referenced", "file", "line", "column"],
        }
    }

    /// Kind filter selecting the entities a report iterates by default.
    pub fn scope_filter<'c>(&self, filters: &'c FilterConfig) -> &'c str {
        match self {
            ReportKind::Classes | ReportKind::Methods | ReportKind::Depends => &filters.classes,
            ReportKind::Calls | ReportKind::CalledBy => &filters.methods,
            ReportKind::Refs => &filters.variables,
        }
    }
}

impl FromStr for ReportKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                GraphError::invalid(format!(
                    "unknown report '{s}' (expected one of: {})",
                    ReportKind::ALL.map(|k| k.name()).join(", ")
                ))
            })
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Escaping ───────────────────────────────────────────────────

/// Quote a field when it contains the delimiter, a quote or a line break.
/// Embedded quotes are doubled.
pub fn escape_field(field: &str, delimiter: char) -> Cow<'_, str> {
    if field.contains([delimiter, '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// One output line, without the trailing newline.
pub fn format_record<S: AsRef<str>>(fields: &[S], delimiter: char) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(delimiter);
        }
        line.push_str(&escape_field(field.as_ref(), delimiter));
    }
    line
}

// ─── Exporter ───────────────────────────────────────────────────

pub struct Exporter<'a, 'db> {
    session: &'a Session<'db>,
    delimiter: char,
}

impl<'a, 'db> Exporter<'a, 'db> {
    pub fn new(session: &'a Session<'db>) -> Self {
        Self {
            session,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Default scope of a report: entities matching its configured filter.
    pub fn scope(&self, kind: ReportKind, filters: &FilterConfig) -> Result<Vec<&'db Entity>> {
        self.session.ents(kind.scope_filter(filters))
    }

    /// Header plus data rows.
    pub fn rows(&self, kind: ReportKind, scope: &[&Entity]) -> Result<Vec<Vec<String>>> {
        let blocks = scope
            .par_iter()
            .map(|entity| self.entity_rows(kind, entity))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(1 + blocks.iter().map(Vec::len).sum::<usize>());
        rows.push(kind.header().iter().map(|h| h.to_string()).collect());
        rows.extend(blocks.into_iter().flatten());
        debug!(report = %kind, scope = scope.len(), rows = rows.len() - 1, "report rows built");
        Ok(rows)
    }

    /// Write the report to `sink`. Returns the number of data rows.
    pub fn write<W: Write>(&self, kind: ReportKind, scope: &[&Entity], sink: &mut W) -> Result<usize> {
        let rows = self.rows(kind, scope)?;
        self.write_rows(&rows, sink, "report sink")?;
        Ok(rows.len() - 1)
    }

    /// Write the report to a file, replacing it.
    pub fn export_to_path(&self, kind: ReportKind, scope: &[&Entity], path: &Path) -> Result<usize> {
        let rows = self.rows(kind, scope)?;
        let target = path.display().to_string();
        let file = File::create(path).map_err(|e| GraphError::io(target.clone(), e))?;
        let mut writer = BufWriter::new(file);
        self.write_rows(&rows, &mut writer, &target)?;
        writer.flush().map_err(|e| GraphError::io(target, e))?;

        info!(report = %kind, path = %path.display(), rows = rows.len() - 1, "report exported");
        Ok(rows.len() - 1)
    }

    fn write_rows<W: Write>(&self, rows: &[Vec<String>], sink: &mut W, target: &str) -> Result<()> {
        for row in rows {
            writeln!(sink, "{}", format_record(row, self.delimiter))
                .map_err(|e| GraphError::io(target, e))?;
        }
        sink.flush().map_err(|e| GraphError::io(target, e))
    }

    fn entity_rows(&self, kind: ReportKind, entity: &Entity) -> Result<Vec<Vec<String>>> {
        let session = self.session;
        let rows = match kind {
            ReportKind::Classes => {
                let defined = session.refs(entity.id, Some("definein"), None, false)?;
                let (file, line) = defined
                    .first()
                    .map(|r| (r.file().name.clone(), r.line()))
                    .unwrap_or_default();
                vec![vec![
                    entity.longname.clone(),
                    entity.kind.name().to_string(),
                    file,
                    line.to_string(),
                ]]
            }
            ReportKind::Methods => session
                .refs(entity.id, Some("define"), Some("method"), true)?
                .iter()
                .map(|r| {
                    vec![
                        entity.longname.clone(),
                        r.ent().name.clone(),
                        r.ent().type_annotation(),
                        r.file().name.clone(),
                        r.line().to_string(),
                    ]
                })
                .collect(),
            ReportKind::Calls | ReportKind::CalledBy => {
                let relation = if kind == ReportKind::Calls { "call" } else { "callby" };
                let own_class = self.class_name(entity.id)?;
                session
                    .refs(entity.id, Some(relation), Some("method"), false)?
                    .iter()
                    .map(|r| {
                        Ok(vec![
                            own_class.clone(),
                            entity.name.clone(),
                            self.class_name(r.ent().id)?,
                            r.ent().name.clone(),
                            r.file().name.clone(),
                            r.line().to_string(),
                        ])
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            ReportKind::Depends => session
                .dependencies(entity.id)?
                .iter()
                .map(|(target, refs)| {
                    vec![
                        entity.longname.clone(),
                        target.longname.clone(),
                        refs.len().to_string(),
                    ]
                })
                .collect(),
            ReportKind::Refs => session
                .refs(entity.id, None, None, false)?
                .iter()
                .map(|r| {
                    vec![
                        r.scope().longname.clone(),
                        r.kind().name().to_string(),
                        r.ent().longname.clone(),
                        r.file().name.clone(),
                        r.line().to_string(),
                        r.column().to_string(),
                    ]
                })
                .collect(),
        };
        Ok(rows)
    }

    /// Long name of the owning class; empty when unresolved.
    fn class_name(&self, member: EntityId) -> Result<String> {
        Ok(self
            .session
            .owner_class(member)?
            .map(|class| class.longname.clone())
            .unwrap_or_default())
    }
}

//! The upstream database contract and an in-memory implementation.
//!
//! The engine never builds or mutates a database. It borrows one that is
//! already open and reads entities, forward references and per-file tokens
//! through [`CodeDatabase`]. [`MemoryDatabase`] is the implementation used
//! by the CLI (loaded from a snapshot) and by tests (assembled with
//! [`DatabaseBuilder`]).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::filter::KindFilter;
use super::types::{Entity, EntityId, Kind, Reference, Token};
use crate::error::{GraphError, Result};

/// Kinds treated as unresolved placeholders unless a snapshot says otherwise.
pub const DEFAULT_UNRESOLVED: &str = "unresolved, unknown";

/// Read-only primitives of an open code database.
pub trait CodeDatabase: Send + Sync {
    /// Display name of the database.
    fn name(&self) -> &str;

    /// Languages the database was built from.
    fn languages(&self) -> &[String];

    /// False once the owner has closed the database.
    fn is_open(&self) -> bool;

    /// Every entity, in storage order.
    fn entities(&self) -> &[Entity];

    /// Every forward reference edge, in storage order.
    fn references(&self) -> &[Reference];

    /// Lexical tokens of a file entity, if the database recorded any.
    fn lexemes(&self, file: EntityId) -> Option<&[Token]>;

    /// Whether `entity` is an unlinkable placeholder (unresolved or unknown).
    fn is_unresolved(&self, entity: &Entity) -> bool;
}

/// Tokens recorded for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLexemes {
    pub file: EntityId,
    pub tokens: Vec<Token>,
}

/// Serializable content of a [`MemoryDatabase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(default)]
    pub languages: Vec<String>,
    /// Kind filter classifying unresolved placeholder entities.
    #[serde(default = "default_unresolved")]
    pub unresolved: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub lexemes: Vec<FileLexemes>,
}

fn default_unresolved() -> String {
    DEFAULT_UNRESOLVED.to_string()
}

impl Snapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            languages: Vec::new(),
            unresolved: default_unresolved(),
            entities: Vec::new(),
            references: Vec::new(),
            lexemes: Vec::new(),
        }
    }
}

/// An open, in-memory code database.
#[derive(Debug)]
pub struct MemoryDatabase {
    snapshot: Snapshot,
    unresolved: KindFilter,
    lexeme_index: HashMap<EntityId, usize>,
    open: bool,
}

impl MemoryDatabase {
    /// Validate a snapshot and open it.
    ///
    /// Every reference endpoint, reference file and token back-reference
    /// must name a known entity; dangling ids are rejected rather than
    /// silently dropped.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let unresolved = KindFilter::parse(&snapshot.unresolved)?;

        let mut ids: HashSet<EntityId> = HashSet::with_capacity(snapshot.entities.len());
        for entity in &snapshot.entities {
            if !ids.insert(entity.id) {
                return Err(GraphError::invalid(format!(
                    "duplicate entity id {}",
                    entity.id
                )));
            }
        }

        let known = |id: EntityId, what: &str, at: usize| -> Result<()> {
            if ids.contains(&id) {
                Ok(())
            } else {
                Err(GraphError::invalid(format!(
                    "{what} {id} of reference {at} is not a known entity"
                )))
            }
        };
        for (i, r) in snapshot.references.iter().enumerate() {
            known(r.source, "source", i)?;
            known(r.target, "target", i)?;
            known(r.file, "file", i)?;
        }

        let mut lexeme_index = HashMap::with_capacity(snapshot.lexemes.len());
        for (i, file) in snapshot.lexemes.iter().enumerate() {
            if !ids.contains(&file.file) {
                return Err(GraphError::invalid(format!(
                    "tokens recorded for unknown file {}",
                    file.file
                )));
            }
            if let Some(bad) = file
                .tokens
                .iter()
                .filter_map(|t| t.entity)
                .find(|id| !ids.contains(id))
            {
                return Err(GraphError::invalid(format!(
                    "token in file {} resolves to unknown entity {bad}",
                    file.file
                )));
            }
            if lexeme_index.insert(file.file, i).is_some() {
                return Err(GraphError::invalid(format!(
                    "tokens recorded twice for file {}",
                    file.file
                )));
            }
        }

        info!(
            name = %snapshot.name,
            entities = snapshot.entities.len(),
            references = snapshot.references.len(),
            files_with_tokens = snapshot.lexemes.len(),
            "database opened"
        );

        Ok(Self {
            snapshot,
            unresolved,
            lexeme_index,
            open: true,
        })
    }

    /// End the session. Queries against a closed database fail with
    /// `ResourceClosed`; borrowing rules keep sessions from outliving it.
    pub fn close(&mut self) {
        if self.open {
            info!(name = %self.snapshot.name, "database closed");
        }
        self.open = false;
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl CodeDatabase for MemoryDatabase {
    fn name(&self) -> &str {
        &self.snapshot.name
    }

    fn languages(&self) -> &[String] {
        &self.snapshot.languages
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn entities(&self) -> &[Entity] {
        &self.snapshot.entities
    }

    fn references(&self) -> &[Reference] {
        &self.snapshot.references
    }

    fn lexemes(&self, file: EntityId) -> Option<&[Token]> {
        self.lexeme_index
            .get(&file)
            .map(|&i| self.snapshot.lexemes[i].tokens.as_slice())
    }

    fn is_unresolved(&self, entity: &Entity) -> bool {
        !self.unresolved.is_all() && self.unresolved.matches(&entity.kind)
    }
}

/// Assembles a [`MemoryDatabase`] entity by entity.
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    snapshot: Snapshot,
}

impl DatabaseBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            snapshot: Snapshot::new(name),
        }
    }

    pub fn language(&mut self, language: impl Into<String>) -> &mut Self {
        self.snapshot.languages.push(language.into());
        self
    }

    /// Replace the unresolved-kind filter.
    pub fn unresolved(&mut self, filter: impl Into<String>) -> &mut Self {
        self.snapshot.unresolved = filter.into();
        self
    }

    /// Add a fully specified entity. Returns its id.
    pub fn entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.snapshot.entities.push(entity);
        id
    }

    /// Add an entity from its parts. Returns its id.
    pub fn add(
        &mut self,
        id: u32,
        name: &str,
        longname: &str,
        kind: impl Into<Kind>,
    ) -> EntityId {
        self.entity(Entity::new(id, name, longname, kind))
    }

    /// Add a forward reference `source -kind-> target` at `file:line:column`.
    pub fn link(
        &mut self,
        source: EntityId,
        kind: &str,
        target: EntityId,
        file: EntityId,
        line: u32,
        column: u32,
    ) -> &mut Self {
        self.snapshot
            .references
            .push(Reference::new(source, target, kind, file, line, column));
        self
    }

    /// Record the token stream of a file.
    pub fn tokens(&mut self, file: EntityId, tokens: Vec<Token>) -> &mut Self {
        self.snapshot.lexemes.push(FileLexemes { file, tokens });
        self
    }

    pub fn build(&self) -> Result<MemoryDatabase> {
        debug!(
            entities = self.snapshot.entities.len(),
            references = self.snapshot.references.len(),
            "building in-memory database"
        );
        MemoryDatabase::from_snapshot(self.snapshot.clone())
    }
}

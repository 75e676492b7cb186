//! The query session over an open database.
//!
//! A [`Session`] borrows a [`CodeDatabase`] for its whole lifetime, builds
//! the entity store and reference index once, and answers one-hop
//! traversal queries. It never mutates or closes the database and is safe
//! to share between threads.

use std::collections::HashSet;
use std::sync::OnceLock;

use petgraph::graph::EdgeIndex;
use tracing::{debug, info};

use super::database::CodeDatabase;
use super::filter::KindFilter;
use super::index::{Ref, ReferenceIndex};
use super::store::EntityStore;
use super::types::{Entity, EntityId, Kind, Reference};
use crate::config::{EngineConfig, GraphConfig};
use crate::error::{GraphError, Result};

/// Relation followed from a member to its owner.
pub const OWNER_RELATION: &str = "definein";

/// Graph settings compiled once per session.
#[derive(Debug, Clone)]
pub(crate) struct Compiled {
    pub owner_relation: KindFilter,
    pub owner_kinds: KindFilter,
    pub containment: Option<KindFilter>,
    pub dependency_exclude: Option<KindFilter>,
}

impl Compiled {
    fn new(config: &GraphConfig) -> Result<Self> {
        let optional = |expr: &str| -> Result<Option<KindFilter>> {
            let filter = KindFilter::parse(expr)?;
            Ok((!filter.is_all()).then_some(filter))
        };
        Ok(Self {
            owner_relation: KindFilter::parse(OWNER_RELATION)?,
            owner_kinds: KindFilter::parse(&config.owner_kinds)?,
            containment: optional(&config.containment)?,
            dependency_exclude: optional(&config.dependency_exclude)?,
        })
    }
}

pub struct Session<'db> {
    db: &'db dyn CodeDatabase,
    pub(crate) store: EntityStore<'db>,
    pub(crate) index: ReferenceIndex,
    pub(crate) graph: Compiled,
    /// Memoized `owner_class` edge per entity slot.
    owner_cache: Vec<OnceLock<Option<EdgeIndex>>>,
    /// Memoized `parent` slot per entity slot.
    parent_cache: Vec<OnceLock<Option<usize>>>,
}

impl<'db> Session<'db> {
    /// Start a session with default configuration.
    pub fn open(db: &'db dyn CodeDatabase) -> Result<Self> {
        Self::with_config(db, &EngineConfig::default())
    }

    /// Start a session. Fails with `ResourceClosed` if the database is not
    /// open.
    pub fn with_config(db: &'db dyn CodeDatabase, config: &EngineConfig) -> Result<Self> {
        if !db.is_open() {
            return Err(GraphError::ResourceClosed);
        }
        let graph = Compiled::new(&config.graph)?;
        let store = EntityStore::new(db.entities())?;
        let index = ReferenceIndex::build(&store, db.references())?;
        let owner_cache = (0..store.len()).map(|_| OnceLock::new()).collect();
        let parent_cache = (0..store.len()).map(|_| OnceLock::new()).collect();

        info!(
            database = %db.name(),
            entities = store.len(),
            edges = index.edge_count(),
            "session opened"
        );

        Ok(Self {
            db,
            store,
            index,
            graph,
            owner_cache,
            parent_cache,
        })
    }

    pub fn database(&self) -> &'db dyn CodeDatabase {
        self.db
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.db.is_open() {
            Ok(())
        } else {
            Err(GraphError::ResourceClosed)
        }
    }

    pub(crate) fn references_raw(&self) -> &'db [Reference] {
        self.db.references()
    }

    pub(crate) fn slot_of(&self, id: EntityId) -> Result<usize> {
        self.store
            .slot(id)
            .ok_or_else(|| GraphError::invalid(format!("unknown entity {id}")))
    }

    // ─── Entity Queries ─────────────────────────────────────────

    /// Number of entities in the database.
    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    pub fn entity(&self, id: EntityId) -> Option<&'db Entity> {
        self.store.get(id)
    }

    /// Entities whose kind matches the filter expression, ascending id.
    pub fn ents(&self, filter: &str) -> Result<Vec<&'db Entity>> {
        self.ents_matching(&KindFilter::parse(filter)?)
    }

    pub fn ents_matching(&self, filter: &KindFilter) -> Result<Vec<&'db Entity>> {
        self.ensure_open()?;
        let found = self.store.select(filter);
        debug!(filter = %filter, count = found.len(), "entities selected");
        Ok(found)
    }

    /// First entity (lowest id) with this short name and a matching kind.
    /// A miss is `Ok(None)`.
    pub fn find(&self, name: &str, filter: Option<&str>) -> Result<Option<&'db Entity>> {
        self.ensure_open()?;
        if name.is_empty() {
            return Err(GraphError::invalid("entity name must not be empty"));
        }
        Ok(self.store.find(name, &KindFilter::parse_opt(filter)?))
    }

    /// Like [`Session::find`], matching the long name.
    pub fn find_longname(&self, longname: &str, filter: Option<&str>) -> Result<Option<&'db Entity>> {
        self.ensure_open()?;
        if longname.is_empty() {
            return Err(GraphError::invalid("entity name must not be empty"));
        }
        Ok(self.store.find_longname(longname, &KindFilter::parse_opt(filter)?))
    }

    /// Like [`Session::find`], but a miss is a `NotFound` error labelled
    /// with `what` ("class", "method", ...).
    pub fn require(&self, name: &str, filter: Option<&str>, what: &str) -> Result<&'db Entity> {
        self.find(name, filter)?
            .ok_or_else(|| GraphError::not_found(what, name))
    }

    // ─── Reference Queries ──────────────────────────────────────

    /// References of `entity`.
    ///
    /// `kinds` filters the relation kind and `ent_kinds` the kind of the
    /// referenced entity, both with the kind filter grammar; `None` or an
    /// empty string means no constraint. With `unique` false every edge is
    /// returned in source-location order. With `unique` true edges sharing
    /// (relation kind, referenced entity) collapse into the first one by
    /// location, and the result is ordered by referenced entity id.
    pub fn refs(
        &self,
        entity: EntityId,
        kinds: Option<&str>,
        ent_kinds: Option<&str>,
        unique: bool,
    ) -> Result<Vec<Ref<'_>>> {
        let kinds = KindFilter::parse_opt(kinds)?;
        let ent_kinds = KindFilter::parse_opt(ent_kinds)?;
        self.refs_matching(entity, &kinds, &ent_kinds, unique)
    }

    pub fn refs_matching(
        &self,
        entity: EntityId,
        kinds: &KindFilter,
        ent_kinds: &KindFilter,
        unique: bool,
    ) -> Result<Vec<Ref<'_>>> {
        self.ensure_open()?;
        let slot = self.slot_of(entity)?;
        let references = self.references_raw();

        let matching = self.index.outgoing(slot).iter().copied().filter(|&e| {
            kinds.matches(self.index.kind(references, e))
                && ent_kinds.matches(&self.store.at(self.index.to_slot(e)).kind)
        });

        let mut found: Vec<Ref<'_>> = if unique {
            let mut seen: HashSet<(&Kind, usize)> = HashSet::new();
            matching
                .filter(|&e| seen.insert((self.index.kind(references, e), self.index.to_slot(e))))
                .map(|e| self.view(e))
                .collect()
        } else {
            matching.map(|e| self.view(e)).collect()
        };
        if unique {
            found.sort_by(|a, b| {
                a.ent()
                    .id
                    .cmp(&b.ent().id)
                    .then_with(|| a.kind().name().cmp(b.kind().name()))
            });
        }

        debug!(
            entity = %entity,
            kinds = %kinds,
            ent_kinds = %ent_kinds,
            unique,
            count = found.len(),
            "references resolved"
        );
        Ok(found)
    }

    pub(crate) fn view(&self, edge: EdgeIndex) -> Ref<'_> {
        self.index.view(&self.store, self.references_raw(), edge)
    }

    // ─── Ownership ──────────────────────────────────────────────

    /// First owner of `entity` (location order of its `definein`
    /// references) whose kind matches `filter`.
    pub fn owner(&self, entity: EntityId, filter: &KindFilter) -> Result<Option<Ref<'_>>> {
        self.ensure_open()?;
        let slot = self.slot_of(entity)?;
        Ok(self.first_owner_edge(slot, filter).map(|e| self.view(e)))
    }

    /// Owning class of a member, following `definein` to the configured
    /// owner kinds. Memoized per entity; `None` when unresolved.
    pub fn owner_class(&self, entity: EntityId) -> Result<Option<&'db Entity>> {
        self.ensure_open()?;
        let slot = self.slot_of(entity)?;
        let edge = *self.owner_cache[slot]
            .get_or_init(|| self.first_owner_edge(slot, &self.graph.owner_kinds));
        Ok(edge.map(|e| self.store.at(self.index.to_slot(e))))
    }

    /// Immediate container of `entity` of any kind. Memoized per entity.
    pub fn parent(&self, entity: EntityId) -> Result<Option<&'db Entity>> {
        self.ensure_open()?;
        let slot = self.slot_of(entity)?;
        Ok(self.parent_slot(slot).map(|p| self.store.at(p)))
    }

    pub(crate) fn parent_slot(&self, slot: usize) -> Option<usize> {
        *self.parent_cache[slot].get_or_init(|| {
            self.first_owner_edge(slot, &KindFilter::all())
                .map(|e| self.index.to_slot(e))
        })
    }

    fn first_owner_edge(&self, slot: usize, filter: &KindFilter) -> Option<EdgeIndex> {
        let references = self.references_raw();
        self.index.outgoing(slot).iter().copied().find(|&e| {
            self.index.weight(e).inverse
                && self.graph.owner_relation.matches(self.index.kind(references, e))
                && filter.matches(&self.store.at(self.index.to_slot(e)).kind)
        })
    }
}

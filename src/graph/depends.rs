//! Dependency aggregation.
//!
//! `dependencies(E)` groups the forward references leaving `E` and its
//! members by the entity they reach, lifted to `E`'s own level: for a class
//! that means the class owning a called method, for a file the file defining
//! it. `dependents(E)` does the same for forward references arriving at `E`.

use std::collections::{HashSet, VecDeque};

use petgraph::graph::EdgeIndex;
use petgraph::Direction;
use tracing::debug;

use super::engine::Session;
use super::index::Ref;
use super::types::{Entity, EntityId};
use crate::error::Result;

/// Neighbour entity -> contributing references, ascending neighbour id.
#[derive(Debug, Clone, Default)]
pub struct DependencyMap<'s> {
    entries: Vec<(&'s Entity, Vec<Ref<'s>>)>,
}

impl<'s> DependencyMap<'s> {
    /// Number of distinct neighbours.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'s Entity, &[Ref<'s>])> + '_ {
        self.entries.iter().map(|(ent, refs)| (*ent, refs.as_slice()))
    }

    pub fn get(&self, id: EntityId) -> Option<&[Ref<'s>]> {
        self.entries
            .binary_search_by_key(&id, |(ent, _)| ent.id)
            .ok()
            .map(|i| self.entries[i].1.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'s Entity> + '_ {
        self.entries.iter().map(|(ent, _)| *ent)
    }

    /// Total number of references across all neighbours.
    pub fn edge_count(&self) -> usize {
        self.entries.iter().map(|(_, refs)| refs.len()).sum()
    }
}

impl<'s> IntoIterator for DependencyMap<'s> {
    type Item = (&'s Entity, Vec<Ref<'s>>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'db> Session<'db> {
    /// What `entity` depends on.
    pub fn dependencies(&self, entity: EntityId) -> Result<DependencyMap<'_>> {
        self.aggregate(entity, Direction::Outgoing)
    }

    /// What depends on `entity`.
    pub fn dependents(&self, entity: EntityId) -> Result<DependencyMap<'_>> {
        self.aggregate(entity, Direction::Incoming)
    }

    fn aggregate(&self, entity: EntityId, direction: Direction) -> Result<DependencyMap<'_>> {
        self.ensure_open()?;
        let root = self.slot_of(entity)?;
        let category = self.store.at(root).kind.category();
        let references = self.references_raw();
        let db = self.database();

        let members = self.members(root);
        let mut pairs: Vec<(EntityId, usize, EdgeIndex)> = Vec::new();

        for &member in &members {
            let edges: Box<dyn Iterator<Item = EdgeIndex> + '_> = match direction {
                Direction::Outgoing => Box::new(
                    self.index
                        .outgoing(member)
                        .iter()
                        .copied()
                        .filter(|&e| !self.index.weight(e).inverse),
                ),
                Direction::Incoming => Box::new(self.index.incoming(member).iter().copied()),
            };

            for e in edges {
                if self
                    .graph
                    .dependency_exclude
                    .as_ref()
                    .is_some_and(|f| f.matches(self.index.kind(references, e)))
                {
                    continue;
                }
                let neighbour = match direction {
                    Direction::Outgoing => self.index.to_slot(e),
                    Direction::Incoming => self.index.from_slot(e),
                };
                let key = self.lift(neighbour, category);
                if key == root {
                    continue;
                }
                if db.is_unresolved(self.store.at(neighbour)) || db.is_unresolved(self.store.at(key)) {
                    continue;
                }
                pairs.push((self.store.at(key).id, key, e));
            }
        }

        // stable: each key keeps traversal order
        pairs.sort_by_key(|&(id, _, _)| id);

        let mut entries: Vec<(&Entity, Vec<Ref<'_>>)> = Vec::new();
        for (id, key, e) in pairs {
            let view = self.view(e);
            match entries.last_mut() {
                Some((ent, refs)) if ent.id == id => refs.push(view),
                _ => entries.push((self.store.at(key), vec![view])),
            }
        }

        let map = DependencyMap { entries };
        debug!(
            entity = %entity,
            direction = ?direction,
            members = members.len(),
            neighbours = map.len(),
            edges = map.edge_count(),
            "dependencies aggregated"
        );
        Ok(map)
    }

    /// `root` plus everything it contains, breadth-first, without entering
    /// entities of the root's own category.
    fn members(&self, root: usize) -> Vec<usize> {
        let Some(containment) = self.graph.containment.as_ref() else {
            return vec![root];
        };
        let references = self.references_raw();
        let category = self.store.at(root).kind.category();

        let mut seen: HashSet<usize> = HashSet::from([root]);
        let mut order = vec![root];
        let mut queue = VecDeque::from([root]);
        while let Some(slot) = queue.pop_front() {
            for &e in self.index.outgoing(slot) {
                if self.index.weight(e).inverse || !containment.matches(self.index.kind(references, e)) {
                    continue;
                }
                let child = self.index.to_slot(e);
                if self.store.at(child).kind.category() == category || !seen.insert(child) {
                    continue;
                }
                order.push(child);
                queue.push_back(child);
            }
        }
        order
    }

    /// Nearest ancestor-or-self of `slot` whose kind category is `category`;
    /// `slot` itself when there is none.
    fn lift(&self, slot: usize, category: &str) -> usize {
        let mut current = slot;
        // bounded so a cyclic parent chain still terminates
        for _ in 0..=self.store.len() {
            if self.store.at(current).kind.category() == category {
                return current;
            }
            match self.parent_slot(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::fixtures::two_classes;
    use crate::graph::database::{CodeDatabase, DatabaseBuilder, MemoryDatabase};

    /// Eight entities and twelve edges, including a self call, a call into
    /// an unresolved class and two files.
    fn wide() -> MemoryDatabase {
        let mut b = DatabaseBuilder::new("wide");
        let f1 = b.add(1, "A.src", "src/A.src", "File");
        let f2 = b.add(2, "B.src", "src/B.src", "File");
        let a = b.add(10, "A", "A", "Class");
        let a_run = b.add(11, "run", "A.run", "Method");
        let a_stop = b.add(12, "stop", "A.stop", "Method");
        let bc = b.add(20, "B", "B", "Class");
        let b_go = b.add(21, "go", "B.go", "Method");
        let ghost = b.add(30, "Ghost", "Ghost", "Unresolved Class");
        b.link(f1, "define", a, f1, 1, 1)
            .link(f2, "define", bc, f2, 1, 1)
            .link(a, "define", a_run, f1, 2, 3)
            .link(a, "define", a_stop, f1, 8, 3)
            .link(bc, "define", b_go, f2, 2, 3)
            .link(a_run, "call", b_go, f1, 4, 7)
            .link(a_run, "call", b_go, f1, 5, 7)
            .link(a_run, "call", a_stop, f1, 6, 7)
            .link(a_run, "call", a_run, f1, 7, 7)
            .link(a_stop, "use", ghost, f1, 9, 7)
            .link(a_stop, "call", b_go, f1, 10, 7)
            .link(b_go, "call", a_stop, f2, 3, 7);
        b.build().unwrap()
    }

    fn lines(refs: &[Ref<'_>]) -> Vec<u32> {
        refs.iter().map(|r| r.line()).collect()
    }

    #[test]
    fn test_class_level_dependency() {
        let db = two_classes();
        let session = Session::open(&db).unwrap();

        let deps = session.dependencies(EntityId(2)).unwrap();
        assert_eq!(deps.len(), 1);
        let (key, refs) = deps.iter().next().unwrap();
        assert_eq!(key.name, "ClassB");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].file().name, "X.src");
        assert_eq!(refs[0].line(), 10);

        let back = session.dependents(EntityId(4)).unwrap();
        let keys: Vec<&str> = back.keys().map(|e| e.name.as_str()).collect();
        assert_eq!(keys, vec!["ClassA"]);

        assert!(session.dependents(EntityId(2)).unwrap().is_empty());
    }

    #[test]
    fn test_method_level_dependency() {
        let db = two_classes();
        let session = Session::open(&db).unwrap();
        // method category: no lifting to the class
        let deps = session.dependencies(EntityId(3)).unwrap();
        assert_eq!(deps.keys().map(|e| e.id).collect::<Vec<_>>(), vec![EntityId(5)]);
    }

    #[test]
    fn test_keys_distinct_and_edges_complete() {
        let db = wide();
        let session = Session::open(&db).unwrap();
        assert!(db.entities().len() >= 5);
        assert!(db.references().len() >= 10);

        let deps = session.dependencies(EntityId(10)).unwrap();
        let keys: Vec<EntityId> = deps.keys().map(|e| e.id).collect();
        // self call and calls inside A are self edges, Ghost is unresolved
        assert_eq!(keys, vec![EntityId(20)]);
        assert_eq!(lines(deps.get(EntityId(20)).unwrap()), vec![4, 5, 10]);

        // the union equals the filtered forward edge set of A's members
        let mut expected: Vec<EdgeIndex> = Vec::new();
        for member in [EntityId(11), EntityId(12)] {
            for r in session.refs(member, Some("call"), None, false).unwrap() {
                if session.owner_class(r.ent().id).unwrap().map(|c| c.id) == Some(EntityId(20)) {
                    expected.push(r.edge());
                }
            }
        }
        let mut got: Vec<EdgeIndex> = deps
            .iter()
            .flat_map(|(_, refs)| refs.iter().map(|r| r.edge()))
            .collect();
        let unique: HashSet<EdgeIndex> = got.iter().copied().collect();
        assert_eq!(unique.len(), got.len());
        got.sort();
        expected.sort();
        assert_eq!(got, expected);
        assert_eq!(deps.edge_count(), 3);
    }

    #[test]
    fn test_dependents_and_files() {
        let db = wide();
        let session = Session::open(&db).unwrap();

        let users = session.dependents(EntityId(10)).unwrap();
        assert_eq!(users.keys().map(|e| e.id).collect::<Vec<_>>(), vec![EntityId(20)]);
        assert_eq!(lines(users.get(EntityId(20)).unwrap()), vec![3]);

        // file level: method calls lift to the defining files
        let file_deps = session.dependencies(EntityId(1)).unwrap();
        assert_eq!(file_deps.keys().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["B.src"]);
        assert_eq!(file_deps.edge_count(), 3);
        let file_users = session.dependents(EntityId(1)).unwrap();
        assert_eq!(lines(file_users.get(EntityId(2)).unwrap()), vec![3]);
    }

    #[test]
    fn test_unresolved_kept_when_not_classified() {
        let mut b = DatabaseBuilder::new("lenient");
        b.unresolved("");
        let f = b.add(1, "A.src", "A.src", "File");
        let a = b.add(2, "A", "A", "Class");
        let ghost = b.add(3, "Ghost", "Ghost", "Unresolved Class");
        b.link(f, "define", a, f, 1, 1);
        b.link(a, "use", ghost, f, 2, 1);
        let db = b.build().unwrap();
        let session = Session::open(&db).unwrap();
        assert_eq!(session.dependencies(EntityId(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_ownership_counts_when_not_excluded() {
        let db = two_classes();
        let mut config = EngineConfig::default();
        config.graph.dependency_exclude = String::new();
        config.graph.containment = String::new();
        let session = Session::with_config(&db, &config).unwrap();

        // without member expansion ClassA only reaches its own method, which
        // lifts back to ClassA
        assert!(session.dependencies(EntityId(2)).unwrap().is_empty());
        let file = session.dependencies(EntityId(1)).unwrap();
        assert_eq!(file.len(), 0);
        let from_file = session.dependents(EntityId(2)).unwrap();
        assert_eq!(from_file.keys().map(|e| e.id).collect::<Vec<_>>(), vec![EntityId(1)]);
    }

    #[test]
    fn test_unknown_entity() {
        let db = two_classes();
        let session = Session::open(&db).unwrap();
        assert!(session.dependencies(EntityId(404)).is_err());
    }
}

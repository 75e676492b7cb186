//! Reference index: typed adjacency over an arena of edges.
//!
//! Every stored (forward) reference becomes two petgraph edges: the forward
//! edge `source -> target` and an inverse edge `target -> source` whose kind
//! is the inverse relation (`call` -> `callby`). Both point back at the same
//! database record by position, so nothing is copied. Per-entity adjacency
//! lists are sorted once, in source-location order, when the index is built.

use std::cmp::Ordering;
use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use super::store::EntityStore;
use super::types::{Entity, Kind, Reference};
use crate::error::{GraphError, Result};

/// Weight of an arena edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RefEdge {
    /// Position of the database record.
    pub raw: usize,
    /// True for the derived inverse view of the record.
    pub inverse: bool,
}

/// One reference as seen from an entity: relation kind, the entity whose
/// references are listed (scope), the entity on the other end, and where it
/// happens.
#[derive(Debug, Clone, Copy)]
pub struct Ref<'s> {
    kind: &'s Kind,
    scope: &'s Entity,
    ent: &'s Entity,
    file: &'s Entity,
    line: u32,
    column: u32,
    edge: EdgeIndex,
}

impl<'s> Ref<'s> {
    pub fn kind(&self) -> &'s Kind {
        self.kind
    }

    /// The entity whose references were requested.
    pub fn scope(&self) -> &'s Entity {
        self.scope
    }

    /// The referenced entity.
    pub fn ent(&self) -> &'s Entity {
        self.ent
    }

    /// File entity where the reference occurs.
    pub fn file(&self) -> &'s Entity {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// Stable arena index of the edge behind this view.
    pub fn edge(&self) -> EdgeIndex {
        self.edge
    }
}

impl PartialEq for Ref<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.edge == other.edge
    }
}

impl Eq for Ref<'_> {}

pub struct ReferenceIndex {
    /// Node `i` is entity slot `i`.
    graph: DiGraph<usize, RefEdge>,
    /// Forward and inverse edges leaving each slot, location order.
    outgoing: Vec<Vec<EdgeIndex>>,
    /// Forward edges arriving at each slot, location order.
    incoming: Vec<Vec<EdgeIndex>>,
    /// Stored relation kind name -> its inverse kind.
    inverse_kinds: HashMap<String, Kind>,
}

impl ReferenceIndex {
    pub fn build(store: &EntityStore<'_>, references: &[Reference]) -> Result<Self> {
        let mut graph: DiGraph<usize, RefEdge> =
            DiGraph::with_capacity(store.len(), references.len() * 2);
        for slot in 0..store.len() {
            graph.add_node(slot);
        }

        let mut inverse_kinds: HashMap<String, Kind> = HashMap::new();
        for (raw, r) in references.iter().enumerate() {
            let slot_of = |id, what: &str| {
                store.slot(id).ok_or_else(|| {
                    GraphError::invalid(format!(
                        "{what} {id} of reference {raw} is not a known entity"
                    ))
                })
            };
            let source = NodeIndex::new(slot_of(r.source, "source")?);
            let target = NodeIndex::new(slot_of(r.target, "target")?);
            slot_of(r.file, "file")?;

            graph.add_edge(source, target, RefEdge { raw, inverse: false });
            graph.add_edge(target, source, RefEdge { raw, inverse: true });
            inverse_kinds
                .entry(r.kind.name().to_string())
                .or_insert_with(|| r.kind.inverse());
        }

        let mut index = Self {
            graph,
            outgoing: Vec::with_capacity(store.len()),
            incoming: Vec::with_capacity(store.len()),
            inverse_kinds,
        };

        for node in index.graph.node_indices() {
            let mut out: Vec<EdgeIndex> = index
                .graph
                .edges_directed(node, Direction::Outgoing)
                .map(|e| e.id())
                .collect();
            out.sort_by(|&a, &b| index.location_order(store, references, a, b));

            let mut inc: Vec<EdgeIndex> = index
                .graph
                .edges_directed(node, Direction::Incoming)
                .filter(|e| !e.weight().inverse)
                .map(|e| e.id())
                .collect();
            inc.sort_by(|&a, &b| index.location_order(store, references, a, b));

            index.outgoing.push(out);
            index.incoming.push(inc);
        }

        debug!(
            entities = store.len(),
            references = references.len(),
            relation_kinds = index.inverse_kinds.len(),
            "reference index built"
        );

        Ok(index)
    }

    pub(crate) fn weight(&self, edge: EdgeIndex) -> RefEdge {
        self.graph.raw_edges()[edge.index()].weight
    }

    /// Slot on the near end of an edge.
    pub(crate) fn from_slot(&self, edge: EdgeIndex) -> usize {
        self.graph.raw_edges()[edge.index()].source().index()
    }

    /// Slot on the far end of an edge.
    pub(crate) fn to_slot(&self, edge: EdgeIndex) -> usize {
        self.graph.raw_edges()[edge.index()].target().index()
    }

    /// Forward and inverse edges leaving `slot`, location order.
    pub(crate) fn outgoing(&self, slot: usize) -> &[EdgeIndex] {
        &self.outgoing[slot]
    }

    /// Forward edges arriving at `slot`, location order.
    pub(crate) fn incoming(&self, slot: usize) -> &[EdgeIndex] {
        &self.incoming[slot]
    }

    /// Relation kind of an edge, inverse name for inverse edges.
    pub(crate) fn kind<'s>(&'s self, references: &'s [Reference], edge: EdgeIndex) -> &'s Kind {
        let weight = self.weight(edge);
        let kind = &references[weight.raw].kind;
        if weight.inverse {
            self.inverse_kinds.get(kind.name()).unwrap_or(kind)
        } else {
            kind
        }
    }

    pub(crate) fn view<'s>(
        &'s self,
        store: &EntityStore<'s>,
        references: &'s [Reference],
        edge: EdgeIndex,
    ) -> Ref<'s> {
        let r = &references[self.weight(edge).raw];
        // File ids were validated in `build`.
        let file = store
            .get(r.file)
            .unwrap_or_else(|| store.at(self.from_slot(edge)));
        Ref {
            kind: self.kind(references, edge),
            scope: store.at(self.from_slot(edge)),
            ent: store.at(self.to_slot(edge)),
            file,
            line: r.line,
            column: r.column,
            edge,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// File (long name, then id), line, column; then relation kind, far end
    /// id and arena position so the order is total.
    fn location_order(
        &self,
        store: &EntityStore<'_>,
        references: &[Reference],
        a: EdgeIndex,
        b: EdgeIndex,
    ) -> Ordering {
        let (ra, rb) = (
            &references[self.weight(a).raw],
            &references[self.weight(b).raw],
        );
        let file_name = |r: &Reference| store.get(r.file).map(|f| f.longname.as_str());
        file_name(ra)
            .cmp(&file_name(rb))
            .then(ra.file.cmp(&rb.file))
            .then(ra.line.cmp(&rb.line))
            .then(ra.column.cmp(&rb.column))
            .then_with(|| {
                self.kind(references, a)
                    .name()
                    .cmp(self.kind(references, b).name())
            })
            .then_with(|| {
                store
                    .at(self.to_slot(a))
                    .id
                    .cmp(&store.at(self.to_slot(b)).id)
            })
            .then(a.index().cmp(&b.index()))
    }
}

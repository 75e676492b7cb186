//! Entity store: a read-only, indexed view over a database's entities.
//!
//! Entities stay in the database; the store only keeps slot numbers
//! (positions in [`CodeDatabase::entities`]) ordered by id, plus name and
//! long-name indexes built once per session so lookups do not rescan.
//!
//! [`CodeDatabase::entities`]: super::database::CodeDatabase::entities

use std::collections::HashMap;

use tracing::debug;

use super::filter::KindFilter;
use super::types::{Entity, EntityId};
use crate::error::{GraphError, Result};

pub struct EntityStore<'db> {
    entities: &'db [Entity],
    /// Slots sorted by entity id.
    order: Vec<usize>,
    by_id: HashMap<EntityId, usize>,
    /// Short name -> slots, ascending id.
    by_name: HashMap<&'db str, Vec<usize>>,
    /// Long name -> slots, ascending id.
    by_longname: HashMap<&'db str, Vec<usize>>,
}

impl<'db> EntityStore<'db> {
    pub fn new(entities: &'db [Entity]) -> Result<Self> {
        let mut order: Vec<usize> = (0..entities.len()).collect();
        order.sort_by_key(|&slot| entities[slot].id);

        let mut by_id = HashMap::with_capacity(entities.len());
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_longname: HashMap<&str, Vec<usize>> = HashMap::new();

        for &slot in &order {
            let entity = &entities[slot];
            if by_id.insert(entity.id, slot).is_some() {
                return Err(GraphError::invalid(format!(
                    "duplicate entity id {}",
                    entity.id
                )));
            }
            by_name.entry(entity.name.as_str()).or_default().push(slot);
            by_longname
                .entry(entity.longname.as_str())
                .or_default()
                .push(slot);
        }

        debug!(
            entities = entities.len(),
            unique_names = by_name.len(),
            "entity store indexed"
        );

        Ok(Self {
            entities,
            order,
            by_id,
            by_name,
            by_longname,
        })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity at a storage slot.
    pub fn at(&self, slot: usize) -> &'db Entity {
        &self.entities[slot]
    }

    pub fn slot(&self, id: EntityId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn get(&self, id: EntityId) -> Option<&'db Entity> {
        self.slot(id).map(|slot| self.at(slot))
    }

    /// All entities, ascending id.
    pub fn iter(&self) -> impl Iterator<Item = &'db Entity> + '_ {
        self.order.iter().map(|&slot| self.at(slot))
    }

    /// Entities whose kind passes `filter`, ascending id.
    pub fn select(&self, filter: &KindFilter) -> Vec<&'db Entity> {
        self.iter().filter(|e| filter.matches(&e.kind)).collect()
    }

    /// First entity (lowest id) with this short name whose kind passes `filter`.
    pub fn find(&self, name: &str, filter: &KindFilter) -> Option<&'db Entity> {
        self.first_match(self.by_name.get(name), filter)
    }

    /// First entity (lowest id) with this long name whose kind passes `filter`.
    pub fn find_longname(&self, longname: &str, filter: &KindFilter) -> Option<&'db Entity> {
        self.first_match(self.by_longname.get(longname), filter)
    }

    fn first_match(&self, slots: Option<&Vec<usize>>, filter: &KindFilter) -> Option<&'db Entity> {
        slots?
            .iter()
            .map(|&slot| self.at(slot))
            .find(|e| filter.matches(&e.kind))
    }
}

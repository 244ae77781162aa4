use std::collections::{BTreeMap, HashMap, VecDeque};

use serde_json::Value;

use crate::{Entity, EntityId, EntityKind, EntityRef, EntitySchema, NormalizedPage};

/// Flat, per-type, identity-keyed entity collections.
///
/// Besides the identity maps the store keeps the order in which entities were
/// last fetched. List rendering reads that order; the memory governor evicts
/// from its front. Every arrival entry refers to exactly one stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedStore {
    collections: BTreeMap<EntityKind, HashMap<EntityId, Entity>>,
    arrivals: VecDeque<EntityRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl MergeStats {
    pub fn touched(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

impl NormalizedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts every entity of the page and moves it to the back of the
    /// arrival order. Re-merging identical input is a no-op.
    pub fn merge(&mut self, page: NormalizedPage) -> MergeStats {
        let mut stats = MergeStats::default();
        for entity in page.entities {
            let collection = self.collections.entry(entity.kind.clone()).or_default();
            match collection.get_mut(&entity.id) {
                Some(existing) => {
                    if existing.merge_fields(entity.fields) {
                        stats.updated += 1;
                    } else {
                        stats.unchanged += 1;
                    }
                    let reference = existing.reference();
                    self.touch(reference);
                }
                None => {
                    self.arrivals.push_back(entity.reference());
                    collection.insert(entity.id.clone(), entity);
                    stats.inserted += 1;
                }
            }
        }
        stats
    }

    fn touch(&mut self, reference: EntityRef) {
        if self.arrivals.back() == Some(&reference) {
            return;
        }
        if let Some(position) = self.arrivals.iter().position(|entry| entry == &reference) {
            self.arrivals.remove(position);
        }
        self.arrivals.push_back(reference);
    }

    pub fn get(&self, kind: &EntityKind, id: &EntityId) -> Option<&Entity> {
        self.collections.get(kind)?.get(id)
    }

    pub fn contains(&self, reference: &EntityRef) -> bool {
        self.get(&reference.kind, &reference.id).is_some()
    }

    pub fn len_of(&self, kind: &EntityKind) -> usize {
        self.collections.get(kind).map_or(0, HashMap::len)
    }

    /// Total number of tracked entities across all kinds.
    pub fn total_len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &EntityKind> {
        self.collections
            .iter()
            .filter(|(_, entities)| !entities.is_empty())
            .map(|(kind, _)| kind)
    }

    /// Entities of one kind in fetch order.
    pub fn items(&self, kind: &EntityKind) -> Vec<&Entity> {
        let Some(collection) = self.collections.get(kind) else {
            return Vec::new();
        };
        self.arrivals
            .iter()
            .filter(|reference| &reference.kind == kind)
            .filter_map(|reference| collection.get(&reference.id))
            .collect()
    }

    pub fn arrivals(&self) -> impl Iterator<Item = &EntityRef> {
        self.arrivals.iter()
    }

    /// Rebuilds the nested shape of an entity from whatever is still stored.
    /// References to evicted entities stay as plain ids.
    pub fn denormalize(&self, reference: &EntityRef, schema: &EntitySchema) -> Option<Value> {
        let entity = self.get(&reference.kind, &reference.id)?;
        let mut fields = entity.fields.clone();
        for (field, nested) in schema.nested() {
            let Some(value) = fields.get_mut(field) else {
                continue;
            };
            match value {
                Value::Array(items) => {
                    for item in items.iter_mut() {
                        self.embed(item, nested);
                    }
                }
                other => self.embed(other, nested),
            }
        }
        Some(Value::Object(fields))
    }

    fn embed(&self, slot: &mut Value, schema: &EntitySchema) {
        let Some(id) = EntityId::from_json(slot) else {
            return;
        };
        let reference = EntityRef {
            kind: schema.kind().clone(),
            id,
        };
        if let Some(expanded) = self.denormalize(&reference, schema) {
            *slot = expanded;
        }
    }

    /// Drops the `count` oldest arrivals. Returns how many were removed.
    pub(crate) fn evict_oldest(&mut self, count: usize) -> usize {
        let mut evicted = 0;
        while evicted < count {
            let Some(reference) = self.arrivals.pop_front() else {
                break;
            };
            if let Some(collection) = self.collections.get_mut(&reference.kind) {
                collection.remove(&reference.id);
            }
            evicted += 1;
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.collections.clear();
        self.arrivals.clear();
    }
}

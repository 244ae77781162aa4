use serde_json::{Map, Value};

use crate::{Entity, EntityId, EntityKind, EntityRef, ShapeError};

/// Describes how a raw record splits into per-type entities.
///
/// Fields listed in `nested` hold embedded records (an object or an array of
/// objects). Those are extracted into their own collection and replaced in the
/// parent by their id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    kind: EntityKind,
    nested: Vec<(String, EntitySchema)>,
}

/// Result of normalizing one page of raw records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedPage {
    /// Top-level records in page order.
    pub roots: Vec<EntityRef>,
    /// Every extracted entity in arrival order: each root followed by its nested records.
    pub entities: Vec<Entity>,
}

impl EntitySchema {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            nested: Vec::new(),
        }
    }

    pub fn with_nested(mut self, field: impl Into<String>, schema: EntitySchema) -> Self {
        self.nested.push((field.into(), schema));
        self
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn nested(&self) -> impl Iterator<Item = (&str, &EntitySchema)> {
        self.nested
            .iter()
            .map(|(field, schema)| (field.as_str(), schema))
    }

    pub fn campaign() -> Self {
        Self::new(EntityKind::Campaign)
            .with_nested("workflow_state", Self::new(EntityKind::Workflow))
    }

    pub fn employee() -> Self {
        Self::new(EntityKind::Employee)
    }

    pub fn pair() -> Self {
        Self::new(EntityKind::Pair)
            .with_nested("employee1", Self::employee())
            .with_nested("employee2", Self::employee())
    }

    pub fn evaluation() -> Self {
        Self::new(EntityKind::Evaluation)
            .with_nested("employee", Self::employee())
            .with_nested("employee_pair", Self::pair())
    }

    /// Normalizes a whole page. Any malformed record rejects the page.
    pub fn normalize_page(&self, records: &[Value]) -> Result<NormalizedPage, ShapeError> {
        let mut page = NormalizedPage::default();
        for (index, record) in records.iter().enumerate() {
            let (root, _) = self.normalize_record(record, index, &mut page.entities)?;
            page.roots.push(root);
        }
        Ok(page)
    }

    fn normalize_record(
        &self,
        record: &Value,
        index: usize,
        out: &mut Vec<Entity>,
    ) -> Result<(EntityRef, Value), ShapeError> {
        let object = record
            .as_object()
            .ok_or_else(|| ShapeError::wrong_type(format!("data[{index}]"), "object"))?;
        let raw_id = object.get("id").cloned().unwrap_or(Value::Null);
        let id = EntityId::from_json(&raw_id).ok_or_else(|| ShapeError::MissingId {
            kind: self.kind.clone(),
            index,
        })?;

        let mut fields: Map<String, Value> = object.clone();
        let mut children = Vec::new();
        for (field, schema) in &self.nested {
            let Some(value) = fields.get(field) else {
                continue;
            };
            let replacement = match value {
                Value::Object(_) => schema.normalize_record(value, index, &mut children)?.1,
                Value::Array(items) => {
                    let mut ids = Vec::with_capacity(items.len());
                    for item in items {
                        if item.is_object() {
                            ids.push(schema.normalize_record(item, index, &mut children)?.1);
                        } else {
                            ids.push(item.clone());
                        }
                    }
                    Value::Array(ids)
                }
                // Already a reference (or null).
                _ => continue,
            };
            fields.insert(field.clone(), replacement);
        }

        let entity = Entity::new(self.kind.clone(), id, fields);
        let reference = entity.reference();
        out.push(entity);
        out.extend(children);
        Ok((reference, raw_id))
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection an entity is tracked in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Campaign,
    Workflow,
    Employee,
    Pair,
    Evaluation,
    Notification,
    Other(String),
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Campaign => "campaign",
            EntityKind::Workflow => "workflow",
            EntityKind::Employee => "employee",
            EntityKind::Pair => "pair",
            EntityKind::Evaluation => "evaluation",
            EntityKind::Notification => "notification",
            EntityKind::Other(name) => name,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a record. Numeric and string ids share one textual form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an id out of a JSON value. Only non-empty strings and numbers qualify.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(Self(number.to_string())),
            Value::String(text) if !text.trim().is_empty() => Some(Self(text.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// A uniquely identified record with its (flattened) fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: EntityId,
    pub fields: Map<String, Value>,
}

impl Entity {
    pub fn new(kind: EntityKind, id: EntityId, fields: Map<String, Value>) -> Self {
        Self { kind, id, fields }
    }

    pub fn reference(&self) -> EntityRef {
        EntityRef {
            kind: self.kind.clone(),
            id: self.id.clone(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Shallow last-write-wins merge. Returns whether any field changed.
    pub(crate) fn merge_fields(&mut self, incoming: Map<String, Value>) -> bool {
        let mut changed = false;
        for (key, value) in incoming {
            if self.fields.get(&key) != Some(&value) {
                self.fields.insert(key, value);
                changed = true;
            }
        }
        changed
    }
}

//! Units: the versioned documents of a world.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TypeError, TypeResult};
use crate::id::UnitId;

/// One structured document.
///
/// Units are pure values: they carry no identity beyond `id`, and two
/// units with the same content are interchangeable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Units keyed by id.
pub type UnitMap = BTreeMap<UnitId, Unit>;

/// Unit trees keyed by id, as consumed and produced by diff and merge.
///
/// A merged tree is not guaranteed to still have the shape of a [`Unit`]
/// until conflicts are resolved, so the engine works on raw JSON.
pub type UnitValues = BTreeMap<UnitId, Value>;

impl Unit {
    pub fn new(id: impl Into<UnitId>, kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            title: title.into(),
            fields: Map::new(),
            refs: None,
            meta: None,
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// The unit as a JSON tree, keys in declaration order.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.to_string()));
        map.insert("type".into(), Value::String(self.kind.clone()));
        map.insert("title".into(), Value::String(self.title.clone()));
        map.insert("fields".into(), Value::Object(self.fields.clone()));
        if let Some(refs) = &self.refs {
            map.insert("refs".into(), Value::Object(refs.clone()));
        }
        if let Some(meta) = &self.meta {
            map.insert("meta".into(), Value::Object(meta.clone()));
        }
        Value::Object(map)
    }

    /// Parse a JSON tree back into a unit stored under `unit_id`.
    ///
    /// Fails if the tree does not have the unit shape or names a different id.
    pub fn from_value(unit_id: &UnitId, value: Value) -> TypeResult<Self> {
        let unit: Unit = serde_json::from_value(value).map_err(|e| TypeError::InvalidUnit {
            unit_id: unit_id.to_string(),
            reason: e.to_string(),
        })?;
        if &unit.id != unit_id {
            return Err(TypeError::InvalidUnit {
                unit_id: unit_id.to_string(),
                reason: format!("content carries id {}", unit.id),
            });
        }
        Ok(unit)
    }

    pub fn summary(&self) -> UnitSummary {
        UnitSummary {
            id: self.id.clone(),
            kind: self.kind.clone(),
            title: self.title.clone(),
        }
    }
}

/// Convert a unit map into the JSON trees the engine operates on.
pub fn unit_values(units: &UnitMap) -> UnitValues {
    units
        .iter()
        .map(|(id, unit)| (id.clone(), unit.to_value()))
        .collect()
}

/// Identifying header of a unit, used in listings and conflict reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub id: UnitId,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
}

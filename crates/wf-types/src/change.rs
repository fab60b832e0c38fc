//! Records produced and consumed by the diff and merge engines.
//!
//! Absent values (`None`) stand for "the path does not exist on this side"
//! and are omitted from the serialized form, which is how a JSON client
//! sees `undefined`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::UnitId;

/// One leaf-level difference between two unit maps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffChange {
    pub unit_id: UnitId,
    /// JSON Pointer into the unit tree.
    pub path: String,
    #[serde(
        default,
        deserialize_with = "crate::json::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub from: Option<Value>,
    #[serde(
        default,
        deserialize_with = "crate::json::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<Value>,
}

/// A three-way disagreement the merge engine could not settle on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflict {
    pub unit_id: UnitId,
    pub path: String,
    #[serde(
        default,
        deserialize_with = "crate::json::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub base: Option<Value>,
    #[serde(
        default,
        deserialize_with = "crate::json::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub ours: Option<Value>,
    #[serde(
        default,
        deserialize_with = "crate::json::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub theirs: Option<Value>,
}

/// Which side a resolution takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionChoice {
    Ours,
    Theirs,
    Manual,
}

/// A caller instruction overriding the engine's default choice at one path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub unit_id: UnitId,
    pub path: String,
    pub choice: ResolutionChoice,
    /// Only meaningful for [`ResolutionChoice::Manual`].
    #[serde(
        default,
        deserialize_with = "crate::json::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

impl Resolution {
    pub fn ours(unit_id: impl Into<UnitId>, path: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            path: path.into(),
            choice: ResolutionChoice::Ours,
            value: None,
        }
    }

    pub fn theirs(unit_id: impl Into<UnitId>, path: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            path: path.into(),
            choice: ResolutionChoice::Theirs,
            value: None,
        }
    }

    pub fn manual(unit_id: impl Into<UnitId>, path: impl Into<String>, value: Value) -> Self {
        Self {
            unit_id: unit_id.into(),
            path: path.into(),
            choice: ResolutionChoice::Manual,
            value: Some(value),
        }
    }
}

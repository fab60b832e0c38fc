//! Read models returned by the SDK.
//!
//! These are shaped for clients: camelCase, with derived fields such as
//! `updatedAt` and a commit's `parents` list filled in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wf_types::{Branch, Commit, CommitId, Unit, UnitId, UnitSummary, World, WorldId};

/// A world as it appears in listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSummary {
    pub id: WorldId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&World> for WorldSummary {
    fn from(world: &World) -> Self {
        Self {
            id: world.id.clone(),
            name: world.name.clone(),
            description: world.description.clone(),
            created_at: world.created_at,
            updated_at: world.created_at,
        }
    }
}

/// A world together with its branches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldDetail {
    #[serde(flatten)]
    pub world: WorldSummary,
    pub branches: Vec<BranchView>,
}

/// A branch with the time its head last moved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchView {
    pub name: String,
    pub world_id: WorldId,
    pub head_commit_id: Option<CommitId>,
    pub created_at: DateTime<Utc>,
    /// Creation time of the head commit, or of the branch when unborn.
    pub updated_at: DateTime<Utc>,
}

impl BranchView {
    pub fn new(branch: &Branch, head: Option<&Commit>) -> Self {
        Self {
            name: branch.name.clone(),
            world_id: branch.world_id.clone(),
            head_commit_id: branch.head_commit_id.clone(),
            created_at: branch.created_at,
            updated_at: head.map_or(branch.created_at, |c| c.created_at),
        }
    }
}

/// A commit with its parents flattened into a list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitView {
    pub id: CommitId,
    pub world_id: WorldId,
    pub message: String,
    /// The present subset of `[parentA, parentB]`.
    pub parents: Vec<CommitId>,
    pub created_at: DateTime<Utc>,
}

impl From<&Commit> for CommitView {
    fn from(commit: &Commit) -> Self {
        Self {
            id: commit.id.clone(),
            world_id: commit.world_id.clone(),
            message: commit.message.clone(),
            parents: commit.parents().cloned().collect(),
            created_at: commit.created_at,
        }
    }
}

/// One entry of a unit listing: the header alone, or the whole unit when
/// content was requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitListItem {
    Full(Unit),
    Summary(UnitSummary),
}

impl UnitListItem {
    pub fn new(unit: Unit, include_content: bool) -> Self {
        if include_content {
            Self::Full(unit)
        } else {
            Self::Summary(unit.summary())
        }
    }

    pub fn id(&self) -> &UnitId {
        match self {
            Self::Full(unit) => &unit.id,
            Self::Summary(summary) => &summary.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wf_types::TenantId;

    #[test]
    fn commit_view_lists_present_parents() {
        let world = WorldId::new("w");
        let a = Commit::new(world.clone(), "a", None, None);
        let b = Commit::new(world.clone(), "b", Some(a.id.clone()), None);
        let m = Commit::new(world, "m", Some(b.id.clone()), Some(a.id.clone()));

        assert!(CommitView::from(&a).parents.is_empty());
        assert_eq!(CommitView::from(&b).parents, vec![a.id.clone()]);
        assert_eq!(CommitView::from(&m).parents, vec![b.id, a.id]);
    }

    #[test]
    fn branch_updated_at_tracks_head() {
        let world = World::new(TenantId::new("t"), "w", None);
        let branch = Branch::new(world.id.clone(), "main", None);
        assert_eq!(BranchView::new(&branch, None).updated_at, branch.created_at);

        let head = Commit::new(world.id, "c", None, None);
        assert_eq!(BranchView::new(&branch, Some(&head)).updated_at, head.created_at);
    }

    #[test]
    fn unit_item_content_is_optional() {
        let unit = Unit::new("u1", "npc", "Ana").with_field("hp", json!(1));
        let bare = serde_json::to_value(UnitListItem::new(unit.clone(), false)).unwrap();
        assert_eq!(bare, json!({"id": "u1", "type": "npc", "title": "Ana"}));

        let full = serde_json::to_value(UnitListItem::new(unit, true)).unwrap();
        assert_eq!(
            full,
            json!({"id": "u1", "type": "npc", "title": "Ana", "fields": {"hp": 1}})
        );
    }
}

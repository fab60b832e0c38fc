//! Worlds, branches, and commits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{BranchId, CommitId, TenantId, WorldId};

/// Top-level namespace owned by one tenant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    pub id: WorldId,
    #[serde(skip_serializing, default)]
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl World {
    /// Create a world with a fresh id, stamped now.
    pub fn new(tenant_id: TenantId, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: WorldId::generate(),
            tenant_id,
            name: name.into(),
            description,
            created_at: Utc::now(),
        }
    }
}

/// A named, mutable pointer to a commit.
///
/// `head_commit_id` is the only field that changes after creation, and it
/// only changes through a compare-and-swap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub world_id: WorldId,
    pub name: String,
    pub head_commit_id: Option<CommitId>,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// Create a branch with a fresh id, stamped now.
    pub fn new(world_id: WorldId, name: impl Into<String>, head_commit_id: Option<CommitId>) -> Self {
        Self {
            id: BranchId::generate(),
            world_id,
            name: name.into(),
            head_commit_id,
            created_at: Utc::now(),
        }
    }
}

/// An immutable point in history with up to two parents.
///
/// A commit with only `parent_a` is a normal commit, one with both parents
/// is a merge commit, and one with neither is a root commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: CommitId,
    pub world_id: WorldId,
    pub message: String,
    pub parent_a: Option<CommitId>,
    pub parent_b: Option<CommitId>,
    pub created_at: DateTime<Utc>,
}

impl Commit {
    /// Create a commit with a fresh id, stamped now.
    pub fn new(
        world_id: WorldId,
        message: impl Into<String>,
        parent_a: Option<CommitId>,
        parent_b: Option<CommitId>,
    ) -> Self {
        Self {
            id: CommitId::generate(),
            world_id,
            message: message.into(),
            parent_a,
            parent_b,
            created_at: Utc::now(),
        }
    }

    /// Parent ids in `[parent_a, parent_b]` order, skipping absent ones.
    pub fn parents(&self) -> impl Iterator<Item = &CommitId> {
        self.parent_a.iter().chain(self.parent_b.iter())
    }

    pub fn is_root(&self) -> bool {
        self.parent_a.is_none() && self.parent_b.is_none()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_a.is_some() && self.parent_b.is_some()
    }
}

//! In-memory commit arena.
//!
//! [`CommitDag`] stores commits in a [`HashMap`] keyed by id. Parent links
//! are plain ids into the same arena.
//!
//! # Invariants
//!
//! - Commit ids are unique within the arena.
//! - Every parent reference resolves to a commit already in the arena.
//! - No commit names itself as a parent.
//!
//! Together with append-only insertion these rule out cycles, so the walks
//! in [`crate::walk`] only need their visited sets as a guard.

use std::collections::HashMap;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::debug;

use wf_types::{Commit, CommitId};

use crate::error::{DagError, DagResult};
use crate::walk::CommitSource;

/// Append-only arena of commits.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommitDag {
    commits: HashMap<CommitId, Commit>,
}

impl CommitDag {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Returns `true` if the arena holds no commits.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Insert a commit.
    ///
    /// Both parents must already be present and the commit must not name
    /// itself as a parent.
    pub fn insert(&mut self, commit: Commit) -> DagResult<()> {
        self.check(&commit)?;
        debug!(
            commit = %commit.id.short_id(),
            merge = commit.is_merge(),
            "added commit"
        );
        self.commits.insert(commit.id.clone(), commit);
        Ok(())
    }

    /// Validate a commit against the arena without inserting it.
    pub fn check(&self, commit: &Commit) -> DagResult<()> {
        if self.commits.contains_key(&commit.id) {
            return Err(DagError::DuplicateCommit(commit.id.clone()));
        }
        for parent in commit.parents() {
            if parent == &commit.id {
                return Err(DagError::SelfParent(commit.id.clone()));
            }
            if !self.commits.contains_key(parent) {
                return Err(DagError::DanglingParent {
                    commit: commit.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &CommitId) -> Option<&Commit> {
        self.commits.get(id)
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.commits.contains_key(id)
    }

    /// Serialize the arena to bincode bytes.
    pub fn to_bytes(&self) -> DagResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| DagError::Serialization(e.to_string()))
    }

    /// Deserialize an arena from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> DagResult<Self> {
        bincode::deserialize(data).map_err(|e| DagError::Serialization(e.to_string()))
    }
}

impl CommitSource for CommitDag {
    type Error = Infallible;

    fn load_commit(&self, id: &CommitId) -> Result<Option<Commit>, Infallible> {
        Ok(self.commits.get(id).cloned())
    }
}

//! In-memory world store.
//!
//! [`InMemoryStore`] keeps all state in one structure behind a `RwLock`.
//! A transaction holds the write lock from start to finish and stages its
//! writes on the side; they are folded into the state only when the
//! transaction body returns `Ok`. That makes every transaction serializable
//! and all-or-nothing.
//!
//! The whole state can be saved to and loaded from a JSON file so a server
//! can survive restarts.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use wf_dag::{CommitDag, DagError};
use wf_types::{Branch, BranchId, Commit, CommitId, TenantId, Unit, UnitId, UnitMap, World, WorldId};

use crate::error::{StoreError, StoreResult};
use crate::traits::{CasOutcome, Transaction, WorldStore};

/// An in-memory implementation of [`WorldStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    worlds: BTreeMap<WorldId, OwnedWorld>,
    branches: BTreeMap<BranchId, Branch>,
    commits: CommitDag,
    snapshots: HashMap<CommitId, UnitMap>,
    unit_states: HashMap<BranchId, UnitMap>,
}

/// A world with its owner kept alongside, since the tenant is not part of a
/// world's serialized form.
#[derive(Debug, Serialize, Deserialize)]
struct OwnedWorld {
    tenant_id: TenantId,
    world: World,
}

impl OwnedWorld {
    fn to_world(&self) -> World {
        World {
            tenant_id: self.tenant_id.clone(),
            ..self.world.clone()
        }
    }
}

impl StoreState {
    fn commit_in_world(&self, id: &CommitId, world: &WorldId) -> StoreResult<()> {
        match self.commits.get(id) {
            Some(commit) if &commit.world_id == world => Ok(()),
            _ => Err(StoreError::CommitNotFound(id.clone())),
        }
    }
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store previously written by [`InMemoryStore::save`].
    pub fn load(path: &Path) -> StoreResult<Self> {
        let data = fs::read(path)?;
        let state: StoreState =
            serde_json::from_slice(&data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(
            path = %path.display(),
            worlds = state.worlds.len(),
            commits = state.commits.len(),
            "loaded store"
        );
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Write the whole store to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let state = self.read()?;
        let data =
            serde_json::to_vec(&*state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "saved store");
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl WorldStore for InMemoryStore {
    fn insert_world(&self, world: World, main: Branch) -> StoreResult<()> {
        let mut state = self.write()?;
        if main.world_id != world.id {
            return Err(StoreError::WorldNotFound(main.world_id));
        }
        debug!(world = %world.id.short_id(), tenant = %world.tenant_id, "inserted world");
        state.unit_states.insert(main.id.clone(), UnitMap::new());
        state.branches.insert(main.id.clone(), main);
        state.worlds.insert(
            world.id.clone(),
            OwnedWorld {
                tenant_id: world.tenant_id.clone(),
                world,
            },
        );
        Ok(())
    }

    fn world(&self, id: &WorldId) -> StoreResult<Option<World>> {
        Ok(self.read()?.worlds.get(id).map(OwnedWorld::to_world))
    }

    fn worlds(&self, tenant: &TenantId) -> StoreResult<Vec<World>> {
        let state = self.read()?;
        Ok(state
            .worlds
            .values()
            .rev()
            .filter(|owned| &owned.tenant_id == tenant)
            .map(OwnedWorld::to_world)
            .collect())
    }

    fn insert_branch(&self, branch: Branch, seed: UnitMap) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.worlds.contains_key(&branch.world_id) {
            return Err(StoreError::WorldNotFound(branch.world_id));
        }
        if state
            .branches
            .values()
            .any(|b| b.world_id == branch.world_id && b.name == branch.name)
        {
            return Err(StoreError::BranchExists {
                world_id: branch.world_id,
                name: branch.name,
            });
        }
        if let Some(head) = &branch.head_commit_id {
            state.commit_in_world(head, &branch.world_id)?;
        }
        debug!(
            branch = %branch.name,
            world = %branch.world_id.short_id(),
            units = seed.len(),
            "inserted branch"
        );
        state.unit_states.insert(branch.id.clone(), seed);
        state.branches.insert(branch.id.clone(), branch);
        Ok(())
    }

    fn branch(&self, world: &WorldId, name: &str) -> StoreResult<Option<Branch>> {
        let state = self.read()?;
        Ok(state
            .branches
            .values()
            .find(|b| &b.world_id == world && b.name == name)
            .cloned())
    }

    fn branches(&self, world: &WorldId) -> StoreResult<Vec<Branch>> {
        let state = self.read()?;
        let mut branches: Vec<Branch> = state
            .branches
            .values()
            .filter(|b| &b.world_id == world)
            .cloned()
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    fn commit(&self, id: &CommitId) -> StoreResult<Option<Commit>> {
        Ok(self.read()?.commits.get(id).cloned())
    }

    fn branch_units(&self, branch: &BranchId) -> StoreResult<UnitMap> {
        Ok(self
            .read()?
            .unit_states
            .get(branch)
            .cloned()
            .unwrap_or_default())
    }

    fn commit_units(&self, commit: &CommitId) -> StoreResult<UnitMap> {
        Ok(self
            .read()?
            .snapshots
            .get(commit)
            .cloned()
            .unwrap_or_default())
    }

    fn branch_unit(&self, branch: &BranchId, unit: &UnitId) -> StoreResult<Option<Unit>> {
        let state = self.read()?;
        Ok(state
            .unit_states
            .get(branch)
            .and_then(|units| units.get(unit))
            .cloned())
    }

    fn commit_unit(&self, commit: &CommitId, unit: &UnitId) -> StoreResult<Option<Unit>> {
        let state = self.read()?;
        Ok(state
            .snapshots
            .get(commit)
            .and_then(|units| units.get(unit))
            .cloned())
    }

    fn put_unit_state(&self, branch: &BranchId, unit: Unit) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.branches.contains_key(branch) {
            return Err(StoreError::BranchNotFound(branch.clone()));
        }
        state
            .unit_states
            .entry(branch.clone())
            .or_default()
            .insert(unit.id.clone(), unit);
        Ok(())
    }

    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut state = self.write()?;
        let mut tx = MemoryTransaction {
            state: &*state,
            staged: Staged::default(),
        };
        let out = f(&mut tx)?;
        let staged = tx.staged;
        staged.apply(&mut state)?;
        Ok(out)
    }
}

/// Writes buffered by a transaction until it succeeds.
#[derive(Debug, Default)]
struct Staged {
    commits: Vec<Commit>,
    snapshots: Vec<(CommitId, UnitMap)>,
    unit_states: Vec<(BranchId, Unit)>,
    heads: HashMap<BranchId, CommitId>,
}

impl Staged {
    fn has_commit(&self, id: &CommitId) -> bool {
        self.commits.iter().any(|c| &c.id == id)
    }

    /// Fold the staged writes into `state`.
    ///
    /// Every write was validated against `state` when staged, under the same
    /// lock, so nothing here can fail halfway.
    fn apply(self, state: &mut StoreState) -> StoreResult<()> {
        debug!(
            commits = self.commits.len(),
            unit_states = self.unit_states.len(),
            heads = self.heads.len(),
            "committing transaction"
        );
        for commit in self.commits {
            state.commits.insert(commit)?;
        }
        for (commit, units) in self.snapshots {
            state.snapshots.entry(commit).or_default().extend(units);
        }
        for (branch, unit) in self.unit_states {
            state
                .unit_states
                .entry(branch)
                .or_default()
                .insert(unit.id.clone(), unit);
        }
        for (branch, head) in self.heads {
            if let Some(b) = state.branches.get_mut(&branch) {
                b.head_commit_id = Some(head);
            }
        }
        Ok(())
    }
}

struct MemoryTransaction<'a> {
    state: &'a StoreState,
    staged: Staged,
}

impl Transaction for MemoryTransaction<'_> {
    fn branch(&self, id: &BranchId) -> StoreResult<Option<Branch>> {
        Ok(self.state.branches.get(id).map(|branch| {
            let mut branch = branch.clone();
            if let Some(head) = self.staged.heads.get(id) {
                branch.head_commit_id = Some(head.clone());
            }
            branch
        }))
    }

    fn branch_units(&self, id: &BranchId) -> StoreResult<UnitMap> {
        let mut units = self.state.unit_states.get(id).cloned().unwrap_or_default();
        for (branch, unit) in &self.staged.unit_states {
            if branch == id {
                units.insert(unit.id.clone(), unit.clone());
            }
        }
        Ok(units)
    }

    fn insert_commit(&mut self, commit: Commit) -> StoreResult<()> {
        if !self.state.worlds.contains_key(&commit.world_id) {
            return Err(StoreError::WorldNotFound(commit.world_id));
        }
        if self.staged.has_commit(&commit.id) {
            return Err(DagError::DuplicateCommit(commit.id).into());
        }
        self.state.commits.check(&commit)?;
        for parent in commit.parents() {
            self.state.commit_in_world(parent, &commit.world_id)?;
        }
        self.staged.commits.push(commit);
        Ok(())
    }

    fn insert_snapshots(&mut self, commit: &CommitId, units: UnitMap) -> StoreResult<()> {
        if !self.staged.has_commit(commit) {
            return Err(StoreError::CommitNotFound(commit.clone()));
        }
        self.staged.snapshots.push((commit.clone(), units));
        Ok(())
    }

    fn put_unit_state(&mut self, branch: &BranchId, unit: Unit) -> StoreResult<()> {
        if !self.state.branches.contains_key(branch) {
            return Err(StoreError::BranchNotFound(branch.clone()));
        }
        self.staged.unit_states.push((branch.clone(), unit));
        Ok(())
    }

    fn compare_and_swap_head(
        &mut self,
        branch: &BranchId,
        expected: Option<&CommitId>,
        new: &CommitId,
    ) -> StoreResult<CasOutcome> {
        let current = self
            .branch(branch)?
            .ok_or_else(|| StoreError::BranchNotFound(branch.clone()))?;
        if current.head_commit_id.as_ref() != expected {
            return Ok(CasOutcome::Mismatch {
                actual: current.head_commit_id,
            });
        }

        let known = match self.staged.commits.iter().find(|c| &c.id == new) {
            Some(staged) => staged.world_id == current.world_id,
            None => self.state.commit_in_world(new, &current.world_id).is_ok(),
        };
        if !known {
            return Err(StoreError::CommitNotFound(new.clone()));
        }

        self.staged.heads.insert(branch.clone(), new.clone());
        Ok(CasOutcome::Swapped)
    }
}

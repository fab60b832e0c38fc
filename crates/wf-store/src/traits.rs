use wf_dag::CommitSource;
use wf_types::{Branch, BranchId, Commit, CommitId, TenantId, Unit, UnitId, UnitMap, World, WorldId};

use crate::error::{StoreError, StoreResult};

/// Result of a branch head compare-and-swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    /// The head matched and now points at the new commit.
    Swapped,
    /// The head had moved; nothing was written.
    Mismatch { actual: Option<CommitId> },
}

/// Persistent state of every world.
///
/// All implementations must satisfy these invariants:
/// - Commits and their snapshots are immutable once written.
/// - A branch head, when set, names an existing commit of the same world.
/// - Everything written inside one [`WorldStore::transact`] call becomes
///   visible together or not at all, and concurrent transactions behave as
///   if run one after another.
/// - Unit state writes outside a transaction are last-writer-wins.
pub trait WorldStore: Send + Sync {
    /// Insert a new world together with its initial branch.
    fn insert_world(&self, world: World, main: Branch) -> StoreResult<()>;

    /// Read a world by id. Returns `Ok(None)` if it does not exist.
    fn world(&self, id: &WorldId) -> StoreResult<Option<World>>;

    /// All worlds owned by `tenant`, world id descending.
    fn worlds(&self, tenant: &TenantId) -> StoreResult<Vec<World>>;

    /// Insert a branch whose unit states start out as `seed`.
    ///
    /// Fails with [`StoreError::BranchExists`] if the name is taken in the
    /// world.
    fn insert_branch(&self, branch: Branch, seed: UnitMap) -> StoreResult<()>;

    /// Read a branch by world and name.
    fn branch(&self, world: &WorldId, name: &str) -> StoreResult<Option<Branch>>;

    /// All branches of a world, name ascending.
    fn branches(&self, world: &WorldId) -> StoreResult<Vec<Branch>>;

    /// Read a commit record by id.
    fn commit(&self, id: &CommitId) -> StoreResult<Option<Commit>>;

    /// Current unit states on a branch.
    fn branch_units(&self, branch: &BranchId) -> StoreResult<UnitMap>;

    /// Unit snapshots frozen into a commit.
    fn commit_units(&self, commit: &CommitId) -> StoreResult<UnitMap>;

    /// Current state of one unit on a branch.
    fn branch_unit(&self, branch: &BranchId, unit: &UnitId) -> StoreResult<Option<Unit>> {
        Ok(self.branch_units(branch)?.remove(unit))
    }

    /// Snapshot of one unit in a commit.
    fn commit_unit(&self, commit: &CommitId, unit: &UnitId) -> StoreResult<Option<Unit>> {
        Ok(self.commit_units(commit)?.remove(unit))
    }

    /// Overwrite the current state of one unit on a branch.
    fn put_unit_state(&self, branch: &BranchId, unit: Unit) -> StoreResult<()>;

    /// Run `f` as one atomic, serializable transaction.
    ///
    /// Writes staged through the [`Transaction`] take effect only if `f`
    /// returns `Ok`; on `Err` (or panic) nothing is observed.
    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>;

    /// View the store's commits as a [`CommitSource`] for graph walks.
    fn commits(&self) -> StoreCommits<'_, Self>
    where
        Self: Sized,
    {
        StoreCommits(self)
    }
}

/// Commit records of a [`WorldStore`], readable by the `wf_dag` walks.
pub struct StoreCommits<'a, S>(&'a S);

impl<S: WorldStore> CommitSource for StoreCommits<'_, S> {
    type Error = StoreError;

    fn load_commit(&self, id: &CommitId) -> StoreResult<Option<Commit>> {
        self.0.commit(id)
    }
}

/// Operations available inside [`WorldStore::transact`].
///
/// Reads observe the transaction's own staged writes.
pub trait Transaction {
    /// Read a branch by id.
    fn branch(&self, id: &BranchId) -> StoreResult<Option<Branch>>;

    /// Current unit states on a branch.
    fn branch_units(&self, id: &BranchId) -> StoreResult<UnitMap>;

    /// Stage a new commit. Its parents must already exist.
    fn insert_commit(&mut self, commit: Commit) -> StoreResult<()>;

    /// Stage the snapshots of a commit staged in this transaction.
    fn insert_snapshots(&mut self, commit: &CommitId, units: UnitMap) -> StoreResult<()>;

    /// Stage an overwrite of one unit's current state on a branch.
    fn put_unit_state(&mut self, branch: &BranchId, unit: Unit) -> StoreResult<()>;

    /// Stage `branch.head = new` if the head currently equals `expected`.
    fn compare_and_swap_head(
        &mut self,
        branch: &BranchId,
        expected: Option<&CommitId>,
        new: &CommitId,
    ) -> StoreResult<CasOutcome>;
}

use std::sync::Arc;

use tracing::{info, warn};

use wf_store::{CasOutcome, Transaction, WorldStore};
use wf_types::{Branch, BranchId, Commit, CommitId, UnitMap};

use crate::error::{LedgerError, LedgerResult};
use crate::expected::ExpectedHead;

/// Moves branch heads forward, one commit at a time.
pub struct BranchHeadController<S> {
    store: Arc<S>,
}

impl<S> Clone for BranchHeadController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: WorldStore> BranchHeadController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Commit the branch's current unit states.
    ///
    /// The new commit's only parent is the head read inside the
    /// transaction, and every current unit state is snapshotted into it.
    pub fn commit(
        &self,
        branch: &BranchId,
        message: &str,
        expected: &ExpectedHead,
    ) -> LedgerResult<Commit> {
        let result = self.store.transact(|tx| {
            let current = checked_branch(tx, branch, expected)?;
            let commit = Commit::new(
                current.world_id.clone(),
                message,
                current.head_commit_id.clone(),
                None,
            );
            tx.insert_commit(commit.clone())?;
            let units = tx.branch_units(branch)?;
            tx.insert_snapshots(&commit.id, units)?;
            swap_head(tx, &current, expected, &commit.id)?;
            Ok(commit)
        });
        logged(result, "created commit")
    }

    /// Record a merge of `theirs_head` into the branch.
    ///
    /// `resolved` becomes both the merge commit's snapshots and the branch's
    /// new unit states. Units on the branch that are not in `resolved` keep
    /// their current state.
    pub fn merge_commit(
        &self,
        ours: &BranchId,
        theirs_head: Option<&CommitId>,
        message: &str,
        resolved: UnitMap,
        expected: &ExpectedHead,
    ) -> LedgerResult<Commit> {
        let result = self.store.transact(|tx| {
            let current = checked_branch(tx, ours, expected)?;
            let commit = Commit::new(
                current.world_id.clone(),
                message,
                current.head_commit_id.clone(),
                theirs_head.cloned(),
            );
            tx.insert_commit(commit.clone())?;
            for unit in resolved.values() {
                tx.put_unit_state(ours, unit.clone())?;
            }
            tx.insert_snapshots(&commit.id, resolved)?;
            swap_head(tx, &current, expected, &commit.id)?;
            Ok(commit)
        });
        logged(result, "created merge commit")
    }
}

/// Read the branch and check it against `expected`.
fn checked_branch(
    tx: &dyn Transaction,
    id: &BranchId,
    expected: &ExpectedHead,
) -> LedgerResult<Branch> {
    let branch = tx
        .branch(id)?
        .ok_or_else(|| LedgerError::BranchNotFound(id.clone()))?;
    if !expected.matches(branch.head_commit_id.as_ref()) {
        return Err(LedgerError::HeadChanged {
            expected: expected.resolve(branch.head_commit_id.as_ref()),
            actual: branch.head_commit_id,
            branch_name: branch.name,
        });
    }
    Ok(branch)
}

/// Swap the head from the value `read` was observed with to `new`.
fn swap_head(
    tx: &mut dyn Transaction,
    read: &Branch,
    expected: &ExpectedHead,
    new: &CommitId,
) -> LedgerResult<()> {
    match tx.compare_and_swap_head(&read.id, read.head_commit_id.as_ref(), new)? {
        CasOutcome::Swapped => Ok(()),
        CasOutcome::Mismatch { actual } => Err(LedgerError::HeadChanged {
            branch_name: read.name.clone(),
            expected: expected.resolve(read.head_commit_id.as_ref()),
            actual,
        }),
    }
}

fn logged(result: LedgerResult<Commit>, what: &str) -> LedgerResult<Commit> {
    match &result {
        Ok(commit) => info!(
            commit = %commit.id.short_id(),
            world = %commit.world_id.short_id(),
            merge = commit.is_merge(),
            "{what}"
        ),
        Err(LedgerError::HeadChanged {
            branch_name,
            expected,
            actual,
        }) => warn!(
            branch = %branch_name,
            ?expected,
            ?actual,
            "branch head changed"
        ),
        Err(_) => {}
    }
    result
}

//! Graph walks over any commit source.
//!
//! The walks read commits one at a time through [`CommitSource`], so they
//! work the same against the in-memory [`CommitDag`](crate::CommitDag) and
//! against a store that loads commits on demand. A commit that cannot be
//! found ends that branch of the walk without error.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use wf_types::{Commit, CommitId};

/// Read access to commit records by id.
pub trait CommitSource {
    /// Failure to reach the underlying storage. A missing commit is not an
    /// error; it is reported as `Ok(None)`.
    type Error;

    fn load_commit(&self, id: &CommitId) -> Result<Option<Commit>, Self::Error>;
}

/// Every commit reachable from `id` through parent links, `id` included.
///
/// Stack-based traversal following `parent_a` then `parent_b`. Each commit
/// is visited at most once.
pub fn ancestors<S>(source: &S, id: &CommitId) -> Result<HashSet<CommitId>, S::Error>
where
    S: CommitSource + ?Sized,
{
    let mut visited = HashSet::new();
    let mut stack = vec![id.clone()];

    while let Some(current) = stack.pop() {
        if visited.contains(&current) {
            continue;
        }
        let commit = source.load_commit(&current)?;
        visited.insert(current);
        if let Some(commit) = commit {
            stack.extend(commit.parents().cloned());
        }
    }

    Ok(visited)
}

/// A common ancestor of `a` and `b`, or `None` if either is absent or the
/// two share no history.
///
/// Breadth-first from `b`, returning the first commit that is also an
/// ancestor of `a`. This is the common ancestor closest to `b`; in graphs
/// with criss-cross merges it need not be the unique lowest one.
pub fn common_ancestor<S>(
    source: &S,
    a: Option<&CommitId>,
    b: Option<&CommitId>,
) -> Result<Option<CommitId>, S::Error>
where
    S: CommitSource + ?Sized,
{
    let (Some(a), Some(b)) = (a, b) else {
        return Ok(None);
    };

    let ours = ancestors(source, a)?;
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([b.clone()]);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if ours.contains(&current) {
            debug!(
                a = %a.short_id(),
                b = %b.short_id(),
                base = %current.short_id(),
                visited = visited.len(),
                "resolved merge base"
            );
            return Ok(Some(current));
        }
        if let Some(commit) = source.load_commit(&current)? {
            queue.extend(commit.parents().cloned());
        }
    }

    debug!(a = %a.short_id(), b = %b.short_id(), "no merge base");
    Ok(None)
}

/// All commits reachable from `head`, newest first.
///
/// Ordered by `(created_at, id)` descending so the order is total even when
/// timestamps collide.
pub fn history<S>(source: &S, head: Option<&CommitId>) -> Result<Vec<Commit>, S::Error>
where
    S: CommitSource + ?Sized,
{
    let Some(head) = head else {
        return Ok(Vec::new());
    };

    let mut commits = Vec::new();
    for id in ancestors(source, head)? {
        if let Some(commit) = source.load_commit(&id)? {
            commits.push(commit);
        }
    }
    commits.sort_by(|x, y| (y.created_at, &y.id).cmp(&(x.created_at, &x.id)));
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommitDag;
    use chrono::{TimeZone, Utc};
    use wf_types::WorldId;

    fn commit(id: &str, parents: &[&str], secs: i64) -> Commit {
        Commit {
            id: CommitId::new(id),
            world_id: WorldId::new("w1"),
            message: id.to_string(),
            parent_a: parents.first().map(|p| CommitId::new(*p)),
            parent_b: parents.get(1).map(|p| CommitId::new(*p)),
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    fn id(s: &str) -> CommitId {
        CommitId::new(s)
    }

    /// ```text
    ///        c0
    ///       /  \
    ///     a1    b1
    ///     |     |
    ///     a2    b2
    ///       \  /
    ///        m
    /// ```
    fn diamond() -> CommitDag {
        let mut dag = CommitDag::new();
        dag.insert(commit("c0", &[], 0)).unwrap();
        dag.insert(commit("a1", &["c0"], 1)).unwrap();
        dag.insert(commit("b1", &["c0"], 2)).unwrap();
        dag.insert(commit("a2", &["a1"], 3)).unwrap();
        dag.insert(commit("b2", &["b1"], 4)).unwrap();
        dag.insert(commit("m", &["a2", "b2"], 5)).unwrap();
        dag
    }

    /// Commit source that hides some commits.
    struct Sparse {
        dag: CommitDag,
        hidden: HashSet<CommitId>,
    }

    impl CommitSource for Sparse {
        type Error = String;

        fn load_commit(&self, id: &CommitId) -> Result<Option<Commit>, String> {
            if self.hidden.contains(id) {
                return Ok(None);
            }
            Ok(self.dag.get(id).cloned())
        }
    }

    #[test]
    fn ancestors_include_start_and_both_parents() {
        let dag = diamond();
        let set = ancestors(&dag, &id("m")).unwrap();
        assert_eq!(set.len(), 6);
        for c in ["m", "a2", "a1", "b2", "b1", "c0"] {
            assert!(set.contains(&id(c)), "{c} missing");
        }
    }

    #[test]
    fn ancestors_of_root_is_itself() {
        let dag = diamond();
        let set = ancestors(&dag, &id("c0")).unwrap();
        assert_eq!(set, HashSet::from([id("c0")]));
    }

    #[test]
    fn ancestors_of_unknown_commit() {
        let dag = diamond();
        let set = ancestors(&dag, &id("ghost")).unwrap();
        assert_eq!(set, HashSet::from([id("ghost")]));
    }

    #[test]
    fn common_ancestor_of_self() {
        let dag = diamond();
        assert_eq!(
            common_ancestor(&dag, Some(&id("a2")), Some(&id("a2"))).unwrap(),
            Some(id("a2"))
        );
    }

    #[test]
    fn common_ancestor_of_divergent_branches() {
        let dag = diamond();
        assert_eq!(
            common_ancestor(&dag, Some(&id("a2")), Some(&id("b2"))).unwrap(),
            Some(id("c0"))
        );
    }

    #[test]
    fn common_ancestor_when_one_side_contains_the_other() {
        let dag = diamond();
        assert_eq!(
            common_ancestor(&dag, Some(&id("m")), Some(&id("b1"))).unwrap(),
            Some(id("b1"))
        );
        assert_eq!(
            common_ancestor(&dag, Some(&id("a1")), Some(&id("m"))).unwrap(),
            Some(id("a1"))
        );
    }

    #[test]
    fn common_ancestor_absent_side() {
        let dag = diamond();
        assert_eq!(common_ancestor(&dag, None, Some(&id("m"))).unwrap(), None);
        assert_eq!(common_ancestor(&dag, Some(&id("m")), None).unwrap(), None);
    }

    #[test]
    fn common_ancestor_of_unrelated_roots() {
        let mut dag = diamond();
        dag.insert(commit("r0", &[], 10)).unwrap();
        dag.insert(commit("r1", &["r0"], 11)).unwrap();
        assert_eq!(
            common_ancestor(&dag, Some(&id("m")), Some(&id("r1"))).unwrap(),
            None
        );
    }

    #[test]
    fn missing_commit_ends_the_walk() {
        let source = Sparse {
            dag: diamond(),
            hidden: HashSet::from([id("b1")]),
        };
        // b2 -> b1 is cut, so the walk from b2 never reaches c0.
        assert_eq!(
            common_ancestor(&source, Some(&id("a2")), Some(&id("b2"))).unwrap(),
            None
        );
    }

    #[test]
    fn history_is_newest_first() {
        let dag = diamond();
        let ids: Vec<String> = history(&dag, Some(&id("m")))
            .unwrap()
            .into_iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, vec!["m", "b2", "a2", "b1", "a1", "c0"]);
    }

    #[test]
    fn history_breaks_timestamp_ties_by_id() {
        let mut dag = CommitDag::new();
        dag.insert(commit("c0", &[], 0)).unwrap();
        dag.insert(commit("x", &["c0"], 1)).unwrap();
        dag.insert(commit("y", &["c0"], 1)).unwrap();
        dag.insert(commit("m", &["x", "y"], 2)).unwrap();
        let ids: Vec<String> = history(&dag, Some(&id("m")))
            .unwrap()
            .into_iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, vec!["m", "y", "x", "c0"]);
    }

    #[test]
    fn history_of_unborn_branch() {
        let dag = diamond();
        assert!(history(&dag, None).unwrap().is_empty());
    }
}

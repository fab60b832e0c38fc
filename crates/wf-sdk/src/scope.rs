use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use wf_dag::history;
use wf_diff::{diff_units, UnitDiff};
use wf_ledger::ExpectedHead;
use wf_refs::{validate_branch_name, RefSpec};
use wf_store::WorldStore;
use wf_types::{
    paginate, unit_values, Branch, Commit, CommitId, Page, Unit, UnitId, UnitMap, World,
};

use crate::error::{SdkError, SdkResult};
use crate::fork::{WorldFork, DEFAULT_BRANCH};
use crate::views::{BranchView, CommitView, UnitListItem, WorldDetail, WorldSummary};

/// Where a new branch starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BranchSource {
    /// The current head of another branch.
    Branch(String),
    /// A specific commit of the same world.
    Commit(CommitId),
}

impl Default for BranchSource {
    fn default() -> Self {
        Self::Branch(DEFAULT_BRANCH.to_string())
    }
}

impl BranchSource {
    /// Build a source from the optional request fields. Naming neither
    /// starts from `main`; naming both is an error.
    pub fn from_parts(branch: Option<String>, commit: Option<CommitId>) -> SdkResult<Self> {
        match (branch, commit) {
            (Some(_), Some(_)) => Err(SdkError::InvalidInput(
                "provide either sourceBranch or sourceCommitId".into(),
            )),
            (Some(name), None) => Ok(Self::Branch(name)),
            (None, Some(id)) => Ok(Self::Commit(id)),
            (None, None) => Ok(Self::default()),
        }
    }
}

/// A unit as submitted for upsert; the id is assigned when absent.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UnitDraft {
    #[serde(default)]
    pub id: Option<UnitId>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub refs: Option<Map<String, Value>>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

impl From<Unit> for UnitDraft {
    fn from(unit: Unit) -> Self {
        Self {
            id: Some(unit.id),
            kind: unit.kind,
            title: unit.title,
            fields: unit.fields,
            refs: unit.refs,
            meta: unit.meta,
        }
    }
}

impl UnitDraft {
    fn into_unit(self) -> SdkResult<Unit> {
        let id = match self.id {
            Some(id) if id.as_str().is_empty() => {
                return Err(SdkError::InvalidInput("unit id must not be empty".into()))
            }
            Some(id) => id,
            None => UnitId::generate(),
        };
        Ok(Unit {
            id,
            kind: self.kind,
            title: self.title,
            fields: self.fields,
            refs: self.refs,
            meta: self.meta,
        })
    }
}

/// Operations on one world, already checked against the caller's tenant.
pub struct WorldScope<'a, S> {
    fork: &'a WorldFork<S>,
    world: World,
}

impl<'a, S: WorldStore> WorldScope<'a, S> {
    pub(crate) fn new(fork: &'a WorldFork<S>, world: World) -> Self {
        Self { fork, world }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn fork(&self) -> &'a WorldFork<S> {
        self.fork
    }

    /// The world with all of its branches.
    pub fn detail(&self) -> SdkResult<WorldDetail> {
        Ok(WorldDetail {
            world: WorldSummary::from(&self.world),
            branches: self.branches(None)?,
        })
    }

    // ---- Branches ----

    /// Branches by name, optionally only the one named `name`.
    pub fn branches(&self, name: Option<&str>) -> SdkResult<Vec<BranchView>> {
        let store = self.fork.store();
        store
            .branches(&self.world.id)?
            .into_iter()
            .filter(|b| name.map_or(true, |n| b.name == n))
            .map(|b| -> SdkResult<BranchView> {
                let head = match &b.head_commit_id {
                    Some(id) => store.commit(id)?,
                    None => None,
                };
                Ok(BranchView::new(&b, head.as_ref()))
            })
            .collect()
    }

    /// Look up a branch by name.
    pub fn branch(&self, name: &str) -> SdkResult<Branch> {
        self.fork
            .store()
            .branch(&self.world.id, name)?
            .ok_or_else(|| SdkError::BranchNotFound(name.to_string()))
    }

    /// Create a branch whose head and unit states come from `source`.
    pub fn create_branch(&self, name: &str, source: BranchSource) -> SdkResult<Branch> {
        validate_branch_name(name)?;
        let head = match source {
            BranchSource::Branch(source) => self.branch(&source)?.head_commit_id,
            BranchSource::Commit(id) => Some(self.commit(&id)?.id),
        };
        let seed = match &head {
            Some(id) => self.fork.store().commit_units(id)?,
            None => UnitMap::new(),
        };

        let branch = Branch::new(self.world.id.clone(), name, head);
        self.fork.store().insert_branch(branch.clone(), seed)?;
        info!(
            world = %self.world.id.short_id(),
            branch = %branch.name,
            head = ?branch.head_commit_id,
            "created branch"
        );
        Ok(branch)
    }

    // ---- Units ----

    /// Write a unit's current state on a branch, replacing any previous one.
    pub fn upsert_unit(&self, branch: &str, draft: UnitDraft) -> SdkResult<Unit> {
        let branch = self.branch(branch)?;
        let unit = draft.into_unit()?;
        self.fork.store().put_unit_state(&branch.id, unit.clone())?;
        debug!(branch = %branch.name, unit = %unit.id, "upserted unit");
        Ok(unit)
    }

    /// Units visible at `reference`, by id ascending.
    pub fn list_units(
        &self,
        reference: &str,
        limit: usize,
        cursor: Option<&str>,
        include_content: bool,
    ) -> SdkResult<Page<UnitListItem>> {
        let units = self.units_at(&RefSpec::parse(reference)?)?;
        let page = paginate(units.into_values(), limit, cursor, |u| u.id.to_string())?;
        Ok(page.map(|unit| UnitListItem::new(unit, include_content)))
    }

    /// One unit as seen at `reference`.
    pub fn get_unit(&self, reference: &str, unit_id: &UnitId) -> SdkResult<Unit> {
        let store = self.fork.store();
        let unit = match RefSpec::parse(reference)? {
            RefSpec::Branch(name) => store.branch_unit(&self.branch(&name)?.id, unit_id)?,
            RefSpec::Commit(id) => store.commit_unit(&self.commit(&id)?.id, unit_id)?,
        };
        unit.ok_or_else(|| SdkError::UnitNotFound(unit_id.clone()))
    }

    /// Unit map behind a ref: a branch's current states or a commit's
    /// snapshots.
    pub fn units_at(&self, reference: &RefSpec) -> SdkResult<UnitMap> {
        let store = self.fork.store();
        Ok(match reference {
            RefSpec::Branch(name) => store.branch_units(&self.branch(name)?.id)?,
            RefSpec::Commit(id) => store.commit_units(&self.commit(id)?.id)?,
        })
    }

    // ---- Commits ----

    /// Commit the branch's current unit states.
    pub fn create_commit(
        &self,
        branch: &str,
        message: &str,
        expected: &ExpectedHead,
    ) -> SdkResult<Commit> {
        if message.is_empty() {
            return Err(SdkError::InvalidInput("commit message must not be empty".into()));
        }
        let branch = self.branch(branch)?;
        Ok(self.fork.ledger().commit(&branch.id, message, expected)?)
    }

    /// A commit of this world.
    pub fn commit(&self, id: &CommitId) -> SdkResult<Commit> {
        match self.fork.store().commit(id)? {
            Some(commit) if commit.world_id == self.world.id => Ok(commit),
            _ => Err(SdkError::CommitNotFound(id.clone())),
        }
    }

    /// History of a branch (default `main`), newest first.
    pub fn list_commits(
        &self,
        branch: Option<&str>,
        limit: usize,
        cursor: Option<&str>,
    ) -> SdkResult<Page<CommitView>> {
        let branch = self.branch(branch.unwrap_or(DEFAULT_BRANCH))?;
        let store = self.fork.store();
        let commits = history(&store.commits(), branch.head_commit_id.as_ref())?;
        let page = paginate(commits, limit, cursor, |c| c.id.to_string())?;
        Ok(page.map(|c| CommitView::from(&c)))
    }

    // ---- Diff ----

    /// Structural diff between the unit maps behind two refs.
    pub fn diff(&self, from: &str, to: &str) -> SdkResult<UnitDiff> {
        let (from, to) = (RefSpec::parse(from)?, RefSpec::parse(to)?);
        let from_units = unit_values(&self.units_at(&from)?);
        let to_units = unit_values(&self.units_at(&to)?);
        Ok(diff_units(&from_units, &to_units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use wf_store::InMemoryStore;
    use wf_types::TenantId;

    fn fork() -> (WorldFork<InMemoryStore>, TenantId, wf_types::WorldId) {
        let fork = WorldFork::new(Arc::new(InMemoryStore::new()));
        let tenant = TenantId::new("t1");
        let world = fork.create_world(&tenant, "Eldoria", None).unwrap();
        (fork, tenant, world.id)
    }

    fn draft(id: &str, title: &str, fields: Value) -> UnitDraft {
        let mut unit = Unit::new(id, "npc", title);
        if let Value::Object(map) = fields {
            unit.fields = map;
        }
        unit.into()
    }

    #[test]
    fn upsert_assigns_id_and_overwrites() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();

        let mut anonymous = draft("x", "Ana", json!({}));
        anonymous.id = None;
        let created = scope.upsert_unit("main", anonymous).unwrap();
        assert!(!created.id.as_str().is_empty());

        scope
            .upsert_unit("main", draft("u1", "First", json!({})))
            .unwrap();
        scope
            .upsert_unit("main", draft("u1", "Second", json!({})))
            .unwrap();
        let unit = scope.get_unit("branch:main", &UnitId::new("u1")).unwrap();
        assert_eq!(unit.title, "Second");
    }

    #[test]
    fn upsert_on_missing_branch_fails() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();
        let err = scope
            .upsert_unit("nope", draft("u1", "Ana", json!({})))
            .unwrap_err();
        assert_eq!(err.code(), "BRANCH_NOT_FOUND");
    }

    #[test]
    fn branch_is_seeded_from_source_head() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();
        scope
            .upsert_unit("main", draft("u1", "Ana", json!({"hp": 10})))
            .unwrap();
        let c1 = scope.create_commit("main", "init", &ExpectedHead::Any).unwrap();
        scope
            .upsert_unit("main", draft("u2", "Uncommitted", json!({})))
            .unwrap();

        let feature = scope
            .create_branch("feature/quests", BranchSource::default())
            .unwrap();
        assert_eq!(feature.head_commit_id, Some(c1.id.clone()));
        let page = scope.list_units("branch:feature/quests", 10, None, false).unwrap();
        let ids: Vec<&str> = page.items.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, vec!["u1"]);

        let pinned = scope
            .create_branch("pinned", BranchSource::Commit(c1.id))
            .unwrap();
        assert!(pinned.head_commit_id.is_some());
    }

    #[test]
    fn branch_creation_errors() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();

        assert_eq!(
            scope.create_branch("main", BranchSource::default()).unwrap_err().code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            scope.create_branch("bad..name", BranchSource::default()).unwrap_err().code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            scope
                .create_branch("x", BranchSource::Branch("ghost".into()))
                .unwrap_err()
                .code(),
            "BRANCH_NOT_FOUND"
        );
        assert_eq!(
            scope
                .create_branch("y", BranchSource::Commit(CommitId::new("ghost")))
                .unwrap_err()
                .code(),
            "COMMIT_NOT_FOUND"
        );
        assert!(BranchSource::from_parts(Some("main".into()), Some(CommitId::new("c"))).is_err());
    }

    #[test]
    fn branch_filter_matches_exact_name() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();
        scope.create_branch("feature", BranchSource::default()).unwrap();
        assert_eq!(scope.branches(None).unwrap().len(), 2);
        let only = scope.branches(Some("feature")).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name, "feature");
    }

    #[test]
    fn unit_listing_pages_by_id() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();
        for id in ["c", "a", "b"] {
            scope.upsert_unit("main", draft(id, id, json!({}))).unwrap();
        }

        let first = scope.list_units("branch:main", 2, None, true).unwrap();
        let ids: Vec<&str> = first.items.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(matches!(first.items[0], UnitListItem::Full(_)));
        assert_eq!(first.next_cursor.as_deref(), Some("b"));

        let rest = scope.list_units("branch:main", 2, Some("b"), false).unwrap();
        assert_eq!(rest.items.len(), 1);
        assert!(matches!(rest.items[0], UnitListItem::Summary(_)));
        assert!(rest.next_cursor.is_none());

        assert_eq!(
            scope.list_units("main", 2, None, false).unwrap_err().code(),
            "INVALID_REF"
        );
    }

    #[test]
    fn commit_lookup_is_scoped_to_world() {
        let (fork, tenant, world) = fork();
        let other = fork.create_world(&tenant, "Other", None).unwrap();
        let other_scope = fork.world(&tenant, &other.id).unwrap();
        let foreign = other_scope
            .create_commit("main", "elsewhere", &ExpectedHead::Any)
            .unwrap();

        let scope = fork.world(&tenant, &world).unwrap();
        assert_eq!(scope.commit(&foreign.id).unwrap_err().code(), "COMMIT_NOT_FOUND");
        assert_eq!(
            scope
                .get_unit(&format!("commit:{}", foreign.id), &UnitId::new("u"))
                .unwrap_err()
                .code(),
            "COMMIT_NOT_FOUND"
        );
    }

    #[test]
    fn commit_history_is_newest_first() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();
        let c1 = scope.create_commit("main", "one", &ExpectedHead::Unborn).unwrap();
        let c2 = scope
            .create_commit("main", "two", &ExpectedHead::Commit(c1.id.clone()))
            .unwrap();

        let page = scope.list_commits(None, 10, None).unwrap();
        let ids: Vec<&CommitId> = page.items.iter().map(|c| &c.id).collect();
        assert_eq!(ids, vec![&c2.id, &c1.id]);
        assert_eq!(page.items[0].parents, vec![c1.id.clone()]);

        let err = scope
            .create_commit("main", "stale", &ExpectedHead::Commit(c1.id.clone()))
            .unwrap_err();
        assert_eq!(err.code(), "HEAD_CHANGED");
        assert_eq!(
            err.details().unwrap(),
            json!({"branchName": "main", "expected": c1.id.as_str(), "actual": c2.id.as_str()})
        );
        assert_eq!(
            scope.create_commit("main", "", &ExpectedHead::Any).unwrap_err().code(),
            "INVALID_INPUT"
        );
    }

    #[test]
    fn diff_between_commit_and_branch() {
        let (fork, tenant, world) = fork();
        let scope = fork.world(&tenant, &world).unwrap();
        scope
            .upsert_unit("main", draft("u1", "Ana", json!({"a/b": 1})))
            .unwrap();
        let c1 = scope.create_commit("main", "one", &ExpectedHead::Any).unwrap();
        scope
            .upsert_unit("main", draft("u1", "Ana", json!({"a/b": 2})))
            .unwrap();

        let diff = scope.diff(&format!("commit:{}", c1.id), "branch:main").unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.changes[0].path, "/fields/a~1b");

        assert_eq!(scope.diff("main", "branch:main").unwrap_err().code(), "INVALID_REF");
        assert_eq!(
            scope.diff("branch:ghost", "branch:main").unwrap_err().code(),
            "BRANCH_NOT_FOUND"
        );
    }
}

//! The merge flow: three-way merge of two branch heads, conflict
//! enrichment, and either a preview or a resolved merge commit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use wf_dag::common_ancestor;
use wf_ledger::ExpectedHead;
use wf_merge::{apply_resolutions, into_units, merge_units};
use wf_store::WorldStore;
use wf_types::{
    from_pointer, unit_values, Branch, CommitId, MergeConflict, Resolution, UnitId, UnitSummary,
    UnitValues,
};

use crate::error::SdkResult;
use crate::scope::WorldScope;

/// A request to merge `theirs_branch` into `ours_branch`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub ours_branch: String,
    pub theirs_branch: String,
    #[serde(default)]
    pub resolutions: Option<Vec<Resolution>>,
    #[serde(default, rename = "expectedHeadCommitId")]
    pub expected_head: ExpectedHead,
}

/// The three commits a merge was computed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefContext {
    pub base_commit_id: Option<CommitId>,
    pub ours_commit_id: Option<CommitId>,
    pub theirs_commit_id: Option<CommitId>,
}

/// A merge conflict with enough context to present it to a person.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedConflict {
    #[serde(flatten)]
    pub conflict: MergeConflict,
    pub unit: UnitSummary,
    pub ref_context: RefContext,
    pub path_tokens: Vec<String>,
}

/// Outcome of [`WorldScope::merge`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MergeResponse {
    /// Conflicts were found and no resolutions were given; nothing was
    /// written.
    #[serde(rename_all = "camelCase")]
    Preview {
        conflicts: Vec<EnrichedConflict>,
        preview_merged_units: UnitValues,
    },
    /// The merge commit now heads the ours branch.
    #[serde(rename_all = "camelCase")]
    Committed { merge_commit_id: CommitId },
}

impl MergeResponse {
    pub fn is_preview(&self) -> bool {
        matches!(self, Self::Preview { .. })
    }
}

impl<S: WorldStore> WorldScope<'_, S> {
    /// Merge the head of `theirs_branch` into `ours_branch`.
    ///
    /// The base is the nearest common ancestor of the two heads; all three
    /// sides are read from commit snapshots, so uncommitted unit states
    /// take no part. When the merge conflicts and the request carries no
    /// resolutions the result is a preview. Otherwise the resolutions are
    /// applied on top of the merged units (each conflict defaults to ours)
    /// and a merge commit is created under the request's head expectation.
    /// Without one, the ours head the merge was computed from is expected.
    pub fn merge(&self, request: &MergeRequest) -> SdkResult<MergeResponse> {
        let store = self.fork().store();
        let ours = self.branch(&request.ours_branch)?;
        let theirs = self.branch(&request.theirs_branch)?;

        let base_id = common_ancestor(
            &store.commits(),
            ours.head_commit_id.as_ref(),
            theirs.head_commit_id.as_ref(),
        )?;
        let snapshot = |id: Option<&CommitId>| -> SdkResult<UnitValues> {
            Ok(match id {
                Some(id) => unit_values(&store.commit_units(id)?),
                None => UnitValues::new(),
            })
        };
        let base_units = snapshot(base_id.as_ref())?;
        let ours_units = snapshot(ours.head_commit_id.as_ref())?;
        let theirs_units = snapshot(theirs.head_commit_id.as_ref())?;

        let outcome = merge_units(&base_units, &ours_units, &theirs_units);
        debug!(
            ours = %ours.name,
            theirs = %theirs.name,
            base = ?base_id,
            units = outcome.merged.len(),
            conflicts = outcome.conflicts.len(),
            "merged branch heads"
        );

        let context = RefContext {
            base_commit_id: base_id,
            ours_commit_id: ours.head_commit_id.clone(),
            theirs_commit_id: theirs.head_commit_id.clone(),
        };
        let Some(resolutions) = request.resolutions.as_deref() else {
            if !outcome.is_clean() {
                let sides = [&ours_units, &theirs_units, &base_units];
                let conflicts = outcome
                    .conflicts
                    .into_iter()
                    .map(|c| enrich(c, &sides, &context))
                    .collect();
                return Ok(MergeResponse::Preview {
                    conflicts,
                    preview_merged_units: outcome.merged,
                });
            }
            return self.commit_merge(request, &ours, &theirs, outcome.merged);
        };

        let resolved = apply_resolutions(outcome.merged, &ours_units, &theirs_units, resolutions)?;
        self.commit_merge(request, &ours, &theirs, resolved)
    }

    fn commit_merge(
        &self,
        request: &MergeRequest,
        ours: &Branch,
        theirs: &Branch,
        resolved: UnitValues,
    ) -> SdkResult<MergeResponse> {
        let units = into_units(resolved)?;
        let message = format!("Merge {} <- {}", ours.name, theirs.name);
        let expected = match &request.expected_head {
            ExpectedHead::Any => ExpectedHead::from(ours.head_commit_id.clone()),
            given => given.clone(),
        };
        let commit = self.fork().ledger().merge_commit(
            &ours.id,
            theirs.head_commit_id.as_ref(),
            &message,
            units,
            &expected,
        )?;
        Ok(MergeResponse::Committed {
            merge_commit_id: commit.id,
        })
    }
}

/// Attach the unit header, ref context and decoded path to a conflict.
///
/// The header comes from the first side in `sides` that has the unit.
fn enrich(conflict: MergeConflict, sides: &[&UnitValues], context: &RefContext) -> EnrichedConflict {
    let unit = sides
        .iter()
        .find_map(|units| units.get(&conflict.unit_id))
        .map_or_else(
            || unknown_unit(&conflict.unit_id),
            |tree| header(&conflict.unit_id, tree),
        );
    let path_tokens = from_pointer(&conflict.path).unwrap_or_default();
    EnrichedConflict {
        conflict,
        unit,
        ref_context: context.clone(),
        path_tokens,
    }
}

fn header(unit_id: &UnitId, tree: &Value) -> UnitSummary {
    let text = |key: &str| {
        tree.get(key)
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    };
    UnitSummary {
        id: tree
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| unit_id.clone(), UnitId::from),
        kind: text("type"),
        title: text("title"),
    }
}

fn unknown_unit(unit_id: &UnitId) -> UnitSummary {
    UnitSummary {
        id: unit_id.clone(),
        kind: "unknown".into(),
        title: "unknown".into(),
    }
}

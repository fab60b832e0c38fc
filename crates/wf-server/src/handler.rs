//! Route handlers.
//!
//! Each handler checks the request shape, opens the caller's world and
//! hands off to the SDK. Failures of either kind come back as
//! [`ServerError`] and render through its `IntoResponse`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use wf_sdk::{
    BranchSource, BranchView, CommitView, ExpectedHead, MergeRequest, UnitDiff, UnitDraft,
    UnitListItem, WorldDetail, WorldScope, WorldSummary,
};
use wf_store::WorldStore;
use wf_types::{Branch, Commit, CommitId, Page, TenantId, Unit, UnitId, WorldId};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type QueryParams<T> = Result<Query<T>, QueryRejection>;

fn body<T>(payload: JsonBody<T>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

fn params<T>(query: QueryParams<T>) -> ServerResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

fn required<'a>(field: &str, value: &'a str) -> ServerResult<&'a str> {
    if value.trim().is_empty() {
        return Err(ServerError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value)
}

fn open<'a, S: WorldStore>(
    state: &'a AppState<S>,
    tenant: &TenantId,
    world_id: &WorldId,
) -> ServerResult<WorldScope<'a, S>> {
    Ok(state.fork.world(tenant, world_id)?)
}

fn branch_view<S: WorldStore>(
    scope: &WorldScope<'_, S>,
    branch: &Branch,
) -> ServerResult<BranchView> {
    let head: Option<Commit> = match &branch.head_commit_id {
        Some(id) => Some(scope.commit(id)?),
        None => None,
    };
    Ok(BranchView::new(branch, head.as_ref()))
}

// ---- Request shapes ----

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorld {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BranchQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranch {
    pub name: String,
    #[serde(default)]
    pub source_branch: Option<String>,
    #[serde(default)]
    pub source_commit_id: Option<CommitId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitQuery {
    pub branch_name: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommit {
    pub branch_name: String,
    pub message: String,
    #[serde(default, rename = "expectedHeadCommitId")]
    pub expected_head: ExpectedHead,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitQuery {
    #[serde(rename = "ref")]
    pub reference: String,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub include_content: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefQuery {
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUnit {
    pub branch_name: String,
    pub unit: UnitDraft,
}

#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    pub from: String,
    pub to: String,
}

// ---- Response shapes ----

#[derive(Debug, Serialize)]
pub struct BranchList {
    pub items: Vec<BranchView>,
}

// ---- Handlers ----

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_worlds<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    query: QueryParams<PageQuery>,
) -> ServerResult<Json<Page<WorldSummary>>> {
    let query = params(query)?;
    let limit = state.limits.resolve(query.limit)?;
    let page = state
        .fork
        .list_worlds(&tenant, limit, query.cursor.as_deref())?;
    Ok(Json(page))
}

pub async fn create_world<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    payload: JsonBody<CreateWorld>,
) -> ServerResult<(StatusCode, Json<WorldSummary>)> {
    let payload = body(payload)?;
    let name = required("name", &payload.name)?;
    let world = state.fork.create_world(&tenant, name, payload.description)?;
    Ok((StatusCode::CREATED, Json(WorldSummary::from(&world))))
}

pub async fn get_world<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
) -> ServerResult<Json<WorldDetail>> {
    let scope = open(&state, &tenant, &world_id)?;
    Ok(Json(scope.detail()?))
}

pub async fn list_branches<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    query: QueryParams<BranchQuery>,
) -> ServerResult<Json<BranchList>> {
    let query = params(query)?;
    let scope = open(&state, &tenant, &world_id)?;
    let items = scope.branches(query.name.as_deref())?;
    Ok(Json(BranchList { items }))
}

pub async fn create_branch<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    payload: JsonBody<CreateBranch>,
) -> ServerResult<(StatusCode, Json<BranchView>)> {
    let payload = body(payload)?;
    let name = required("name", &payload.name)?;
    let source = BranchSource::from_parts(payload.source_branch, payload.source_commit_id)?;
    let scope = open(&state, &tenant, &world_id)?;
    let branch = scope.create_branch(name, source)?;
    Ok((StatusCode::CREATED, Json(branch_view(&scope, &branch)?)))
}

pub async fn list_commits<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    query: QueryParams<CommitQuery>,
) -> ServerResult<Json<Page<CommitView>>> {
    let query = params(query)?;
    let limit = state.limits.resolve(query.limit)?;
    let scope = open(&state, &tenant, &world_id)?;
    let page = scope.list_commits(query.branch_name.as_deref(), limit, query.cursor.as_deref())?;
    Ok(Json(page))
}

pub async fn create_commit<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    payload: JsonBody<CreateCommit>,
) -> ServerResult<(StatusCode, Json<CommitView>)> {
    let payload = body(payload)?;
    let branch = required("branchName", &payload.branch_name)?;
    let message = required("message", &payload.message)?;
    let scope = open(&state, &tenant, &world_id)?;
    let commit = scope.create_commit(branch, message, &payload.expected_head)?;
    Ok((StatusCode::CREATED, Json(CommitView::from(&commit))))
}

pub async fn get_commit<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path((world_id, commit_id)): Path<(WorldId, CommitId)>,
) -> ServerResult<Json<CommitView>> {
    let scope = open(&state, &tenant, &world_id)?;
    Ok(Json(CommitView::from(&scope.commit(&commit_id)?)))
}

pub async fn list_units<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    query: QueryParams<UnitQuery>,
) -> ServerResult<Json<Page<UnitListItem>>> {
    let query = params(query)?;
    let limit = state.limits.resolve(query.limit)?;
    let scope = open(&state, &tenant, &world_id)?;
    let page = scope.list_units(
        &query.reference,
        limit,
        query.cursor.as_deref(),
        query.include_content,
    )?;
    Ok(Json(page))
}

pub async fn upsert_unit<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    payload: JsonBody<UpsertUnit>,
) -> ServerResult<(StatusCode, Json<Unit>)> {
    let payload = body(payload)?;
    let branch = required("branchName", &payload.branch_name)?;
    required("unit.type", &payload.unit.kind)?;
    required("unit.title", &payload.unit.title)?;
    let scope = open(&state, &tenant, &world_id)?;
    let unit = scope.upsert_unit(branch, payload.unit)?;
    Ok((StatusCode::CREATED, Json(unit)))
}

pub async fn get_unit<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path((world_id, unit_id)): Path<(WorldId, UnitId)>,
    query: QueryParams<RefQuery>,
) -> ServerResult<Json<Unit>> {
    let query = params(query)?;
    let scope = open(&state, &tenant, &world_id)?;
    Ok(Json(scope.get_unit(&query.reference, &unit_id)?))
}

pub async fn diff<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    query: QueryParams<DiffQuery>,
) -> ServerResult<Json<UnitDiff>> {
    let query = params(query)?;
    let scope = open(&state, &tenant, &world_id)?;
    Ok(Json(scope.diff(&query.from, &query.to)?))
}

/// A preview answers 200; a merge commit answers 201.
pub async fn merge<S: WorldStore>(
    State(state): State<AppState<S>>,
    Extension(tenant): Extension<TenantId>,
    Path(world_id): Path<WorldId>,
    payload: JsonBody<MergeRequest>,
) -> ServerResult<Response> {
    let request = body(payload)?;
    required("oursBranch", &request.ours_branch)?;
    required("theirsBranch", &request.theirs_branch)?;
    let scope = open(&state, &tenant, &world_id)?;
    let response = scope.merge(&request)?;
    let status = if response.is_preview() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)).into_response())
}

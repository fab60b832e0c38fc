use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use wf_store::WorldStore;

use crate::auth::require_tenant;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all WorldFork endpoints.
///
/// Everything under `/v1` runs behind tenant resolution; `/health` does not.
pub fn build_router<S: WorldStore + 'static>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route(
            "/worlds",
            get(handler::list_worlds::<S>).post(handler::create_world::<S>),
        )
        .route("/worlds/:world_id", get(handler::get_world::<S>))
        .route(
            "/worlds/:world_id/branches",
            get(handler::list_branches::<S>).post(handler::create_branch::<S>),
        )
        .route(
            "/worlds/:world_id/commits",
            get(handler::list_commits::<S>).post(handler::create_commit::<S>),
        )
        .route(
            "/worlds/:world_id/commits/:commit_id",
            get(handler::get_commit::<S>),
        )
        .route(
            "/worlds/:world_id/units",
            get(handler::list_units::<S>).post(handler::upsert_unit::<S>),
        )
        .route(
            "/worlds/:world_id/units/:unit_id",
            get(handler::get_unit::<S>),
        )
        .route("/worlds/:world_id/diff", get(handler::diff::<S>))
        .route("/worlds/:world_id/merge", post(handler::merge::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_tenant::<S>,
        ));

    Router::new()
        .route("/health", get(handler::health))
        .nest("/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

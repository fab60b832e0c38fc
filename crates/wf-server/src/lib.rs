//! HTTP server for WorldFork.
//!
//! A thin axum layer over [`wf_sdk::WorldFork`]: it resolves the caller's
//! tenant from an API key, validates request shapes and renders every
//! failure as `{"error": {"code", "message", "details"}}`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{hash_api_key, ApiKeyResolver, StaticTenant, TenantResolver, API_KEY_HEADER};
pub use config::{ApiKeyConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::WorldForkServer;
pub use state::{AppState, PageLimits};

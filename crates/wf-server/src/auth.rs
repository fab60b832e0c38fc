use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use wf_store::WorldStore;
use wf_types::TenantId;

use crate::config::{ApiKeyConfig, ServerConfig};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Hex BLAKE3 digest of a raw API key, as stored in configuration.
pub fn hash_api_key(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

/// Maps request credentials to the tenant the request runs as.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// `api_key` is the trimmed header value, `None` when missing or blank.
    async fn resolve(&self, api_key: Option<&str>) -> ServerResult<TenantId>;
}

/// Resolves every request to one tenant, ignoring credentials.
pub struct StaticTenant(pub TenantId);

#[async_trait]
impl TenantResolver for StaticTenant {
    async fn resolve(&self, _api_key: Option<&str>) -> ServerResult<TenantId> {
        Ok(self.0.clone())
    }
}

/// Looks API keys up by hash among the configured, unrevoked keys.
pub struct ApiKeyResolver {
    keys: HashMap<String, TenantId>,
}

impl ApiKeyResolver {
    pub fn new(keys: &[ApiKeyConfig]) -> Self {
        let keys = keys
            .iter()
            .filter(|k| !k.revoked)
            .map(|k| (k.key_hash.to_ascii_lowercase(), TenantId::new(k.tenant.as_str())))
            .collect();
        Self { keys }
    }
}

#[async_trait]
impl TenantResolver for ApiKeyResolver {
    async fn resolve(&self, api_key: Option<&str>) -> ServerResult<TenantId> {
        let key = api_key.ok_or(ServerError::AuthRequired)?;
        self.keys
            .get(&hash_api_key(key))
            .cloned()
            .ok_or(ServerError::InvalidApiKey)
    }
}

/// The resolver a configuration asks for.
pub fn resolver_for(config: &ServerConfig) -> Arc<dyn TenantResolver> {
    if config.auth_enabled {
        Arc::new(ApiKeyResolver::new(&config.api_keys))
    } else {
        Arc::new(StaticTenant(TenantId::new(config.default_tenant.as_str())))
    }
}

/// Middleware that resolves the tenant and stores it in the request
/// extensions for handlers to pick up.
pub async fn require_tenant<S: WorldStore + 'static>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> ServerResult<Response> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty());
    let tenant = state.resolver.resolve(api_key).await?;
    debug!(%tenant, path = %request.uri().path(), "resolved tenant");
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<ApiKeyConfig> {
        vec![
            ApiKeyConfig {
                key_hash: hash_api_key("wf_live_good"),
                tenant: "acme".into(),
                revoked: false,
            },
            ApiKeyConfig {
                key_hash: hash_api_key("wf_live_old"),
                tenant: "acme".into(),
                revoked: true,
            },
        ]
    }

    #[test]
    fn hash_is_hex_blake3() {
        let h = hash_api_key("secret");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, hash_api_key("secret"));
        assert_ne!(h, hash_api_key("Secret"));
    }

    #[tokio::test]
    async fn api_key_resolution() {
        let resolver = ApiKeyResolver::new(&keys());
        assert_eq!(
            resolver.resolve(Some("wf_live_good")).await.unwrap(),
            TenantId::new("acme")
        );
        assert!(matches!(
            resolver.resolve(None).await.unwrap_err(),
            ServerError::AuthRequired
        ));
        assert!(matches!(
            resolver.resolve(Some("wf_live_bad")).await.unwrap_err(),
            ServerError::InvalidApiKey
        ));
        assert!(matches!(
            resolver.resolve(Some("wf_live_old")).await.unwrap_err(),
            ServerError::InvalidApiKey
        ));
    }

    #[tokio::test]
    async fn static_tenant_ignores_keys() {
        let resolver = StaticTenant(TenantId::new("local"));
        assert_eq!(resolver.resolve(None).await.unwrap(), TenantId::new("local"));
        assert_eq!(
            resolver.resolve(Some("anything")).await.unwrap(),
            TenantId::new("local")
        );
    }
}

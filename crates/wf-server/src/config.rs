use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server settings, usually read from a TOML file.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// When off, every request runs as `default_tenant`.
    pub auth_enabled: bool,
    pub default_tenant: String,
    pub api_keys: Vec<ApiKeyConfig>,
    pub default_page_limit: usize,
    pub max_page_limit: usize,
    /// Where the store is loaded from at startup. It is saved after every
    /// successful write request and on shutdown.
    pub data_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            auth_enabled: true,
            default_tenant: "local".into(),
            api_keys: Vec::new(),
            default_page_limit: 20,
            max_page_limit: 100,
            data_file: None,
        }
    }
}

/// One accepted API key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    /// BLAKE3 hex digest of the raw key.
    pub key_hash: String,
    pub tenant: String,
    #[serde(default)]
    pub revoked: bool,
}

impl ServerConfig {
    pub fn from_toml_str(source: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Apply `WORLDFORK_AUTH=off` and `WORLDFORK_TENANT_ID` from the
    /// environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(auth) = std::env::var("WORLDFORK_AUTH") {
            self.auth_enabled = auth != "off";
        }
        if let Ok(tenant) = std::env::var("WORLDFORK_TENANT_ID") {
            if !tenant.is_empty() {
                self.default_tenant = tenant;
            }
        }
        self
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(ServerError::Config(format!(
                "default_page_limit must be in 1..={}",
                self.max_page_limit
            )));
        }
        if self.default_tenant.is_empty() {
            return Err(ServerError::Config("default_tenant must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert!(c.auth_enabled);
        assert_eq!(c.default_tenant, "local");
        assert_eq!(c.default_page_limit, 20);
        assert_eq!(c.max_page_limit, 100);
        assert!(c.data_file.is_none());
    }

    #[test]
    fn empty_toml_is_default() {
        let c = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(c.default_page_limit, 20);
        assert!(c.api_keys.is_empty());
    }

    #[test]
    fn parses_keys() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:8080"
            auth_enabled = true

            [[api_keys]]
            key_hash = "abc"
            tenant = "acme"

            [[api_keys]]
            key_hash = "def"
            tenant = "acme"
            revoked = true
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.api_keys.len(), 2);
        assert!(!c.api_keys[0].revoked);
        assert!(c.api_keys[1].revoked);
    }

    #[test]
    fn rejects_bad_limits() {
        let err = ServerConfig::from_toml_str("default_page_limit = 500").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(ServerConfig::from_toml_str("bind_addr = 5").is_err());
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worldfork.toml");
        std::fs::write(&path, "default_tenant = \"studio\"\n").unwrap();
        let c = ServerConfig::from_file(&path).unwrap();
        assert_eq!(c.default_tenant, "studio");
    }
}

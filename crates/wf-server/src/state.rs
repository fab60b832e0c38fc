use std::sync::Arc;

use wf_sdk::WorldFork;

use crate::auth::TenantResolver;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Page size bounds for listing endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default: usize,
    pub max: usize,
}

impl PageLimits {
    /// The limit to use for a request, `default` when none was given.
    pub fn resolve(&self, requested: Option<usize>) -> ServerResult<usize> {
        match requested {
            None => Ok(self.default),
            Some(n) if (1..=self.max).contains(&n) => Ok(n),
            Some(n) => Err(ServerError::BadRequest(format!(
                "limit {n} outside 1..={}",
                self.max
            ))),
        }
    }
}

impl From<&ServerConfig> for PageLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            default: config.default_page_limit,
            max: config.max_page_limit,
        }
    }
}

/// Shared state handed to every handler.
pub struct AppState<S> {
    pub fork: WorldFork<S>,
    pub resolver: Arc<dyn TenantResolver>,
    pub limits: PageLimits,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            fork: self.fork.clone(),
            resolver: Arc::clone(&self.resolver),
            limits: self.limits,
        }
    }
}

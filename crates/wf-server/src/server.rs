use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use wf_sdk::WorldFork;
use wf_store::InMemoryStore;

use crate::auth::resolver_for;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::{AppState, PageLimits};

/// WorldFork HTTP server over an in-memory store.
pub struct WorldForkServer {
    config: ServerConfig,
    store: Arc<InMemoryStore>,
    save_lock: Arc<Mutex<()>>,
}

impl WorldForkServer {
    /// Validate the configuration and open the store, loading `data_file`
    /// when it exists.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = match &config.data_file {
            Some(path) if path.exists() => {
                let store = InMemoryStore::load(path)?;
                info!(path = %path.display(), "loaded store");
                store
            }
            _ => InMemoryStore::new(),
        };
        Ok(Self {
            config,
            store: Arc::new(store),
            save_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<InMemoryStore> {
        &self.store
    }

    pub fn state(&self) -> AppState<InMemoryStore> {
        AppState {
            fork: WorldFork::new(Arc::clone(&self.store)),
            resolver: resolver_for(&self.config),
            limits: PageLimits::from(&self.config),
        }
    }

    /// Build the router. With a `data_file`, every successful write
    /// request saves the store before its response is returned.
    pub fn router(&self) -> axum::Router {
        let router = build_router(self.state());
        match &self.config.data_file {
            Some(path) => router.layer(middleware::from_fn_with_state(
                Saver {
                    store: Arc::clone(&self.store),
                    path: path.clone(),
                    lock: Arc::clone(&self.save_lock),
                },
                save_after_write,
            )),
            None => router,
        }
    }

    /// Serve until Ctrl-C, then write the store back to `data_file`.
    pub async fn serve(self) -> ServerResult<()> {
        if self.config.auth_enabled && self.config.api_keys.iter().all(|k| k.revoked) {
            warn!("auth is enabled but no API keys are configured; every /v1 request will be rejected");
        }
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            auth = self.config.auth_enabled,
            "WorldFork server listening"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        self.persist()
    }

    /// Write the store to `data_file`, if one is configured.
    pub fn persist(&self) -> ServerResult<()> {
        if let Some(path) = &self.config.data_file {
            let _guard = self
                .save_lock
                .lock()
                .map_err(|e| ServerError::Internal(e.to_string()))?;
            self.store.save(path)?;
            info!(path = %path.display(), "saved store");
        }
        Ok(())
    }
}

#[derive(Clone)]
struct Saver {
    store: Arc<InMemoryStore>,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl Saver {
    fn save(&self) -> ServerResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(self.store.save(&self.path)?)
    }
}

async fn save_after_write(State(saver): State<Saver>, request: Request, next: Next) -> Response {
    let write = !matches!(*request.method(), Method::GET | Method::HEAD);
    let response = next.run(request).await;
    if write && response.status().is_success() {
        let path = saver.path.clone();
        match tokio::task::spawn_blocking(move || saver.save()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(path = %path.display(), error = %e, "failed to save store"),
            Err(e) => error!(path = %path.display(), error = %e, "store save task failed"),
        }
    }
    response
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
    }
}

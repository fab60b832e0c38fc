use std::sync::Arc;

use tracing::info;

use wf_ledger::BranchHeadController;
use wf_store::WorldStore;
use wf_types::{paginate, Branch, Page, TenantId, World, WorldId};

use crate::error::{SdkError, SdkResult};
use crate::scope::WorldScope;
use crate::views::WorldSummary;

/// Name of the branch every world starts with.
pub const DEFAULT_BRANCH: &str = "main";

/// High-level WorldFork API over one store.
pub struct WorldFork<S> {
    store: Arc<S>,
    ledger: BranchHeadController<S>,
}

impl<S> Clone for WorldFork<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ledger: self.ledger.clone(),
        }
    }
}

impl<S: WorldStore> WorldFork<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            ledger: BranchHeadController::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn ledger(&self) -> &BranchHeadController<S> {
        &self.ledger
    }

    // ---- Worlds ----

    /// Create a world with an empty `main` branch.
    pub fn create_world(
        &self,
        tenant: &TenantId,
        name: &str,
        description: Option<String>,
    ) -> SdkResult<World> {
        if name.is_empty() {
            return Err(SdkError::InvalidInput("world name must not be empty".into()));
        }
        let world = World::new(tenant.clone(), name, description);
        let main = Branch::new(world.id.clone(), DEFAULT_BRANCH, None);
        self.store.insert_world(world.clone(), main)?;
        info!(world = %world.id.short_id(), tenant = %tenant, name, "created world");
        Ok(world)
    }

    /// The tenant's worlds, newest id first.
    pub fn list_worlds(
        &self,
        tenant: &TenantId,
        limit: usize,
        cursor: Option<&str>,
    ) -> SdkResult<Page<WorldSummary>> {
        let worlds = self.store.worlds(tenant)?;
        let page = paginate(worlds, limit, cursor, |w| w.id.to_string())?;
        Ok(page.map(|w| WorldSummary::from(&w)))
    }

    /// Open a world owned by `tenant`.
    ///
    /// Worlds of other tenants are reported as not found.
    pub fn world(&self, tenant: &TenantId, id: &WorldId) -> SdkResult<WorldScope<'_, S>> {
        match self.store.world(id)? {
            Some(world) if &world.tenant_id == tenant => Ok(WorldScope::new(self, world)),
            _ => Err(SdkError::WorldNotFound(id.clone())),
        }
    }
}

//! High-level SDK for WorldFork.
//!
//! [`WorldFork`] is the entry point for applications embedding the engine.
//! It is bound to one [`WorldStore`](wf_store::WorldStore) and scopes every
//! call to a tenant: a world owned by another tenant is reported as not
//! found. Operations on one world go through a [`WorldScope`].

pub mod error;
pub mod fork;
pub mod merge;
pub mod scope;
pub mod views;

pub use error::{SdkError, SdkResult};
pub use fork::WorldFork;
pub use merge::{EnrichedConflict, MergeRequest, MergeResponse, RefContext};
pub use scope::{BranchSource, UnitDraft, WorldScope};
pub use views::{BranchView, CommitView, UnitListItem, WorldDetail, WorldSummary};

// Re-export key types
pub use wf_diff::UnitDiff;
pub use wf_ledger::ExpectedHead;
pub use wf_refs::RefSpec;
pub use wf_store::{InMemoryStore, WorldStore};
pub use wf_types::{
    Branch, BranchId, Commit, CommitId, Page, Resolution, TenantId, Unit, UnitId, World, WorldId,
};

//! Branch head controller for WorldFork.
//!
//! A branch head only ever moves through this crate. Both operations read
//! the current head, create a commit on top of it, snapshot unit content
//! into the commit and compare-and-swap the head, all inside one store
//! transaction. Two writers racing from the same head can therefore never
//! both succeed: the loser gets [`LedgerError::HeadChanged`] naming the
//! winner's commit.

pub mod controller;
pub mod error;
pub mod expected;

pub use controller::BranchHeadController;
pub use error::{LedgerError, LedgerResult};
pub use expected::ExpectedHead;

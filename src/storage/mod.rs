//! Persistence context and unit of work
//!
//! This module wraps the SeaORM connection shared by every repository and the
//! explicit list of pending changes that repositories stage for commit:
//! - [`DbContext`]: owns the connection, hands out repositories, commits
//! - [`UnitOfWork`]: ordered inserts, updates and removals awaiting commit

pub mod db;
pub mod unit_of_work;

pub use db::DbContext;
pub use unit_of_work::{ChangeKind, CommitSummary, PendingChange, UnitOfWork};

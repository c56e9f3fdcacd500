//! Repository layer for database operations.
//!
//! This module provides a single generic repository that works for any SeaORM
//! entity implementing [`Navigable`](crate::properties::Navigable). Entities
//! stay pure data models while the repository supplies the reusable query,
//! ordering, include and mutation operations.

pub mod generic;

pub use generic::Repository;

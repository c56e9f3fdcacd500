//! query-repository - A generic query repository for SeaORM entities
//!
//! This library provides one repository type that works for any entity:
//! filtered reads, eager loading of related rows by include path, dynamic
//! ordering by a dotted property path such as `"Customer.Address.City"`, and
//! staged mutations flushed through an explicit unit of work.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`repositories`] - The generic [`Repository`]
//! * [`ordering`] - Ordering built from a property path and a direction token
//! * [`include`] - Include path parsing and eager loading
//! * [`properties`] - Property graph of entities and their navigations
//! * [`storage`] - Database context and unit of work
//! * [`config`] - Configuration management
//! * [`logger`] - Logging setup

/// Configuration module for database, query and logging settings
pub mod config;

/// Crate constants and default values
pub mod constants;

/// Error types returned by repository operations
pub mod error;

/// Include path parsing and loading of related rows
pub mod include;

/// Logging setup backed by fern
pub mod logger;

/// Dynamic ordering by property path
pub mod ordering;

/// Property graph used to resolve ordering and include paths
pub mod properties;

/// Repository layer for database operations
pub mod repositories;

/// Database context and unit of work
pub mod storage;

pub use error::{RepositoryError, Result};
pub use include::{IncludeTree, Loaded};
pub use ordering::{OrderBy, SortDirection};
pub use properties::{Navigable, NavigationMap};
pub use repositories::Repository;
pub use storage::{ChangeKind, CommitSummary, DbContext, PendingChange, UnitOfWork};

//! Error types for repository operations.

use sea_orm::DbErr;

/// Errors raised while building or running repository queries.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A segment of an ordering path does not name a column or navigation
    /// on the entity reached so far.
    #[error("Cannot resolve property '{segment}' in path '{path}' (resolved so far: '{resolved}')")]
    PropertyResolution {
        segment: String,
        path: String,
        resolved: String,
    },

    #[error("Query build error: {0}")]
    QueryBuild(String),

    #[error("Invalid sort direction '{0}', expected 'asc' or 'desc'")]
    InvalidDirection(String),

    #[error("Store error: {0}")]
    Store(#[from] DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub(crate) fn unresolved(segment: &str, path: &str, resolved: &[String]) -> Self {
        Self::PropertyResolution {
            segment: segment.to_string(),
            path: path.to_string(),
            resolved: resolved.join("."),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

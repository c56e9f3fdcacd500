use log::info;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};

use crate::config::Config;
use crate::error::Result;
use crate::repositories::Repository;
use crate::storage::{CommitSummary, UnitOfWork};

/// Persistence context shared by the repositories created against it.
///
/// The context owns the connection; repositories only borrow it, so they can
/// never outlive the context.
pub struct DbContext {
    conn: DatabaseConnection,
    strict_direction: bool,
}

impl DbContext {
    /// Connect to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, false).await
    }

    /// Connect using the `[database]` and `[query]` sections of `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let context = Self::connect_with(&config.database.url, config.database.sql_logging).await?;
        Ok(context.with_strict_direction(config.query.strict_direction))
    }

    async fn connect_with(url: &str, sql_logging: bool) -> Result<Self> {
        let mut options = ConnectOptions::new(url.to_string());
        options.sqlx_logging(sql_logging);

        // Every connection to an in-memory SQLite URL opens its own database
        if is_in_memory_sqlite(url) {
            options.max_connections(1).min_connections(1);
        }

        let conn = Database::connect(options).await?;
        info!("Connected to database ({})", backend_name(url));

        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            strict_direction: false,
        }
    }

    /// Reject sort direction tokens other than `"asc"` and `"desc"` in
    /// [`Repository::order_by`].
    #[must_use]
    pub fn with_strict_direction(mut self, strict: bool) -> Self {
        self.strict_direction = strict;
        self
    }

    pub fn strict_direction(&self) -> bool {
        self.strict_direction
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Create a repository for entity `E` bound to this context.
    pub fn repository<E: EntityTrait>(&self) -> Repository<'_, E> {
        Repository::new(self)
    }

    /// Apply the changes staged in `uow`.
    pub async fn commit(&self, uow: UnitOfWork) -> Result<CommitSummary> {
        uow.commit(self).await
    }

    /// Close the underlying connection.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}

fn backend_name(url: &str) -> &str {
    url.split(':').next().unwrap_or("unknown")
}

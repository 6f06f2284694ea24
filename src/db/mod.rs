mod mappers;
mod read_ops;
mod store_impl;
mod types;
mod write_ops;


use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{ErrorClass, LineError, Result};

pub use write_ops::EMBEDDED_SCHEMA_SQL;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(1_000);

/// PostgreSQL session used as the coordination bus.
///
/// Each process owns exactly one of these; the pool is capped at a single
/// connection so the process behaves as one sequential client.
pub struct LineDb {
    database_url: String,
    timeout: Duration,
    pool: Option<PgPool>,
}

impl LineDb {
    #[must_use]
    pub fn new(database_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            database_url: database_url.into(),
            timeout,
            pool: None,
        }
    }

    /// Create a new `LineDb` with an existing pool (for testing).
    #[must_use]
    pub const fn new_with_pool(pool: PgPool, timeout: Duration) -> Self {
        Self {
            database_url: String::new(),
            timeout,
            pool: Some(pool),
        }
    }

    fn pool(&self) -> Result<&PgPool> {
        self.pool
            .as_ref()
            .filter(|pool| !pool.is_closed())
            .ok_or_else(|| LineError::NotConnected("no database session".to_string()))
    }

    /// # Errors
    /// `LineError::AuthenticationFailed` when the server rejects the
    /// credentials; connectivity failures otherwise.
    pub async fn open(&mut self) -> Result<()> {
        if self.ping().await {
            self.shutdown().await;
        }

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.timeout)
            .connect(&self.database_url)
            .await
            .map_err(connect_error)?;

        info!("Connected to PostgreSQL line database");
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn ping(&self) -> bool {
        let Ok(pool) = self.pool() else {
            return false;
        };
        let probe = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool);
        matches!(tokio::time::timeout(self.timeout, probe).await, Ok(Ok(_)))
    }

    pub async fn shutdown(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            info!("Closed PostgreSQL line database session");
        }
    }

    /// Runs one statement under the store timeout.
    async fn bounded<T, F>(&self, action: &str, query: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(|error| query_error(action, error)),
            Err(_) => Err(LineError::NotConnected(format!(
                "Timed out after {}ms trying to {action}",
                self.timeout.as_millis()
            ))),
        }
    }
}

fn connect_error(error: sqlx::Error) -> LineError {
    let error = LineError::from(error);
    if error.class() == ErrorClass::Fatal {
        warn!("Database connection rejected: {}", error);
        LineError::AuthenticationFailed(error.to_string())
    } else {
        error
    }
}

fn query_error(action: &str, error: sqlx::Error) -> LineError {
    match LineError::from(error) {
        error if error.class() == ErrorClass::Retry => {
            LineError::DatabaseError(format!("Failed to {action}: {error}"))
        }
        error => error,
    }
}

#[cfg(test)]
mod tests {
    use super::{query_error, LineDb, DEFAULT_STORE_TIMEOUT};
    use crate::error::ErrorClass;
    use crate::LineError;

    #[test]
    fn connectivity_errors_keep_their_class() {
        let error = query_error("read line", sqlx::Error::PoolTimedOut);
        assert_eq!(error.class(), ErrorClass::Reconnect);
    }

    #[test]
    fn statement_errors_carry_the_action() {
        let error = query_error("read line", sqlx::Error::RowNotFound);
        assert!(matches!(&error, LineError::DatabaseError(msg) if msg.contains("read line")));
    }

    #[tokio::test]
    async fn unopened_session_is_not_alive() {
        let db = LineDb::new("postgres://nowhere/none", DEFAULT_STORE_TIMEOUT);
        assert!(!db.ping().await);
        assert!(matches!(db.pool(), Err(LineError::NotConnected(_))));
    }
}

//! High-level database client.

use std::fmt;
use std::sync::Arc;

use deadpool::managed::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;

use super::{ConnectionPool, PgConfig, PooledConnection};
use crate::error::{PgError, PgResult};
use crate::TRACING_TARGET;

/// Connection pool status information.
#[derive(Debug, Clone)]
pub struct PgPoolStatus {
    /// Maximum number of connections in the pool.
    pub max_size: usize,
    /// Current number of connections in the pool.
    pub size: usize,
    /// Number of available connections.
    pub available: usize,
    /// Number of requests waiting for connections.
    pub waiting: usize,
}

impl PgPoolStatus {
    /// Returns the utilization of the pool (0.0 to 1.0).
    #[inline]
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            (self.size - self.available) as f64 / self.max_size as f64
        }
    }

    /// Returns whether the pool is under pressure.
    #[inline]
    pub fn is_under_pressure(&self) -> bool {
        self.waiting > 0 || self.utilization() > 0.8
    }
}

/// High-level database client that manages the connection pool.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: ConnectionPool,
    config: PgConfig,
}

impl PgClient {
    /// Creates a new database client with the provided configuration.
    pub fn new(config: PgConfig) -> PgResult<Self> {
        tracing::info!(
            target: TRACING_TARGET,
            database_url = %config.database_url_masked(),
            "Initializing database client"
        );

        let manager = AsyncDieselConnectionManager::new(&config.postgres_url);

        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(Some(config.connection_timeout()))
            .create_timeout(Some(config.connection_timeout()))
            .recycle_timeout(Some(config.idle_timeout()))
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Failed to create connection pool"
                );
                PgError::Unexpected(format!("failed to build connection pool: {e}").into())
            })?;

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Gets a connection from the pool.
    pub async fn get_connection(&self) -> PgResult<PooledConnection> {
        self.inner.pool.get().await.map_err(PgError::from)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }

    /// Returns current pool status.
    pub fn pool_status(&self) -> PgPoolStatus {
        let status = self.inner.pool.status();
        PgPoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available.max(0) as usize,
            waiting: status.waiting,
        }
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("database_url", &self.inner.config.database_url_masked())
            .finish_non_exhaustive()
    }
}

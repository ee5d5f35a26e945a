//! # Database Connection Pool Module
//!
//! Provides SQLite connection pooling for the media library.
//!
//! ## Features
//!
//! - **WAL Mode**: Enabled for better concurrency (multiple readers, one writer)
//! - **Connection Pooling**: Configurable min/max connections with timeouts
//! - **Statement Caching**: Automatic prepared statement caching
//! - **Foreign Keys**: Enforced by default, can be switched off per store
//! - **Schema Application**: The idempotent library schema runs on every open
//! - **Health Checks**: Connection validation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_library::db::{DatabaseConfig, create_pool};
//!
//! let config = DatabaseConfig::new("library.db");
//! let pool = create_pool(config).await?;
//!
//! let albums: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM album")
//!     .fetch_one(&pool)
//!     .await?;
//! ```
//!
//! ## Testing
//!
//! For tests, use in-memory databases:
//!
//! ```rust,ignore
//! let pool = create_test_pool().await?;
//! ```

use crate::schema::initialize_schema;
use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Database configuration for SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL, `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    pub acquire_timeout: Duration,

    /// Maximum lifetime of a connection
    pub max_lifetime: Option<Duration>,

    /// Maximum idle time for a connection before being closed
    pub idle_timeout: Option<Duration>,

    /// Enable statement caching (number of statements to cache)
    pub statement_cache_capacity: usize,

    /// Enforce `media.album_id` references
    pub foreign_keys: bool,
}

impl DatabaseConfig {
    /// Create a new database configuration with the given file path
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let config = DatabaseConfig::new("library.db");
    /// ```
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        let database_url = format!("sqlite:{}", path.display());

        Self {
            database_url,
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
            idle_timeout: Some(Duration::from_secs(600)),  // 10 minutes
            statement_cache_capacity: 100,
            foreign_keys: true,
        }
    }

    /// Create a configuration for an in-memory database (useful for testing)
    ///
    /// The pool is pinned to a single connection that is never recycled, since
    /// the database lives only as long as a connection holds it open.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
            statement_cache_capacity: 100,
            foreign_keys: true,
        }
    }

    /// Set the minimum number of connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection acquire timeout
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime
    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the statement cache capacity
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Enable or disable foreign key enforcement
    pub fn foreign_keys(mut self, enforce: bool) -> Self {
        self.foreign_keys = enforce;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Create a configured SQLite connection pool
///
/// This function:
/// 1. Configures SQLite connection options (WAL mode, foreign keys, etc.)
/// 2. Creates a connection pool with the specified configuration
/// 3. Applies the library schema
/// 4. Performs a health check
///
/// # Errors
///
/// Returns an error if:
/// - The database file cannot be accessed
/// - Connection pool creation fails
/// - The schema cannot be applied
/// - Health check fails
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        foreign_keys = config.foreign_keys,
        "Creating database connection pool"
    );

    let mut connect_options =
        SqliteConnectOptions::from_str(&config.database_url).map_err(LibraryError::Database)?;

    connect_options = connect_options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(config.foreign_keys)
        .create_if_missing(true)
        // 64MB page cache
        .pragma("cache_size", "-64000")
        .pragma("mmap_size", "268435456") // 256MB
        .pragma("auto_vacuum", "INCREMENTAL")
        .statement_cache_capacity(config.statement_cache_capacity);

    debug!("SQLite connection options configured");

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create connection pool");
            LibraryError::Database(e)
        })?;

    info!(
        connections = pool.size(),
        "Database connection pool created successfully"
    );

    initialize_schema(&pool).await?;

    health_check(&pool).await?;

    Ok(pool)
}

/// Create a connection pool for testing with in-memory database
///
/// The returned store is fully initialized: tables, trigger, view and the
/// seeded default album are all present.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

/// Perform a health check on the connection pool
///
/// This executes a simple query to verify the database is accessible
/// and the pool is functioning correctly.
pub async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Performing database health check");

    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;

    debug!("Database health check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_in_memory_pool() {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(config).await;
        assert!(pool.is_ok(), "Should create in-memory pool successfully");
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = create_test_pool().await.unwrap();
        let result = health_check(&pool).await;
        assert!(result.is_ok(), "Health check should pass");
    }

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::in_memory()
            .min_connections(2)
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(60))
            .statement_cache_capacity(200)
            .foreign_keys(false);

        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
        assert_eq!(config.statement_cache_capacity, 200);
        assert!(!config.foreign_keys);
    }

    #[test]
    fn test_file_config_url() {
        let config = DatabaseConfig::new("/tmp/library.db");
        assert_eq!(config.database_url, "sqlite:/tmp/library.db");
        assert!(config.foreign_keys);
    }

    #[tokio::test]
    async fn test_foreign_keys_follow_config() {
        let pool = create_test_pool().await.unwrap();
        let (enabled,): (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1, "Foreign keys should be enabled");

        let pool = create_pool(DatabaseConfig::in_memory().foreign_keys(false))
            .await
            .unwrap();
        let (enabled,): (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 0, "Foreign keys should be disabled");
    }

    #[tokio::test]
    async fn test_reopening_file_store_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");

        let pool = create_pool(DatabaseConfig::new(&path)).await.unwrap();
        sqlx::query("INSERT INTO album (name) VALUES ('Rumours')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = create_pool(DatabaseConfig::new(&path)).await.unwrap();
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM album ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(names, vec!["Unknown Album".to_string(), "Rumours".to_string()]);
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(DatabaseConfig::new(dir.path().join("wal.db")))
            .await
            .unwrap();

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}

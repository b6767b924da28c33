//! # grievance-db
//!
//! Storage layer for the grievance service.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL and in-memory `GrievanceRepository` implementations
//! - `GrievanceStore`, which couples household lookups into updates
//! - The household registry
//! - Attachment object stores (HTTP and filesystem)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use grievance_db::{Database, GrievanceStore, StaticHouseholdDirectory};
//!
//! let db = Database::connect("postgres://localhost/grievance").await?;
//! db.migrate().await?;
//! let store = GrievanceStore::new(
//!     Arc::new(db.grievances.clone()),
//!     Arc::new(StaticHouseholdDirectory::default()),
//! );
//! ```

pub mod grievances;
pub mod households;
pub mod memory;
pub mod object_store;
pub mod pool;
pub mod store;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use grievance_core::*;

pub use grievances::PgGrievanceRepository;
pub use households::StaticHouseholdDirectory;
pub use memory::InMemoryGrievanceRepository;
pub use object_store::{object_key, FilesystemObjectStore, HttpObjectStore};
pub use pool::{connect_pool, PoolConfig};
pub use store::{GrievanceStore, NOT_FOUND_MESSAGE};

/// PostgreSQL context: pool plus repositories.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub grievances: PgGrievanceRepository,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            grievances: PgGrievanceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_config(url, PoolConfig::default()).await
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = connect_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

//! # sqlx-conn-registry
//!
//! A lightweight registry of named database connections with maintenance operations
//! that work the same way across SQLite (and LibSQL), MySQL and PostgreSQL.
//!
//! ## Core Types
//!
//! - **[`ConnectionManager`]**: Maps logical connection names to driver configs, creates
//!   clients lazily through per-driver factories and caches them
//! - **[`ConnectionConfig`]**: `(name, driver, dsn)` triple, deserializable from any serde source
//! - **[`Dialect`]**: Per-dialect SQL used by the bulk table operations
//! - **[`split_statements`]**: Quote-aware splitter used for migration files
//! - **[`Error`]**: Error type for registry operations
//!
//! ## Operations
//!
//! - `flush_all_tables` / `drop_all_tables`: clear or drop every user table with foreign
//!   key enforcement temporarily disabled
//! - `run_migration`: execute a `.sql` file statement by statement inside one transaction
//! - `run_migration_once`: the same, at most once per `(connection, file)` for the
//!   lifetime of the manager, even with concurrent callers
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqlx_conn_mgr::{PoolConfig, PoolFactory};
//! use sqlx_conn_registry::{ConnectionManager, MYSQL, SQLITE};
//!
//! #[tokio::main]
//! async fn main() -> sqlx_conn_registry::Result<()> {
//!     let manager = Arc::new(ConnectionManager::new());
//!     manager.register_factory(SQLITE, PoolFactory::sqlite(PoolConfig::default()));
//!     manager.register_factory(MYSQL, PoolFactory::mysql(PoolConfig::default()));
//!
//!     manager.set_config("cache", SQLITE, "sqlite://cache.db?mode=rwc");
//!     manager.set_config("primary", MYSQL, "mysql://root@localhost/app");
//!
//!     // Clients are created on first use and shared afterwards
//!     manager.run_migration_once("primary", "migrations/001_init.sql").await?;
//!     manager.run_migration_once("primary", "migrations/001_init.sql").await?; // no-op
//!
//!     manager.flush_all_tables("cache").await?;
//!     manager.close_all().await?;
//!     Ok(())
//! }
//! ```
//!
//! Prefer constructing a manager in your composition root and passing it around.
//! [`global()`] exists for code that needs a process-wide default instance.
//!
use std::sync::LazyLock;

mod config;
mod error;
mod manager;
mod migration;
mod splitter;
mod tables;

pub use sqlx_conn_mgr;

pub use config::ConnectionConfig;
pub use error::{Error, Result};
pub use manager::ConnectionManager;
pub use splitter::split_statements;
pub use tables::{Dialect, TableAction, apply_to_all_tables};

/// Driver identifier for MySQL / MariaDB
pub const MYSQL: &str = "mysql";
/// Driver identifier for PostgreSQL
pub const POSTGRES: &str = "postgres";
/// Driver identifier for SQLite
pub const SQLITE: &str = "sqlite";
/// Driver identifier for LibSQL, which uses the SQLite dialect
pub const LIBSQL: &str = "libsql";

static GLOBAL: LazyLock<ConnectionManager> = LazyLock::new(ConnectionManager::new);

/// Process-wide default manager, created on first access.
pub fn global() -> &'static ConnectionManager {
   &GLOBAL
}

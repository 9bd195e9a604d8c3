//! # sqlx-conn-mgr
//!
//! The narrow, object-safe client capability a connection registry calls into, with
//! ready-made implementations backed by SQLx pools for SQLite, MySQL and PostgreSQL.
//!
//! ## Core Types
//!
//! - **[`DatabaseClient`]**: Shared, expensive-to-create handle (usually a pool)
//! - **[`SqlSession`]**: A single checked-out connection for session-scoped work
//! - **[`SqlTransaction`]**: A session inside a transaction, rolled back on drop
//! - **[`ConnectionFactory`]**: Creates a client from a data-source string
//! - **[`PoolClient`]** / **[`PoolFactory`]**: SQLx-backed implementations
//! - **[`PoolConfig`]**: Pool sizing for the built-in factories
//! - **[`Error`]**: Error type for client operations
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_conn_mgr::{
//!     ConnectionFactory, DatabaseClient, PoolConfig, PoolFactory, SqlSession, SqlTransaction,
//! };
//!
//! #[tokio::main]
//! async fn main() -> sqlx_conn_mgr::Result<()> {
//!     let factory = PoolFactory::postgres(PoolConfig::default());
//!     let client = factory.connect("postgres://localhost/app").await?;
//!
//!     // Session-scoped settings stick to the checked-out connection
//!     let mut session = client.acquire().await?;
//!     session.execute("SET session_replication_role = 'replica'").await?;
//!     let tables = session
//!         .fetch_column("SELECT tablename FROM pg_tables WHERE schemaname = 'public'")
//!         .await?;
//!     println!("{tables:?}");
//!     drop(session);
//!
//!     // Transactions commit explicitly and roll back on drop
//!     let mut tx = client.begin().await?;
//!     tx.execute("CREATE TABLE users (id SERIAL PRIMARY KEY)").await?;
//!     tx.commit().await?;
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Design Principles
//!
//! - Uses sqlx's `PoolOptions` for all pool configuration
//! - Statements are sent through `sqlx::raw_sql`, so `SET`, `PRAGMA`, `SHOW` and DDL
//!   behave the same on every backend
//! - Any other driver can participate by implementing the traits directly
//!
mod client;
mod config;
mod error;
mod pool;
mod session;

// Re-export public types
pub use client::{ConnectionFactory, DatabaseClient, SqlSession, SqlTransaction};
pub use config::PoolConfig;
pub use error::Error;
pub use pool::{Backend, PoolClient, PoolFactory};
pub use session::{PooledSession, PooledTransaction};

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

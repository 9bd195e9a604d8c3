//! Configuration for sqlx connection pools

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::Database;
use sqlx::pool::PoolOptions;

/// Configuration for the pools built by [`PoolFactory`](crate::PoolFactory)
///
/// # Examples
///
/// ```
/// use sqlx_conn_mgr::PoolConfig;
///
/// // Use defaults
/// let config = PoolConfig::default();
///
/// // Override just one field
/// let config = PoolConfig {
///     max_connections: 1,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
   /// Maximum number of connections the pool keeps open
   ///
   /// In-memory SQLite databases are private to a single connection, so use 1
   /// when the DSN is `sqlite::memory:`.
   ///
   /// Default: 10
   pub max_connections: u32,

   /// Idle timeout for pooled connections (in seconds)
   ///
   /// Connections that remain idle for this duration will be closed automatically.
   ///
   /// Default: 30
   pub idle_timeout_secs: u64,
}

impl PoolConfig {
   pub(crate) fn pool_options<DB: Database>(&self) -> PoolOptions<DB> {
      PoolOptions::<DB>::new()
         .max_connections(self.max_connections)
         .min_connections(0)
         .idle_timeout(Some(Duration::from_secs(self.idle_timeout_secs)))
   }
}

impl Default for PoolConfig {
   fn default() -> Self {
      Self {
         max_connections: 10,
         idle_timeout_secs: 30,
      }
   }
}

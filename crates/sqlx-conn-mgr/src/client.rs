//! The narrow client capability the registry calls into

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// An open database target (typically a connection pool), shared by every
/// caller that resolves the same logical connection.
///
/// Implementations must be cheap to share behind an `Arc` and safe to use from
/// many tasks at once.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
   /// Check out a single connection.
   ///
   /// Session-scoped settings (PRAGMAs, session variables) issued through the
   /// returned session apply to all later statements on that same session.
   async fn acquire(&self) -> Result<Box<dyn SqlSession>>;

   /// Begin a transaction on a dedicated connection.
   async fn begin(&self) -> Result<Box<dyn SqlTransaction>>;

   /// Release every resource held by the client.
   ///
   /// After a successful close the client must not be used again.
   async fn close(&self) -> Result<()>;
}

/// A single connection that plain SQL text can be run against.
#[async_trait]
pub trait SqlSession: Send {
   /// Execute a statement, returning the number of affected rows.
   async fn execute(&mut self, sql: &str) -> Result<u64>;

   /// Run a query and return the first column of every row as text.
   async fn fetch_column(&mut self, sql: &str) -> Result<Vec<String>>;
}

/// A session wrapped in a transaction.
///
/// Dropping the transaction without committing rolls it back.
#[async_trait]
pub trait SqlTransaction: SqlSession {
   async fn commit(self: Box<Self>) -> Result<()>;

   async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Creates a [`DatabaseClient`] from a data-source string.
///
/// One factory is registered per driver identifier and may serve any number of
/// logical connections. Plain async closures taking the DSN as a `String` are
/// factories too:
///
/// ```no_run
/// use std::sync::Arc;
/// use sqlx::Sqlite;
/// use sqlx_conn_mgr::{ConnectionFactory, DatabaseClient, PoolClient, PoolConfig};
///
/// fn single_connection_sqlite() -> impl ConnectionFactory {
///     |dsn: String| async move {
///         let config = PoolConfig { max_connections: 1, ..Default::default() };
///         let client: Arc<dyn DatabaseClient> =
///             PoolClient::<Sqlite>::connect(&dsn, &config).await?;
///         Ok::<_, sqlx_conn_mgr::Error>(client)
///     }
/// }
/// ```
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
   async fn connect(&self, dsn: &str) -> Result<Arc<dyn DatabaseClient>>;
}

#[async_trait]
impl<F, Fut> ConnectionFactory for F
where
   F: Fn(String) -> Fut + Send + Sync,
   Fut: Future<Output = Result<Arc<dyn DatabaseClient>>> + Send,
{
   async fn connect(&self, dsn: &str) -> Result<Arc<dyn DatabaseClient>> {
      (self)(dsn.to_owned()).await
   }
}

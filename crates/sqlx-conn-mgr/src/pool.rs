//! sqlx connection pools exposed through the [`DatabaseClient`] capability

use crate::Result;
use crate::client::{ConnectionFactory, DatabaseClient, SqlSession, SqlTransaction};
use crate::config::PoolConfig;
use crate::error::Error;
use crate::session::{PooledSession, PooledTransaction};
use async_trait::async_trait;
use sqlx::{Database, MySql, Pool, Postgres, Sqlite};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Database backends with a built-in sqlx pool implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
   Sqlite,
   MySql,
   Postgres,
}

impl fmt::Display for Backend {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         Backend::Sqlite => "sqlite",
         Backend::MySql => "mysql",
         Backend::Postgres => "postgres",
      })
   }
}

/// A sqlx connection pool shared by every caller of one logical connection.
///
/// Sessions and transactions each check out a dedicated pooled connection.
/// After [`DatabaseClient::close`] every operation returns `Error::DatabaseClosed`.
///
/// # Example
///
/// ```no_run
/// use sqlx::Sqlite;
/// use sqlx_conn_mgr::{DatabaseClient, PoolClient, PoolConfig, SqlSession};
///
/// # async fn example() -> Result<(), sqlx_conn_mgr::Error> {
/// let client = PoolClient::<Sqlite>::connect("sqlite://app.db?mode=rwc", &PoolConfig::default()).await?;
///
/// let mut session = client.acquire().await?;
/// session.execute("CREATE TABLE IF NOT EXISTS users (name TEXT)").await?;
/// drop(session);
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PoolClient<DB: Database> {
   pool: Pool<DB>,

   /// Marks the client as closed to prevent further operations
   closed: AtomicBool,
}

impl<DB: Database> PoolClient<DB> {
   /// Wrap an already configured pool
   pub fn new(pool: Pool<DB>) -> Self {
      Self {
         pool,
         closed: AtomicBool::new(false),
      }
   }

   /// Open a pool for `dsn` with the given configuration
   ///
   /// Connections are established lazily by the pool, but the first one is
   /// opened here so that an unreachable target fails at creation time.
   pub async fn connect(dsn: &str, config: &PoolConfig) -> Result<Arc<Self>> {
      if dsn.trim().is_empty() {
         return Err(Error::InvalidDsn(dsn.to_string()));
      }

      let pool = config.pool_options::<DB>().connect(dsn).await?;
      Ok(Arc::new(Self::new(pool)))
   }

   /// Get a reference to the underlying pool
   pub fn pool(&self) -> Result<&Pool<DB>> {
      if self.closed.load(Ordering::SeqCst) {
         return Err(Error::DatabaseClosed);
      }
      Ok(&self.pool)
   }
}

macro_rules! impl_database_client {
   ($db:ty) => {
      #[async_trait]
      impl DatabaseClient for PoolClient<$db> {
         async fn acquire(&self) -> Result<Box<dyn SqlSession>> {
            let conn = self.pool()?.acquire().await?;
            Ok(Box::new(PooledSession::new(conn)))
         }

         async fn begin(&self) -> Result<Box<dyn SqlTransaction>> {
            let tx = self.pool()?.begin().await?;
            Ok(Box::new(PooledTransaction::new(tx)))
         }

         async fn close(&self) -> Result<()> {
            if self.closed.swap(true, Ordering::SeqCst) {
               return Err(Error::DatabaseClosed);
            }

            // Waits for checked-out connections to be returned
            self.pool.close().await;
            trace!("pool closed");
            Ok(())
         }
      }
   };
}

impl_database_client!(Sqlite);
impl_database_client!(MySql);
impl_database_client!(Postgres);

/// Factory producing [`PoolClient`]s for one backend.
///
/// Register one per driver identifier with the connection registry; every
/// logical connection using that driver gets its own pool.
#[derive(Debug, Clone)]
pub struct PoolFactory {
   backend: Backend,
   config: PoolConfig,
}

impl PoolFactory {
   pub fn new(backend: Backend, config: PoolConfig) -> Self {
      Self { backend, config }
   }

   pub fn sqlite(config: PoolConfig) -> Self {
      Self::new(Backend::Sqlite, config)
   }

   pub fn mysql(config: PoolConfig) -> Self {
      Self::new(Backend::MySql, config)
   }

   pub fn postgres(config: PoolConfig) -> Self {
      Self::new(Backend::Postgres, config)
   }
}

#[async_trait]
impl ConnectionFactory for PoolFactory {
   async fn connect(&self, dsn: &str) -> Result<Arc<dyn DatabaseClient>> {
      debug!("Opening {} pool", self.backend);

      let client: Arc<dyn DatabaseClient> = match self.backend {
         Backend::Sqlite => PoolClient::<Sqlite>::connect(dsn, &self.config).await?,
         Backend::MySql => PoolClient::<MySql>::connect(dsn, &self.config).await?,
         Backend::Postgres => PoolClient::<Postgres>::connect(dsn, &self.config).await?,
      };
      Ok(client)
   }
}

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use sqlx_conn_mgr::{ConnectionFactory, DatabaseClient};
use tokio::sync::RwLock as AsyncRwLock;
use tracing::{debug, error, info, trace, warn};

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::migration::{MigrationKey, MigrationTracker, run_migration_file};
use crate::tables::{Dialect, TableAction, apply_to_all_tables};

/// Registry of named logical connections.
///
/// Maps connection names to `(driver, dsn)` configs, driver identifiers to
/// [`ConnectionFactory`]s, and connection names to lazily created, cached
/// [`DatabaseClient`]s. At most one client exists per name at any time.
///
/// Configs and factories sit behind short-held synchronous locks. The client
/// cache uses an async reader/writer lock: cache hits only take the shared
/// lock, while a miss takes the exclusive lock and re-checks before invoking
/// the factory. Migration bookkeeping has its own lock and never holds it while
/// a migration runs.
///
/// # Example
///
/// ```no_run
/// use sqlx_conn_registry::{ConnectionManager, POSTGRES};
/// use sqlx_conn_mgr::{PoolConfig, PoolFactory};
///
/// # async fn example() -> sqlx_conn_registry::Result<()> {
/// let manager = ConnectionManager::new();
/// manager.register_factory(POSTGRES, PoolFactory::postgres(PoolConfig::default()));
/// manager.set_config("primary", POSTGRES, "postgres://localhost/app");
///
/// manager.run_migration_once("primary", "migrations/001_init.sql").await?;
/// manager.flush_all_tables("primary").await?;
/// manager.close_all().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ConnectionManager {
   configs: RwLock<HashMap<String, ConnectionConfig>>,
   factories: RwLock<HashMap<String, Arc<dyn ConnectionFactory>>>,
   connections: AsyncRwLock<HashMap<String, Arc<dyn DatabaseClient>>>,
   migrations: MigrationTracker,
}

impl ConnectionManager {
   pub fn new() -> Self {
      Self::default()
   }

   /// Register the factory used for every connection whose config names `driver`.
   ///
   /// Replaces any factory previously registered for the same driver. Clients
   /// that are already cached are not affected.
   pub fn register_factory(&self, driver: impl Into<String>, factory: impl ConnectionFactory + 'static) {
      self.register_shared_factory(driver, Arc::new(factory));
   }

   /// Like [`register_factory`](Self::register_factory) for a factory that is already shared.
   pub fn register_shared_factory(&self, driver: impl Into<String>, factory: Arc<dyn ConnectionFactory>) {
      let driver = driver.into();
      trace!("Registering factory for driver {}", driver);
      self.factories.write().insert(driver, factory);
   }

   /// Store or overwrite the config for a logical connection. Does not connect.
   pub fn set_config(&self, name: impl Into<String>, driver: impl Into<String>, dsn: impl Into<String>) {
      let config = ConnectionConfig::new(name, driver, dsn);
      self.configs.write().insert(config.name.clone(), config);
   }

   /// Store or overwrite several configs at once.
   pub fn set_configs(&self, configs: impl IntoIterator<Item = ConnectionConfig>) {
      let mut stored = self.configs.write();
      for config in configs {
         stored.insert(config.name.clone(), config);
      }
   }

   /// The config registered under `name`, if any.
   pub fn config(&self, name: &str) -> Option<ConnectionConfig> {
      self.configs.read().get(name).cloned()
   }

   /// Whether a client is currently cached for `name`.
   pub async fn has_connection(&self, name: &str) -> bool {
      self.connections.read().await.contains_key(name)
   }

   fn resolve(&self, name: &str) -> Result<(ConnectionConfig, Arc<dyn ConnectionFactory>)> {
      let config = self
         .config(name)
         .ok_or_else(|| Error::ConfigNotFound(name.to_string()))?;

      let factory = self
         .factories
         .read()
         .get(&config.driver)
         .cloned()
         .ok_or_else(|| Error::FactoryNotFound(config.driver.clone()))?;

      Ok((config, factory))
   }

   /// Get the client for `name`, creating it with the driver's factory on first use.
   ///
   /// Concurrent first callers for the same name invoke the factory exactly once
   /// and all receive the same client. A failed factory call caches nothing.
   pub async fn get_connection(&self, name: &str) -> Result<Arc<dyn DatabaseClient>> {
      let (config, factory) = self.resolve(name)?;

      let cached = self.connections.read().await.get(name).cloned();
      if let Some(client) = cached {
         return Ok(client);
      }

      let mut connections = self.connections.write().await;

      // Another caller may have created it while we waited for the write lock
      if let Some(client) = connections.get(name) {
         trace!("Connection {} created concurrently, reusing", name);
         return Ok(Arc::clone(client));
      }

      debug!("Opening connection {} (driver {})", name, config.driver);
      let client = factory
         .connect(&config.dsn)
         .await
         .map_err(|source| Error::ClientCreation {
            name: name.to_string(),
            source,
         })?;

      connections.insert(name.to_string(), Arc::clone(&client));
      info!("Connection {} opened", name);
      Ok(client)
   }

   /// Close and uncache the client for `name`.
   ///
   /// The next [`get_connection`](Self::get_connection) re-creates it from the
   /// factory. If closing fails the client stays cached.
   pub async fn close(&self, name: &str) -> Result<()> {
      let mut connections = self.connections.write().await;

      let client = connections
         .get(name)
         .cloned()
         .ok_or_else(|| Error::ConnectionNotFound(name.to_string()))?;

      client.close().await.map_err(|source| Error::Close {
         name: name.to_string(),
         source,
      })?;

      connections.remove(name);
      info!("Connection {} closed", name);
      Ok(())
   }

   /// Close every cached client and empty the cache.
   ///
   /// All clients are attempted even if some fail; failures are returned
   /// together as [`Error::CloseAll`]. The cache is empty afterwards either way.
   pub async fn close_all(&self) -> Result<()> {
      let mut connections = self.connections.write().await;
      let drained: Vec<_> = connections.drain().collect();

      let results = join_all(drained.into_iter().map(|(name, client)| async move {
         let result = client.close().await;
         (name, result)
      }))
      .await;

      let failures: Vec<Error> = results
         .into_iter()
         .filter_map(|(name, result)| {
            result.err().map(|source| {
               error!("Failed to close connection {}: {}", name, source);
               Error::Close { name, source }
            })
         })
         .collect();

      if failures.is_empty() {
         debug!("All connections closed");
         Ok(())
      } else {
         Err(Error::CloseAll(failures))
      }
   }

   /// Delete all rows from every table of `name`, ignoring foreign key constraints.
   ///
   /// On failure integrity enforcement may remain disabled on the target.
   pub async fn flush_all_tables(&self, name: &str) -> Result<()> {
      self.clear_tables(name, TableAction::Flush).await
   }

   /// Drop every table of `name`, ignoring foreign key constraints.
   ///
   /// On failure integrity enforcement may remain disabled on the target.
   pub async fn drop_all_tables(&self, name: &str) -> Result<()> {
      self.clear_tables(name, TableAction::Drop).await
   }

   async fn clear_tables(&self, name: &str, action: TableAction) -> Result<()> {
      let client = self.get_connection(name).await?;

      let driver = self
         .config(name)
         .ok_or_else(|| Error::ConfigNotFound(name.to_string()))?
         .driver;
      let dialect = Dialect::from_driver(&driver).ok_or(Error::UnsupportedDriver(driver))?;

      // One session so the constraint toggles apply to the per-table statements
      let mut session = client.acquire().await.map_err(|source| Error::Session {
         name: name.to_string(),
         source,
      })?;
      let count = apply_to_all_tables(session.as_mut(), dialect, action)
         .await
         .map_err(|source| Error::TableOperation {
            name: name.to_string(),
            action,
            source: Box::new(source),
         })?;
      info!("Completed {} of {} tables on {}", action, count, name);
      Ok(())
   }

   /// Execute the SQL file at `path` against `name` inside one transaction.
   ///
   /// Fails without touching the database if the file is unreadable, blank or
   /// contains no statements. Any failing statement rolls back the whole file.
   pub async fn run_migration(&self, name: &str, path: impl AsRef<Path>) -> Result<()> {
      let path = path.as_ref();
      let client = self.get_connection(name).await?;

      debug!("Running migration {} on {}", path.display(), name);
      match run_migration_file(name, client.as_ref(), path).await {
         Ok(count) => {
            info!(
               "Migration {} applied {} statements on {}",
               path.display(),
               count,
               name
            );
            Ok(())
         }
         Err(e) => {
            warn!("Migration {} failed on {}: {}", path.display(), name, e);
            Err(e)
         }
      }
   }

   /// Like [`run_migration`](Self::run_migration), but at most once per
   /// `(name, path)` for the lifetime of this manager.
   ///
   /// Concurrent callers for the same key wait for the one running it. A failed
   /// run is not remembered, so a later call retries.
   pub async fn run_migration_once(&self, name: &str, path: impl AsRef<Path>) -> Result<()> {
      let path = path.as_ref();

      self
         .migrations
         .run_once(MigrationKey::new(name, path), || self.run_migration(name, path))
         .await?;
      Ok(())
   }

   /// Whether `run_migration_once` has completed for this `(name, path)`.
   pub fn is_migration_executed(&self, name: &str, path: impl AsRef<Path>) -> bool {
      self
         .migrations
         .is_executed(&MigrationKey::new(name, path.as_ref()))
   }
}

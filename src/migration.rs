//! SQL file migrations: all-or-nothing execution and at-most-once tracking.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use sqlx_conn_mgr::{DatabaseClient, SqlSession, SqlTransaction};
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace};

use crate::error::{Error, Result};
use crate::splitter::split_statements;

/// Read, split and execute a migration file inside a single transaction.
///
/// Statements run strictly in file order. The first failure rolls the whole
/// file back and is reported with its 1-based index and text. Returns the
/// number of statements executed.
pub(crate) async fn run_migration_file(
   name: &str,
   client: &dyn DatabaseClient,
   path: &Path,
) -> Result<usize> {
   let content = tokio::fs::read_to_string(path)
      .await
      .map_err(|source| Error::FileRead {
         path: path.to_path_buf(),
         source,
      })?;

   let content = content.trim();
   if content.is_empty() {
      return Err(Error::EmptyFile(path.to_path_buf()));
   }

   let statements = split_statements(content);
   if statements.is_empty() {
      return Err(Error::NoStatements(path.to_path_buf()));
   }

   let mut tx = client.begin().await.map_err(|source| Error::Transaction {
      name: name.to_string(),
      path: path.to_path_buf(),
      source,
   })?;

   for (i, statement) in statements.iter().enumerate() {
      trace!("Executing statement {} of {}", i + 1, path.display());
      if let Err(source) = tx.execute(statement).await {
         rollback(tx, path).await;
         return Err(Error::StatementExecution {
            name: name.to_string(),
            index: i + 1,
            path: path.to_path_buf(),
            source,
            statement: statement.clone(),
         });
      }
   }

   tx.commit().await.map_err(|source| Error::Transaction {
      name: name.to_string(),
      path: path.to_path_buf(),
      source,
   })?;

   Ok(statements.len())
}

async fn rollback(tx: Box<dyn SqlTransaction>, path: &Path) {
   // The statement error is what the caller needs; a failed rollback is only logged
   if let Err(e) = tx.rollback().await {
      error!("Failed to roll back migration {}: {}", path.display(), e);
   }
}

/// Identifies one "run at most once" migration: a connection name and the
/// file path exactly as the caller passed it.
///
/// Kept as a pair rather than a joined string so that names or paths
/// containing the separator cannot alias each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MigrationKey {
   name: String,
   path: PathBuf,
}

impl MigrationKey {
   pub(crate) fn new(name: &str, path: &Path) -> Self {
      Self {
         name: name.to_string(),
         path: path.to_path_buf(),
      }
   }
}

impl fmt::Display for MigrationKey {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{}:{}", self.name, self.path.display())
   }
}

#[derive(Default)]
struct MigrationSlot {
   executed: AtomicBool,
   running: Mutex<()>,
}

/// Remembers which migration keys have completed for the lifetime of the manager.
///
/// The map lock is only held to look up or insert a slot. The migration itself
/// runs under the slot's own mutex, so distinct keys never wait on each other
/// and connection lookups are never blocked by a running migration.
#[derive(Default)]
pub(crate) struct MigrationTracker {
   slots: RwLock<HashMap<MigrationKey, Arc<MigrationSlot>>>,
}

impl MigrationTracker {
   pub(crate) fn is_executed(&self, key: &MigrationKey) -> bool {
      self
         .slots
         .read()
         .get(key)
         .is_some_and(|slot| slot.executed.load(Ordering::SeqCst))
   }

   /// Run `migrate` unless `key` already completed. Concurrent callers for the
   /// same key wait for the first one; a failed run leaves the key unmarked.
   ///
   /// Returns `true` when this call executed the migration.
   pub(crate) async fn run_once<F, Fut>(&self, key: MigrationKey, migrate: F) -> Result<bool>
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = Result<()>>,
   {
      if self.is_executed(&key) {
         trace!("Migration {} already executed", key);
         return Ok(false);
      }

      let slot = {
         let mut slots = self.slots.write();
         Arc::clone(slots.entry(key.clone()).or_default())
      };

      let _running = slot.running.lock().await;
      if slot.executed.load(Ordering::SeqCst) {
         debug!("Migration {} completed while waiting", key);
         return Ok(false);
      }

      migrate().await?;
      slot.executed.store(true, Ordering::SeqCst);
      info!("Migration {} executed", key);
      Ok(true)
   }
}

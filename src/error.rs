use std::path::PathBuf;

use crate::tables::{Dialect, TableAction};

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the connection registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// No config registered under this logical connection name.
   #[error("database connection config not found for {0}")]
   ConfigNotFound(String),

   /// The config names a driver without a registered factory.
   #[error("database connection factory not found for driver {0}")]
   FactoryNotFound(String),

   /// No open client cached under this logical connection name.
   #[error("connection {0} not found")]
   ConnectionNotFound(String),

   /// The driver has no dialect table operations.
   #[error("unsupported database driver: {0}")]
   UnsupportedDriver(String),

   /// The factory failed; nothing was cached.
   #[error("failed to create client for connection {name}: {source}")]
   ClientCreation {
      name: String,
      #[source]
      source: sqlx_conn_mgr::Error,
   },

   /// Closing a client failed; the client stays cached.
   #[error("failed to close connection {name}: {source}")]
   Close {
      name: String,
      #[source]
      source: sqlx_conn_mgr::Error,
   },

   /// One or more clients failed to close during a bulk close. The cache is empty regardless.
   #[error("failed to close {} connection(s): {}", .0.len(), join_errors(.0))]
   CloseAll(Vec<Error>),

   /// Checking out a session from the client failed.
   #[error("failed to acquire a session on connection {name}: {source}")]
   Session {
      name: String,
      #[source]
      source: sqlx_conn_mgr::Error,
   },

   #[error("failed to read SQL file {}: {source}", .path.display())]
   FileRead {
      path: PathBuf,
      #[source]
      source: std::io::Error,
   },

   #[error("SQL file {} is empty", .0.display())]
   EmptyFile(PathBuf),

   #[error("no valid SQL statements found in file {}", .0.display())]
   NoStatements(PathBuf),

   /// A migration statement failed and the file's transaction was rolled back.
   #[error(
      "failed to execute statement {index} in file {} on {name}: {source}\nStatement: {statement}",
      .path.display()
   )]
   StatementExecution {
      name: String,
      /// 1-based position of the statement in the file
      index: usize,
      path: PathBuf,
      #[source]
      source: sqlx_conn_mgr::Error,
      statement: String,
   },

   /// Beginning or committing a migration transaction failed.
   #[error("transaction failed for SQL file {} on {name}: {source}", .path.display())]
   Transaction {
      name: String,
      path: PathBuf,
      #[source]
      source: sqlx_conn_mgr::Error,
   },

   /// A flush or drop failed on connection `name`; `source` names the phase.
   #[error("failed to {action} all tables on {name}: {source}")]
   TableOperation {
      name: String,
      action: TableAction,
      #[source]
      source: Box<Error>,
   },

   #[error("failed to disable foreign key checks ({dialect}): {source}")]
   DisableConstraints {
      dialect: Dialect,
      #[source]
      source: sqlx_conn_mgr::Error,
   },

   #[error("failed to get table names ({dialect}): {source}")]
   ListTables {
      dialect: Dialect,
      #[source]
      source: sqlx_conn_mgr::Error,
   },

   /// Integrity checks are still disabled when this is returned.
   #[error("failed to {action} table {table}: {source}")]
   TableStatement {
      table: String,
      action: TableAction,
      #[source]
      source: sqlx_conn_mgr::Error,
   },

   #[error("failed to re-enable foreign key checks ({dialect}): {source}")]
   EnableConstraints {
      dialect: Dialect,
      #[source]
      source: sqlx_conn_mgr::Error,
   },
}

fn join_errors(errors: &[Error]) -> String {
   errors
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join("; ")
}

//! Error types for sqlx-conn-mgr

use thiserror::Error;

/// Errors that may occur when creating or using a database client
#[derive(Error, Debug)]
pub enum Error {
   /// Error from the sqlx library. Standard sqlx errors are converted to this variant
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// The data-source string handed to a factory was blank
   #[error("Invalid DSN: {0:?}")]
   InvalidDsn(String),

   /// Client has been closed and cannot be used
   #[error("Database has been closed")]
   DatabaseClosed,

   /// Failure reported by a client that is not backed by sqlx (e.g. a libsql driver)
   #[error(transparent)]
   Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
   /// Wrap an arbitrary driver error
   pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
      Error::Other(err.into())
   }
}

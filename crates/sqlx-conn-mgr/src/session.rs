//! Pooled sessions and transactions handed out by [`PoolClient`](crate::PoolClient)

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Database, Executor, MySql, Postgres, Row, Sqlite, Transaction};
use std::ops::{Deref, DerefMut};

use crate::Result;
use crate::client::{SqlSession, SqlTransaction};
use crate::error::Error;

/// RAII guard over a single pooled connection
///
/// The connection returns to the pool on drop. The guard derefs to the
/// backend connection type so it can also be used directly with sqlx queries.
#[derive(Debug)]
pub struct PooledSession<DB: Database> {
   conn: PoolConnection<DB>,
}

impl<DB: Database> PooledSession<DB> {
   pub(crate) fn new(conn: PoolConnection<DB>) -> Self {
      Self { conn }
   }
}

impl<DB: Database> Deref for PooledSession<DB> {
   type Target = DB::Connection;

   fn deref(&self) -> &Self::Target {
      &*self.conn
   }
}

impl<DB: Database> DerefMut for PooledSession<DB> {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut *self.conn
   }
}

/// Transaction over a pooled connection
///
/// Rolled back on drop unless [`SqlTransaction::commit`] was called.
pub struct PooledTransaction<DB: Database> {
   tx: Transaction<'static, DB>,
}

impl<DB: Database> PooledTransaction<DB> {
   pub(crate) fn new(tx: Transaction<'static, DB>) -> Self {
      Self { tx }
   }
}

impl<DB: Database> Deref for PooledTransaction<DB> {
   type Target = DB::Connection;

   fn deref(&self) -> &Self::Target {
      &*self.tx
   }
}

impl<DB: Database> DerefMut for PooledTransaction<DB> {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut *self.tx
   }
}

// Table listings come back as text on every backend except a few MySQL
// catalog columns, which are reported as binary strings.
macro_rules! first_column {
   ($row:expr) => {
      match $row.try_get::<String, _>(0) {
         Ok(text) => Ok(text),
         Err(_) => {
            let bytes = $row.try_get::<Vec<u8>, _>(0)?;
            String::from_utf8(bytes).map_err(Error::other)
         }
      }
   };
}

macro_rules! impl_sql_session {
   ($db:ty) => {
      #[async_trait]
      impl SqlSession for PooledSession<$db> {
         async fn execute(&mut self, sql: &str) -> Result<u64> {
            let result = (&mut **self).execute(sqlx::raw_sql(sql)).await?;
            Ok(result.rows_affected())
         }

         async fn fetch_column(&mut self, sql: &str) -> Result<Vec<String>> {
            let rows = (&mut **self).fetch_all(sqlx::raw_sql(sql)).await?;
            rows
               .iter()
               .map(|row| -> Result<String> { first_column!(row) })
               .collect()
         }
      }

      #[async_trait]
      impl SqlSession for PooledTransaction<$db> {
         async fn execute(&mut self, sql: &str) -> Result<u64> {
            let result = (&mut **self).execute(sqlx::raw_sql(sql)).await?;
            Ok(result.rows_affected())
         }

         async fn fetch_column(&mut self, sql: &str) -> Result<Vec<String>> {
            let rows = (&mut **self).fetch_all(sqlx::raw_sql(sql)).await?;
            rows
               .iter()
               .map(|row| -> Result<String> { first_column!(row) })
               .collect()
         }
      }

      #[async_trait]
      impl SqlTransaction for PooledTransaction<$db> {
         async fn commit(self: Box<Self>) -> Result<()> {
            let PooledTransaction { tx } = *self;
            tx.commit().await?;
            Ok(())
         }

         async fn rollback(self: Box<Self>) -> Result<()> {
            let PooledTransaction { tx } = *self;
            tx.rollback().await?;
            Ok(())
         }
      }
   };
}

impl_sql_session!(Sqlite);
impl_sql_session!(MySql);
impl_sql_session!(Postgres);

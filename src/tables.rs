//! Dialect-aware bulk table operations (flush and drop).
//!
//! Every operation follows the same four phases on one session: disable
//! referential-integrity enforcement, enumerate the user tables, run the
//! destructive statement per table, then re-enable enforcement. Per-table
//! statements are not wrapped in a transaction. When any phase fails the loop
//! stops and enforcement is NOT restored; the database is left with integrity
//! checks off until someone intervenes.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx_conn_mgr::SqlSession;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::{LIBSQL, MYSQL, POSTGRES, SQLITE};

/// SQL dialect selected by a connection's driver identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
   /// SQLite and LibSQL
   Sqlite,
   MySql,
   Postgres,
}

/// Destructive per-table action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
   /// Remove every row, keep the schema
   Flush,
   /// Remove the table entirely
   Drop,
}

impl fmt::Display for TableAction {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         TableAction::Flush => "flush",
         TableAction::Drop => "drop",
      })
   }
}

impl Dialect {
   /// Map a driver identifier to its dialect. `libsql` shares the SQLite dialect.
   pub fn from_driver(driver: &str) -> Option<Self> {
      match driver {
         SQLITE | LIBSQL => Some(Dialect::Sqlite),
         MYSQL => Some(Dialect::MySql),
         POSTGRES => Some(Dialect::Postgres),
         _ => None,
      }
   }

   pub fn name(self) -> &'static str {
      match self {
         Dialect::Sqlite => "sqlite",
         Dialect::MySql => "mysql",
         Dialect::Postgres => "postgres",
      }
   }

   pub fn disable_constraints_sql(self) -> &'static str {
      match self {
         Dialect::Sqlite => "PRAGMA foreign_keys = OFF",
         Dialect::MySql => "SET FOREIGN_KEY_CHECKS = 0",
         Dialect::Postgres => "SET session_replication_role = 'replica'",
      }
   }

   pub fn enable_constraints_sql(self) -> &'static str {
      match self {
         Dialect::Sqlite => "PRAGMA foreign_keys = ON",
         Dialect::MySql => "SET FOREIGN_KEY_CHECKS = 1",
         Dialect::Postgres => "SET session_replication_role = 'origin'",
      }
   }

   pub fn list_tables_sql(self) -> &'static str {
      match self {
         Dialect::Sqlite => {
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'"
         }
         Dialect::MySql => "SHOW TABLES",
         Dialect::Postgres => "SELECT tablename FROM pg_tables WHERE schemaname = 'public'",
      }
   }

   /// Statement applying `action` to a single table. Table names are used verbatim.
   pub fn table_sql(self, action: TableAction, table: &str) -> String {
      match (self, action) {
         (Dialect::Sqlite, TableAction::Flush) => format!("DELETE FROM {table}"),
         (Dialect::MySql, TableAction::Flush) => format!("TRUNCATE TABLE {table}"),
         (Dialect::Postgres, TableAction::Flush) => format!("TRUNCATE TABLE {table} CASCADE"),
         (Dialect::Sqlite | Dialect::MySql, TableAction::Drop) => {
            format!("DROP TABLE IF EXISTS {table}")
         }
         (Dialect::Postgres, TableAction::Drop) => format!("DROP TABLE IF EXISTS {table} CASCADE"),
      }
   }
}

impl fmt::Display for Dialect {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.name())
   }
}

/// Run `action` against every user table, returning how many tables were touched.
pub async fn apply_to_all_tables(
   session: &mut dyn SqlSession,
   dialect: Dialect,
   action: TableAction,
) -> Result<usize> {
   session
      .execute(dialect.disable_constraints_sql())
      .await
      .map_err(|source| Error::DisableConstraints { dialect, source })?;

   let tables = session
      .fetch_column(dialect.list_tables_sql())
      .await
      .map_err(|source| Error::ListTables { dialect, source })?;
   debug!("Found {} tables to {} ({})", tables.len(), action, dialect);

   for table in &tables {
      trace!("{} table {}", action, table);
      if let Err(source) = session.execute(&dialect.table_sql(action, table)).await {
         warn!(
            "Failed to {} table {}; integrity checks remain disabled",
            action, table
         );
         return Err(Error::TableStatement {
            table: table.clone(),
            action,
            source,
         });
      }
   }

   session
      .execute(dialect.enable_constraints_sql())
      .await
      .map_err(|source| Error::EnableConstraints { dialect, source })?;

   Ok(tables.len())
}

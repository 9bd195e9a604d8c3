use serde::{Deserialize, Serialize};

/// A named logical database connection.
///
/// Callers can deserialize a list of these from their own configuration source
/// and hand them to [`ConnectionManager::set_configs`](crate::ConnectionManager::set_configs).
///
/// ```
/// use sqlx_conn_registry::ConnectionConfig;
///
/// let config = ConnectionConfig::new("primary", "postgres", "postgres://localhost/app");
/// assert_eq!(config.driver, "postgres");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
   /// Caller-chosen key, unique within a manager
   pub name: String,
   /// Driver identifier selecting the factory and the table-operation dialect
   pub driver: String,
   /// Data-source string handed to the factory
   pub dsn: String,
}

impl ConnectionConfig {
   pub fn new(name: impl Into<String>, driver: impl Into<String>, dsn: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         driver: driver.into(),
         dsn: dsn.into(),
      }
   }
}

//! Recording test doubles for the client capability.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx_conn_mgr::{ConnectionFactory, DatabaseClient, Error, Result, SqlSession, SqlTransaction};

/// What a [`RecordingClient`] does when asked to run SQL.
#[derive(Debug, Clone, Default)]
pub struct Script {
   /// Rows returned by any `fetch_column` call
   pub tables: Vec<String>,
   /// Any statement containing this text fails
   pub fail_on: Option<String>,
   /// Make `close` fail
   pub fail_close: bool,
   /// Delay applied to every executed statement
   pub delay: Duration,
}

/// Shared record of everything the clients of one test did.
#[derive(Debug, Default)]
pub struct Journal {
   /// Every statement in the order it was issued, plus BEGIN/COMMIT/ROLLBACK markers
   pub log: Mutex<Vec<String>>,
   /// Statements whose effects survived (executed outside a transaction or committed)
   pub committed: Mutex<Vec<String>>,
   pub closes: AtomicUsize,
}

impl Journal {
   pub fn log(&self) -> Vec<String> {
      self.log.lock().clone()
   }

   pub fn committed(&self) -> Vec<String> {
      self.committed.lock().clone()
   }

   pub fn count(&self, sql: &str) -> usize {
      self.log.lock().iter().filter(|s| s.as_str() == sql).count()
   }
}

pub struct RecordingClient {
   script: Script,
   journal: Arc<Journal>,
}

impl RecordingClient {
   pub fn new(script: Script, journal: Arc<Journal>) -> Self {
      Self { script, journal }
   }
}

#[async_trait]
impl DatabaseClient for RecordingClient {
   async fn acquire(&self) -> Result<Box<dyn SqlSession>> {
      Ok(Box::new(RecordingSession {
         script: self.script.clone(),
         journal: Arc::clone(&self.journal),
      }))
   }

   async fn begin(&self) -> Result<Box<dyn SqlTransaction>> {
      self.journal.log.lock().push("BEGIN".to_string());
      Ok(Box::new(RecordingTransaction {
         session: RecordingSession {
            script: self.script.clone(),
            journal: Arc::clone(&self.journal),
         },
         pending: Vec::new(),
      }))
   }

   async fn close(&self) -> Result<()> {
      if self.script.fail_close {
         return Err(Error::other("close refused"));
      }
      self.journal.closes.fetch_add(1, Ordering::SeqCst);
      Ok(())
   }
}

pub struct RecordingSession {
   script: Script,
   journal: Arc<Journal>,
}

impl RecordingSession {
   async fn record(&self, sql: &str) -> Result<()> {
      if !self.script.delay.is_zero() {
         tokio::time::sleep(self.script.delay).await;
      }
      self.journal.log.lock().push(sql.to_string());

      match &self.script.fail_on {
         Some(needle) if sql.contains(needle.as_str()) => {
            Err(Error::other(format!("scripted failure: {sql}")))
         }
         _ => Ok(()),
      }
   }
}

#[async_trait]
impl SqlSession for RecordingSession {
   async fn execute(&mut self, sql: &str) -> Result<u64> {
      self.record(sql).await?;
      self.journal.committed.lock().push(sql.to_string());
      Ok(0)
   }

   async fn fetch_column(&mut self, sql: &str) -> Result<Vec<String>> {
      self.record(sql).await?;
      Ok(self.script.tables.clone())
   }
}

pub struct RecordingTransaction {
   session: RecordingSession,
   pending: Vec<String>,
}

#[async_trait]
impl SqlSession for RecordingTransaction {
   async fn execute(&mut self, sql: &str) -> Result<u64> {
      self.session.record(sql).await?;
      self.pending.push(sql.to_string());
      Ok(0)
   }

   async fn fetch_column(&mut self, sql: &str) -> Result<Vec<String>> {
      self.session.fetch_column(sql).await
   }
}

#[async_trait]
impl SqlTransaction for RecordingTransaction {
   async fn commit(self: Box<Self>) -> Result<()> {
      let journal = &self.session.journal;
      journal.log.lock().push("COMMIT".to_string());
      journal.committed.lock().extend(self.pending.iter().cloned());
      Ok(())
   }

   async fn rollback(self: Box<Self>) -> Result<()> {
      self.session.journal.log.lock().push("ROLLBACK".to_string());
      Ok(())
   }
}

/// Factory handing out [`RecordingClient`]s and counting how often it ran.
pub struct RecordingFactory {
   pub script: Script,
   pub journal: Arc<Journal>,
   pub invocations: Arc<AtomicUsize>,
   /// Time spent "connecting"
   pub connect_delay: Duration,
   /// The first `fail_first` connect calls fail
   pub fail_first: usize,
   pub dsns: Arc<Mutex<Vec<String>>>,
}

impl RecordingFactory {
   pub fn new(script: Script) -> Self {
      Self {
         script,
         journal: Arc::new(Journal::default()),
         invocations: Arc::new(AtomicUsize::new(0)),
         connect_delay: Duration::ZERO,
         fail_first: 0,
         dsns: Arc::new(Mutex::new(Vec::new())),
      }
   }
}

#[async_trait]
impl ConnectionFactory for RecordingFactory {
   async fn connect(&self, dsn: &str) -> Result<Arc<dyn DatabaseClient>> {
      if !self.connect_delay.is_zero() {
         tokio::time::sleep(self.connect_delay).await;
      }
      self.dsns.lock().push(dsn.to_string());

      let attempt = self.invocations.fetch_add(1, Ordering::SeqCst);
      if attempt < self.fail_first {
         return Err(Error::other(format!("cannot reach {dsn}")));
      }

      Ok(Arc::new(RecordingClient::new(
         self.script.clone(),
         Arc::clone(&self.journal),
      )))
   }
}

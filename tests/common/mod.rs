#![allow(dead_code)]

use bnpl::db::{DatabaseHandle, Driver};
use sqlx::{Connection, SqlitePool};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// What the next `open` call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    OpenFails,
    PingFails,
    PingHangs,
    Healthy,
}

/// Shared record of what the scripted driver and its handles did.
#[derive(Debug, Default)]
pub struct Ledger {
    opened: AtomicUsize,
    closed: AtomicUsize,
    dsns: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
}

impl Ledger {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Handles opened and not yet closed.
    pub fn live(&self) -> usize {
        self.opened() - self.closed()
    }

    pub fn dsns(&self) -> Vec<String> {
        self.dsns.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

/// Driver that replays a fixed script of outcomes, one per `open`.
/// Once the script runs out every open fails.
pub struct ScriptedDriver {
    script: Mutex<VecDeque<Outcome>>,
    fail_migrations: bool,
    ledger: Arc<Ledger>,
}

impl ScriptedDriver {
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fail_migrations: false,
            ledger: Arc::default(),
        }
    }

    pub fn failing_migrations(mut self) -> Self {
        self.fail_migrations = true;
        self
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        self.ledger.clone()
    }
}

impl Driver for ScriptedDriver {
    type Handle = FakeHandle;

    async fn open(&self, dsn: &str) -> Result<FakeHandle, sqlx::Error> {
        self.ledger.dsns.lock().unwrap().push(dsn.to_string());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::OpenFails);

        if outcome == Outcome::OpenFails {
            return Err(sqlx::Error::Configuration("scripted open failure".into()));
        }
        self.ledger.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            outcome,
            fail_migrations: self.fail_migrations,
            closed: AtomicBool::new(false),
            ledger: self.ledger.clone(),
        })
    }
}

#[derive(Debug)]
pub struct FakeHandle {
    outcome: Outcome,
    fail_migrations: bool,
    closed: AtomicBool,
    ledger: Arc<Ledger>,
}

impl FakeHandle {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl DatabaseHandle for FakeHandle {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        match self.outcome {
            Outcome::Healthy => Ok(()),
            Outcome::PingHangs => std::future::pending().await,
            _ => Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted ping failure",
            ))),
        }
    }

    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
        self.ledger.executed.lock().unwrap().push(statement.to_string());
        if self.fail_migrations {
            return Err(sqlx::Error::Protocol("permission denied for schema public".into()));
        }
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.ledger.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// In-process SQLite database used where a real handle is needed.
#[derive(Debug, Clone)]
pub struct MemoryDb(SqlitePool);

impl MemoryDb {
    /// Fresh in-memory database behind a single-connection pool.
    pub async fn open() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory sqlite");
        Self(pool)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.0
    }
}

impl DatabaseHandle for MemoryDb {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.0.acquire().await?;
        conn.ping().await
    }

    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
        sqlx::query(statement).execute(&self.0).await?;
        Ok(())
    }

    async fn close(&self) {
        self.0.close().await
    }
}

/// Tracing layer that records every event's level and message.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    /// Route events on the current thread into this capture until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        tracing_subscriber::registry().with(self.clone()).set_default()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.messages(level).len()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

use crate::db::backoff::LinearBuilder;
use crate::db::descriptor::ConnectionDescriptor;
use crate::db::driver::{DatabaseHandle, Driver};
use crate::db::migrate::{self, MIGRATION_TIMEOUT, Migration};
use crate::db::schema::MIGRATIONS;
use crate::error::{AttemptError, BootstrapError};
use backon::Retryable;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

pub const MAX_ATTEMPTS: usize = 5;
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);
pub const BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Opens a verified, migrated database handle with bounded retries.
pub struct Connector<D> {
    driver: D,
    max_attempts: usize,
    ping_timeout: Duration,
    backoff_unit: Duration,
    migrations: &'static [Migration],
    migration_timeout: Duration,
}

impl<D: Driver> Connector<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            max_attempts: MAX_ATTEMPTS,
            ping_timeout: PING_TIMEOUT,
            backoff_unit: BACKOFF_UNIT,
            migrations: MIGRATIONS,
            migration_timeout: MIGRATION_TIMEOUT,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_ping_timeout(mut self, ping_timeout: Duration) -> Self {
        self.ping_timeout = ping_timeout;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_migrations(mut self, migrations: &'static [Migration], limit: Duration) -> Self {
        self.migrations = migrations;
        self.migration_timeout = limit;
        self
    }

    /// Connect, verify and migrate.
    ///
    /// Transient open/ping failures are logged and retried with linear
    /// backoff. The returned handle is owned by the caller, who must close
    /// it. On error no handle opened here is left open.
    pub async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<D::Handle, BootstrapError> {
        let dsn = descriptor.connection_string();
        let attempt = AtomicUsize::new(0);
        let backoff = LinearBuilder::new(self.backoff_unit).with_max_times(self.max_attempts - 1);

        let handle = (|| async {
            let n = attempt.fetch_add(1, Ordering::Relaxed) + 1;
            self.try_once(&dsn).await.inspect_err(|e| {
                error!(attempt = n, max_attempts = self.max_attempts, "attempt {n}/{}: {e}", self.max_attempts);
            })
        })
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .await
        .map_err(|last| BootstrapError::ConnectionExhausted {
            attempts: attempt.load(Ordering::Relaxed),
            last,
        })?;

        info!(database = %descriptor, "Database connection established.");

        if let Err(e) = migrate::apply(&handle, self.migrations, self.migration_timeout).await {
            handle.close().await;
            return Err(e.into());
        }

        Ok(handle)
    }

    async fn try_once(&self, dsn: &str) -> Result<D::Handle, AttemptError> {
        let handle = self.driver.open(dsn).await.map_err(AttemptError::Open)?;

        let verified = match timeout(self.ping_timeout, handle.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AttemptError::Ping(e)),
            Err(_) => Err(AttemptError::PingTimeout(self.ping_timeout)),
        };

        match verified {
            Ok(()) => Ok(handle),
            Err(e) => {
                handle.close().await;
                Err(e)
            }
        }
    }
}

//! Seams between the bootstrap sequence and the database driver.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{Connection, PgConnection, PgPool};
use std::future::Future;

/// An open connection (or pool) to the database.
pub trait DatabaseHandle: Send + Sync {
    /// Round-trip to the server to prove the handle is usable.
    fn ping(&self) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Execute one statement, discarding any result rows.
    fn execute(&self, statement: &str) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Release the handle. Further use fails.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Opens handles from a connection string.
pub trait Driver: Send + Sync {
    type Handle: DatabaseHandle;

    fn open(&self, dsn: &str) -> impl Future<Output = Result<Self::Handle, sqlx::Error>> + Send;
}

/// PostgreSQL driver backed by a lazily connecting sqlx pool.
///
/// Opening only validates the connection string; the first network round
/// trip happens on [`DatabaseHandle::ping`], which dials a dedicated
/// connection so connect errors come back as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgDriver;

impl Driver for PgDriver {
    type Handle = PgPool;

    async fn open(&self, dsn: &str) -> Result<PgPool, sqlx::Error> {
        let options = pg_options(dsn)?;
        Ok(PgPoolOptions::new().connect_lazy_with(options))
    }
}

/// Parse a `key=value` connection string into connect options.
pub fn pg_options(dsn: &str) -> Result<PgConnectOptions, sqlx::Error> {
    let mut options = PgConnectOptions::new_without_pgpass();
    for pair in dsn.split_whitespace() {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(config_error(format!("malformed connection parameter `{pair}`")));
        };
        options = match key {
            "host" => options.host(value),
            "user" => options.username(value),
            "password" => options.password(value),
            "dbname" => options.database(value),
            "port" => {
                let port = value
                    .parse::<u16>()
                    .map_err(|e| config_error(format!("invalid port `{value}`: {e}")))?;
                options.port(port)
            }
            "sslmode" => options.ssl_mode(value.parse::<PgSslMode>()?),
            "TimeZone" => options.options([("TimeZone", value)]),
            other => return Err(config_error(format!("unknown connection parameter `{other}`"))),
        };
    }
    Ok(options)
}

fn config_error(msg: String) -> sqlx::Error {
    sqlx::Error::Configuration(msg.into())
}

impl DatabaseHandle for PgPool {
    // `acquire` retries failed connects until its own timeout and reports
    // `PoolTimedOut`, so liveness is checked on a connection outside the pool.
    async fn ping(&self) -> Result<(), sqlx::Error> {
        if self.is_closed() {
            return Err(sqlx::Error::PoolClosed);
        }
        let mut conn = PgConnection::connect_with(&self.connect_options()).await?;
        conn.ping().await?;
        conn.close().await
    }

    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
        sqlx::query(statement).execute(self).await?;
        Ok(())
    }

    async fn close(&self) {
        PgPool::close(self).await
    }
}

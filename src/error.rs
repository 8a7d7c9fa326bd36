use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BootstrapError {
    #[error("missing critical environment variables: {}", .0.join(", "))]
    ConfigMissing(Vec<&'static str>),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to connect to database after {attempts} attempts: {last}")]
    ConnectionExhausted {
        attempts: usize,
        #[source]
        last: AttemptError,
    },

    #[error("failed to run database migrations: {0}")]
    MigrationFailed(#[from] MigrationError),
}

impl BootstrapError {
    /// Names of the required variables that were absent, if that is why loading failed.
    pub fn missing(&self) -> Option<&[&'static str]> {
        match self {
            BootstrapError::ConfigMissing(names) => Some(names),
            _ => None,
        }
    }
}

/// Failure of a single connection attempt. Retried by the connector and only
/// surfaced as the `last` cause of [`BootstrapError::ConnectionExhausted`].
#[derive(Debug, ThisError)]
pub enum AttemptError {
    #[error("failed to open database connection: {0}")]
    Open(#[source] sqlx::Error),

    #[error("failed to ping database: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("database ping timed out after {0:?}")]
    PingTimeout(Duration),
}

#[derive(Debug, ThisError)]
pub enum MigrationError {
    #[error("failed to {step}: {source}")]
    SchemaApplyFailed {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration deadline of {limit:?} exceeded during `{step}`")]
    DeadlineExceeded { step: &'static str, limit: Duration },
}

impl MigrationError {
    /// The logical step that was running when the migration phase aborted.
    pub fn step(&self) -> &'static str {
        match self {
            MigrationError::SchemaApplyFailed { step, .. }
            | MigrationError::DeadlineExceeded { step, .. } => step,
        }
    }
}

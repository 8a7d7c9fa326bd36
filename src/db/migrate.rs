use crate::db::driver::DatabaseHandle;
use crate::error::MigrationError;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

/// Total time allowed for one pass over the statement set.
pub const MIGRATION_TIMEOUT: Duration = Duration::from_secs(10);

/// One idempotent schema step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// Human readable step, used in logs and errors.
    pub name: &'static str,
    pub statement: &'static str,
}

/// Apply `migrations` in order under a single deadline of `limit`.
///
/// Stops at the first failing step; later steps are not attempted.
pub async fn apply<H>(handle: &H, migrations: &[Migration], limit: Duration) -> Result<(), MigrationError>
where
    H: DatabaseHandle,
{
    let deadline = Instant::now() + limit;
    info!(steps = migrations.len(), "Starting database schema migrations...");

    for migration in migrations {
        match timeout_at(deadline, handle.execute(migration.statement)).await {
            Ok(Ok(())) => debug!(step = migration.name, "schema step applied"),
            Ok(Err(source)) => {
                return Err(MigrationError::SchemaApplyFailed {
                    step: migration.name,
                    source,
                });
            }
            Err(_) => {
                return Err(MigrationError::DeadlineExceeded {
                    step: migration.name,
                    limit,
                });
            }
        }
    }

    info!("Database schema migrations completed (tables created/verified).");
    Ok(())
}

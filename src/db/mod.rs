//! Database bootstrap: connect with bounded retries, then migrate.
//!
//! Layout:
//! - `descriptor.rs`: connection parameters and the `key=value` connection string
//! - `driver.rs`: `Driver` / `DatabaseHandle` seams and the PostgreSQL driver
//! - `backoff.rs`: linear retry delays
//! - `schema.rs`: SQL DDL applied at startup
//! - `migrate.rs`: deadline-bound migration runner
//! - `connector.rs`: the retry loop tying it together

pub mod backoff;
pub mod connector;
pub mod descriptor;
pub mod driver;
pub mod migrate;
pub mod schema;

pub use connector::Connector;
pub use descriptor::ConnectionDescriptor;
pub use driver::{DatabaseHandle, Driver, PgDriver};
pub use migrate::Migration;

use crate::config::Config;
use crate::error::BootstrapError;
use sqlx::PgPool;

/// Open a live, schema-ready PostgreSQL pool for `cfg`.
pub async fn connect(cfg: &Config) -> Result<PgPool, BootstrapError> {
    Connector::new(PgDriver)
        .connect(&ConnectionDescriptor::from(cfg))
        .await
}

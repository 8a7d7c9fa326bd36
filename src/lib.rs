pub mod config;
pub mod db;
pub mod error;
pub mod router;

pub use config::Config;
pub use error::BootstrapError;

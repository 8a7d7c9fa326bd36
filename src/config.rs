//! Startup configuration.
//!
//! Values are layered as built-in defaults < local `.env` file < process
//! environment, then validated into an immutable [`Config`] that callers pass
//! around by reference.

use crate::error::BootstrapError;
use figment::{Figment, providers::Serialized};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

pub const DB_HOST: &str = "DB_HOST";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_NAME: &str = "DB_NAME";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_SSLMODE: &str = "DB_SSLMODE";
pub const DB_TIMEZONE: &str = "DB_TIMEZONE";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const APP_PORT: &str = "APP_PORT";

const KNOWN_KEYS: [&str; 9] = [
    DB_HOST,
    DB_USER,
    DB_PASSWORD,
    DB_NAME,
    DB_PORT,
    DB_SSLMODE,
    DB_TIMEZONE,
    SERVER_PORT,
    APP_PORT,
];

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct Defaults {
    db_port: &'static str,
    db_sslmode: &'static str,
    db_timezone: &'static str,
    server_port: &'static str,
    app_port: &'static str,
}

const DEFAULTS: Defaults = Defaults {
    db_port: "5432",
    db_sslmode: "disable",
    db_timezone: "UTC",
    server_port: "8088",
    app_port: "8089",
};

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawConfig {
    db_host: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_name: Option<String>,
    db_port: String,
    db_sslmode: String,
    db_timezone: String,
    server_port: String,
    app_port: String,
}

/// Validated service configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_port: String,
    pub ssl_mode: String,
    pub time_zone: String,
    pub server_port: String,
    pub app_port: String,
}

impl Config {
    /// Load from `./.env` (if present) and the process environment.
    pub fn load() -> Result<Self, BootstrapError> {
        Self::load_from(Path::new(".env"), env_vars())
    }

    /// Load using `dotenv` as the file layer and `env` as the environment layer.
    pub fn load_from<E>(dotenv: &Path, env: E) -> Result<Self, BootstrapError>
    where
        E: IntoIterator<Item = (String, String)>,
    {
        Self::from_layers(read_dotenv(dotenv), env)
    }

    /// Build from explicit layers. Entries in `env` win over entries in `file`;
    /// unknown keys and empty values are ignored.
    pub fn from_layers<F, E>(file: F, env: E) -> Result<Self, BootstrapError>
    where
        F: IntoIterator<Item = (String, String)>,
        E: IntoIterator<Item = (String, String)>,
    {
        let file = known_vars(file);
        let env = known_vars(env);

        let supplied = |key: &str| file.contains_key(key) || env.contains_key(key);
        if !supplied(DB_PORT) {
            warn!("{DB_PORT} environment variable not set, using default port {}.", DEFAULTS.db_port);
        }
        if !supplied(DB_SSLMODE) {
            warn!(
                "{DB_SSLMODE} environment variable not set, using default sslmode {}.",
                DEFAULTS.db_sslmode
            );
        }
        if !supplied(DB_TIMEZONE) {
            warn!(
                "{DB_TIMEZONE} environment variable not set, using default TimeZone {}.",
                DEFAULTS.db_timezone
            );
        }
        if !supplied(SERVER_PORT) {
            info!(
                "{SERVER_PORT} environment variable not set, using default port {}.",
                DEFAULTS.server_port
            );
        }

        let raw: RawConfig = Figment::from(Serialized::defaults(DEFAULTS))
            .merge(Serialized::defaults(file))
            .merge(Serialized::defaults(env))
            .extract()?;

        match (raw.db_host, raw.db_user, raw.db_password, raw.db_name) {
            (Some(db_host), Some(db_user), Some(db_password), Some(db_name)) => Ok(Config {
                db_host,
                db_user,
                db_password,
                db_name,
                db_port: raw.db_port,
                ssl_mode: raw.db_sslmode,
                time_zone: raw.db_timezone,
                server_port: raw.server_port,
                app_port: raw.app_port,
            }),
            (host, user, password, name) => {
                let missing = [
                    (DB_HOST, host.is_none()),
                    (DB_USER, user.is_none()),
                    (DB_PASSWORD, password.is_none()),
                    (DB_NAME, name.is_none()),
                ]
                .into_iter()
                .filter_map(|(key, absent)| absent.then_some(key))
                .collect();
                Err(BootstrapError::ConfigMissing(missing))
            }
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_host", &self.db_host)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("db_port", &self.db_port)
            .field("ssl_mode", &self.ssl_mode)
            .field("time_zone", &self.time_zone)
            .field("server_port", &self.server_port)
            .field("app_port", &self.app_port)
            .finish()
    }
}

fn known_vars<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(key, value)| !value.is_empty() && KNOWN_KEYS.contains(&key.as_str()))
        .collect()
}

// Non-UTF-8 entries can never be one of our keys, so they are skipped rather
// than panicking like `std::env::vars` would.
fn env_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn read_dotenv(path: &Path) -> Vec<(String, String)> {
    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries
            .filter_map(|entry| {
                entry
                    .inspect_err(|e| {
                        warn!(path = %path.display(), error = %e, "skipping malformed .env entry");
                    })
                    .ok()
            })
            .collect(),
        Err(e) if e.not_found() => Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read .env file; using environment only");
            Vec::new()
        }
    }
}

use crate::config::Config;
use std::fmt;

/// Parameters needed to address and authenticate to the database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub port: String,
    pub ssl_mode: String,
    pub time_zone: String,
}

impl ConnectionDescriptor {
    /// Render the space separated `key=value` connection string.
    ///
    /// Values are written verbatim; a value containing whitespace will not
    /// survive parsing on the driver side.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} user={} password={} dbname={} port={} sslmode={} TimeZone={}",
            self.host, self.user, self.password, self.dbname, self.port, self.ssl_mode, self.time_zone
        )
    }
}

impl From<&Config> for ConnectionDescriptor {
    fn from(cfg: &Config) -> Self {
        Self {
            host: cfg.db_host.clone(),
            user: cfg.db_user.clone(),
            password: cfg.db_password.clone(),
            dbname: cfg.db_name.clone(),
            port: cfg.db_port.clone(),
            ssl_mode: cfg.ssl_mode.clone(),
            time_zone: cfg.time_zone.clone(),
        }
    }
}

// Credential-free rendering used in logs.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}/{} (sslmode={})",
            self.user, self.host, self.port, self.dbname, self.ssl_mode
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .field("ssl_mode", &self.ssl_mode)
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

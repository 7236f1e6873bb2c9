//! Database settings read from the environment.

use crate::error::{DbError, DbResult};
use std::env;

/// Default pool capacity when `DB_POOL_MAX_SIZE` is unset.
pub const DEFAULT_POOL_MAX_SIZE: usize = 100;

/// Connection settings.
///
/// Read by [`DbConfig::from_env`] from:
///
/// | variable           | field      |
/// |--------------------|------------|
/// | `DB_USER`          | `user`     |
/// | `DB_PASSWORD`      | `password` |
/// | `DB_HOST`          | `host`     |
/// | `DB_PORT`          | `port`     |
/// | `DB_NAME`          | `dbname`   |
/// | `DB_POOL_MAX_SIZE` | `max_size` (optional, default 100) |
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub max_size: usize,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("max_size", &self.max_size)
            .finish()
    }
}

impl DbConfig {
    /// Load settings from the process environment, honoring a `.env` file.
    pub fn from_env() -> DbResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DbError::config(format!("{key} is not set")))
        };

        let port = required("DB_PORT")?;
        let port = port
            .parse::<u16>()
            .map_err(|_| DbError::config(format!("DB_PORT is not a valid port: {port}")))?;

        let max_size = match lookup("DB_POOL_MAX_SIZE").filter(|v| !v.is_empty()) {
            None => DEFAULT_POOL_MAX_SIZE,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(DbError::config(format!(
                        "DB_POOL_MAX_SIZE must be a positive integer: {raw}"
                    )));
                }
            },
        };

        Ok(Self {
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            host: required("DB_HOST")?,
            port,
            dbname: required("DB_NAME")?,
            max_size,
        })
    }

    /// Driver connection settings.
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname);
        config
    }

    /// Build a connection pool from these settings.
    #[cfg(feature = "pool")]
    pub fn create_pool(&self) -> DbResult<deadpool_postgres::Pool> {
        crate::pool::create_pool_from_pg_config(self.pg_config(), self.max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full() -> HashMap<String, String> {
        vars(&[
            ("DB_USER", "risk"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_NAME", "rmp"),
        ])
    }

    #[test]
    fn loads_all_fields_with_default_pool_size() {
        let env = full();
        let config = DbConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_size, DEFAULT_POOL_MAX_SIZE);
    }

    #[test]
    fn pool_size_override() {
        let mut env = full();
        env.insert("DB_POOL_MAX_SIZE".into(), "8".into());
        let config = DbConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.max_size, 8);
    }

    #[test]
    fn missing_variable_is_config_error() {
        let mut env = full();
        env.remove("DB_HOST");
        let err = DbConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("DB_HOST"));
    }

    #[test]
    fn bad_port_is_config_error() {
        let mut env = full();
        env.insert("DB_PORT".into(), "postgres".into());
        assert!(DbConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err().is_config());
    }

    #[test]
    fn debug_redacts_password() {
        let env = full();
        let config = DbConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn pg_config_carries_settings() {
        let env = full();
        let pg = DbConfig::from_lookup(|k| env.get(k).cloned()).unwrap().pg_config();
        assert_eq!(pg.get_user(), Some("risk"));
        assert_eq!(pg.get_dbname(), Some("rmp"));
        assert_eq!(pg.get_ports(), &[5432]);
    }
}

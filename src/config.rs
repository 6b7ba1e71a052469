//! Service configuration.
//!
//! Values come from built-in defaults overridden by `APP__`-prefixed
//! environment variables, with `__` separating nested keys:
//!
//! - `APP__SERVER__HOST` / `APP__SERVER__PORT` (default `0.0.0.0:3000`)
//! - `APP__DATABASE__URL` (falls back to `DATABASE_URL`, required)
//! - `APP__DATABASE__MAX_CONNECTIONS` (default 10)
//! - `APP__CACHE__ADDRESS_CAPACITY` (default 10000)
//! - `APP__CACHE__ADDRESS_TTL_SECS` (default 86400, at most one year)

use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

// The URL carries the password.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub address_capacity: u64,
    pub address_ttl_secs: u64,
}

/// Upper bound for the address cache TTL. moka refuses to build a cache
/// with a TTL beyond 1000 years.
pub const MAX_ADDRESS_TTL_SECS: u64 = 365 * 24 * 60 * 60;

impl CacheConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.address_ttl_secs == 0 || self.address_ttl_secs > MAX_ADDRESS_TTL_SECS {
            return Err(ConfigError::Message(format!(
                "cache.address_ttl_secs must be between 1 and {MAX_ADDRESS_TTL_SECS}, got {}",
                self.address_ttl_secs
            )));
        }
        Ok(())
    }

    pub fn address_ttl(&self) -> Duration {
        Duration::from_secs(self.address_ttl_secs)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("APP")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Loads the configuration from the process environment.
pub fn load() -> Result<AppConfig, ConfigError> {
    load_from(environment(), std::env::var("DATABASE_URL").ok())
}

fn load_from(env: Environment, database_url: Option<String>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000_i64)?
        .set_default("database.max_connections", 10_i64)?
        .set_default("cache.address_capacity", 10_000_i64)?
        .set_default("cache.address_ttl_secs", 86_400_i64)?;

    if let Some(url) = database_url {
        builder = builder.set_default("database.url", url)?;
    }

    let config: AppConfig = builder.add_source(env).build()?.try_deserialize()?;
    config.cache.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(source))
    }

    #[test]
    fn defaults_apply() {
        let config = load_from(env(&[]), Some("postgres://localhost/shop".into())).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "postgres://localhost/shop");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.cache.address_ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn prefixed_variables_override() {
        let config = load_from(
            env(&[
                ("APP__SERVER__PORT", "8080"),
                ("APP__DATABASE__URL", "postgres://db/override"),
                ("APP__CACHE__ADDRESS_TTL_SECS", "60"),
            ]),
            Some("postgres://localhost/shop".into()),
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "postgres://db/override");
        assert_eq!(config.cache.address_ttl_secs, 60);
    }

    #[test]
    fn address_ttl_must_be_bounded() {
        for ttl in ["0", "31536001", "315360000000"] {
            let err = load_from(
                env(&[("APP__CACHE__ADDRESS_TTL_SECS", ttl)]),
                Some("postgres://localhost/shop".into()),
            )
            .unwrap_err();
            assert!(
                err.to_string().contains("cache.address_ttl_secs"),
                "ttl {ttl}: {err}"
            );
        }

        let config = load_from(
            env(&[("APP__CACHE__ADDRESS_TTL_SECS", "31536000")]),
            Some("postgres://localhost/shop".into()),
        )
        .unwrap();
        assert_eq!(config.cache.address_ttl_secs, MAX_ADDRESS_TTL_SECS);
    }

    #[test]
    fn database_url_is_required() {
        assert!(load_from(env(&[]), None).is_err());
    }

    #[test]
    fn debug_redacts_database_url() {
        let config = load_from(env(&[]), Some("postgres://user:secret@db/shop".into())).unwrap();
        let debug = format!("{:?}", config.database);
        assert!(!debug.contains("secret"));
    }
}

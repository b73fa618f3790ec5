use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::password::DEFAULT_COST;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    /// Reported by the status endpoint.
    pub environment: String,
    pub db_timeout: Duration,
    pub db_max_connections: u32,
    pub bcrypt_cost: u32,
    pub limiter: LimiterConfig,
    pub guest_login_enabled: bool,
    /// Whether the refresh cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub rps: u32,
    pub burst: u32,
    pub enabled: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            rps: 2,
            burst: 4,
            enabled: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let limiter = LimiterConfig {
            rps: parsed(&lookup, "LIMITER_RPS", 2)?,
            burst: parsed(&lookup, "LIMITER_BURST", 4)?,
            enabled: flag(&lookup, "LIMITER_ENABLED", true)?,
        };
        if limiter.rps == 0 || limiter.burst == 0 {
            return Err(ConfigError::Invalid {
                name: "LIMITER_RPS/LIMITER_BURST",
                value: "0".into(),
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_port: parsed(&lookup, "SERVER_PORT", 4000)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            environment: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
            db_timeout: Duration::from_secs(parsed(&lookup, "DB_TIMEOUT_SECS", 5)?),
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            bcrypt_cost: parsed(&lookup, "BCRYPT_COST", DEFAULT_COST)?,
            limiter,
            guest_login_enabled: flag(&lookup, "GUEST_LOGIN_ENABLED", false)?,
            cookie_secure: flag(&lookup, "COOKIE_SECURE", true)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn flag<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1") | Some("true") | Some("TRUE") | Some("True") => Ok(true),
        Some("0") | Some("false") | Some("FALSE") | Some("False") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://test"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = config(&REQUIRED).unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.environment, "development");
        assert_eq!(config.db_timeout, Duration::from_secs(5));
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.limiter, LimiterConfig::default());
        assert!(!config.guest_login_enabled);
        assert!(config.cookie_secure);
        assert_eq!(config.server_url(), "http://127.0.0.1:4000");
    }

    #[test]
    fn test_custom_values() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("APP_ENV", "production"),
            ("LIMITER_ENABLED", "false"),
            ("GUEST_LOGIN_ENABLED", "true"),
            ("DB_TIMEOUT_SECS", "2"),
        ]);
        let config = config(&vars).unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.environment, "production");
        assert!(!config.limiter.enabled);
        assert!(config.guest_login_enabled);
        assert_eq!(config.db_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_and_invalid_values() {
        assert_eq!(
            config(&[("JWT_SECRET", "secret")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );

        let mut vars = REQUIRED.to_vec();
        vars.push(("SERVER_PORT", "eighty"));
        assert!(matches!(
            config(&vars),
            Err(ConfigError::Invalid { name: "SERVER_PORT", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("COOKIE_SECURE", "maybe"));
        assert!(matches!(
            config(&vars),
            Err(ConfigError::Invalid { name: "COOKIE_SECURE", .. })
        ));
    }
}

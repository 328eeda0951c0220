//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// A platform admin created at start-up when no user has this email yet.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Postgres when set, in-memory stores otherwise.
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Argon2 memory cost in KiB.
    pub password_hash_memory_kib: u32,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("database", &self.database_url.is_some())
            .field("bootstrap_admin", &self.bootstrap_admin)
            .field("password_hash_memory_kib", &self.password_hash_memory_kib)
            .finish_non_exhaustive()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::hours(24),
            database_url: None,
            bootstrap_admin: None,
            password_hash_memory_kib: 19 * 1024,
        }
    }
}

impl ApiConfig {
    /// Load `.env` (if any), then read every setting from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            defaults.jwt_secret.clone()
        });

        let bootstrap_admin = match (var("BOOTSTRAP_ADMIN_EMAIL"), var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together; skipping");
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            bind_addr: parse_or("BIND_ADDR", var("BIND_ADDR"), defaults.bind_addr)?,
            jwt_secret,
            access_ttl: Duration::minutes(parse_or(
                "ACCESS_TOKEN_TTL_MINUTES",
                var("ACCESS_TOKEN_TTL_MINUTES"),
                5_i64,
            )?),
            refresh_ttl: Duration::hours(parse_or(
                "REFRESH_TOKEN_TTL_HOURS",
                var("REFRESH_TOKEN_TTL_HOURS"),
                24_i64,
            )?),
            database_url: var("DATABASE_URL"),
            bootstrap_admin,
            password_hash_memory_kib: parse_or(
                "PASSWORD_HASH_MEMORY_KIB",
                var("PASSWORD_HASH_MEMORY_KIB"),
                defaults.password_hash_memory_kib,
            )?,
        })
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

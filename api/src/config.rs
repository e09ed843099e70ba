use std::{env, fmt::Display, str::FromStr};

use jsonwebtoken::Algorithm;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Process settings, read once at startup and passed by reference afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: String,
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let algorithm: Algorithm = try_load("ALGORITHM", "HS256")?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::Invalid {
                key: "ALGORITHM",
                reason: format!("{algorithm:?} needs an asymmetric key, expected HS256/HS384/HS512"),
            });
        }

        let access_token_expire_minutes: i64 = try_load("ACCESS_TOKEN_EXPIRE_MINUTES", "60")?;
        if access_token_expire_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://postboard.db?mode=rwc")?,
            max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            secret_key: required("SECRET_KEY")?,
            algorithm,
            access_token_expire_minutes,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

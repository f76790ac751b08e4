use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use log::{info, warn};
use thiserror::Error;

const DEV_SECRET: &str = "dev-only-jwt-secret";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub database_path: PathBuf,
    pub public_dir: PathBuf,
    pub tls_cert_path: PathBuf,
    pub tls_key_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| env::var(key).ok())
    }

    fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using the development secret");
            DEV_SECRET.to_string()
        });

        Ok(Self {
            port: try_load(&lookup, "PORT", "3000")?,
            jwt_secret,
            database_path: try_load(&lookup, "DATABASE_PATH", "chat.db")?,
            public_dir: try_load(&lookup, "PUBLIC_DIR", "public")?,
            tls_cert_path: try_load(&lookup, "TLS_CERT_PATH", "ssl/certificate.pem")?,
            tls_key_path: try_load(&lookup, "TLS_KEY_PATH", "ssl/private.key")?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

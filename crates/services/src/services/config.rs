//! Process configuration, read once from the environment at startup.

use std::{env, fmt::Display, net::IpAddr, str::FromStr};

use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_VISITOR_SLUG: &str = "site_total_visitors";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    pub visitor_slug: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            database_url: "sqlite://folio.db".to_string(),
            cors_allowed_origins: Vec::new(),
            visitor_slug: DEFAULT_VISITOR_SLUG.to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment, honoring an optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let visitor_slug = lookup("VISITOR_SLUG").unwrap_or(defaults.visitor_slug);
        if visitor_slug.trim().is_empty() {
            return Err(ConfigError::Empty { key: "VISITOR_SLUG" });
        }

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            info!("DATABASE_URL not set, using default: {}", defaults.database_url);
            defaults.database_url.clone()
        });
        if database_url.trim().is_empty() {
            return Err(ConfigError::Empty { key: "DATABASE_URL" });
        }

        Ok(Self {
            host: parse_or(&lookup, "HOST", defaults.host)?,
            port: parse_or(&lookup, "PORT", defaults.port)?,
            database_url,
            cors_allowed_origins,
            visitor_slug,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

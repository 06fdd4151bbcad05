use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::TimeDelta;
use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Ophtha Clinic Core";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 30;
const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 14;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// One week.
const MAX_ACCESS_TOKEN_MINUTES: i64 = 7 * 24 * 60;
/// Ten years.
const MAX_REFRESH_TOKEN_DAYS: i64 = 3650;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Cannot determine home directory for the default database location")]
    NoHomeDir,
}

/// Process-wide settings. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Settings {
    pub env: String,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub cors_origins: Vec<String>,
    pub bind_addr: SocketAddr,
    /// Record the `jti` of every rotated refresh token and refuse reuse.
    pub revoke_rotated_refresh_tokens: bool,
}

impl Settings {
    /// Read settings from the process environment, after loading `.env`
    /// from the working directory when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let database_path = match get("DATABASE_URL") {
            Some(url) => parse_database_url(&url)?,
            None => default_database_path()?,
        };

        let jwt_algorithm = match get("JWT_ALG") {
            Some(alg) => parse_algorithm(&alg)?,
            None => Algorithm::HS256,
        };

        let access_token_minutes = parse_bounded(
            get("ACCESS_TOKEN_MINUTES"),
            "ACCESS_TOKEN_MINUTES",
            DEFAULT_ACCESS_TOKEN_MINUTES,
            MAX_ACCESS_TOKEN_MINUTES,
        )?;
        let refresh_token_days = parse_bounded(
            get("REFRESH_TOKEN_DAYS"),
            "REFRESH_TOKEN_DAYS",
            DEFAULT_REFRESH_TOKEN_DAYS,
            MAX_REFRESH_TOKEN_DAYS,
        )?;

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let revoke_rotated_refresh_tokens = match get("REVOKE_ROTATED_REFRESH_TOKENS") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
                key: "REVOKE_ROTATED_REFRESH_TOKENS",
                value: v,
            })?,
            None => true,
        };

        Ok(Self {
            env: get("ENV").unwrap_or_else(|| "dev".to_string()),
            database_path,
            jwt_secret,
            jwt_algorithm,
            access_token_minutes,
            refresh_token_days,
            cors_origins,
            bind_addr,
            revoke_rotated_refresh_tokens,
        })
    }

    /// Out-of-range values (only reachable by editing the fields directly)
    /// yield a zero TTL, so every token is already expired.
    pub fn access_token_ttl(&self) -> TimeDelta {
        TimeDelta::try_minutes(self.access_token_minutes).unwrap_or_else(TimeDelta::zero)
    }

    pub fn refresh_token_ttl(&self) -> TimeDelta {
        TimeDelta::try_days(self.refresh_token_days).unwrap_or_else(TimeDelta::zero)
    }
}

/// Get the application data directory
/// ~/OphthaCore/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join("OphthaCore"))
}

/// Default SQLite file used when `DATABASE_URL` is not set.
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("clinic.db"))
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "ophtha_core=info,tower_http=info"
}

/// Accepts a plain filesystem path or a `sqlite://` / `sqlite:///` URL.
fn parse_database_url(url: &str) -> Result<PathBuf, ConfigError> {
    let url = url.trim();
    let path = match url.strip_prefix("sqlite:") {
        Some(rest) => {
            // sqlite:///abs/path keeps its leading slash, sqlite://rel/path does not
            let rest = rest.strip_prefix("//").unwrap_or(rest);
            rest.split('?').next().unwrap_or(rest)
        }
        None if url.contains("://") => {
            return Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                value: url.to_string(),
            })
        }
        None => url,
    };
    if path.is_empty() {
        return Err(ConfigError::Invalid {
            key: "DATABASE_URL",
            value: url.to_string(),
        });
    }
    Ok(PathBuf::from(path))
}

/// Only HMAC algorithms make sense with a single shared secret.
fn parse_algorithm(alg: &str) -> Result<Algorithm, ConfigError> {
    match alg.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::Invalid {
            key: "JWT_ALG",
            value: alg.to_string(),
        }),
    }
}

fn parse_bounded(
    raw: Option<String>,
    key: &'static str,
    default: i64,
    max: i64,
) -> Result<i64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => match v.trim().parse::<i64>() {
            Ok(n) if (1..=max).contains(&n) => Ok(n),
            _ => Err(ConfigError::Invalid { key, value: v }),
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

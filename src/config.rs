//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin13";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin1313";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl_secs: i64,
    pub production: bool,
    pub static_dir: PathBuf,
    pub qr_dir: PathBuf,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let production = get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let port = match get("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: v })?,
            None => 5000,
        };

        let session_ttl_secs = match get("SESSION_TTL_SECS") {
            Some(v) => match v.parse::<i64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SESSION_TTL_SECS",
                        value: v,
                    })
                }
            },
            None => 3600,
        };

        let seed_demo_data = match get("SEED_DEMO_DATA") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
                key: "SEED_DEMO_DATA",
                value: v,
            })?,
            None => !production,
        };

        let static_dir = PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "static".to_string()));
        let qr_dir = get("QR_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| static_dir.join("qr_codes"));

        let base_url = get("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://pilots.db".to_string()),
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            base_url,
            admin_username: get("ADMIN_USERNAME")
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password: get("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            session_ttl_secs,
            production,
            static_dir,
            qr_dir,
            seed_demo_data,
        })
    }

    pub fn uses_default_credentials(&self) -> bool {
        self.admin_username == DEFAULT_ADMIN_USERNAME || self.admin_password == DEFAULT_ADMIN_PASSWORD
    }

    pub fn warn_if_insecure(&self) {
        if self.uses_default_credentials() {
            warn!("⚠️  Admin login uses the built-in default credentials; set ADMIN_USERNAME and ADMIN_PASSWORD");
        }
        if self.production && self.base_url.starts_with("http://localhost") {
            warn!("⚠️  BASE_URL points at localhost in production; QR links will not resolve for visitors");
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

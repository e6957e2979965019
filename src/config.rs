//! Configuration types, loaded from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;
use uuid::Uuid;

use crate::error::ConfigError;
use crate::session::DEMO_USER_ID;

pub const ENV_STORE_URL: &str = "HOMEBASE_STORE_URL";
pub const ENV_STORE_KEY: &str = "HOMEBASE_STORE_KEY";
pub const ENV_DB_PATH: &str = "HOMEBASE_DB_PATH";
pub const ENV_USER_ID: &str = "HOMEBASE_USER_ID";
pub const ENV_BIND: &str = "HOMEBASE_BIND";

const DEFAULT_DB_PATH: &str = "./data/homebase.db";
const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Credentials for the hosted REST table store.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Anon / service key sent as `apikey` and bearer token.
    pub api_key: SecretString,
}

/// Whether the hosted store can be reached with the current environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigStatus {
    Configured,
    /// Credentials are absent or still set to template placeholders.
    NotConfigured { reason: String },
}

impl ConfigStatus {
    pub fn is_configured(&self) -> bool {
        matches!(self, ConfigStatus::Configured)
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hosted store credentials, when fully configured.
    pub rest: Option<RestStoreConfig>,
    pub store_status: ConfigStatus,
    /// Local libSQL file used when the hosted store is not configured.
    pub db_path: PathBuf,
    /// Tenant every request acts as until authentication exists.
    pub user_id: Uuid,
    pub bind: SocketAddr,
}

impl AppConfig {
    /// Load from the process environment, reading `.env.local` and `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let (rest, store_status) = match rest_config(get(ENV_STORE_URL), get(ENV_STORE_KEY)) {
            Ok(cfg) => (Some(cfg), ConfigStatus::Configured),
            Err(reason) => (None, ConfigStatus::NotConfigured { reason }),
        };

        let user_id = match get(ENV_USER_ID) {
            Some(raw) => Uuid::parse_str(&raw).map_err(|e| ConfigError::InvalidValue {
                key: ENV_USER_ID.to_string(),
                message: e.to_string(),
            })?,
            None => DEMO_USER_ID,
        };

        let bind_raw = get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                key: ENV_BIND.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            rest,
            store_status,
            db_path: get(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            user_id,
            bind,
        })
    }
}

fn rest_config(url: Option<String>, key: Option<String>) -> Result<RestStoreConfig, String> {
    let (url, key) = match (url, key) {
        (Some(url), Some(key)) => (url, key),
        (None, None) => return Err(format!("{ENV_STORE_URL} and {ENV_STORE_KEY} are not set")),
        (None, Some(_)) => return Err(format!("{ENV_STORE_URL} is not set")),
        (Some(_), None) => return Err(format!("{ENV_STORE_KEY} is not set")),
    };
    if url.contains("your-project") || key.contains("your-anon-key") {
        return Err("store credentials are still template placeholders".to_string());
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("{ENV_STORE_URL} must be an http(s) URL"));
    }
    Ok(RestStoreConfig {
        url: url.trim_end_matches('/').to_string(),
        api_key: SecretString::from(key),
    })
}

use std::{env, fmt::Display, ops::RangeInclusive, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

/// Work factor for password hashes unless overridden.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Costs the bcrypt crate will hash with.
pub const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

/// Secrets that ship in docs and `.env.example`; never valid in a real deployment.
pub const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Server configuration. Built once at startup and handed to whatever needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub github_api_url: String,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            db_path: "devlink.db".into(),
            jwt_secret: "dev-secret-change-me".into(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            github_api_url: "https://api.github.com".into(),
            github_client_id: None,
            github_client_secret: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env::var("DEVLINK_HOST").unwrap_or(defaults.host),
            port: try_load("DEVLINK_PORT", defaults.port)?,
            db_path: env::var("DEVLINK_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            jwt_secret: env::var("DEVLINK_JWT_SECRET").unwrap_or_default(),
            bcrypt_cost: check_bcrypt_cost(try_load("DEVLINK_BCRYPT_COST", defaults.bcrypt_cost)?)
                .context("Invalid DEVLINK_BCRYPT_COST")?,
            github_api_url: env::var("DEVLINK_GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            github_client_id: optional("DEVLINK_GITHUB_CLIENT_ID"),
            github_client_secret: optional("DEVLINK_GITHUB_CLIENT_SECRET"),
        })
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {key} value '{raw}'")),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn check_bcrypt_cost(cost: u32) -> Result<u32> {
    if !BCRYPT_COST_RANGE.contains(&cost) {
        bail!(
            "cost {cost} is outside {}..={}",
            BCRYPT_COST_RANGE.start(),
            BCRYPT_COST_RANGE.end()
        );
    }
    Ok(cost)
}

fn optional(key: &str) -> Option<String> {
    let value = env::var(key).ok().filter(|v| !v.is_empty());
    if value.is_none() {
        warn!("{key} not set, outbound GitHub requests will be unauthenticated");
    }
    value
}

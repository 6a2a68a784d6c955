use std::sync::Arc;

use tracing::error;

use devlink_db::Database;

use crate::config::Config;
use crate::error::ApiError;
use crate::token::TokenKeys;

pub type AppState = Arc<AppStateInner>;

/// Process-wide state, read-only once constructed.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenKeys,
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppStateInner {
    pub fn new(db: Database, config: Config) -> anyhow::Result<AppState> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("devlink/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Arc::new(Self {
            db,
            tokens: TokenKeys::new(&config.jwt_secret),
            config,
            http,
        }))
    }
}

/// Run a blocking store call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::Internal)
}

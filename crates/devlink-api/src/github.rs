use anyhow::{Context, anyhow};
use axum::{
    Json,
    extract::{Path, State},
};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::is_github_login;

const NO_GITHUB_PROFILE: &str = "No Github profile found";

/// GET /api/profile/github/{username}: the user's five oldest public
/// repositories, passed through as GitHub returns them.
pub async fn get_repos(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !is_github_login(&username) {
        debug!("Rejected GitHub login {:?}", username);
        return Err(ApiError::not_found(NO_GITHUB_PROFILE));
    }

    let url = repos_url(&state.config, &username)?;

    let response = state
        .http
        .get(url)
        .query(&credentials(&state.config))
        .send()
        .await
        .with_context(|| format!("GitHub request for {} failed", username))?;

    if response.status() != reqwest::StatusCode::OK {
        debug!("GitHub returned {} for {}", response.status(), username);
        return Err(ApiError::not_found(NO_GITHUB_PROFILE));
    }

    let repos = response
        .json::<Value>()
        .await
        .context("GitHub returned a non-JSON body")?;

    Ok(Json(repos))
}

/// `{api}/users/{username}/repos`, with the username encoded as a single
/// path segment.
pub fn repos_url(config: &Config, username: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(&config.github_api_url)
        .with_context(|| format!("Invalid GitHub API url '{}'", config.github_api_url))?;

    url.path_segments_mut()
        .map_err(|_| anyhow!("GitHub API url cannot take a path: {}", config.github_api_url))?
        .pop_if_empty()
        .extend(["users", username, "repos"]);

    url.query_pairs_mut()
        .append_pair("per_page", "5")
        .append_pair("sort", "created:asc");

    Ok(url)
}

fn credentials(config: &Config) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(id) = &config.github_client_id {
        params.push(("client_id", id.clone()));
    }
    if let Some(secret) = &config.github_client_secret {
        params.push(("client_secret", secret.clone()));
    }
    params
}

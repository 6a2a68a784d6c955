use axum::{Extension, Json, extract::State};
use tracing::info;

use devlink_types::api::{Identity, LoginRequest, TokenResponse};
use devlink_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, with_db};
use crate::validation::Checks;

/// POST /api/auth: exchange email and password for a token.
///
/// Unknown email and wrong password produce the same error so callers
/// cannot probe which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    Checks::new()
        .email("email", &req.email, "Please include a valid email")
        .required("password", &req.password, "Password is required")
        .finish()?;

    let email = req.email.trim().to_string();
    let user = with_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let matches = bcrypt::verify(&req.password, &user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.id, e))?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let user_id = user.user_id()?;
    let token = state.tokens.issue(user_id)?;
    info!("User {} logged in", user_id);

    Ok(Json(TokenResponse { token }))
}

/// GET /api/auth: the authenticated user, without the password hash.
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>, ApiError> {
    let row = with_db(&state, move |db| db.get_user_by_id(identity.id))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(row.into_user()?))
}

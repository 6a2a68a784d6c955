use axum::{Json, extract::State};
use md5::{Digest, Md5};
use tracing::{info, warn};
use uuid::Uuid;

use devlink_db::models::NewUser;
use devlink_types::api::{RegisterRequest, TokenResponse};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, with_db};
use crate::validation::Checks;

/// POST /api/users: register and return a token for the new account.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    Checks::new()
        .required("name", &req.name, "Name is required")
        .email("email", &req.email, "Please include a valid email")
        .min_len(
            "password",
            &req.password,
            6,
            "Please enter a password with six or more characters",
        )
        .finish()?;

    let name = req.name.trim().to_string();
    let email = req.email.trim().to_string();

    let lookup = email.clone();
    if with_db(&state, move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        warn!("Registration for existing email {}", email);
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let avatar = gravatar_url(&email);
    let password_hash = bcrypt::hash(&req.password, state.config.bcrypt_cost)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;

    let user_id = Uuid::new_v4();
    let created = with_db(&state, move |db| {
        db.create_user(&NewUser {
            id: user_id,
            name: &name,
            email: &email,
            password_hash: &password_hash,
            avatar: &avatar,
        })
    })
    .await?;

    // Lost a race with a concurrent registration for the same email.
    if !created {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let token = state.tokens.issue(user_id)?;
    info!("Registered user {}", user_id);

    Ok(Json(TokenResponse { token }))
}

/// Gravatar URL for an email: 200px, PG rated, mystery-person fallback.
pub fn gravatar_url(email: &str) -> String {
    let digest = Md5::digest(email.trim().to_lowercase().as_bytes());
    format!("//www.gravatar.com/avatar/{}?s=200&r=pg&d=mm", hex::encode(digest))
}

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the identity token on protected routes.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Verify the token in [`TOKEN_HEADER`] and attach the caller's
/// [`Identity`](devlink_types::api::Identity) to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match req.headers().get(TOKEN_HEADER) {
        None => {
            return Err(ApiError::Unauthorized("No token, authorization denied".into()));
        }
        Some(value) => value
            .to_str()
            .map_err(|e| e.to_string())
            .and_then(|token| state.tokens.verify(token).map_err(|e| e.to_string()))
            .map_err(|reason| {
                debug!("Rejected token: {}", reason);
                ApiError::Unauthorized("Token is not valid".into())
            })?,
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

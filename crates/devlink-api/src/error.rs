use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use devlink_types::api::{ErrorBody, ErrorDetail};
use devlink_types::models::MutationError;

/// Every handler failure. Rendered as `{ "errors": [...] }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<ErrorDetail>),

    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{}", .0.body_text())]
    BadBody(#[from] JsonRejection),

    #[error("Server Error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(msg: &str) -> Self {
        Self::NotFound(msg.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCredentials | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadBody(rejection) => rejection.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MutationError> for ApiError {
    fn from(err: MutationError) -> Self {
        let msg = err.to_string();
        match err {
            MutationError::AlreadyLiked => ApiError::Conflict(msg),
            MutationError::TextRequired => {
                ApiError::Validation(vec![ErrorDetail::for_field("text", msg)])
            }
            MutationError::NotCommentAuthor => ApiError::Unauthorized(msg),
            MutationError::NotYetLiked
            | MutationError::CommentNotFound
            | MutationError::ExperienceNotFound
            | MutationError::EducationNotFound => ApiError::NotFound(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let errors = match self {
            ApiError::Validation(errors) => errors,
            ApiError::Internal(err) => {
                // Details stay in the log; clients only see the generic message.
                error!("Internal error: {:#}", err);
                vec![ErrorDetail::new("Server Error")]
            }
            other => vec![ErrorDetail::new(other.to_string())],
        };

        (status, Json(ErrorBody { errors })).into_response()
    }
}

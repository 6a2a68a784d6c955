pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod github;
pub mod middleware;
pub mod posts;
pub mod profile;
pub mod state;
pub mod token;
pub mod users;
pub mod validation;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Every route of the API. Protected routes sit behind [`require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(|| async { "Api is running." }))
        .route("/api/users", post(users::register))
        .route("/api/auth", post(auth::login))
        .route("/api/profile", get(profile::list_profiles))
        .route("/api/profile/user/{user_id}", get(profile::get_profile_by_user))
        .route("/api/profile/github/{username}", get(github::get_repos))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth", get(auth::me))
        .route("/api/profile/me", get(profile::get_my_profile))
        .route("/api/profile", post(profile::upsert_profile))
        .route("/api/profile", delete(profile::delete_account))
        .route("/api/profile/experience", put(profile::add_experience))
        .route("/api/profile/experience/{exp_id}", delete(profile::remove_experience))
        .route("/api/profile/education", put(profile::add_education))
        .route("/api/profile/education/{edu_id}", delete(profile::remove_education))
        .route("/api/posts", post(posts::create_post))
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/{id}", get(posts::get_post))
        .route("/api/posts/{id}", delete(posts::delete_post))
        .route("/api/posts/like/{id}", put(posts::like_post))
        .route("/api/posts/unlike/{id}", put(posts::unlike_post))
        .route("/api/posts/comments/{id}", post(posts::add_comment))
        .route("/api/posts/comments/{id}/{comment_id}", delete(posts::remove_comment))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(|| async { ApiError::not_found("Not found") })
}

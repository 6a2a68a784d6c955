use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::{info, warn};
use uuid::Uuid;

use devlink_types::api::{Identity, MessageResponse, TextRequest};
use devlink_types::models::{Comment, Like, Post, User};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, with_db};
use crate::validation::{Checks, parse_id};

const POST_NOT_FOUND: &str = "Post not found";

// Like, unlike and comment handlers load the post, mutate it in memory and
// write the whole document back. Concurrent writers to one post can overwrite
// each other; there is no version check.

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<TextRequest>,
) -> Result<Json<Post>, ApiError> {
    Checks::new()
        .required("text", &req.text, "Text is required")
        .finish()?;

    let author = load_user(&state, identity.id).await?;
    let post = Post::new(&author, req.text);

    let post = with_db(&state, move |db| {
        db.insert_post(&post)?;
        Ok(post)
    })
    .await?;

    info!("User {} created post {}", identity.id, post.id);
    Ok(Json(post))
}

/// GET /api/posts: newest first.
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = with_db(&state, |db| db.list_posts()).await?;
    Ok(Json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    load_post(&state, id).await.map(Json)
}

/// DELETE /api/posts/{id}: authors only.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let post = load_post(&state, id).await?;

    if !post.is_authored_by(identity.id) {
        warn!("User {} tried to delete post {} of {}", identity.id, post.id, post.user);
        return Err(ApiError::Unauthorized("User not authorized".into()));
    }

    if !with_db(&state, move |db| db.delete_post(id)).await? {
        return Err(ApiError::not_found(POST_NOT_FOUND));
    }

    Ok(Json(MessageResponse::new("Post removed")))
}

/// PUT /api/posts/like/{id}: returns the updated likes.
pub async fn like_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Like>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let mut post = load_post(&state, id).await?;

    post.like(identity.id)?;

    let post = save_post(&state, post).await?;
    Ok(Json(post.likes))
}

/// PUT /api/posts/unlike/{id}: returns the updated likes.
pub async fn unlike_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Like>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let mut post = load_post(&state, id).await?;

    post.unlike(identity.id)?;

    let post = save_post(&state, post).await?;
    Ok(Json(post.likes))
}

/// POST /api/posts/comments/{id}: returns the updated comments.
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<TextRequest>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Checks::new()
        .required("text", &req.text, "Text is required")
        .finish()?;

    let id = parse_id(&id, POST_NOT_FOUND)?;
    let author = load_user(&state, identity.id).await?;
    let mut post = load_post(&state, id).await?;

    post.add_comment(&author, &req.text)?;

    let post = save_post(&state, post).await?;
    Ok(Json(post.comments))
}

/// DELETE /api/posts/comments/{id}/{comment_id}: comment authors only.
pub async fn remove_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let comment_id = parse_id(&comment_id, "Comment does not exist")?;
    let mut post = load_post(&state, id).await?;

    post.remove_comment(comment_id, identity.id)?;

    let post = save_post(&state, post).await?;
    Ok(Json(post.comments))
}

async fn load_user(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    let row = with_db(state, move |db| db.get_user_by_id(id))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(row.into_user()?)
}

async fn load_post(state: &AppState, id: Uuid) -> Result<Post, ApiError> {
    with_db(state, move |db| db.get_post(id))
        .await?
        .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND))
}

async fn save_post(state: &AppState, post: Post) -> Result<Post, ApiError> {
    let (saved, post) = with_db(state, move |db| {
        let saved = db.save_post(&post)?;
        Ok((saved, post))
    })
    .await?;

    // Deleted between our read and this write.
    if !saved {
        return Err(ApiError::not_found(POST_NOT_FOUND));
    }
    Ok(post)
}

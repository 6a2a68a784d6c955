use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::info;
use uuid::Uuid;

use devlink_types::api::{
    EducationRequest, ExperienceRequest, Identity, MessageResponse, ProfileRequest,
};
use devlink_types::models::{Profile, UserSummary};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, with_db};
use crate::validation::{Checks, parse_id};

const NO_PROFILE: &str = "There is no profile for this user";

/// GET /api/profile/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Profile<UserSummary>>, ApiError> {
    let profile = with_db(&state, move |db| db.get_populated_profile(identity.id))
        .await?
        .ok_or_else(|| ApiError::not_found(NO_PROFILE))?;

    Ok(Json(profile))
}

/// GET /api/profile
pub async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Profile<UserSummary>>>, ApiError> {
    let profiles = with_db(&state, |db| db.list_profiles()).await?;
    Ok(Json(profiles))
}

/// GET /api/profile/user/{user_id}
pub async fn get_profile_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile<UserSummary>>, ApiError> {
    let user_id = parse_id(&user_id, NO_PROFILE)?;
    let profile = with_db(&state, move |db| db.get_populated_profile(user_id))
        .await?
        .ok_or_else(|| ApiError::not_found(NO_PROFILE))?;

    Ok(Json(profile))
}

/// POST /api/profile: create the caller's profile, or update the fields
/// supplied if it already exists.
pub async fn upsert_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    Checks::new()
        .required("status", req.status.as_deref().unwrap_or_default(), "Status is required")
        .required("skills", req.skills.as_deref().unwrap_or_default(), "Skills is required")
        .finish()?;

    let fields = req.into_fields();
    let user_id = identity.id;

    let profile = with_db(&state, move |db| match db.get_profile_by_user(user_id)? {
        Some(mut profile) => {
            profile.apply(fields);
            db.save_profile(&profile)?;
            Ok(profile)
        }
        None => {
            let profile = Profile::new(user_id, fields);
            db.insert_profile(&profile)?;
            info!("Created profile for user {}", user_id);
            Ok(profile)
        }
    })
    .await?;

    Ok(Json(profile))
}

/// DELETE /api/profile: remove the caller's profile, posts and account.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = with_db(&state, move |db| db.delete_account(identity.id)).await?;
    if !removed {
        return Err(ApiError::not_found("User not found"));
    }

    info!("Deleted account {}", identity.id);
    Ok(Json(MessageResponse::new("User deleted")))
}

/// PUT /api/profile/experience
pub async fn add_experience(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<ExperienceRequest>,
) -> Result<Json<Profile>, ApiError> {
    Checks::new()
        .required("title", &req.title, "Title is required")
        .required("company", &req.company, "Company is required")
        .required("from", &req.from, "From date is required")
        .finish()?;

    let mut profile = load_own_profile(&state, identity.id).await?;
    profile.add_experience(req.into_entry());
    save_profile(&state, profile).await.map(Json)
}

/// DELETE /api/profile/experience/{exp_id}
pub async fn remove_experience(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(exp_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let exp_id = parse_id(&exp_id, "Experience not found")?;

    let mut profile = load_own_profile(&state, identity.id).await?;
    profile.remove_experience(exp_id)?;
    save_profile(&state, profile).await.map(Json)
}

/// PUT /api/profile/education
pub async fn add_education(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<EducationRequest>,
) -> Result<Json<Profile>, ApiError> {
    Checks::new()
        .required("school", &req.school, "School is required")
        .required("degree", &req.degree, "Degree is required")
        .required("fieldOfStudy", &req.field_of_study, "Field of study is required")
        .required("from", &req.from, "From date is required")
        .finish()?;

    let mut profile = load_own_profile(&state, identity.id).await?;
    profile.add_education(req.into_entry());
    save_profile(&state, profile).await.map(Json)
}

/// DELETE /api/profile/education/{edu_id}
pub async fn remove_education(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(edu_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let edu_id = parse_id(&edu_id, "Education not found")?;

    let mut profile = load_own_profile(&state, identity.id).await?;
    profile.remove_education(edu_id)?;
    save_profile(&state, profile).await.map(Json)
}

async fn load_own_profile(state: &AppState, user_id: Uuid) -> Result<Profile, ApiError> {
    with_db(state, move |db| db.get_profile_by_user(user_id))
        .await?
        .ok_or_else(|| ApiError::not_found(NO_PROFILE))
}

async fn save_profile(state: &AppState, profile: Profile) -> Result<Profile, ApiError> {
    let (saved, profile) = with_db(state, move |db| {
        let saved = db.save_profile(&profile)?;
        Ok((saved, profile))
    })
    .await?;

    if !saved {
        return Err(ApiError::not_found(NO_PROFILE));
    }
    Ok(profile)
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::handlers::PaginationParams;
use crate::middlewares::AuthUser;
use crate::models::{Profile, ProfileResponse, ProfileSelfResponse, UpdateProfile};
use crate::repositories::{ProfileRepository, Repository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    /// Only honored while the phone is confirmed
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileListResponse {
    pub data: Vec<ProfileResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

// ============ Handlers ============

/// Update the current profile
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileSelfResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileSelfResponse>> {
    let update = UpdateProfile {
        display_name: payload.display_name,
        phone: payload.phone.map(|p| p.trim().to_string()),
        is_public: payload.is_public,
    };

    let profile = ProfileRepository::update(&state.db, user.id, &update).await?;
    Ok(Json(profile.into()))
}

/// Delete the current profile. Projects shared with other profiles survive.
#[utoipa::path(
    delete,
    path = "/api/users/me",
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn delete_me(user: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    ProfileRepository::soft_delete(&state.db, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List public profiles
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Public profiles", body = ProfileListResponse)
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ProfileListResponse>> {
    let (limit, offset) = params.resolve();

    let profiles = <ProfileRepository as Repository<Profile>>::list(&state.db, limit, offset).await?;
    let total = <ProfileRepository as Repository<Profile>>::count(&state.db).await?;

    Ok(Json(ProfileListResponse {
        data: profiles.into_iter().map(|p| p.into()).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a profile by username
#[utoipa::path(
    get,
    path = "/api/users/{username}",
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 404, description = "Profile not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = ProfileRepository::find_by_username(&state.db, &username).await?;
    Ok(Json(profile.into()))
}

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{RankedTag, Tag};
use crate::repositories::TagRepository;
use crate::state::AppState;

const SEARCH_LIMIT: u64 = 20;
const MAX_PROFILE_TAGS: usize = 30;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, IntoParams)]
pub struct TagSearchParams {
    /// Title prefix
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: Uuid,
    pub title: String,
}

impl From<Tag> for TagResponse {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            title: t.title,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileTagResponse {
    pub id: Uuid,
    pub title: String,
    pub rank: i32,
}

impl From<RankedTag> for ProfileTagResponse {
    fn from(t: RankedTag) -> Self {
        Self {
            id: t.tag.id,
            title: t.tag.title,
            rank: t.rank,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTagsRequest {
    /// Titles in rank order
    pub tags: Vec<String>,
}

// ============ Handlers ============

/// Tags starting with the given prefix
#[utoipa::path(
    get,
    path = "/api/tags",
    params(TagSearchParams),
    responses(
        (status = 200, description = "Matching tags", body = Vec<TagResponse>)
    ),
    tag = "Tags"
)]
pub async fn search_tags(
    State(state): State<AppState>,
    Query(params): Query<TagSearchParams>,
) -> AppResult<Json<Vec<TagResponse>>> {
    let prefix = params.search.unwrap_or_default();
    let tags = TagRepository::search(&state.db, prefix.trim(), SEARCH_LIMIT).await?;
    Ok(Json(tags.into_iter().map(|t| t.into()).collect()))
}

/// The caller's tags in rank order
#[utoipa::path(
    get,
    path = "/api/profile/tags",
    responses(
        (status = 200, description = "Profile tags", body = Vec<ProfileTagResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tags"
)]
pub async fn get_profile_tags(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProfileTagResponse>>> {
    let tags = TagRepository::for_profile(&state.db, user.id).await?;
    Ok(Json(tags.into_iter().map(|t| t.into()).collect()))
}

/// Replace the caller's tags
#[utoipa::path(
    put,
    path = "/api/profile/tags",
    request_body = SetTagsRequest,
    responses(
        (status = 200, description = "Profile tags", body = Vec<ProfileTagResponse>),
        (status = 400, description = "Too many tags"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tags"
)]
pub async fn set_profile_tags(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SetTagsRequest>,
) -> AppResult<Json<Vec<ProfileTagResponse>>> {
    if payload.tags.len() > MAX_PROFILE_TAGS {
        return Err(AppError::Validation(format!(
            "At most {} tags are allowed",
            MAX_PROFILE_TAGS
        )));
    }

    let tags = TagRepository::set_for_profile(&state.db, user.id, &payload.tags).await?;
    Ok(Json(tags.into_iter().map(|t| t.into()).collect()))
}

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::common::parse_optional_date;
use crate::handlers::project::{project_responses, ProjectResponse};
use crate::middlewares::{AuthUser, MaybeAuthUser};
use crate::models::{format_date, parse_date, Calendar, CalendarQuery, OffersCalendar};
use crate::repositories::{DayRepository, ProfileRepository, ProjectRepository};
use crate::services::calendar;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, IntoParams)]
pub struct CalendarParams {
    /// Calendar owner; defaults to the caller
    pub user: Option<Uuid>,
    /// First date, inclusive (`YYYY-MM-DD`)
    pub start: Option<String>,
    /// Last date, inclusive (`YYYY-MM-DD`)
    pub end: Option<String>,
    /// Project being edited, left out of the result
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OffersCalendarParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OffersResponse {
    pub projects: Vec<ProjectResponse>,
    pub calendar: OffersCalendar,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DayOffRequest {
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayOffResponse {
    pub date: String,
    /// Whether the date is marked off after the toggle
    pub is_off: bool,
}

// ============ Handlers ============

/// Busy/free calendar of a profile as seen by the caller. Anonymous callers
/// only get opaque busy dates.
#[utoipa::path(
    get,
    path = "/api/calendar",
    params(CalendarParams),
    responses(
        (status = 200, description = "Calendar", body = Calendar),
        (status = 400, description = "Malformed date or missing owner"),
        (status = 404, description = "Profile not found")
    ),
    tag = "Calendar"
)]
pub async fn get_calendar(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> AppResult<Json<Calendar>> {
    let asker = viewer.id();
    let owner = params
        .user
        .or(asker)
        .ok_or_else(|| AppError::Validation("user is required".to_string()))?;

    let query = CalendarQuery {
        owner,
        asker,
        start: parse_optional_date(params.start.as_deref())?,
        end: parse_optional_date(params.end.as_deref())?,
        excluding_project_id: params.project_id,
    };

    ProfileRepository::ensure_active(&state.db, owner).await?;
    let days = DayRepository::calendar_days(&state.db, owner, query.start, query.end).await?;

    Ok(Json(calendar::aggregate(&query, days)))
}

/// Dates the caller has offered to other calendars
#[utoipa::path(
    get,
    path = "/api/calendar/offers",
    params(OffersCalendarParams),
    responses(
        (status = 200, description = "Offers calendar", body = OffersCalendar),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn get_offers_calendar(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<OffersCalendarParams>,
) -> AppResult<Json<OffersCalendar>> {
    let start = parse_optional_date(params.start.as_deref())?;
    let end = parse_optional_date(params.end.as_deref())?;

    let days = DayRepository::offer_days(&state.db, user.id, start, end).await?;
    Ok(Json(calendar::aggregate_offers(
        user.id,
        start,
        end,
        params.project_id,
        days,
    )))
}

/// The caller's outbound proposals and open offers with their calendar
#[utoipa::path(
    get,
    path = "/api/offers",
    responses(
        (status = 200, description = "Offers", body = OffersResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn list_offers(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<OffersResponse>> {
    let projects = ProjectRepository::list_offers(&state.db, user.id).await?;
    let days = DayRepository::offer_days(&state.db, user.id, None, None).await?;

    Ok(Json(OffersResponse {
        projects: project_responses(&state, projects).await?,
        calendar: calendar::aggregate_offers(user.id, None, None, None, days),
    }))
}

/// Mark a date off on the caller's calendar, or clear it if already off
#[utoipa::path(
    post,
    path = "/api/daysoff",
    request_body = DayOffRequest,
    responses(
        (status = 200, description = "Date toggled", body = DayOffResponse),
        (status = 400, description = "Malformed date"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn toggle_day_off(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<DayOffRequest>,
) -> AppResult<Json<DayOffResponse>> {
    let date = parse_date(payload.date.trim())?;
    let is_off = ProjectRepository::toggle_day_off(&state.db, user.id, date).await?;

    Ok(Json(DayOffResponse {
        date: format_date(date),
        is_off,
    }))
}

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::common::{double_option, validate_required};
use crate::handlers::PaginationParams;
use crate::middlewares::AuthUser;
use crate::models::{
    format_date, Day, DayEntry, NewProject, Pricing, Project, ProjectField, ProjectPatch,
};
use crate::repositories::{DayRepository, ProjectRepository};
use crate::services::notification;
use crate::state::AppState;

// ============ Request/Response DTOs ============

/// Body of both create and update. Absent fields are left alone on update.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProjectRequest {
    pub title: Option<String>,
    /// Calendar owner. Absent on create means the caller; `null` makes an open offer.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub user: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub client: Option<Option<Uuid>>,
    /// Folder this project belongs to
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent: Option<Option<Uuid>>,
    pub info: Option<String>,
    /// `YYYY-MM-DD` to an optional note
    #[schema(value_type = Option<Object>)]
    pub days: Option<BTreeMap<String, Option<String>>>,
    pub money: Option<i64>,
    pub money_per_day: Option<i64>,
    pub money_calculating: Option<bool>,
    pub is_paid: Option<bool>,
}

impl ProjectRequest {
    fn pricing(&self) -> AppResult<Option<Pricing>> {
        Pricing::from_request(self.money, self.money_per_day, self.money_calculating)
    }

    fn day_entries(&self) -> AppResult<Option<Vec<DayEntry>>> {
        self.days.as_ref().map(DayEntry::from_map).transpose()
    }

    fn into_new_project(self, actor: Uuid) -> AppResult<NewProject> {
        let pricing = self.pricing()?.unwrap_or_default();
        let days = self.day_entries()?.unwrap_or_default();

        Ok(NewProject {
            user_id: self.user.unwrap_or(Some(actor)),
            creator_id: Some(actor),
            client_id: self.client.flatten(),
            parent_id: self.parent.flatten(),
            title: validate_required(self.title, "Title")?,
            pricing,
            info: self.info.unwrap_or_default(),
            is_paid: self.is_paid.unwrap_or(false),
            is_wait: false,
            confirmed: false,
            days,
        })
    }

    fn into_patch(self) -> AppResult<ProjectPatch> {
        let mut fields = Vec::new();

        if let Some(pricing) = self.pricing()? {
            fields.push(ProjectField::Pricing(pricing));
        }
        let days = self.day_entries()?;

        if self.title.is_some() {
            fields.push(ProjectField::Title(validate_required(self.title, "Title")?));
        }
        if let Some(info) = self.info {
            fields.push(ProjectField::Info(info));
        }
        if let Some(client) = self.client {
            fields.push(ProjectField::Client(client));
        }
        if let Some(parent) = self.parent {
            fields.push(ProjectField::Parent(parent));
        }
        if let Some(is_paid) = self.is_paid {
            fields.push(ProjectField::IsPaid(is_paid));
        }

        Ok(ProjectPatch {
            user: self.user,
            days,
            fields,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub user: Option<Uuid>,
    pub creator: Option<Uuid>,
    pub client: Option<Uuid>,
    pub parent: Option<Uuid>,
    pub info: String,
    #[schema(value_type = Object)]
    pub days: BTreeMap<String, Option<String>>,
    pub money: Option<i64>,
    pub money_per_day: Option<i64>,
    pub money_calculating: bool,
    /// Fixed price, or rate times the number of days
    pub total: Option<i64>,
    pub is_paid: bool,
    pub is_wait: bool,
    pub confirmed: bool,
    pub canceled: bool,
    /// `user` or `creator`
    pub canceled_by: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub updated_at: time::OffsetDateTime,
}

impl ProjectResponse {
    pub fn new(project: Project, days: &[Day]) -> Self {
        let (money, money_per_day, money_calculating) = project.pricing.to_columns();

        Self {
            id: project.id,
            total: project.pricing.total(days.len()),
            days: days
                .iter()
                .map(|d| (format_date(d.date), d.info.clone()))
                .collect(),
            title: project.title,
            user: project.user_id,
            creator: project.creator_id,
            client: project.client_id,
            parent: project.parent_id,
            info: project.info,
            money,
            money_per_day,
            money_calculating,
            is_paid: project.is_paid,
            is_wait: project.is_wait,
            confirmed: project.confirmed,
            canceled: project.canceled.is_some(),
            canceled_by: project.canceled.map(|party| party.as_str().to_string()),
            date_start: project.date_start.map(format_date),
            date_end: project.date_end.map(format_date),
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<ProjectResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteProjectResponse {
    /// `false` when the project was canceled and kept for the other party
    pub deleted: bool,
    pub project: Option<ProjectResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProjectListParams {
    /// Whose projects to list; defaults to the caller
    pub user: Option<Uuid>,
    /// Substring of the title
    pub filter: Option<String>,
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    #[param(default = 0, minimum = 0)]
    pub offset: Option<i64>,
}

/// Load the days of `projects` and build their responses
pub(crate) async fn project_responses(
    state: &AppState,
    projects: Vec<Project>,
) -> AppResult<Vec<ProjectResponse>> {
    let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
    let mut days_by_project: HashMap<Uuid, Vec<Day>> = HashMap::new();
    for day in DayRepository::for_projects(&state.db, &ids).await? {
        if let Some(project_id) = day.project_id {
            days_by_project.entry(project_id).or_default().push(day);
        }
    }

    Ok(projects
        .into_iter()
        .map(|p| {
            let days = days_by_project.remove(&p.id).unwrap_or_default();
            ProjectResponse::new(p, &days)
        })
        .collect())
}

async fn project_response(state: &AppState, project: Project) -> AppResult<ProjectResponse> {
    let days = DayRepository::for_project(&state.db, project.id).await?;
    Ok(ProjectResponse::new(project, &days))
}

// ============ Handlers ============

/// Create a project on the caller's calendar, propose it to another profile,
/// or publish it as an open offer
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Owner, client or folder not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn create_project(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let new = payload.into_new_project(user.id)?;

    let (project, events) = ProjectRepository::create(&state.db, user.id, new).await?;
    notification::dispatch(state.task_queue.as_ref(), events).await;

    Ok(Json(project_response(&state, project).await?))
}

/// List the caller's projects, or those the caller proposed to another profile
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectListParams),
    responses(
        (status = 200, description = "List of projects", body = ProjectListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_projects(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ProjectListParams>,
) -> AppResult<Json<ProjectListResponse>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let (projects, total) = ProjectRepository::list_for(
        &state.db,
        user.id,
        params.user,
        params.filter.as_deref(),
        limit,
        offset,
    )
    .await?;

    Ok(Json(ProjectListResponse {
        data: project_responses(&state, projects).await?,
        total,
        limit,
        offset,
    }))
}

/// Get a project the caller is a party of
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn get_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProjectResponse>> {
    let project = ProjectRepository::find_for_party(&state.db, id, user.id).await?;
    Ok(Json(project_response(&state, project).await?))
}

/// Update a project. Changing `user` moves it to another calendar and
/// returns the replacement project.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a party of the project"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn update_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let patch = payload.into_patch()?;

    let (project, events) = ProjectRepository::update(&state.db, id, user.id, patch).await?;
    notification::dispatch(state.task_queue.as_ref(), events).await;

    Ok(Json(project_response(&state, project).await?))
}

/// Delete a project, or cancel it when the other party keeps it
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted or canceled", body = DeleteProjectResponse),
        (status = 400, description = "Paid project or non-empty folder"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a party of the project"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn delete_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteProjectResponse>> {
    let (kept, events) = ProjectRepository::remove(&state.db, id, user.id).await?;
    notification::dispatch(state.task_queue.as_ref(), events).await;

    let project = match kept {
        Some(project) => Some(project_response(&state, project).await?),
        None => None,
    };

    Ok(Json(DeleteProjectResponse {
        deleted: project.is_none(),
        project,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_into_patch() {
        let body: ProjectRequest = serde_json::from_value(serde_json::json!({
            "title": "Wedding",
            "client": null,
            "days": {"2024-06-01": "ceremony", "2024-06-02": null},
            "money_per_day": 100
        }))
        .unwrap();

        let patch = body.into_patch().unwrap();
        assert_eq!(patch.user, None);
        assert_eq!(patch.days.as_ref().map(Vec::len), Some(2));
        assert!(patch.fields.contains(&ProjectField::Title("Wedding".to_string())));
        assert!(patch.fields.contains(&ProjectField::Client(None)));
        assert!(patch.fields.contains(&ProjectField::Pricing(Pricing::PerDay(100))));
    }

    #[test]
    fn test_request_rejects_two_prices() {
        let body: ProjectRequest = serde_json::from_value(serde_json::json!({
            "money": 100,
            "money_per_day": 10
        }))
        .unwrap();

        assert!(body.into_patch().is_err());
    }

    #[test]
    fn test_create_defaults_to_own_calendar() {
        let actor = Uuid::new_v4();
        let body: ProjectRequest =
            serde_json::from_value(serde_json::json!({"title": "Shoot"})).unwrap();
        let new = body.into_new_project(actor).unwrap();
        assert_eq!(new.user_id, Some(actor));

        let open: ProjectRequest =
            serde_json::from_value(serde_json::json!({"title": "Shoot", "user": null})).unwrap();
        assert_eq!(open.into_new_project(actor).unwrap().user_id, None);
    }

    #[test]
    fn test_create_requires_title() {
        let body = ProjectRequest::default();
        assert!(body.into_new_project(Uuid::new_v4()).is_err());
    }
}

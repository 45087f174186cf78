use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{format_date, Project};

/// A day row joined with the project it belongs to
#[derive(Debug, Clone)]
pub struct CalendarDay {
    pub date: Date,
    pub info: Option<String>,
    pub project: Project,
}

/// Inputs of a calendar request
#[derive(Debug, Clone, Copy)]
pub struct CalendarQuery {
    pub owner: Uuid,
    /// `None` for an anonymous viewer
    pub asker: Option<Uuid>,
    pub start: Option<Date>,
    pub end: Option<Date>,
    /// Project being edited; it must not block itself
    pub excluding_project_id: Option<Uuid>,
}

/// Project details shown on a calendar date
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub title: String,
    pub user: Option<Uuid>,
    pub creator: Option<Uuid>,
    pub client: Option<Uuid>,
    pub parent: Option<Uuid>,
    pub is_wait: bool,
    pub confirmed: bool,
    pub is_paid: bool,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    /// Note attached to this particular day
    pub info: Option<String>,
}

impl ProjectSummary {
    pub fn of(project: &Project, day_info: Option<String>) -> Self {
        Self {
            id: project.id,
            title: project.title.clone(),
            user: project.user_id,
            creator: project.creator_id,
            client: project.client_id,
            parent: project.parent_id,
            is_wait: project.is_wait,
            confirmed: project.confirmed,
            is_paid: project.is_paid,
            date_start: project.date_start.map(format_date),
            date_end: project.date_end.map(format_date),
            info: day_info,
        }
    }
}

/// Busy/free view of a calendar for one viewer
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct Calendar {
    /// `YYYY-MM-DD` to the projects the viewer may see on that date
    pub days: BTreeMap<String, Vec<ProjectSummary>>,
    /// Dates that are busy without further detail
    #[serde(rename = "daysOff")]
    pub days_off: Vec<String>,
}

/// Offers view: only the dates the asker committed to elsewhere
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct OffersCalendar {
    pub days: BTreeMap<String, Vec<ProjectSummary>>,
}

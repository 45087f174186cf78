use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::DayEntry;

/// One of the two parties of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The calendar owner (`user`)
    User,
    Creator,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Creator => "creator",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "creator" => Some(Self::Creator),
            _ => None,
        }
    }
}

/// Pricing modes are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "amount", rename_all = "snake_case")]
pub enum Pricing {
    #[default]
    Unpriced,
    Total(i64),
    PerDay(i64),
    /// Price will be agreed later
    Calculating,
}

impl Pricing {
    /// Rebuild from the flat storage columns
    pub fn from_columns(money: Option<i64>, money_per_day: Option<i64>, calculating: bool) -> Self {
        match (money, money_per_day, calculating) {
            (_, _, true) => Self::Calculating,
            (_, Some(rate), false) => Self::PerDay(rate),
            (Some(money), None, false) => Self::Total(money),
            (None, None, false) => Self::Unpriced,
        }
    }

    /// Flatten into `(money, money_per_day, money_calculating)`
    pub fn to_columns(self) -> (Option<i64>, Option<i64>, bool) {
        match self {
            Self::Unpriced => (None, None, false),
            Self::Total(money) => (Some(money), None, false),
            Self::PerDay(rate) => (None, Some(rate), false),
            Self::Calculating => (None, None, true),
        }
    }

    /// Read the request fields. `Ok(None)` when no pricing field was submitted.
    pub fn from_request(
        money: Option<i64>,
        money_per_day: Option<i64>,
        money_calculating: Option<bool>,
    ) -> AppResult<Option<Self>> {
        let calculating = money_calculating.unwrap_or(false);
        let submitted =
            money.is_some() as u8 + money_per_day.is_some() as u8 + calculating as u8;

        if submitted > 1 {
            return Err(AppError::Validation(
                "Only one of money, money_per_day, money_calculating may be set".to_string(),
            ));
        }
        if money.is_some_and(|m| m < 0) || money_per_day.is_some_and(|m| m < 0) {
            return Err(AppError::Validation("Money cannot be negative".to_string()));
        }

        Ok(match (money, money_per_day, calculating) {
            (Some(money), _, _) => Some(Self::Total(money)),
            (_, Some(rate), _) => Some(Self::PerDay(rate)),
            (_, _, true) => Some(Self::Calculating),
            // An explicit `money_calculating: false` clears the price
            _ if money_calculating.is_some() => Some(Self::Unpriced),
            _ => None,
        })
    }

    /// Total amount for a project spanning `day_count` days. `None` when
    /// unpriced or when the product does not fit in an `i64`.
    pub fn total(&self, day_count: usize) -> Option<i64> {
        match self {
            Self::Total(money) => Some(*money),
            Self::PerDay(rate) => i64::try_from(day_count)
                .ok()
                .and_then(|days| rate.checked_mul(days)),
            Self::Unpriced | Self::Calculating => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub creator_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub pricing: Pricing,
    pub info: String,
    pub is_paid: bool,
    pub is_wait: bool,
    pub confirmed: bool,
    pub canceled: Option<Party>,
    pub date_start: Option<Date>,
    pub date_end: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// What a project row represents, discriminated from its nullable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// The owner's personal unavailability (no creator)
    DaysOff { owner: Uuid },
    SelfOwned { owner: Uuid },
    Proposal { owner: Uuid, creator: Uuid },
    /// Not addressed to any calendar yet
    OpenOffer { creator: Uuid },
    /// Groups child projects; bounds come from the children
    Folder {
        owner: Option<Uuid>,
        creator: Option<Uuid>,
    },
}

impl ProjectKind {
    /// A second profile is involved and must be told about changes
    pub fn has_counterparty(&self) -> bool {
        match *self {
            Self::Proposal { .. } => true,
            Self::Folder {
                owner: Some(owner),
                creator: Some(creator),
            } => owner != creator,
            _ => false,
        }
    }
}

impl Project {
    pub fn kind(&self, has_children: bool) -> ProjectKind {
        if has_children {
            return ProjectKind::Folder {
                owner: self.user_id,
                creator: self.creator_id,
            };
        }

        match (self.user_id, self.creator_id) {
            (Some(owner), None) => ProjectKind::DaysOff { owner },
            (Some(owner), Some(creator)) if owner == creator => ProjectKind::SelfOwned { owner },
            (Some(owner), Some(creator)) => ProjectKind::Proposal { owner, creator },
            (None, Some(creator)) => ProjectKind::OpenOffer { creator },
            // Both parties gone (creator deleted from an open offer); nothing left to confirm
            (None, None) => ProjectKind::Folder {
                owner: None,
                creator: None,
            },
        }
    }

    /// The party `profile_id` plays in this project, owner taking precedence
    pub fn party_of(&self, profile_id: Uuid) -> Option<Party> {
        if self.user_id == Some(profile_id) {
            Some(Party::User)
        } else if self.creator_id == Some(profile_id) {
            Some(Party::Creator)
        } else {
            None
        }
    }
}

/// Input for inserting a project row
#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: Option<Uuid>,
    pub creator_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub pricing: Pricing,
    pub info: String,
    pub is_paid: bool,
    pub is_wait: bool,
    pub confirmed: bool,
    pub days: Vec<DayEntry>,
}

/// A single recognized field of a project update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectField {
    Title(String),
    Info(String),
    Client(Option<Uuid>),
    Parent(Option<Uuid>),
    Pricing(Pricing),
    IsPaid(bool),
}

/// Typed partial update of a project
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    /// `Some(_)` when the request names an owner (possibly null)
    pub user: Option<Option<Uuid>>,
    pub days: Option<Vec<DayEntry>>,
    pub fields: Vec<ProjectField>,
}

impl ProjectPatch {
    /// Whether this patch moves the project to another calendar
    pub fn changes_owner(&self, project: &Project) -> bool {
        matches!(self.user, Some(user) if user != project.user_id)
    }

    /// Drop the payment state (a proposer cannot mark their own offer paid)
    pub fn strip_payment(&mut self) {
        self.fields
            .retain(|field| !matches!(field, ProjectField::IsPaid(_)));
    }

    pub fn parent(&self) -> Option<Option<Uuid>> {
        self.fields.iter().find_map(|field| match field {
            ProjectField::Parent(parent) => Some(*parent),
            _ => None,
        })
    }

    /// Apply every field to `project`
    pub fn apply_to(&self, project: &mut Project) {
        for field in &self.fields {
            match field {
                ProjectField::Title(title) => project.title = title.clone(),
                ProjectField::Info(info) => project.info = info.clone(),
                ProjectField::Client(client) => project.client_id = *client,
                ProjectField::Parent(parent) => project.parent_id = *parent,
                ProjectField::Pricing(pricing) => project.pricing = *pricing,
                ProjectField::IsPaid(paid) => project.is_paid = *paid,
            }
        }
    }

    /// Build the replacement project for a reassignment: `base` merged with this patch,
    /// owned by `user` and proposed by the original creator
    pub fn into_new_project(self, base: &Project, current_days: Vec<DayEntry>) -> NewProject {
        let mut merged = base.clone();
        self.apply_to(&mut merged);

        NewProject {
            user_id: self.user.unwrap_or(base.user_id),
            creator_id: base.creator_id,
            client_id: merged.client_id,
            parent_id: merged.parent_id,
            title: merged.title,
            pricing: merged.pricing,
            info: merged.info,
            is_paid: false,
            is_wait: false,
            confirmed: false,
            days: self.days.unwrap_or(current_days),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn project(user: Option<Uuid>, creator: Option<Uuid>) -> Project {
        let now = OffsetDateTime::now_utc();
        Project {
            id: Uuid::new_v4(),
            user_id: user,
            creator_id: creator,
            client_id: None,
            parent_id: None,
            title: "Shoot".to_string(),
            pricing: Pricing::Unpriced,
            info: String::new(),
            is_paid: false,
            is_wait: false,
            confirmed: true,
            canceled: None,
            date_start: None,
            date_end: None,
            created_at: now,
            updated_at: now,
        }
    }
}

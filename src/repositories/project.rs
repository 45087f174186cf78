use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::entity::client;
use crate::entity::project::{self, ActiveModel, Column, Entity as ProjectEntity};
use crate::error::{AppError, AppResult};
use crate::models::{DayEntry, NewProject, Party, Pricing, Project, ProjectPatch};
use crate::repositories::{DayRepository, ProfileRepository};
use crate::services::days::bounds_of;
use crate::services::workflow::{
    self, DeletePlan, Flags, ProjectEvent, Retire, UpdatePlan,
};

/// Title of the project that holds a profile's personal days off
pub const DAYS_OFF_TITLE: &str = "Days off";

/// Project repository for database operations
pub struct ProjectRepository;

impl ProjectRepository {
    pub async fn find<C>(conn: &C, id: Uuid) -> AppResult<Project>
    where
        C: ConnectionTrait,
    {
        let model = ProjectEntity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

        Ok(model.into())
    }

    /// Find a project `viewer` is a party of; anyone else gets `NotFound`
    pub async fn find_for_party(db: &DatabaseConnection, id: Uuid, viewer: Uuid) -> AppResult<Project> {
        let project = Self::find(db, id).await?;
        if project.party_of(viewer).is_none() {
            return Err(AppError::NotFound("Project".to_string()));
        }
        Ok(project)
    }

    pub async fn has_children<C>(conn: &C, id: Uuid) -> AppResult<bool>
    where
        C: ConnectionTrait,
    {
        let count = ProjectEntity::find()
            .filter(Column::ParentId.eq(id))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn child_ids<C>(conn: &C, id: Uuid) -> AppResult<Vec<Uuid>>
    where
        C: ConnectionTrait,
    {
        let ids = ProjectEntity::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::ParentId.eq(id))
            .into_tuple::<Uuid>()
            .all(conn)
            .await?;
        Ok(ids)
    }

    /// Create a project proposed by `actor`
    pub async fn create(
        db: &DatabaseConnection,
        actor: Uuid,
        mut new: NewProject,
    ) -> AppResult<(Project, Vec<ProjectEvent>)> {
        workflow::prepare_create(actor, &mut new);

        let txn = db.begin().await?;
        let project = Self::insert(&txn, actor, new).await?;
        txn.commit().await?;

        tracing::info!(
            project_id = %project.id,
            creator = %actor,
            state = ?workflow::ProjectState::of(&project),
            "Project created"
        );

        let events = workflow::creation_events(&project, actor);
        Ok((project, events))
    }

    /// Apply `patch` on behalf of `actor`. Returns the resulting project,
    /// which is a new row when the patch moved it to another calendar.
    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        actor: Uuid,
        patch: ProjectPatch,
    ) -> AppResult<(Project, Vec<ProjectEvent>)> {
        let txn = db.begin().await?;

        let project = Self::find(&txn, id).await?;
        let has_children = Self::has_children(&txn, id).await?;

        let (result, events) = match workflow::plan_update(&project, has_children, actor, patch)? {
            UpdatePlan::Apply {
                patch,
                flags,
                events,
            } => {
                let updated = Self::apply(&txn, &project, has_children, actor, patch, flags).await?;
                (updated, events)
            }
            UpdatePlan::Reassign {
                retire,
                patch,
                mut events,
            } => {
                let current_days = DayRepository::for_project(&txn, id)
                    .await?
                    .into_iter()
                    .map(|day| DayEntry::new(day.date, day.info))
                    .collect();

                let explicit_parent = patch.parent().flatten();
                let mut new = patch.into_new_project(&project, current_days);
                new.parent_id = explicit_parent;
                workflow::prepare_create(actor, &mut new);

                match retire {
                    Retire::SoftCancel(party) => {
                        Self::cancel(&txn, &project, party).await?;
                    }
                    Retire::HardDelete => Self::purge(&txn, &project).await?,
                }
                let replacement = Self::insert(&txn, actor, new).await?;

                tracing::info!(
                    project_id = %id,
                    replacement_id = %replacement.id,
                    retire = ?retire,
                    "Project moved to another calendar"
                );

                events.extend(workflow::creation_events(&replacement, actor));
                (replacement, events)
            }
        };

        txn.commit().await?;
        Ok((result, events))
    }

    /// Delete or cancel a project on behalf of `actor`. Returns the canceled
    /// project when the row is kept.
    pub async fn remove(
        db: &DatabaseConnection,
        id: Uuid,
        actor: Uuid,
    ) -> AppResult<(Option<Project>, Vec<ProjectEvent>)> {
        let txn = db.begin().await?;

        let project = Self::find(&txn, id).await?;
        let has_children = Self::has_children(&txn, id).await?;

        let outcome = match workflow::plan_delete(&project, has_children, actor)? {
            DeletePlan::HardDelete => {
                Self::purge(&txn, &project).await?;
                tracing::info!(project_id = %id, "Project deleted");
                (None, Vec::new())
            }
            DeletePlan::SoftCancel { party, events } => {
                let canceled = Self::cancel(&txn, &project, party).await?;
                tracing::info!(project_id = %id, by = party.as_str(), "Project canceled");
                (Some(canceled), events)
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    /// Projects listed for `asker`: their own (as owner or creator) when
    /// `target` is absent or themselves, otherwise what they proposed to `target`
    pub async fn list_for(
        db: &DatabaseConnection,
        asker: Uuid,
        target: Option<Uuid>,
        filter: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<Project>, u64)> {
        let scope = match target {
            Some(target) if target != asker => Condition::all()
                .add(Column::UserId.eq(target))
                .add(Column::CreatorId.eq(asker)),
            _ => Condition::any()
                .add(Column::UserId.eq(asker))
                .add(Column::CreatorId.eq(asker)),
        };

        let mut query = ProjectEntity::find().filter(scope);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            query = query.filter(Column::Title.contains(filter));
        }

        let total = query.clone().count(db).await?;
        let models = query
            .order_by_desc(Column::DateStart)
            .order_by_desc(Column::CreatedAt)
            .paginate(db, limit)
            .fetch_page(offset / limit)
            .await?;

        Ok((models.into_iter().map(|m| m.into()).collect(), total))
    }

    /// Live proposals `asker` made to other calendars, plus open offers
    pub async fn list_offers(db: &DatabaseConnection, asker: Uuid) -> AppResult<Vec<Project>> {
        let models = ProjectEntity::find()
            .filter(Column::CreatorId.eq(asker))
            .filter(Column::UserId.ne(asker).or(Column::UserId.is_null()))
            .filter(Column::Canceled.is_null())
            .order_by_asc(Column::DateStart)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Toggle `date` in `owner`'s days-off project, creating it on first use.
    /// Returns whether the date is now marked off.
    pub async fn toggle_day_off(db: &DatabaseConnection, owner: Uuid, date: Date) -> AppResult<bool> {
        let txn = db.begin().await?;

        let existing = ProjectEntity::find()
            .filter(Column::UserId.eq(owner))
            .filter(Column::CreatorId.is_null())
            .one(&txn)
            .await?;

        let project_id = match existing {
            Some(model) => model.id,
            None => {
                let flags = Flags::SETTLED;
                let days_off = NewProject {
                    user_id: Some(owner),
                    creator_id: None,
                    client_id: None,
                    parent_id: None,
                    title: DAYS_OFF_TITLE.to_string(),
                    pricing: Pricing::Unpriced,
                    info: String::new(),
                    is_paid: false,
                    is_wait: flags.is_wait,
                    confirmed: flags.confirmed,
                    days: Vec::new(),
                };
                Self::insert_row(&txn, &days_off).await?.id
            }
        };

        let is_off = DayRepository::toggle(&txn, project_id, date).await?;
        Self::write_bounds(&txn, project_id).await?;
        txn.commit().await?;

        tracing::info!(profile_id = %owner, %date, is_off, "Day off toggled");
        Ok(is_off)
    }

    // ============ Internals ============

    async fn insert<C>(conn: &C, actor: Uuid, new: NewProject) -> AppResult<Project>
    where
        C: ConnectionTrait,
    {
        if let Some(user) = new.user_id {
            ProfileRepository::ensure_active(conn, user).await?;
        }
        Self::check_client(conn, actor, new.client_id).await?;
        Self::check_parent(conn, new.user_id, new.creator_id, new.parent_id, None, false).await?;

        let model = Self::insert_row(conn, &new).await?;
        DayRepository::reconcile(conn, model.id, new.days).await?;
        Self::refresh_bounds(conn, model.id, model.parent_id).await?;

        Self::find(conn, model.id).await
    }

    async fn insert_row<C>(conn: &C, new: &NewProject) -> AppResult<project::Model>
    where
        C: ConnectionTrait,
    {
        let (money, money_per_day, money_calculating) = new.pricing.to_columns();
        let now = OffsetDateTime::now_utc();

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            creator_id: Set(new.creator_id),
            client_id: Set(new.client_id),
            parent_id: Set(new.parent_id),
            title: Set(new.title.clone()),
            money: Set(money),
            money_per_day: Set(money_per_day),
            money_calculating: Set(money_calculating),
            info: Set(new.info.clone()),
            is_paid: Set(new.is_paid),
            is_wait: Set(new.is_wait),
            confirmed: Set(new.confirmed),
            canceled: Set(None),
            date_start: Set(None),
            date_end: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(conn).await?)
    }

    /// Write an in-place update planned by the workflow
    async fn apply<C>(
        conn: &C,
        project: &Project,
        has_children: bool,
        actor: Uuid,
        patch: ProjectPatch,
        flags: Flags,
    ) -> AppResult<Project>
    where
        C: ConnectionTrait,
    {
        if let Some(parent) = patch.parent() {
            Self::check_parent(
                conn,
                project.user_id,
                project.creator_id,
                parent,
                Some(project.id),
                has_children,
            )
            .await?;
        }

        let mut updated = project.clone();
        patch.apply_to(&mut updated);
        if updated.client_id != project.client_id {
            Self::check_client(conn, actor, updated.client_id).await?;
        }

        let (money, money_per_day, money_calculating) = updated.pricing.to_columns();
        let active = ActiveModel {
            id: Set(project.id),
            title: Set(updated.title),
            info: Set(updated.info),
            client_id: Set(updated.client_id),
            parent_id: Set(updated.parent_id),
            money: Set(money),
            money_per_day: Set(money_per_day),
            money_calculating: Set(money_calculating),
            is_paid: Set(updated.is_paid),
            is_wait: Set(flags.is_wait),
            confirmed: Set(flags.confirmed),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        };
        active.update(conn).await?;

        if let Some(days) = patch.days {
            DayRepository::reconcile(conn, project.id, days).await?;
        }

        Self::refresh_bounds(conn, project.id, updated.parent_id).await?;
        if let Some(old_parent) = project.parent_id.filter(|p| Some(*p) != updated.parent_id) {
            Self::write_bounds(conn, old_parent).await?;
        }

        Self::find(conn, project.id).await
    }

    async fn cancel<C>(conn: &C, project: &Project, party: Party) -> AppResult<Project>
    where
        C: ConnectionTrait,
    {
        let flags = Flags::CANCELED;
        let active = ActiveModel {
            id: Set(project.id),
            canceled: Set(Some(party.as_str().to_string())),
            is_wait: Set(flags.is_wait),
            confirmed: Set(flags.confirmed),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        };

        Ok(active.update(conn).await?.into())
    }

    /// Delete the row and its days; a folder left without children goes too
    async fn purge<C>(conn: &C, project: &Project) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        DayRepository::delete_for_project(conn, project.id).await?;
        ProjectEntity::delete_by_id(project.id).exec(conn).await?;

        if let Some(parent_id) = project.parent_id {
            if Self::has_children(conn, parent_id).await? {
                Self::write_bounds(conn, parent_id).await?;
            } else {
                DayRepository::delete_for_project(conn, parent_id).await?;
                ProjectEntity::delete_by_id(parent_id).exec(conn).await?;
                tracing::info!(project_id = %parent_id, "Empty folder deleted");
            }
        }

        DayRepository::collect_orphans(conn).await?;
        Ok(())
    }

    /// Recompute the bounds of a project and of its parent folder
    async fn refresh_bounds<C>(conn: &C, project_id: Uuid, parent_id: Option<Uuid>) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        Self::write_bounds(conn, project_id).await?;
        if let Some(parent_id) = parent_id {
            Self::write_bounds(conn, parent_id).await?;
        }
        Ok(())
    }

    /// Bounds come from the children's days for a folder, from own days otherwise
    async fn write_bounds<C>(conn: &C, project_id: Uuid) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let children = Self::child_ids(conn, project_id).await?;
        let sources = if children.is_empty() {
            vec![project_id]
        } else {
            children
        };

        let days = DayRepository::for_projects(conn, &sources).await?;
        let (date_start, date_end) = bounds_of(days.iter().map(|d| d.date));

        ActiveModel {
            id: Set(project_id),
            date_start: Set(date_start),
            date_end: Set(date_end),
            ..Default::default()
        }
        .update(conn)
        .await?;

        Ok(())
    }

    async fn check_client<C>(conn: &C, actor: Uuid, client_id: Option<Uuid>) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let Some(client_id) = client_id else {
            return Ok(());
        };

        let count = client::Entity::find_by_id(client_id)
            .filter(client::Column::ProfileId.eq(actor))
            .count(conn)
            .await?;
        if count == 0 {
            return Err(AppError::NotFound("Client".to_string()));
        }
        Ok(())
    }

    /// Folders are one level deep and group projects of one owner and creator
    async fn check_parent<C>(
        conn: &C,
        user_id: Option<Uuid>,
        creator_id: Option<Uuid>,
        parent_id: Option<Uuid>,
        child_id: Option<Uuid>,
        child_has_children: bool,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };

        if Some(parent_id) == child_id {
            return Err(AppError::Validation(
                "A project cannot be its own parent".to_string(),
            ));
        }
        if child_has_children {
            return Err(AppError::Validation(
                "A folder cannot be put into another folder".to_string(),
            ));
        }

        let parent = Self::find(conn, parent_id).await?;
        if parent.parent_id.is_some() {
            return Err(AppError::Validation(
                "Folders can only be nested one level deep".to_string(),
            ));
        }
        if matches!(
            workflow::ProjectState::of(&parent),
            workflow::ProjectState::Canceled(_) | workflow::ProjectState::DaysOff
        ) {
            return Err(AppError::Validation(
                "Parent cannot hold projects".to_string(),
            ));
        }
        if parent.user_id != user_id || parent.creator_id != creator_id {
            return Err(AppError::Validation(
                "Parent must have the same owner and creator".to_string(),
            ));
        }
        Ok(())
    }
}

// Conversion from SeaORM model to our domain model
impl From<project::Model> for Project {
    fn from(m: project::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            creator_id: m.creator_id,
            client_id: m.client_id,
            parent_id: m.parent_id,
            title: m.title,
            pricing: Pricing::from_columns(m.money, m.money_per_day, m.money_calculating),
            info: m.info,
            is_paid: m.is_paid,
            is_wait: m.is_wait,
            confirmed: m.confirmed,
            canceled: m.canceled.as_deref().and_then(Party::parse),
            date_start: m.date_start,
            date_end: m.date_end,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

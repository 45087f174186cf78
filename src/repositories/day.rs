use std::collections::HashMap;

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use time::Date;
use uuid::Uuid;

use crate::entity::day::{self, ActiveModel, Column, Entity as DayEntity};
use crate::entity::project;
use crate::error::AppResult;
use crate::models::{CalendarDay, Day, DayEntry, Project};
use crate::services::days::{plan_day_set, DayPlan};

/// Day repository. Every method takes the caller's connection so it can run
/// inside the transaction of a project mutation.
pub struct DayRepository;

impl DayRepository {
    pub async fn for_project<C>(conn: &C, project_id: Uuid) -> AppResult<Vec<Day>>
    where
        C: ConnectionTrait,
    {
        Self::for_projects(conn, &[project_id]).await
    }

    pub async fn for_projects<C>(conn: &C, project_ids: &[Uuid]) -> AppResult<Vec<Day>>
    where
        C: ConnectionTrait,
    {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = DayEntity::find()
            .filter(Column::ProjectId.is_in(project_ids.iter().copied()))
            .order_by_asc(Column::Date)
            .all(conn)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Bring the project's day rows in line with `entries` and return the
    /// applied plan (its bounds are the project's new own bounds)
    pub async fn reconcile<C>(conn: &C, project_id: Uuid, entries: Vec<DayEntry>) -> AppResult<DayPlan>
    where
        C: ConnectionTrait,
    {
        let existing = Self::for_project(conn, project_id).await?;
        let plan = plan_day_set(&existing, entries);

        if !plan.remove.is_empty() {
            DayEntity::delete_many()
                .filter(Column::Id.is_in(plan.remove.iter().copied()))
                .exec(conn)
                .await?;
        }

        for (day_id, info) in &plan.renote {
            DayEntity::update_many()
                .col_expr(Column::Info, Expr::value(info.clone()))
                .filter(Column::Id.eq(*day_id))
                .exec(conn)
                .await?;
        }

        if !plan.create.is_empty() {
            let rows = plan.create.iter().map(|entry| ActiveModel {
                id: Set(Uuid::new_v4()),
                project_id: Set(Some(project_id)),
                date: Set(entry.date),
                info: Set(entry.info.clone()),
            });

            // A concurrent writer may have inserted the same date already
            DayEntity::insert_many(rows)
                .on_conflict(
                    OnConflict::columns([Column::ProjectId, Column::Date])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(conn)
                .await?;
        }
        Self::collect_orphans(conn).await?;

        tracing::debug!(
            project_id = %project_id,
            created = plan.create.len(),
            removed = plan.remove.len(),
            renoted = plan.renote.len(),
            "Day set reconciled"
        );

        Ok(plan)
    }

    /// Add `date` to the project if absent, remove it otherwise.
    /// Returns whether the date is present afterwards.
    pub async fn toggle<C>(conn: &C, project_id: Uuid, date: Date) -> AppResult<bool>
    where
        C: ConnectionTrait,
    {
        let existing = DayEntity::find()
            .filter(Column::ProjectId.eq(project_id))
            .filter(Column::Date.eq(date))
            .one(conn)
            .await?;

        let is_present = match existing {
            Some(day) => {
                DayEntity::delete_by_id(day.id).exec(conn).await?;
                false
            }
            None => {
                Self::insert_date(conn, project_id, date).await?;
                true
            }
        };
        Self::collect_orphans(conn).await?;

        Ok(is_present)
    }

    async fn insert_date<C>(conn: &C, project_id: Uuid, date: Date) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        DayEntity::insert(ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(Some(project_id)),
            date: Set(date),
            info: Set(None),
        })
        .on_conflict(
            OnConflict::columns([Column::ProjectId, Column::Date])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
        Ok(())
    }

    pub async fn delete_for_project<C>(conn: &C, project_id: Uuid) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = DayEntity::delete_many()
            .filter(Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete days whose project is gone
    pub async fn collect_orphans<C>(conn: &C) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = DayEntity::delete_many()
            .filter(Column::ProjectId.is_null())
            .exec(conn)
            .await?;

        if result.rows_affected > 0 {
            tracing::debug!(removed = result.rows_affected, "Orphan days collected");
        }
        Ok(result.rows_affected)
    }

    /// Days of every project on `owner`'s calendar within the range
    pub async fn calendar_days(
        db: &DatabaseConnection,
        owner: Uuid,
        start: Option<Date>,
        end: Option<Date>,
    ) -> AppResult<Vec<CalendarDay>> {
        let projects = project::Entity::find()
            .filter(project::Column::UserId.eq(owner))
            .filter(project::Column::Canceled.is_null())
            .all(db)
            .await?;

        Self::join_days(db, projects, start, end).await
    }

    /// Days of the projects `asker` offered to someone else or left open
    pub async fn offer_days(
        db: &DatabaseConnection,
        asker: Uuid,
        start: Option<Date>,
        end: Option<Date>,
    ) -> AppResult<Vec<CalendarDay>> {
        let projects = project::Entity::find()
            .filter(project::Column::CreatorId.eq(asker))
            .filter(
                project::Column::UserId
                    .ne(asker)
                    .or(project::Column::UserId.is_null()),
            )
            .filter(project::Column::Canceled.is_null())
            .all(db)
            .await?;

        Self::join_days(db, projects, start, end).await
    }

    async fn join_days(
        db: &DatabaseConnection,
        projects: Vec<project::Model>,
        start: Option<Date>,
        end: Option<Date>,
    ) -> AppResult<Vec<CalendarDay>> {
        if projects.is_empty() {
            return Ok(Vec::new());
        }

        let by_id: HashMap<Uuid, Project> = projects
            .into_iter()
            .map(|m| (m.id, Project::from(m)))
            .collect();

        let mut query = DayEntity::find()
            .filter(Column::ProjectId.is_in(by_id.keys().copied()))
            .order_by_asc(Column::Date);
        if let Some(start) = start {
            query = query.filter(Column::Date.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(Column::Date.lte(end));
        }

        let days = query
            .all(db)
            .await?
            .into_iter()
            .filter_map(|day| {
                let project = by_id.get(&day.project_id?)?;
                Some(CalendarDay {
                    date: day.date,
                    info: day.info,
                    project: project.clone(),
                })
            })
            .collect();

        Ok(days)
    }
}

impl From<day::Model> for Day {
    fn from(m: day::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            date: m.date,
            info: m.info,
        }
    }
}

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::entity::profile::{self, ActiveModel, Column, Entity as ProfileEntity};
use crate::entity::{client, profile_tag, project};
use crate::error::{AppError, AppResult};
use crate::models::{CreateProfile, Profile, UpdateProfile};
use crate::repositories::{DayRepository, Repository};

/// Profile repository for database operations
pub struct ProfileRepository;

#[async_trait]
impl Repository<Profile> for ProfileRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Profile> {
        let model = ProfileEntity::find_by_id(id)
            .filter(Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        Ok(model.into())
    }

    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let result = ProfileEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Profile".to_string()));
        }

        DayRepository::collect_orphans(db).await?;
        Ok(())
    }

    /// Public profiles only
    async fn list(db: &DatabaseConnection, limit: u64, offset: u64) -> AppResult<Vec<Profile>> {
        let models = ProfileEntity::find()
            .filter(Column::IsPublic.eq(true))
            .filter(Column::IsDeleted.eq(false))
            .order_by_asc(Column::Username)
            .paginate(db, limit)
            .fetch_page(offset / limit)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count(db: &DatabaseConnection) -> AppResult<u64> {
        let count = ProfileEntity::find()
            .filter(Column::IsPublic.eq(true))
            .filter(Column::IsDeleted.eq(false))
            .count(db)
            .await?;
        Ok(count)
    }
}

impl ProfileRepository {
    /// Create a profile, reclaiming unconfirmed profiles that hold the same
    /// username or email.
    ///
    /// A confirmed holder makes the signup fail with `Conflict`.
    pub async fn signup(
        db: &DatabaseConnection,
        input: &CreateProfile,
        password_hash: &str,
        confirmation_code: &str,
    ) -> AppResult<Profile> {
        let txn = db.begin().await?;

        let mut holders_filter = Condition::any().add(Column::Username.eq(input.username.as_str()));
        if let Some(email) = &input.email {
            holders_filter = holders_filter.add(Column::Email.eq(email.as_str()));
        }

        let mut holders: Vec<Profile> = ProfileEntity::find()
            .filter(Column::IsDeleted.eq(false))
            .filter(holders_filter)
            .all(&txn)
            .await?
            .into_iter()
            .map(Profile::from)
            .collect();

        if let Some(taken) = holders.iter().find(|p| p.is_confirmed()) {
            let what = if taken.username == input.username {
                "Username"
            } else {
                "Email"
            };
            return Err(AppError::Conflict(what.to_string()));
        }

        // Keep the row holding the username; the others give way
        holders.sort_by_key(|p| p.username != input.username);
        let mut holders = holders.into_iter();
        let reclaimed = holders.next();
        for stale in holders {
            ProfileEntity::delete_by_id(stale.id).exec(&txn).await?;
        }

        let now = OffsetDateTime::now_utc();
        let model = match reclaimed {
            Some(existing) => {
                tracing::info!(profile_id = %existing.id, "Reclaiming unconfirmed profile");
                let mut active: ActiveModel = ProfileEntity::find_by_id(existing.id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Profile".to_string()))?
                    .into();

                active.username = Set(input.username.clone());
                active.email = Set(input.email.clone());
                active.phone = Set(input.phone.clone());
                active.password_hash = Set(password_hash.to_string());
                active.display_name = Set(input.display_name.clone());
                active.email_confirmed = Set(false);
                active.phone_confirmed = Set(false);
                active.confirmation_code = Set(Some(confirmation_code.to_string()));
                active.is_public = Set(false);
                active.created_at = Set(now);
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                ActiveModel {
                    id: Set(Uuid::new_v4()),
                    username: Set(input.username.clone()),
                    email: Set(input.email.clone()),
                    phone: Set(input.phone.clone()),
                    password_hash: Set(password_hash.to_string()),
                    display_name: Set(input.display_name.clone()),
                    email_confirmed: Set(false),
                    phone_confirmed: Set(false),
                    telegram_chat_id: Set(None),
                    facebook_id: Set(None),
                    confirmation_code: Set(Some(confirmation_code.to_string())),
                    is_public: Set(false),
                    is_deleted: Set(false),
                    last_activity: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        Ok(model.into())
    }

    /// Whether a signup with this username would succeed
    pub async fn username_available(db: &DatabaseConnection, username: &str) -> AppResult<bool> {
        let holder = ProfileEntity::find()
            .filter(Column::Username.eq(username))
            .filter(Column::IsDeleted.eq(false))
            .one(db)
            .await?;

        Ok(holder.is_none_or(|m| !Profile::from(m).is_confirmed()))
    }

    pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> AppResult<Profile> {
        let model = ProfileEntity::find()
            .filter(Column::Username.eq(username))
            .filter(Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        Ok(model.into())
    }

    /// Check that a profile exists and can be put on a project
    pub async fn ensure_active<C>(conn: &C, id: Uuid) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let count = ProfileEntity::find_by_id(id)
            .filter(Column::IsDeleted.eq(false))
            .count(conn)
            .await?;

        if count == 0 {
            return Err(AppError::NotFound("Profile".to_string()));
        }
        Ok(())
    }

    /// Confirm the email address with the code sent at signup
    pub async fn confirm(db: &DatabaseConnection, username: &str, code: &str) -> AppResult<Profile> {
        let model = ProfileEntity::find()
            .filter(Column::Username.eq(username))
            .filter(Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        if model.confirmation_code.as_deref() != Some(code) {
            return Err(AppError::Validation("Invalid confirmation code".to_string()));
        }

        let mut active: ActiveModel = model.into();
        active.email_confirmed = Set(true);
        active.confirmation_code = Set(None);
        active.updated_at = Set(OffsetDateTime::now_utc());

        let profile: Profile = active.update(db).await?.into();
        tracing::info!(profile_id = %profile.id, "Profile confirmed");
        Ok(profile)
    }

    /// Update profile settings. A profile can only be public with a confirmed phone.
    pub async fn update(db: &DatabaseConnection, id: Uuid, input: &UpdateProfile) -> AppResult<Profile> {
        let model = ProfileEntity::find_by_id(id)
            .filter(Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        let mut phone_confirmed = model.phone_confirmed;
        let mut is_public = model.is_public;
        let mut active: ActiveModel = model.clone().into();

        if let Some(display_name) = &input.display_name {
            active.display_name = Set(Some(display_name.clone()));
        }
        if let Some(phone) = &input.phone {
            if model.phone.as_deref() != Some(phone.as_str()) {
                active.phone = Set(Some(phone.clone()));
                phone_confirmed = false;
                active.phone_confirmed = Set(false);
            }
        }
        if let Some(public) = input.is_public {
            is_public = public;
        }
        active.is_public = Set(is_public && phone_confirmed);
        active.updated_at = Set(OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }

    pub async fn touch(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        ProfileEntity::update_many()
            .col_expr(Column::LastActivity, Expr::value(OffsetDateTime::now_utc()))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Soft delete: the row stays for projects other parties still hold,
    /// everything personal goes.
    pub async fn soft_delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let txn = db.begin().await?;

        let model = ProfileEntity::find_by_id(id)
            .filter(Column::IsDeleted.eq(false))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        // Self-owned and days-off projects, then open offers
        project::Entity::delete_many()
            .filter(project::Column::UserId.eq(id))
            .filter(
                Condition::any()
                    .add(project::Column::CreatorId.eq(id))
                    .add(project::Column::CreatorId.is_null()),
            )
            .exec(&txn)
            .await?;
        project::Entity::delete_many()
            .filter(project::Column::UserId.is_null())
            .filter(project::Column::CreatorId.eq(id))
            .exec(&txn)
            .await?;

        client::Entity::delete_many()
            .filter(client::Column::ProfileId.eq(id))
            .exec(&txn)
            .await?;
        profile_tag::Entity::delete_many()
            .filter(profile_tag::Column::ProfileId.eq(id))
            .exec(&txn)
            .await?;

        let mut active: ActiveModel = model.into();
        active.username = Set(format!("deleted-{}", id.simple()));
        active.email = Set(None);
        active.phone = Set(None);
        active.display_name = Set(None);
        active.telegram_chat_id = Set(None);
        active.facebook_id = Set(None);
        active.confirmation_code = Set(None);
        active.is_public = Set(false);
        active.is_deleted = Set(true);
        active.updated_at = Set(OffsetDateTime::now_utc());
        active.update(&txn).await?;

        DayRepository::collect_orphans(&txn).await?;
        txn.commit().await?;

        tracing::info!(profile_id = %id, "Profile soft-deleted");
        Ok(())
    }

    /// Hard delete a profile that is still unconfirmed once `ttl` has passed
    /// since signup. Returns whether anything was removed.
    pub async fn delete_if_unconfirmed(
        db: &DatabaseConnection,
        id: Uuid,
        ttl: Duration,
    ) -> AppResult<bool> {
        let Some(model) = ProfileEntity::find_by_id(id).one(db).await? else {
            return Ok(false);
        };

        let profile = Profile::from(model);
        let expired = profile.created_at + ttl <= OffsetDateTime::now_utc();
        if profile.is_deleted || profile.is_confirmed() || !expired {
            return Ok(false);
        }

        <Self as Repository<Profile>>::delete(db, id).await?;
        Ok(true)
    }
}

// Conversion from SeaORM model to our domain model
impl From<profile::Model> for Profile {
    fn from(m: profile::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            phone: m.phone,
            password_hash: m.password_hash,
            display_name: m.display_name,
            email_confirmed: m.email_confirmed,
            phone_confirmed: m.phone_confirmed,
            telegram_chat_id: m.telegram_chat_id,
            facebook_id: m.facebook_id,
            confirmation_code: m.confirmation_code,
            is_public: m.is_public,
            is_deleted: m.is_deleted,
            last_activity: m.last_activity,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entity::client::{self, ActiveModel, Column, Entity as ClientEntity};
use crate::entity::project;
use crate::error::{AppError, AppResult};
use crate::models::{Client, ClientSearch, CreateClient, UpdateClient};

/// Client repository for database operations
pub struct ClientRepository;

impl ClientRepository {
    pub async fn create(
        db: &DatabaseConnection,
        profile_id: Uuid,
        input: &CreateClient,
    ) -> AppResult<Client> {
        let now = OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            profile_id: Set(profile_id),
            name: Set(input.name.clone()),
            company: Set(input.company.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// Find client by ID and verify ownership
    pub async fn find_by_id_and_profile(
        db: &DatabaseConnection,
        id: Uuid,
        profile_id: Uuid,
    ) -> AppResult<Client> {
        let model = ClientEntity::find_by_id(id)
            .filter(Column::ProfileId.eq(profile_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        Ok(model.into())
    }

    /// Search a profile's clients; `filter` matches name or company
    pub async fn search(
        db: &DatabaseConnection,
        profile_id: Uuid,
        search: &ClientSearch,
    ) -> AppResult<Vec<Client>> {
        let mut query = ClientEntity::find().filter(Column::ProfileId.eq(profile_id));

        if let Some(filter) = search.filter.as_deref().filter(|f| !f.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(Column::Name.contains(filter))
                    .add(Column::Company.contains(filter)),
            );
        }
        if let Some(name) = search.name.as_deref().filter(|n| !n.is_empty()) {
            query = query.filter(Column::Name.contains(name));
        }
        if let Some(company) = search.company.as_deref().filter(|c| !c.is_empty()) {
            query = query.filter(Column::Company.contains(company));
        }

        let models = query.order_by_asc(Column::Name).all(db).await?;
        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Distinct company names across a profile's clients
    pub async fn companies(db: &DatabaseConnection, profile_id: Uuid) -> AppResult<Vec<String>> {
        let companies = ClientEntity::find()
            .select_only()
            .column(Column::Company)
            .distinct()
            .filter(Column::ProfileId.eq(profile_id))
            .filter(Column::Company.is_not_null())
            .order_by_asc(Column::Company)
            .into_tuple::<Option<String>>()
            .all(db)
            .await?;

        Ok(companies.into_iter().flatten().collect())
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        profile_id: Uuid,
        input: &UpdateClient,
    ) -> AppResult<Client> {
        let model = ClientEntity::find_by_id(id)
            .filter(Column::ProfileId.eq(profile_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        let mut active: ActiveModel = model.into();

        if let Some(name) = &input.name {
            active.name = Set(name.clone());
        }
        if let Some(company) = &input.company {
            active.company = Set(Some(company.clone()).filter(|c| !c.is_empty()));
        }
        active.updated_at = Set(OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }

    /// Delete client (with ownership check). Projects keep running without it.
    pub async fn delete_by_profile(db: &DatabaseConnection, id: Uuid, profile_id: Uuid) -> AppResult<()> {
        Self::find_by_id_and_profile(db, id, profile_id).await?;

        let txn = db.begin().await?;
        project::Entity::update_many()
            .col_expr(project::Column::ClientId, Expr::value(Option::<Uuid>::None))
            .filter(project::Column::ClientId.eq(id))
            .exec(&txn)
            .await?;
        ClientEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(())
    }
}

impl From<client::Model> for Client {
    fn from(m: client::Model) -> Self {
        Self {
            id: m.id,
            profile_id: m.profile_id,
            name: m.name,
            company: m.company,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Calendar owner; null for an open offer
    pub user_id: Option<Uuid>,
    /// Proposer; null for the days-off project
    pub creator_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub money: Option<i64>,
    pub money_per_day: Option<i64>,
    pub money_calculating: bool,
    #[sea_orm(column_type = "Text")]
    pub info: String,
    pub is_paid: bool,
    pub is_wait: bool,
    pub confirmed: bool,
    /// "user" or "creator"
    pub canceled: Option<String>,
    pub date_start: Option<TimeDate>,
    pub date_end: Option<TimeDate>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::CreatorId",
        to = "super::profile::Column::Id",
        on_delete = "SetNull"
    )]
    Creator,
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "SetNull"
    )]
    Client,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Parent,
    #[sea_orm(has_many = "super::day::Entity")]
    Days,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::day::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Days.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

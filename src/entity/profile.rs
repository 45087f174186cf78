use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub email_confirmed: bool,
    pub phone_confirmed: bool,
    pub telegram_chat_id: Option<i64>,
    pub facebook_id: Option<String>,
    pub confirmation_code: Option<String>,
    pub is_public: bool,
    pub is_deleted: bool,
    pub last_activity: Option<TimeDateTimeWithTimeZone>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::client::Entity")]
    Clients,
    #[sea_orm(has_many = "super::profile_tag::Entity")]
    ProfileTags,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::profile_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfileTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

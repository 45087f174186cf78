use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profile_tag::Entity")]
    ProfileTags,
}

impl Related<super::profile_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfileTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use std::collections::HashMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entity::profile_tag;
use crate::entity::tag::{self, Column, Entity as TagEntity};
use crate::error::AppResult;
use crate::models::{RankedTag, Tag};

/// Tags are shared by title; profiles attach them with a rank.
pub struct TagRepository;

impl TagRepository {
    /// Tags whose title starts with `prefix`, alphabetically
    pub async fn search(db: &DatabaseConnection, prefix: &str, limit: u64) -> AppResult<Vec<Tag>> {
        let models = TagEntity::find()
            .filter(Column::Title.starts_with(prefix))
            .order_by_asc(Column::Title)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    pub async fn for_profile(db: &DatabaseConnection, profile_id: Uuid) -> AppResult<Vec<RankedTag>> {
        let rows = profile_tag::Entity::find()
            .filter(profile_tag::Column::ProfileId.eq(profile_id))
            .order_by_asc(profile_tag::Column::Rank)
            .find_also_related(TagEntity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, tag)| {
                tag.map(|t| RankedTag {
                    tag: t.into(),
                    rank: link.rank,
                })
            })
            .collect())
    }

    /// Replace the profile's tags with `titles`; position in the list is the rank.
    /// Unknown titles are created.
    pub async fn set_for_profile(
        db: &DatabaseConnection,
        profile_id: Uuid,
        titles: &[String],
    ) -> AppResult<Vec<RankedTag>> {
        let mut seen = Vec::new();
        for title in titles.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !seen.iter().any(|s: &String| s == title) {
                seen.push(title.to_string());
            }
        }

        let txn = db.begin().await?;

        if !seen.is_empty() {
            let rows = seen.iter().map(|title| tag::ActiveModel {
                id: Set(Uuid::new_v4()),
                title: Set(title.clone()),
            });
            TagEntity::insert_many(rows)
                .on_conflict(OnConflict::column(Column::Title).do_nothing().to_owned())
                .exec_without_returning(&txn)
                .await?;
        }

        let ids: HashMap<String, Uuid> = TagEntity::find()
            .filter(Column::Title.is_in(seen.iter().cloned()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|t| (t.title, t.id))
            .collect();

        profile_tag::Entity::delete_many()
            .filter(profile_tag::Column::ProfileId.eq(profile_id))
            .exec(&txn)
            .await?;

        let links: Vec<profile_tag::ActiveModel> = seen
            .iter()
            .enumerate()
            .filter_map(|(rank, title)| {
                let tag_id = *ids.get(title)?;
                Some(profile_tag::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    profile_id: Set(profile_id),
                    tag_id: Set(tag_id),
                    rank: Set(rank as i32),
                })
            })
            .collect();

        if !links.is_empty() {
            profile_tag::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        tracing::debug!(profile_id = %profile_id, count = seen.len(), "Profile tags replaced");

        Self::for_profile(db, profile_id).await
    }
}

impl From<tag::Model> for Tag {
    fn from(m: tag::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
        }
    }
}

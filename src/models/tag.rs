use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
}

/// A tag attached to a profile at a given rank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTag {
    pub tag: Tag,
    pub rank: i32,
}

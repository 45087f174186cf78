use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub company: Option<String>,
}

/// Search filters for a profile's clients
#[derive(Debug, Default, Deserialize)]
pub struct ClientSearch {
    /// Matches name or company
    pub filter: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)] // Never expose password hash
    pub password_hash: String,
    pub display_name: Option<String>,
    pub email_confirmed: bool,
    pub phone_confirmed: bool,
    pub telegram_chat_id: Option<i64>,
    pub facebook_id: Option<String>,
    #[serde(skip_serializing)]
    pub confirmation_code: Option<String>,
    pub is_public: bool,
    pub is_deleted: bool,
    pub last_activity: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Profile {
    /// Confirmed through email, phone or a linked social login
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed
            || self.phone_confirmed
            || self.telegram_chat_id.is_some()
            || self.facebook_id.is_some()
    }
}

/// Profile creation DTO (without id and timestamps)
#[derive(Debug, Deserialize)]
pub struct CreateProfile {
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    pub display_name: Option<String>,
}

/// Profile update DTO
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub is_public: Option<bool>,
}

/// Public profile response (safe to return via API)
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub is_confirmed: bool,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: OffsetDateTime,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            is_confirmed: profile.is_confirmed(),
            username: profile.username,
            display_name: profile.display_name,
            is_public: profile.is_public,
            created_at: profile.created_at,
        }
    }
}

/// What the profile owner sees about themselves
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileSelfResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub email_confirmed: bool,
    pub phone_confirmed: bool,
}

impl From<Profile> for ProfileSelfResponse {
    fn from(profile: Profile) -> Self {
        Self {
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            email_confirmed: profile.email_confirmed,
            phone_confirmed: profile.phone_confirmed,
            profile: profile.into(),
        }
    }
}

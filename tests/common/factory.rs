use time::Date;
use uuid::Uuid;

use dayspick::models::{
    Client, CreateClient, CreateProfile, DayEntry, NewProject, Pricing, Profile, Project,
};
use dayspick::repositories::{ClientRepository, ProfileRepository, ProjectRepository};
use dayspick::services::AuthService;
use dayspick::state::AppState;

pub const PASSWORD: &str = "TestPassword123!";

/// Authentication info for tests
#[allow(dead_code)]
pub struct TestAuth {
    pub profile_id: Uuid,
    pub username: String,
    pub token: String,
}

impl TestAuth {
    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

#[allow(dead_code)]
impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Signed-up profile that never confirmed
    pub async fn create_unconfirmed(&self, username: &str, email: &str) -> Profile {
        let input = CreateProfile {
            username: username.to_string(),
            email: Some(email.to_string()),
            phone: None,
            password: PASSWORD.to_string(),
            display_name: None,
        };

        let password_hash = AuthService::hash_password(PASSWORD).unwrap();
        ProfileRepository::signup(&self.state.db, &input, &password_hash, "123456")
            .await
            .unwrap()
    }

    /// Create a confirmed profile and return auth info
    pub async fn create_profile(&self) -> TestAuth {
        let suffix = Uuid::new_v4().simple().to_string();
        let username = format!("user_{}", &suffix[..12]);
        let email = format!("{}@example.com", username);

        self.create_unconfirmed(&username, &email).await;
        let profile = ProfileRepository::confirm(&self.state.db, &username, "123456")
            .await
            .unwrap();

        let token =
            AuthService::generate_token(profile.id, &profile.username, &self.state.config).unwrap();

        TestAuth {
            profile_id: profile.id,
            username,
            token,
        }
    }

    /// Create a project as `creator` on `user`'s calendar (`None` for an open offer)
    pub async fn create_project(
        &self,
        creator: Uuid,
        user: Option<Uuid>,
        dates: &[Date],
    ) -> Project {
        let new = NewProject {
            user_id: user,
            creator_id: Some(creator),
            client_id: None,
            parent_id: None,
            title: format!("Project {}", Uuid::new_v4()),
            pricing: Pricing::Unpriced,
            info: String::new(),
            is_paid: false,
            is_wait: false,
            confirmed: false,
            days: dates.iter().map(|d| DayEntry::new(*d, None)).collect(),
        };

        let (project, _) = ProjectRepository::create(&self.state.db, creator, new)
            .await
            .unwrap();
        project
    }

    pub async fn create_client(&self, profile_id: Uuid, name: &str, company: Option<&str>) -> Client {
        let input = CreateClient {
            name: name.to_string(),
            company: company.map(str::to_string),
        };

        ClientRepository::create(&self.state.db, profile_id, &input)
            .await
            .unwrap()
    }
}

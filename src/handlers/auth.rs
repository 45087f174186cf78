use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};
use crate::handlers::common::validate_required;
use crate::middlewares::AuthUser;
use crate::models::{CreateProfile, ProfileSelfResponse};
use crate::queue::{QueuedTask, TaskKind};
use crate::repositories::{ProfileRepository, Repository};
use crate::services::notification;
use crate::services::AuthService;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityParams {
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub username: String,
    pub available: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub profile: ProfileSelfResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ConfirmParams {
    /// Username the code was sent for
    pub user: String,
    pub code: String,
}

fn validate_username(username: &str) -> AppResult<()> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');

    if username.len() < 3 || username.len() > 64 || !valid_chars {
        return Err(AppError::Validation(
            "Username must be 3-64 characters of letters, digits, '.', '_' or '-'".to_string(),
        ));
    }
    // Reserved for soft-deleted profiles
    if username.starts_with("deleted-") {
        return Err(AppError::Validation("Username is reserved".to_string()));
    }
    Ok(())
}

// ============ Handlers ============

/// Check whether a username can be registered
#[utoipa::path(
    get,
    path = "/api/auth/signup",
    params(AvailabilityParams),
    responses(
        (status = 200, description = "Availability of the username", body = AvailabilityResponse)
    ),
    tag = "Auth"
)]
pub async fn signup_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> AppResult<Json<AvailabilityResponse>> {
    let username = params.username.trim().to_string();
    let available = validate_username(&username).is_ok()
        && ProfileRepository::username_available(&state.db, &username).await?;

    Ok(Json(AvailabilityResponse {
        username,
        available,
    }))
}

/// Register a new profile. It stays unusable until confirmed.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Profile created, confirmation pending", body = ProfileSelfResponse),
        (status = 409, description = "Username or email taken by a confirmed profile"),
        (status = 400, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<Json<ProfileSelfResponse>> {
    let username = validate_required(payload.username, "Username")?;
    validate_username(&username)?;

    let password = payload.password.unwrap_or_default();
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    if email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(AppError::Validation("Invalid email".to_string()));
    }
    let phone = payload
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if email.is_none() && phone.is_none() {
        return Err(AppError::Validation(
            "Email or phone is required".to_string(),
        ));
    }

    let input = CreateProfile {
        username,
        email,
        phone,
        password,
        display_name: payload.display_name,
    };

    let password_hash = AuthService::hash_password(&input.password)?;
    let code = AuthService::confirmation_code();
    let profile = ProfileRepository::signup(&state.db, &input, &password_hash, &code).await?;

    tracing::info!(profile_id = %profile.id, username = %profile.username, "Profile signed up");

    let queue = state.task_queue.as_ref();
    notification::schedule(
        queue,
        QueuedTask::new(TaskKind::SendConfirmation {
            profile_id: profile.id,
            email: profile.email.clone(),
            code,
        }),
    )
    .await;
    notification::schedule(
        queue,
        QueuedTask::new(TaskKind::SweepUnconfirmed {
            profile_id: profile.id,
        })
        .delayed(time::Duration::minutes(state.config.unconfirmed_ttl_minutes)),
    )
    .await;

    Ok(Json(profile.into()))
}

/// Confirm a profile with the code sent at signup
#[utoipa::path(
    get,
    path = "/api/auth/confirm",
    params(ConfirmParams),
    responses(
        (status = 200, description = "Profile confirmed", body = AuthResponse),
        (status = 400, description = "Wrong code"),
        (status = 404, description = "Profile not found")
    ),
    tag = "Auth"
)]
pub async fn confirm(
    State(state): State<AppState>,
    Query(params): Query<ConfirmParams>,
) -> AppResult<Json<AuthResponse>> {
    let profile = ProfileRepository::confirm(&state.db, &params.user, params.code.trim()).await?;
    let token = AuthService::generate_token(profile.id, &profile.username, &state.config)?;

    Ok(Json(AuthResponse {
        token,
        profile: profile.into(),
    }))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Profile not confirmed yet")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let profile = ProfileRepository::find_by_username(&state.db, payload.username.trim())
        .await
        .map_err(|_| AppError::InvalidCredentials)?;

    let is_valid = AuthService::verify_password(&payload.password, &profile.password_hash)?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }
    if !profile.is_confirmed() {
        return Err(AppError::Forbidden("Profile is not confirmed".to_string()));
    }

    ProfileRepository::touch(&state.db, profile.id).await?;
    let token = AuthService::generate_token(profile.id, &profile.username, &state.config)?;

    Ok(Json(AuthResponse {
        token,
        profile: profile.into(),
    }))
}

/// Get current authenticated profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current profile", body = ProfileSelfResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ProfileSelfResponse>> {
    let profile = ProfileRepository::find_by_id(&state.db, user.id).await?;
    Ok(Json(profile.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("anna_k").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("deleted-1234").is_err());
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::common::validate_required;
use crate::middlewares::AuthUser;
use crate::models::{Client, ClientSearch, CreateClient, UpdateClient};
use crate::repositories::ClientRepository;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClientRequest {
    pub name: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    /// Empty string clears the company
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClientSearchParams {
    /// Matches name or company
    pub filter: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub updated_at: time::OffsetDateTime,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        Self {
            id: c.id,
            name: c.name,
            company: c.company,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ============ Handlers ============

/// Search the caller's clients
#[utoipa::path(
    get,
    path = "/api/clients",
    params(ClientSearchParams),
    responses(
        (status = 200, description = "Matching clients", body = Vec<ClientResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Clients"
)]
pub async fn list_clients(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ClientSearchParams>,
) -> AppResult<Json<Vec<ClientResponse>>> {
    let search = ClientSearch {
        filter: params.filter,
        name: params.name,
        company: params.company,
    };

    let clients = ClientRepository::search(&state.db, user.id, &search).await?;
    Ok(Json(clients.into_iter().map(|c| c.into()).collect()))
}

/// Distinct companies of the caller's clients
#[utoipa::path(
    get,
    path = "/api/clients/companies",
    responses(
        (status = 200, description = "Company names", body = Vec<String>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Clients"
)]
pub async fn list_companies(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<String>>> {
    let companies = ClientRepository::companies(&state.db, user.id).await?;
    Ok(Json(companies))
}

/// Create a client
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 200, description = "Client created", body = ClientResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Clients"
)]
pub async fn create_client(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateClientRequest>,
) -> AppResult<Json<ClientResponse>> {
    let input = CreateClient {
        name: validate_required(payload.name, "Name")?,
        company: payload
            .company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };

    let client = ClientRepository::create(&state.db, user.id, &input).await?;
    Ok(Json(client.into()))
}

/// Get a client by ID
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(
        ("id" = Uuid, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client details", body = ClientResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Client not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Clients"
)]
pub async fn get_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ClientResponse>> {
    let client = ClientRepository::find_by_id_and_profile(&state.db, id, user.id).await?;
    Ok(Json(client.into()))
}

/// Update a client
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(
        ("id" = Uuid, Path, description = "Client ID")
    ),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ClientResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Client not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Clients"
)]
pub async fn update_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> AppResult<Json<ClientResponse>> {
    let name = match payload.name {
        Some(name) => Some(validate_required(Some(name), "Name")?),
        None => None,
    };
    let input = UpdateClient {
        name,
        company: payload.company.map(|c| c.trim().to_string()),
    };

    let client = ClientRepository::update(&state.db, id, user.id, &input).await?;
    Ok(Json(client.into()))
}

/// Delete a client. Its projects stay, without a client.
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(
        ("id" = Uuid, Path, description = "Client ID")
    ),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Client not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Clients"
)]
pub async fn delete_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ClientRepository::delete_by_profile(&state.db, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

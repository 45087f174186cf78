use anyhow::Context;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use dayspick::config::Config;
use dayspick::handlers::{
    AuthResponse, AvailabilityResponse, ClientResponse, CreateClientRequest, DayOffRequest,
    DayOffResponse, DeleteProjectResponse, LoginRequest, OffersResponse, ProfileListResponse,
    ProfileTagResponse, ProjectListResponse, ProjectRequest, ProjectResponse, SetTagsRequest,
    SignupRequest, TagResponse, UpdateClientRequest, UpdateProfileRequest,
};
use dayspick::models::{
    Calendar, OffersCalendar, ProfileResponse, ProfileSelfResponse, ProjectSummary,
};
use dayspick::state::AppState;
use dayspick::{build_router, handlers};

/// Security scheme for Bearer token
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup_availability,
        handlers::auth::signup,
        handlers::auth::confirm,
        handlers::auth::login,
        handlers::auth::me,
        handlers::users::update_me,
        handlers::users::delete_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::project::create_project,
        handlers::project::list_projects,
        handlers::project::get_project,
        handlers::project::update_project,
        handlers::project::delete_project,
        handlers::calendar::get_calendar,
        handlers::calendar::get_offers_calendar,
        handlers::calendar::list_offers,
        handlers::calendar::toggle_day_off,
        handlers::client::list_clients,
        handlers::client::list_companies,
        handlers::client::create_client,
        handlers::client::get_client,
        handlers::client::update_client,
        handlers::client::delete_client,
        handlers::tag::search_tags,
        handlers::tag::get_profile_tags,
        handlers::tag::set_profile_tags,
    ),
    components(schemas(
        SignupRequest,
        AvailabilityResponse,
        LoginRequest,
        AuthResponse,
        ProfileResponse,
        ProfileSelfResponse,
        ProfileListResponse,
        UpdateProfileRequest,
        ProjectRequest,
        ProjectResponse,
        ProjectListResponse,
        DeleteProjectResponse,
        ProjectSummary,
        Calendar,
        OffersCalendar,
        OffersResponse,
        DayOffRequest,
        DayOffResponse,
        CreateClientRequest,
        UpdateClientRequest,
        ClientResponse,
        TagResponse,
        ProfileTagResponse,
        SetTagsRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signup, confirmation and login"),
        (name = "Users", description = "Profile management endpoints"),
        (name = "Projects", description = "Projects, proposals and their workflow"),
        (name = "Calendar", description = "Availability, offers and days off"),
        (name = "Clients", description = "Client management endpoints"),
        (name = "Tags", description = "Profile tags")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let addr = config.server_addr();

    tracing::info!("Connecting to database and Redis...");
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    tracing::info!("Connections established");

    let app = build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

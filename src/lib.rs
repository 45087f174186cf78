// Library crate for DaysPick
// Exports modules for use by the worker binary and tests

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod queue;
pub mod repositories;
pub mod services;
pub mod state;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    confirm, create_client, create_project, delete_client, delete_me, delete_project,
    get_calendar, get_client, get_offers_calendar, get_profile_tags, get_project, get_user,
    list_clients, list_companies, list_offers, list_projects, list_users, login, me,
    search_tags, set_profile_tags, signup, signup_availability, toggle_day_off, update_client,
    update_me, update_project,
};
use crate::middlewares::auth_middleware;
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        // Auth & profile routes
        .route("/api/auth/me", get(me))
        .route("/api/users/me", put(update_me).delete(delete_me))
        .route(
            "/api/profile/tags",
            get(get_profile_tags).put(set_profile_tags),
        )
        // Project routes
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        // Offers and days off
        .route("/api/offers", get(list_offers))
        .route("/api/calendar/offers", get(get_offers_calendar))
        .route("/api/daysoff", post(toggle_day_off))
        // Client routes
        .route("/api/clients", get(list_clients).post(create_client))
        .route("/api/clients/companies", get(list_companies))
        .route(
            "/api/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(|| async { "Hello, DaysPick!" }))
        // Public auth routes
        .route("/api/auth/signup", get(signup_availability).post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/confirm", get(confirm))
        // Public profile and calendar routes; the calendar reads an optional token
        .route("/api/users", get(list_users))
        .route("/api/users/{username}", get(get_user))
        .route("/api/calendar", get(get_calendar))
        .route("/api/tags", get(search_tags))
        // Protected routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub mod auth;
pub mod calendar;
pub mod client;
pub mod common;
pub mod project;
pub mod tag;
pub mod users;

pub use auth::{
    confirm, login, me, signup, signup_availability, AuthResponse, AvailabilityResponse,
    LoginRequest, SignupRequest,
};
pub use calendar::{
    get_calendar, get_offers_calendar, list_offers, toggle_day_off, DayOffRequest,
    DayOffResponse, OffersResponse,
};
pub use client::{
    create_client, delete_client, get_client, list_clients, list_companies, update_client,
    ClientResponse, CreateClientRequest, UpdateClientRequest,
};
pub use common::{validate_required, PaginationParams};
pub use project::{
    create_project, delete_project, get_project, list_projects, update_project,
    DeleteProjectResponse, ProjectListResponse, ProjectRequest, ProjectResponse,
};
pub use tag::{
    get_profile_tags, search_tags, set_profile_tags, ProfileTagResponse, SetTagsRequest,
    TagResponse,
};
pub use users::{
    delete_me, get_user, list_users, update_me, ProfileListResponse, UpdateProfileRequest,
};

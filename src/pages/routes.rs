// src/pages/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Static paths win over the slug captures, so `/dashboard` never
/// resolves as a project called "dashboard".
pub fn page_routes() -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/login", get(handlers::login_page))
        .route("/signup", get(handlers::signup_page))
        .route("/dashboard", get(handlers::dashboard))
        .route("/:project_slug", get(handlers::project_page))
        .route("/:project_slug/:track_slug", get(handlers::track_page))
}

// src/profile/routes.rs

use axum::{
    routing::{patch, post},
    Router,
};

use super::handlers;

pub fn profile_routes() -> Router {
    Router::new()
        .route("/api/user-profile", patch(handlers::update_profile))
        .route(
            "/api/user-settings/change-password",
            post(handlers::change_password),
        )
}

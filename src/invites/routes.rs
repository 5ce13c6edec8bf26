// src/invites/routes.rs

use axum::routing::{get, post};
use axum::Router;

use super::handlers;

pub fn invite_routes() -> Router {
    Router::new()
        .route("/api/project-invites", post(handlers::create_invite))
        .route("/invite/:token", get(handlers::show_invite))
        .route("/invite/:token/accept", post(handlers::accept_invite))
}

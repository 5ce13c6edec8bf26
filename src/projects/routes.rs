// src/projects/routes.rs

use axum::routing::{get, post};
use axum::Router;

use super::handlers;

pub fn project_routes() -> Router {
    Router::new()
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/:project_id",
            get(handlers::get_project)
                .patch(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/api/projects/:project_id/leave",
            post(handlers::leave_project),
        )
}

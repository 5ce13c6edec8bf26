// src/tracks/routes.rs

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use super::handlers;

/// Uploads carry whole audio files; the default 2 MB body limit is far
/// too small for them.
const UPLOAD_BODY_LIMIT: usize = 100 * 1024 * 1024;

pub fn track_routes() -> Router {
    Router::new()
        .route("/api/tracks", post(handlers::create_track))
        .route(
            "/api/tracks/:track_id",
            get(handlers::get_track).delete(handlers::delete_track),
        )
        .route(
            "/api/tracks/:track_id/files",
            get(handlers::list_track_files)
                .post(handlers::upload_track_file)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/tracks/:track_id/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route("/api/track-categories", get(handlers::list_categories))
}

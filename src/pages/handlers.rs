// src/pages/handlers.rs
//! Page-data handlers
//!
//! The client renders pages from these JSON payloads. Public pages
//! return static shells; the rest load the data their page hydrates
//! from. Project and track pages are addressed by slug, so the slug
//! lookup has to come before the membership check.

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::auth::CurrentUser;
use crate::common::{ApiError, AppState};
use crate::projects::handlers::{ensure_member, summarize};

/// GET /
pub async fn home() -> Json<serde_json::Value> {
    Json(json!({ "page": "home" }))
}

/// GET /login
pub async fn login_page() -> Json<serde_json::Value> {
    Json(json!({ "page": "login" }))
}

/// GET /signup
pub async fn signup_page() -> Json<serde_json::Value> {
    Json(json!({ "page": "signup" }))
}

/// GET /dashboard
/// The caller's projects with member previews and recent tracks.
pub async fn dashboard(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let projects = state.projects.list_for_user(identity.id).await.map_err(|e| {
        error!(user_id = %identity.id, error = %e, "Failed to load dashboard projects");
        ApiError::InternalServer("Wystąpił błąd podczas pobierania projektów".to_string())
    })?;

    let mut summaries = Vec::with_capacity(projects.len());
    for project in projects {
        summaries.push(summarize(&state, project).await);
    }

    Ok(Json(json!({
        "user": identity,
        "projects": summaries,
    })))
}

/// GET /:project_slug
/// Project page: the project row, its members and its tracks.
pub async fn project_page(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(project_slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project = state
        .projects
        .find_by_slug(&project_slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Projekt nie został znaleziony".to_string()))?;

    ensure_member(&state, project.id, identity.id).await?;

    let members = state.projects.members(project.id).await?;
    let tracks = state.tracks.for_project(project.id).await?;

    Ok(Json(json!({
        "project": project,
        "members": members,
        "tracks": tracks,
    })))
}

/// GET /:project_slug/:track_slug
/// Track page: the track with its files and comment thread.
pub async fn track_page(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path((project_slug, track_slug)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project = state
        .projects
        .find_by_slug(&project_slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Projekt nie został znaleziony".to_string()))?;

    ensure_member(&state, project.id, identity.id).await?;

    // Track slugs are globally unique, but a track only renders under
    // its own project's path.
    let track = state
        .tracks
        .find_by_slug(&track_slug)
        .await?
        .filter(|t| t.project_id == project.id)
        .ok_or_else(|| ApiError::NotFound("Utwór nie został znaleziony".to_string()))?;

    let files = state.tracks.files_for_track(track.id).await?;
    let comments = state.tracks.comments_for_track(track.id).await?;

    Ok(Json(json!({
        "project": project,
        "track": track,
        "files": files,
        "comments": comments,
    })))
}

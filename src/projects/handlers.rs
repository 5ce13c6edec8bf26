// src/projects/handlers.rs
//! Project endpoints
//!
//! Membership is the only access rule: every project operation except
//! creation requires a `projects_users` row for the caller.

use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::models::{CreateProjectPayload, Project, ProjectSummary, UpdateProjectPayload};
use crate::auth::CurrentUser;
use crate::common::{ApiError, AppState};
use crate::services::cascade::{DeleteJob, ResourceKind};

/// GET /api/projects
///
/// Response: the caller's projects, newest first, each enriched with
/// `members_count`, up to 5 `members` and the 3 newest `recent_tracks`.
pub async fn list_projects(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let projects = state
        .projects
        .list_for_user(identity.id)
        .await
        .map_err(|e| {
            error!(user_id = %identity.id, error = %e, "Failed to load project list");
            ApiError::InternalServer("Wystąpił błąd podczas pobierania projektów".to_string())
        })?;

    let mut enriched = Vec::with_capacity(projects.len());
    for project in projects {
        enriched.push(summarize(&state, project).await);
    }

    Ok(Json(enriched))
}

/// POST /api/projects
///
/// Request: `{ "name": "Mój projekt" }`
/// Response: `201` with the created project row. Creation and the
/// creator's membership happen in one transaction.
pub async fn create_project(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    body: Bytes,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let payload: CreateProjectPayload = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Nieprawidłowy format danych".to_string()))?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            ApiError::ValidationError("Nazwa projektu nie może być pusta".to_string())
        })?;

    let project = state
        .projects
        .create_with_member(name, identity.id)
        .await
        .map_err(|e| {
            error!(user_id = %identity.id, error = %e, "Failed to create project");
            ApiError::InternalServer("Wystąpił błąd podczas tworzenia projektu".to_string())
        })?;

    info!(project_id = project.id, slug = %project.slug, "✅ Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/:project_id
///
/// Response: `{ "project": {...}, "members": [...], "tracks": [...] }`
/// with tracks newest first.
pub async fn get_project(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let project_id = parse_project_id(&project_id)?;

    ensure_member(&state, project_id, identity.id).await?;

    let project = state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Projekt nie został znaleziony".to_string()))?;

    let members = state.projects.members(project.id).await?;
    let tracks = state.tracks.for_project(project.id).await?;

    Ok(Json(json!({
        "project": project,
        "members": members,
        "tracks": tracks,
    })))
}

/// PATCH /api/projects/:project_id
///
/// Request: `{ "name": "Nowa nazwa" }`
/// Response: `{ "success": true, "project": {...}, "redirect": null }`
///
/// Renaming never changes the slug; the slug names the storage
/// namespace for every file in the project. `redirect` stays in the
/// response for clients that still expect it.
pub async fn update_project(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(project_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let project_id = parse_project_id(&project_id)?;

    let payload: UpdateProjectPayload = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Nieprawidłowy format danych".to_string()))?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            ApiError::ValidationError("Nazwa projektu nie może być pusta".to_string())
        })?;

    ensure_member(&state, project_id, identity.id).await?;

    let project = state
        .projects
        .rename(project_id, name)
        .await
        .map_err(|e| {
            error!(project_id, error = %e, "Failed to rename project");
            ApiError::InternalServer("Wystąpił błąd podczas aktualizacji projektu".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound("Projekt nie został znaleziony".to_string()))?;

    info!(project_id, name = %project.name, "Project renamed");
    Ok(Json(json!({
        "success": true,
        "project": project,
        "redirect": null,
    })))
}

/// DELETE /api/projects/:project_id
///
/// Storage goes first: list every file under the project's slug,
/// remove them in one bulk call, and only then delete the row. A
/// storage failure leaves the row in place so the delete can be
/// retried.
pub async fn delete_project(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let project_id = parse_project_id(&project_id)?;

    let project = state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Projekt nie został znaleziony".to_string()))?;

    ensure_member(&state, project.id, identity.id).await?;

    state
        .cascade
        .run(DeleteJob {
            kind: ResourceKind::Project,
            id: project.id,
            prefix: project.slug.clone(),
        })
        .await
        .map_err(|e| ApiError::DependencyFailure {
            context: "Wystąpił błąd podczas usuwania projektu".to_string(),
            detail: e.to_string(),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Projekt został pomyślnie usunięty",
    })))
}

/// POST /api/projects/:project_id/leave
///
/// The sole member cannot leave; deleting the project is the way out.
pub async fn leave_project(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let project_id = parse_project_id(&project_id)?;

    let project = state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Projekt nie został znaleziony".to_string()))?;

    ensure_member(&state, project.id, identity.id).await?;

    let members = state.projects.members_count(project.id).await?;
    if members <= 1 {
        return Err(ApiError::BadRequest(
            "Nie możesz opuścić projektu, którego jesteś jedynym członkiem".to_string(),
        ));
    }

    state.projects.remove_member(project.id, identity.id).await?;

    info!(project_id, user_id = %identity.id, "Member left project");
    Ok(Json(json!({ "success": true })))
}

/// Enriches one project for list views. Enrichment failures are logged
/// and degrade to empty values; the project itself is still returned.
pub(crate) async fn summarize(state: &AppState, project: Project) -> ProjectSummary {
    let members_count = match state.projects.members_count(project.id).await {
        Ok(count) => count,
        Err(e) => {
            warn!(project_id = project.id, error = %e, "Failed to count project members");
            0
        }
    };

    let members = match state.projects.members_preview(project.id, 5).await {
        Ok(members) => members,
        Err(e) => {
            warn!(project_id = project.id, error = %e, "Failed to load project members");
            Vec::new()
        }
    };

    let recent_tracks = match state.tracks.recent_for_project(project.id, 3).await {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!(project_id = project.id, error = %e, "Failed to load recent tracks");
            Vec::new()
        }
    };

    ProjectSummary {
        project,
        members_count,
        members,
        recent_tracks,
    }
}

/// 403 unless the caller has a membership row.
pub(crate) async fn ensure_member(
    state: &AppState,
    project_id: i64,
    user_id: Uuid,
) -> Result<(), ApiError> {
    if state.projects.is_member(project_id, user_id).await? {
        Ok(())
    } else {
        warn!(project_id, user_id = %user_id, "Membership check failed");
        Err(ApiError::Forbidden(
            "Nie masz dostępu do tego projektu".to_string(),
        ))
    }
}

fn parse_project_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest("Nieprawidłowe ID projektu".to_string()))
}

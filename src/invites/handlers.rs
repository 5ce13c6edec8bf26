// src/invites/handlers.rs
//! Invite endpoints
//!
//! An invite is a bearer capability: knowing an unexpired token is
//! enough to join the project. Tokens are single-table rows with a 24h
//! lifetime; expired rows are pruned after every invite write.
//!
//! The create endpoint answers in English; its consumer was built
//! against those exact strings.

use axum::body::Bytes;
use axum::extract::Path;
use axum::response::Redirect;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::{CreateInvitePayload, ProjectInvite};
use crate::auth::CurrentUser;
use crate::common::helpers::generate_invite_token;
use crate::common::{ApiError, AppState};

const INVITE_TTL_HOURS: i64 = 24;

/// POST /api/project-invites
///
/// Request: `{ "project_id": 7 }`
/// Response: `{ "invite_url": "...", "token": "...", "project_id": 7,
///             "expires_at": "..." }`
pub async fn create_invite(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let payload: CreateInvitePayload = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Nieprawidłowy format danych".to_string()))?;

    let project_id = payload
        .project_id
        .ok_or_else(|| ApiError::ValidationError("Missing required fields".to_string()))?;

    let member = state.projects.is_member(project_id, identity.id).await?;
    if !member {
        warn!(project_id, user_id = %identity.id, "Invite refused for non-member");
        return Err(ApiError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let token = generate_invite_token();
    let expires_at = Utc::now() + Duration::hours(INVITE_TTL_HOURS);

    let invite = state
        .invites
        .create(project_id, &token, expires_at)
        .await
        .map_err(|e| {
            error!(project_id, error = %e, "Failed to create invite");
            ApiError::InternalServer("Failed to create invite".to_string())
        })?;

    prune(&state).await;

    info!(project_id, invite_id = invite.id, "🔗 Invite created");
    Ok(Json(json!({
        "invite_url": build_invite_url(&state.app_url, &invite.token),
        "token": invite.token,
        "project_id": invite.project_id,
        "expires_at": invite.expires_at,
    })))
}

/// GET /invite/:token
///
/// Page payload for the join screen: the invite plus the target
/// project's name and slug.
pub async fn show_invite(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(_identity): CurrentUser,
    Path(token): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let invite = find_valid_invite(&state, &token).await?;

    let project = state
        .projects
        .find_by_id(invite.project_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Zaproszenie nie istnieje lub wygasło".to_string())
        })?;

    Ok(Json(json!({
        "invite": invite,
        "project": {
            "name": project.name,
            "slug": project.slug,
        },
    })))
}

/// POST /invite/:token/accept
///
/// Joining is idempotent: an existing member is just sent to the
/// project page.
pub async fn accept_invite(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(token): Path<String>,
) -> Result<Redirect, ApiError> {
    let invite = find_valid_invite(&state, &token).await?;

    let project = state
        .projects
        .find_by_id(invite.project_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Zaproszenie nie istnieje lub wygasło".to_string())
        })?;
    let target = format!("/{}", project.slug);

    if state.projects.is_member(project.id, identity.id).await? {
        return Ok(Redirect::to(&target));
    }

    state
        .projects
        .add_member(project.id, identity.id)
        .await
        .map_err(|e| {
            error!(project_id = project.id, error = %e, "Failed to add member from invite");
            ApiError::InternalServer("Nie udało się dołączyć do projektu".to_string())
        })?;

    prune(&state).await;

    info!(project_id = project.id, user_id = %identity.id, "✅ Invite accepted");
    Ok(Redirect::to(&target))
}

// Helper functions

/// 404 for unknown tokens, 410 for expired ones.
async fn find_valid_invite(state: &AppState, token: &str) -> Result<ProjectInvite, ApiError> {
    let invite = state
        .invites
        .find_by_token(token)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Zaproszenie nie istnieje lub wygasło".to_string())
        })?;

    if invite_expired(&invite) {
        return Err(ApiError::Gone("Zaproszenie wygasło".to_string()));
    }
    Ok(invite)
}

pub(crate) fn invite_expired(invite: &ProjectInvite) -> bool {
    invite.expires_at <= Utc::now()
}

pub(crate) fn build_invite_url(app_url: &str, token: &str) -> String {
    format!("{}/invite/{}", app_url.trim_end_matches('/'), token)
}

/// Best effort; a failed prune never fails the request.
async fn prune(state: &AppState) {
    match state.invites.prune_expired().await {
        Ok(removed) if removed > 0 => {
            info!(removed, "Pruned expired invites");
        }
        Ok(_) => {}
        Err(e) => {
            warn!(error = %e, "Failed to prune expired invites");
        }
    }
}

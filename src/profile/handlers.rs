// src/profile/handlers.rs
//! Profile and account-settings handlers
//!
//! Both endpoints write to the credential authority first and only then
//! touch the local mirror, so the authority stays the source of truth
//! for profile fields. They need the caller's access token, hence
//! `CurrentSession` rather than `CurrentUser`.

use axum::body::Bytes;
use axum::extract::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{ChangePasswordPayload, UpdateProfilePayload};
use crate::auth::models::UserUpdate;
use crate::auth::{AuthorityError, CurrentSession};
use crate::common::{ApiError, AppState};

const MIN_PASSWORD_LEN: usize = 8;

/// PATCH /api/user-profile
/// Updates the display name at the authority and in the local mirror
///
/// # Request Body
/// ```json
/// { "name": "Anna Nowak" }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "user": { ... } }
/// ```
pub async fn update_profile(
    Extension(state): Extension<Arc<AppState>>,
    current: CurrentSession,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: UpdateProfilePayload = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Profile update body is not valid JSON");
        ApiError::BadRequest("Nieprawidłowy format danych".to_string())
    })?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::ValidationError("Nazwa nie może być pusta".to_string()))?;

    // Older accounts carry the name under `full_name`; write both keys so
    // every reader sees the update.
    let update = UserUpdate {
        data: Some(json!({ "name": name, "full_name": name })),
        ..UserUpdate::default()
    };

    state
        .authority
        .update_user(&current.access_token, update)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %current.identity.id, "Authority rejected the profile update");
            ApiError::InternalServer("Błąd podczas aktualizacji profilu".to_string())
        })?;

    let user = state
        .users
        .update_name(current.identity.id, name)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %current.identity.id, "Mirror row update failed after profile change");
            ApiError::InternalServer("Błąd podczas aktualizacji tabeli users".to_string())
        })?;

    info!(user_id = %user.id, "✅ Profile updated");

    Ok(Json(json!({
        "success": true,
        "user": user,
    })))
}

/// POST /api/user-settings/change-password
/// Verifies the current password with a sign-in round trip, then asks
/// the authority to set the new one.
///
/// # Request Body
/// ```json
/// { "currentPassword": "old", "newPassword": "new-secret" }
/// ```
pub async fn change_password(
    Extension(state): Extension<Arc<AppState>>,
    current: CurrentSession,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: ChangePasswordPayload = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Change-password body is not valid JSON");
        ApiError::BadRequest("Nieprawidłowy format danych".to_string())
    })?;

    let (current_password, new_password) = match (
        payload.current_password.filter(|p| !p.is_empty()),
        payload.new_password.filter(|p| !p.is_empty()),
    ) {
        (Some(c), Some(n)) => (c, n),
        _ => {
            return Err(ApiError::ValidationError(
                "Aktualne i nowe hasło są wymagane".to_string(),
            ))
        }
    };

    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::ValidationError(
            "Nowe hasło musi mieć co najmniej 8 znaków".to_string(),
        ));
    }

    // Accounts without an email (OAuth-only) cannot pass this check; the
    // authority rejects the empty email and the caller sees the same
    // wrong-password response.
    let email = current.identity.email.clone().unwrap_or_default();

    match state.authority.sign_in(&email, &current_password).await {
        Ok(_) => {}
        Err(AuthorityError::Rejected { status, message }) => {
            warn!(
                http_status = status,
                authority_message = %message,
                user_id = %current.identity.id,
                "Current-password verification failed"
            );
            return Err(ApiError::BadRequest(
                "Aktualne hasło jest nieprawidłowe".to_string(),
            ));
        }
        Err(e) => {
            return Err(ApiError::DependencyFailure {
                context: "Błąd podczas zmiany hasła".to_string(),
                detail: e.to_string(),
            })
        }
    }

    let update = UserUpdate {
        password: Some(new_password),
        ..UserUpdate::default()
    };

    state
        .authority
        .update_user(&current.access_token, update)
        .await
        .map_err(|e| ApiError::DependencyFailure {
            context: "Błąd podczas zmiany hasła".to_string(),
            detail: e.to_string(),
        })?;

    info!(user_id = %current.identity.id, "✅ Password changed");

    Ok(Json(json!({
        "success": true,
        "message": "Hasło zostało zmienione pomyślnie",
    })))
}

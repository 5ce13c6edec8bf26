// src/auth/handlers.rs
//! Authentication handlers
//!
//! These endpoints sit in front of the credential authority: they parse
//! the request, delegate the credential work, mirror the user row and
//! manage the session cookie. Authority error messages are mapped to
//! Polish user-facing text; the raw messages only reach the logs.

use axum::body::Bytes;
use axum::extract::{Extension, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::authority::AuthorityError;
use super::extractors::CurrentUser;
use super::models::{
    CallbackQuery, GoogleAuthPayload, LoginPayload, RegisterPayload, ResetPasswordPayload,
    TokenGrant,
};
use crate::common::{safe_email_log, ApiError, AppState};

/// POST /api/auth/login
/// Password sign-in against the credential authority
///
/// # Request Body
/// ```json
/// {
///   "email": "user@example.com",
///   "password": "secret"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "user": { ... },
///   "session": { "access_token": "...", ... }
/// }
/// ```
pub async fn login(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Response {
    info!("🔐 Received login request");

    let payload: LoginPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Login request body is not valid JSON");
            return auth_failure(StatusCode::BAD_REQUEST, "Nieprawidłowy format danych");
        }
    };

    let (email, password) = match (present(payload.email), present(payload.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => return auth_failure(StatusCode::BAD_REQUEST, "Email i hasło są wymagane"),
    };

    debug!(email = %safe_email_log(&email), "Login attempt");

    let grant = match state.authority.sign_in(&email, &password).await {
        Ok(grant) => grant,
        Err(AuthorityError::Rejected { status, message }) => {
            warn!(
                http_status = status,
                authority_message = %message,
                email = %safe_email_log(&email),
                "Authority rejected the login"
            );
            return auth_failure(StatusCode::UNAUTHORIZED, map_login_error(&message));
        }
        Err(e) => {
            error!(error = %e, "Login failed before the authority could answer");
            return auth_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Wystąpił nieoczekiwany błąd podczas logowania",
            );
        }
    };

    let user = match state.users.upsert_from_authority(&grant.user).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Failed to mirror the user row after login");
            return auth_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Wystąpił nieoczekiwany błąd podczas logowania",
            );
        }
    };

    info!(
        user_id = %user.id,
        email = %safe_email_log(&email),
        "✅ Login successful"
    );

    (
        [(header::SET_COOKIE, session_cookie(&state.cookie_name, &grant))],
        Json(json!({
            "success": true,
            "user": user,
            "session": grant.session(),
        })),
    )
        .into_response()
}

/// POST /api/auth/register
/// Sign-up with the email local-part as the provisional display name
pub async fn register(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Response {
    info!("🔐 Received registration request");

    let payload: RegisterPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Registration request body is not valid JSON");
            return auth_failure(StatusCode::BAD_REQUEST, "Nieprawidłowy format danych");
        }
    };

    let (email, password) = match (present(payload.email), present(payload.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => return auth_failure(StatusCode::BAD_REQUEST, "Email i hasło są wymagane"),
    };

    if payload.confirm_password.as_deref() != Some(password.as_str()) {
        return auth_failure(StatusCode::BAD_REQUEST, "Podane hasła różnią się od siebie");
    }

    // The part before the @ serves as the name until the user sets one.
    let provisional_name = email.split('@').next().unwrap_or_default();

    let outcome = match state.authority.sign_up(&email, &password, provisional_name).await {
        Ok(outcome) => outcome,
        Err(AuthorityError::Rejected { status, message }) => {
            warn!(
                http_status = status,
                authority_message = %message,
                email = %safe_email_log(&email),
                "Authority rejected the registration"
            );
            return auth_failure(StatusCode::UNAUTHORIZED, map_register_error(&message));
        }
        Err(e) => {
            error!(error = %e, "Registration failed before the authority could answer");
            return auth_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Wystąpił nieoczekiwany błąd podczas rejestracji",
            );
        }
    };

    let user = match state.users.upsert_from_authority(&outcome.user).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Failed to mirror the user row after registration");
            return auth_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Wystąpił nieoczekiwany błąd podczas rejestracji",
            );
        }
    };

    info!(
        user_id = %user.id,
        email = %safe_email_log(&email),
        "✅ Registration successful"
    );

    let body = Json(json!({
        "success": true,
        "user": user,
        "session": outcome.grant.as_ref().map(TokenGrant::session),
    }));

    // A grant only comes back when the authority does not require email
    // confirmation first; without one there is no session to persist.
    match outcome.grant {
        Some(grant) => (
            [(header::SET_COOKIE, session_cookie(&state.cookie_name, &grant))],
            body,
        )
            .into_response(),
        None => body.into_response(),
    }
}

/// POST /api/auth/logout
/// Revokes the session at the authority (best-effort) and clears the
/// session cookie either way.
pub async fn logout(Extension(state): Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    info!("Received logout request");

    if let Some(session) = state.authority.session_from_cookies(&headers) {
        if let Err(e) = state.authority.sign_out(&session.access_token).await {
            warn!(error = %e, "Authority sign-out failed; clearing the cookie anyway");
        }
    }

    let [base, chunk0, chunk1] = clear_session_cookies(&state.cookie_name);
    (
        AppendHeaders([
            (header::SET_COOKIE, base),
            (header::SET_COOKIE, chunk0),
            (header::SET_COOKIE, chunk1),
        ]),
        Json(json!({
            "success": true,
            "message": "Wylogowano pomyślnie",
        })),
    )
        .into_response()
}

/// POST /api/auth/reset-password
/// Sends a recovery email pointing back at the password-update page.
pub async fn reset_password(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Response {
    info!("Received password reset request");

    let payload: ResetPasswordPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Password reset request body is not valid JSON");
            return auth_failure(StatusCode::BAD_REQUEST, "Nieprawidłowy format danych");
        }
    };

    let Some(email) = present(payload.email) else {
        return auth_failure(StatusCode::BAD_REQUEST, "Email jest wymagany");
    };

    debug!(email = %safe_email_log(&email), "Password reset attempt");

    let redirect_to = format!("{}/auth/update-password", state.app_url);
    match state.authority.recover(&email, &redirect_to).await {
        Ok(()) => {
            info!(email = %safe_email_log(&email), "✅ Password reset email sent");
            Json(json!({
                "success": true,
                "message": "Link do resetowania hasła został wysłany na podany adres email",
            }))
            .into_response()
        }
        Err(AuthorityError::Rejected { status, message }) => {
            warn!(
                http_status = status,
                authority_message = %message,
                "Authority rejected the password reset"
            );
            auth_failure(StatusCode::BAD_REQUEST, map_reset_error(&message))
        }
        Err(e) => {
            error!(error = %e, "Password reset failed before the authority could answer");
            auth_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Wystąpił nieoczekiwany błąd podczas resetowania hasła",
            )
        }
    }
}

/// POST /api/auth/google
/// Hands the client the authority's OAuth authorize URL for Google.
pub async fn google_auth(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Response {
    info!("🔐 Received Google auth request");

    let payload: GoogleAuthPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Google auth request body is not valid JSON");
            return auth_failure(StatusCode::BAD_REQUEST, "Nieprawidłowy format danych");
        }
    };

    let redirect_to = present(payload.redirect_url)
        .unwrap_or_else(|| format!("{}/auth/callback", state.app_url));

    let url = state.authority.oauth_authorize_url("google", &redirect_to);
    debug!(redirect_to = %redirect_to, "Built OAuth authorize URL");

    Json(json!({
        "success": true,
        "url": url,
    }))
    .into_response()
}

/// GET /auth/callback?code=...&redirect=...
/// OAuth landing: exchanges the code for a session, sets the cookie and
/// bounces to the requested local path (or the dashboard).
pub async fn auth_callback(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    info!("Received auth callback");

    let Some(code) = present(query.code) else {
        warn!("Auth callback without a code; sending the user home");
        return Redirect::to("/").into_response();
    };

    // PKCE flows stash the verifier in a sibling cookie before the hop
    // to the provider.
    let verifier_cookie = format!("{}-code-verifier", state.cookie_name);
    let code_verifier = super::authority::collect_cookie_value(&headers, &verifier_cookie);

    let grant = match state
        .authority
        .exchange_code(&code, code_verifier.as_deref())
        .await
    {
        Ok(grant) => grant,
        Err(e) => {
            warn!(error = %e, "Authorization-code exchange failed");
            return Redirect::to("/").into_response();
        }
    };

    if let Err(e) = state.users.upsert_from_authority(&grant.user).await {
        error!(error = %e, "Failed to mirror the user row after OAuth sign-in");
    }

    let target = local_redirect_target(query.redirect.as_deref());
    info!(user_id = %grant.user.id, target = %target, "✅ OAuth sign-in complete");

    (
        [(header::SET_COOKIE, session_cookie(&state.cookie_name, &grant))],
        Redirect::to(&target),
    )
        .into_response()
}

/// GET /api/me
/// The caller's mirrored user row.
pub async fn me(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state
        .users
        .find_by_id(identity.id)
        .await
        .map_err(ApiError::DatabaseError)?
    {
        Some(user) => Ok(Json(json!({ "user": user }))),
        // Validated principal without a mirror row yet (e.g. bearer-only
        // clients); answer from the identity itself.
        None => Ok(Json(json!({ "user": identity }))),
    }
}

// ---- Helpers ----

/// Treats missing and empty strings the same way.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn auth_failure(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

fn map_login_error(message: &str) -> &'static str {
    if message.contains("Invalid login credentials") {
        "Nieprawidłowy email lub hasło"
    } else if message.contains("Email not confirmed") {
        "Adres email nie został potwierdzony. Sprawdź swoją skrzynkę email."
    } else if message.contains("Too many requests") {
        "Zbyt wiele prób logowania. Spróbuj ponownie później."
    } else if message.contains("User not found") {
        "Nie znaleziono użytkownika o podanym adresie email"
    } else if message.contains("Invalid email") {
        "Nieprawidłowy format adresu email"
    } else {
        "Wystąpił błąd podczas logowania"
    }
}

fn map_register_error(message: &str) -> &'static str {
    if message.contains("already registered") {
        "Ten adres email jest już zarejestrowany"
    } else if message.contains("weak password") {
        "Hasło jest zbyt słabe. Użyj silniejszego hasła."
    } else if message.contains("Invalid email") {
        "Nieprawidłowy format adresu email"
    } else if message.contains("Too many requests") {
        "Zbyt wiele prób rejestracji. Spróbuj ponownie później."
    } else {
        "Wystąpił błąd podczas rejestracji"
    }
}

fn map_reset_error(message: &str) -> &'static str {
    if message.contains("User not found") {
        "Nie znaleziono użytkownika o podanym adresie email"
    } else if message.contains("Invalid email") {
        "Nieprawidłowy format adresu email"
    } else if message.contains("Too many requests") {
        "Zbyt wiele prób resetowania hasła. Spróbuj ponownie później."
    } else {
        "Wystąpił błąd podczas resetowania hasła"
    }
}

/// Only paths inside this app are acceptable post-login targets.
pub(crate) fn local_redirect_target(redirect: Option<&str>) -> String {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/dashboard".to_string(),
    }
}

// Clients keep the cookie far past token expiry; re-validation against
// the authority decides whether it still counts.
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 400;

pub(crate) fn session_cookie(name: &str, grant: &TokenGrant) -> String {
    let payload = json!({
        "access_token": grant.access_token,
        "token_type": grant.token_type,
        "expires_in": grant.expires_in,
        "expires_at": grant.expires_at,
        "refresh_token": grant.refresh_token,
    });
    format!(
        "{}=base64-{}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name,
        URL_SAFE_NO_PAD.encode(payload.to_string()),
        SESSION_COOKIE_MAX_AGE_SECS
    )
}

/// Expires the session cookie and its chunked variants.
pub(crate) fn clear_session_cookies(name: &str) -> [String; 3] {
    [name.to_string(), format!("{}.0", name), format!("{}.1", name)]
        .map(|n| format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", n))
}

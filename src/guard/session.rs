// src/guard/session.rs
//! Session validation stage
//!
//! Exchanges request credential material (session cookie, bearer token)
//! for a validated identity. Fail-closed throughout: any authority
//! failure leaves the request unauthenticated, never "allowed anyway".

use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use tracing::{debug, warn};

use super::classify::RouteClass;
use super::{GuardContext, StageFuture, StageOutcome};
use crate::auth::authority::peek_claims;
use crate::auth::models::{AuthSession, Session};
use crate::common::helpers::safe_token_log;
use crate::common::{ApiError, AppState};

/// Stage 1: resolve `{identity, session}` for the request.
///
/// A cookie session is never trusted as parsed; the principal behind it
/// is re-fetched from the authority. Only when no cookie session
/// validates does a bearer token get its chance, and only on
/// protected-api routes; a failing bearer terminates with 401.
pub(crate) fn validate<'a>(
    state: &'a AppState,
    parts: &'a Parts,
    ctx: &'a mut GuardContext,
) -> StageFuture<'a> {
    Box::pin(async move {
        if let Some(cookie_session) = state.authority.session_from_cookies(&parts.headers) {
            if let Some(claims) = peek_claims(&cookie_session.access_token) {
                debug!(sub = %claims.sub, "Re-validating cookie session");
            }

            match state
                .authority
                .validate_user(&cookie_session.access_token)
                .await
            {
                Ok(user) => {
                    debug!(user_id = %user.id, "Cookie session validated");
                    ctx.auth = AuthSession {
                        identity: Some(user.to_identity()),
                        session: Some(cookie_session),
                    };
                    return StageOutcome::Continue;
                }
                Err(e) => {
                    // The unvalidated cookie session must not authorize
                    // anything; carry on without it.
                    warn!(
                        error = %e,
                        path = %parts.uri.path(),
                        "Cookie session failed re-validation"
                    );
                }
            }
        }

        if ctx.class == RouteClass::ProtectedApi {
            if let Some(token) = bearer_token(parts) {
                match state.authority.validate_bearer(token).await {
                    Ok(user) => {
                        debug!(user_id = %user.id, "Bearer token validated");
                        ctx.auth = AuthSession {
                            identity: Some(user.to_identity()),
                            session: Some(Session {
                                access_token: token.to_string(),
                                refresh_token: None,
                                expires_at: None,
                                token_type: Some("bearer".to_string()),
                            }),
                        };
                        return StageOutcome::Continue;
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            token = %safe_token_log(token),
                            path = %parts.uri.path(),
                            "Bearer token rejected"
                        );
                        return StageOutcome::Terminal(
                            ApiError::Unauthorized("bearer token rejected".into())
                                .into_response(),
                        );
                    }
                }
            }
        }

        StageOutcome::Continue
    })
}

/// Accepts both `Bearer <token>` and a raw token value.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}

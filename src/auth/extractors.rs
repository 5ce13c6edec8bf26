// src/auth/extractors.rs
//! Authentication extractors for Axum
//!
//! The session pipeline middleware validates credentials and attaches
//! the resulting `AuthSession` to the request. These extractors only
//! read that extension; they never re-derive identity from headers, so
//! a handler cannot accidentally trust an unvalidated token.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::models::{AuthSession, Identity};
use crate::common::ApiError;

/// Validated identity of the requesting user.
#[derive(Debug)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts.extensions.get::<AuthSession>().cloned();

        match auth.and_then(|a| a.identity) {
            Some(identity) => Ok(CurrentUser(identity)),
            None => {
                // Routes behind the pipeline never get here; this is the
                // fail-closed path for anything wired up outside it.
                warn!(
                    path = %parts.uri.path(),
                    "Handler requires a user but no validated session is attached"
                );
                Err(ApiError::Unauthorized("no validated session".into()))
            }
        }
    }
}

/// Validated identity plus the access token it rode in on, for handlers
/// that call the credential authority on the user's behalf.
#[derive(Debug)]
pub struct CurrentSession {
    pub identity: Identity,
    pub access_token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts.extensions.get::<AuthSession>().cloned();

        let Some(auth) = auth else {
            warn!(
                path = %parts.uri.path(),
                "Handler requires a session but none is attached"
            );
            return Err(ApiError::Unauthorized("no validated session".into()));
        };

        match (auth.identity, auth.session) {
            (Some(identity), Some(session)) => Ok(CurrentSession {
                identity,
                access_token: session.access_token,
            }),
            _ => {
                warn!(
                    path = %parts.uri.path(),
                    "Handler requires a session but validation did not produce one"
                );
                Err(ApiError::Unauthorized("no validated session".into()))
            }
        }
    }
}

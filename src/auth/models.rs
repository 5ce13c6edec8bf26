//! Authentication data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Access-token claims, parsed locally without signature verification.
/// Used only for log hints; authorization always goes through an
/// authority round trip.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

/// Validated principal for the current request. Built fresh per request
/// after the authority round trip, never cached between requests.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Token material as issued by the credential authority. A `Session`
/// parsed from cookies proves nothing on its own; it only becomes
/// meaningful once `validate_user` accepted its access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Outcome of session validation for one request, attached to request
/// extensions by the guard pipeline.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub identity: Option<Identity>,
    pub session: Option<Session>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// User object as the credential authority returns it. Profile fields
/// live in free-form metadata on the authority side.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorityUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthorityUser {
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .get("name")
            .or_else(|| self.user_metadata.get("full_name"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.user_metadata
            .get("avatar_url")
            .or_else(|| self.user_metadata.get("picture"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn to_identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            name: self.display_name(),
            avatar_url: self.avatar_url(),
        }
    }
}

/// Token grant: the authority's response to a successful password
/// sign-in or OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthorityUser,
}

impl TokenGrant {
    pub fn session(&self) -> Session {
        Session {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
            token_type: self.token_type.clone(),
        }
    }
}

/// Sign-up outcome: depending on the authority's confirmation settings a
/// registration yields either a full token grant or just the pending user.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthorityUser,
    pub grant: Option<TokenGrant>,
}

/// Fields this service updates on the authority side.
#[derive(Debug, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// User database model (local mirror of the authority's accounts,
/// upserted at login and registration)
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// POST /api/auth/login request body
#[derive(Deserialize, Debug, Default)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /api/auth/register request body
#[derive(Deserialize, Debug, Default)]
pub struct RegisterPayload {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

/// POST /api/auth/reset-password request body
#[derive(Deserialize, Debug, Default)]
pub struct ResetPasswordPayload {
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /api/auth/google request body
#[derive(Deserialize, Debug, Default)]
pub struct GoogleAuthPayload {
    #[serde(default, rename = "redirectUrl")]
    pub redirect_url: Option<String>,
}

/// GET /auth/callback query parameters
#[derive(Deserialize, Debug, Default)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
}

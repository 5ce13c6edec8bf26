// src/common/testing.rs
//! Shared test doubles for handler and pipeline tests.
//!
//! `FakeAuthority` stands in for the credential authority and records
//! every validation call; `test_state` builds an `AppState` over a lazy
//! pool so tests that never touch the database stay offline.

use axum::http::HeaderMap;
use sqlx::PgPool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::auth::authority::{
    collect_cookie_value, parse_session_cookie, AuthorityError, CredentialAuthority,
};
use crate::auth::handlers::session_cookie;
use crate::auth::models::{AuthorityUser, Session, SignUpOutcome, TokenGrant, UserUpdate};
use crate::auth::UserRepository;
use crate::common::AppState;
use crate::invites::InviteRepository;
use crate::projects::ProjectRepository;
use crate::services::cascade::{CascadeDelete, PgRowDeleter};
use crate::services::storage::{BlobObject, BlobStore, StorageError};
use crate::tracks::TrackRepository;

pub const TEST_COOKIE: &str = "sb-test-auth-token";

/// Accepts a fixed set of tokens and one optional password, counting
/// every validation call.
pub struct FakeAuthority {
    pub accepted: Vec<String>,
    pub password: Option<String>,
    pub user: AuthorityUser,
    pub user_validations: AtomicUsize,
    pub bearer_validations: AtomicUsize,
    pub sign_in_calls: AtomicUsize,
    pub updates: Mutex<Vec<UserUpdate>>,
}

impl FakeAuthority {
    fn base(tokens: &[&str]) -> Self {
        Self {
            accepted: tokens.iter().map(|t| t.to_string()).collect(),
            password: None,
            user: AuthorityUser {
                id: Uuid::new_v4(),
                email: Some("anna@example.com".to_string()),
                user_metadata: serde_json::json!({"name": "Anna"}),
            },
            user_validations: AtomicUsize::new(0),
            bearer_validations: AtomicUsize::new(0),
            sign_in_calls: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting(tokens: &[&str]) -> Arc<Self> {
        Arc::new(Self::base(tokens))
    }

    pub fn with_password(tokens: &[&str], password: &str) -> Arc<Self> {
        let mut fake = Self::base(tokens);
        fake.password = Some(password.to_string());
        Arc::new(fake)
    }

    fn check(&self, token: &str) -> Result<AuthorityUser, AuthorityError> {
        if self.accepted.iter().any(|t| t == token) {
            Ok(self.user.clone())
        } else {
            Err(AuthorityError::Rejected {
                status: 401,
                message: "invalid JWT".to_string(),
            })
        }
    }

    fn grant(&self, token: &str) -> TokenGrant {
        TokenGrant {
            access_token: token.to_string(),
            token_type: Some("bearer".to_string()),
            expires_in: Some(3600),
            expires_at: Some(9_999_999_999),
            refresh_token: Some("refresh-1".to_string()),
            user: self.user.clone(),
        }
    }
}

#[async_trait::async_trait]
impl CredentialAuthority for FakeAuthority {
    fn session_from_cookies(&self, headers: &HeaderMap) -> Option<Session> {
        let raw = collect_cookie_value(headers, TEST_COOKIE)?;
        parse_session_cookie(&raw)
    }

    async fn validate_user(&self, access_token: &str) -> Result<AuthorityUser, AuthorityError> {
        self.user_validations.fetch_add(1, Ordering::SeqCst);
        self.check(access_token)
    }

    async fn validate_bearer(&self, token: &str) -> Result<AuthorityUser, AuthorityError> {
        self.bearer_validations.fetch_add(1, Ordering::SeqCst);
        self.check(token)
    }

    async fn sign_in(&self, _email: &str, password: &str) -> Result<TokenGrant, AuthorityError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        match &self.password {
            Some(expected) if expected == password => Ok(self.grant("granted-token")),
            _ => Err(AuthorityError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _name: &str,
    ) -> Result<SignUpOutcome, AuthorityError> {
        Err(AuthorityError::Malformed("not wired in this test".to_string()))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthorityError> {
        Ok(())
    }

    async fn recover(&self, _email: &str, _redirect_to: &str) -> Result<(), AuthorityError> {
        Ok(())
    }

    async fn update_user(
        &self,
        _access_token: &str,
        update: UserUpdate,
    ) -> Result<AuthorityUser, AuthorityError> {
        self.updates.lock().unwrap().push(update);
        Ok(self.user.clone())
    }

    fn oauth_authorize_url(&self, _provider: &str, _redirect_to: &str) -> String {
        "https://fake.invalid/authorize".to_string()
    }

    async fn exchange_code(
        &self,
        _code: &str,
        _code_verifier: Option<&str>,
    ) -> Result<TokenGrant, AuthorityError> {
        Err(AuthorityError::Malformed("not wired in this test".to_string()))
    }
}

pub struct NullStorage;

#[async_trait::async_trait]
impl BlobStore for NullStorage {
    async fn put(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        Ok(format!("null://{}", path))
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<BlobObject>, StorageError> {
        Ok(Vec::new())
    }

    async fn remove_many(&self, _paths: &[String]) -> Result<(), StorageError> {
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("null://{}", path)
    }
}

/// State over a lazy pool; tests that stay on validation paths never
/// open a connection.
pub fn test_state(authority: Arc<FakeAuthority>) -> Arc<AppState> {
    let db = PgPool::connect_lazy("postgres://localhost/bandspace_test")
        .expect("lazy pool options are static");
    let storage: Arc<dyn BlobStore> = Arc::new(NullStorage);
    Arc::new(AppState {
        db: db.clone(),
        authority: authority as Arc<dyn CredentialAuthority>,
        storage: storage.clone(),
        cascade: CascadeDelete::new(storage, Arc::new(PgRowDeleter::new(db.clone()))),
        projects: ProjectRepository::new(db.clone()),
        tracks: TrackRepository::new(db.clone()),
        invites: InviteRepository::new(db.clone()),
        users: UserRepository::new(db),
        app_url: "https://app.example.com".to_string(),
        cookie_name: TEST_COOKIE.to_string(),
    })
}

/// The `name=value` pair a browser would send back from our session
/// Set-Cookie, wrapping `token` the way a real grant would.
pub fn cookie_pair(authority: &FakeAuthority, token: &str) -> String {
    session_cookie(TEST_COOKIE, &authority.grant(token))
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// An `AuthSession` extension as the pipeline would attach it, for
/// handler tests that bypass the middleware stack.
pub fn authenticated_session(authority: &FakeAuthority, token: &str) -> crate::auth::models::AuthSession {
    crate::auth::models::AuthSession {
        identity: Some(authority.user.to_identity()),
        session: Some(Session {
            access_token: token.to_string(),
            refresh_token: None,
            expires_at: None,
            token_type: Some("bearer".to_string()),
        }),
    }
}

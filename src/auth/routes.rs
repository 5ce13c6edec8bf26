// src/auth/routes.rs
//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/login` - Password sign-in
/// - `POST /api/auth/register` - Sign-up
/// - `POST /api/auth/logout` - Sign-out and cookie clearing
/// - `POST /api/auth/reset-password` - Password-recovery email
/// - `POST /api/auth/google` - Google OAuth authorize URL
/// - `GET /auth/callback` - OAuth code exchange landing
/// - `GET /api/me` - Current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/reset-password", post(handlers::reset_password))
        .route("/api/auth/google", post(handlers::google_auth))
        .route("/auth/callback", get(handlers::auth_callback))
        .route("/api/me", get(handlers::me))
}

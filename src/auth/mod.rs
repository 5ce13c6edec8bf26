// src/auth/mod.rs
//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - The `CredentialAuthority` capability boundary and its HTTP client
//! - Session-cookie parsing and issuing
//! - Password and Google OAuth sign-in endpoints
//! - CurrentUser / CurrentSession extractors for protected routes
//! - The local `users` mirror of the authority's accounts

pub mod authority;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;


pub use authority::{AuthApiClient, AuthorityError, CredentialAuthority};
pub use extractors::{CurrentSession, CurrentUser};
pub use models::{AuthSession, Identity, Session, User};
pub use repository::UserRepository;
pub use routes::auth_routes;

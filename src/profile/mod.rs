// src/profile/mod.rs
//! User profile and account settings.

pub mod handlers;
pub mod models;
pub mod routes;


pub use routes::profile_routes;

// src/pages/mod.rs
//! JSON payloads behind the app's page paths.

pub mod handlers;
pub mod routes;


pub use routes::page_routes;

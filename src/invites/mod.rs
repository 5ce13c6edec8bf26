// src/invites/mod.rs
// Invites module - token links that grant project membership

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;


pub use models::ProjectInvite;
pub use repository::InviteRepository;
pub use routes::invite_routes;

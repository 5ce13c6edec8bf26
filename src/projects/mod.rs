// src/projects/mod.rs
// Projects module - project CRUD, membership and the dashboard list

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;


pub use models::{Project, ProjectMember, ProjectSummary};
pub use repository::ProjectRepository;
pub use routes::project_routes;

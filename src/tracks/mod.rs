// src/tracks/mod.rs
// Tracks module - tracks, audio files, comments and categories

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;

mod tests;

pub use models::{Track, TrackCategory, TrackComment, TrackFile};
pub use repository::TrackRepository;
pub use routes::track_routes;

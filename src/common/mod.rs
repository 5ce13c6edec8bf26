// Common module - shared types and utilities across all modules

pub mod error;
pub mod helpers;
pub mod migrations;
pub mod state;
#[cfg(test)]
pub mod testing;

// Re-export commonly used types for convenience
pub use error::ApiError;
pub use helpers::safe_email_log;
pub use state::AppState;

// src/services/mod.rs
//
// Shared services module containing infrastructure services
// that can be used across different domain modules

pub mod cascade;
pub mod storage;

// Re-export commonly used types for convenience
pub use cascade::{CascadeDelete, DeleteJob, ResourceKind};
pub use storage::{BlobStore, S3Storage, StorageConfig};

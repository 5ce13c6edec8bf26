// src/tracks/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Track {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub slug: String,
    /// Name of the primary file, kept on the track for list views.
    pub file_name: Option<String>,
    /// Storage path of the primary file.
    pub storage_file_path: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow, Serialize, Debug, Clone)]
pub struct TrackCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct TrackFile {
    pub id: i64,
    pub track_id: i64,
    pub category_id: i64,
    pub file_name: String,
    pub file_url: String,
    pub file_extension: Option<String>,
    pub file_size: Option<i64>,
    pub duration: Option<f64>,
    pub description: Option<String>,
    pub is_primary: bool,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File row joined with its uploader profile and category.
#[derive(FromRow, Serialize, Debug)]
pub struct TrackFileDetails {
    pub id: i64,
    pub track_id: i64,
    pub category_id: i64,
    pub file_name: String,
    pub file_url: String,
    pub file_extension: Option<String>,
    pub file_size: Option<i64>,
    pub duration: Option<f64>,
    pub description: Option<String>,
    pub is_primary: bool,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub uploader_name: Option<String>,
    pub uploader_email: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Comment joined with its author's profile.
#[derive(FromRow, Serialize, Debug)]
pub struct TrackComment {
    pub id: i64,
    pub track_id: i64,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_avatar_url: Option<String>,
}

/// Column values for one uploaded file; assembled by the upload
/// handler after the blob is already in storage.
#[derive(Debug)]
pub struct NewTrackFile {
    pub track_id: i64,
    pub category_id: i64,
    pub file_name: String,
    pub file_url: String,
    /// Blob path under the bucket, mirrored into
    /// `tracks.storage_file_path` for primary uploads.
    pub storage_path: String,
    pub file_extension: Option<String>,
    pub file_size: i64,
    pub description: Option<String>,
    pub is_primary: bool,
    pub uploaded_by: Uuid,
}

#[derive(Deserialize, Debug)]
pub struct CreateTrackPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct CreateCommentPayload {
    #[serde(default)]
    pub content: Option<String>,
}

// src/projects/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tracks::models::Track;

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership row joined with the user's profile mirror.
#[derive(FromRow, Serialize, Debug, Clone)]
pub struct ProjectMember {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Dashboard entry: one project with its membership and track context.
#[derive(Serialize, Debug)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub members_count: i64,
    pub members: Vec<ProjectMember>,
    pub recent_tracks: Vec<Track>,
}

#[derive(Deserialize, Debug)]
pub struct CreateProjectPayload {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateProjectPayload {
    #[serde(default)]
    pub name: Option<String>,
}

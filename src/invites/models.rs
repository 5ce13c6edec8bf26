// src/invites/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct ProjectInvite {
    pub id: i64,
    pub project_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct CreateInvitePayload {
    #[serde(default)]
    pub project_id: Option<i64>,
}

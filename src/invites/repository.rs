// src/invites/repository.rs
//! Invite persistence

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::ProjectInvite;

#[derive(Clone)]
pub struct InviteRepository {
    db: PgPool,
}

impl InviteRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        project_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ProjectInvite, sqlx::Error> {
        sqlx::query_as::<_, ProjectInvite>(
            r#"
            INSERT INTO project_invites (project_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.db)
        .await
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<ProjectInvite>, sqlx::Error> {
        sqlx::query_as::<_, ProjectInvite>("SELECT * FROM project_invites WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.db)
            .await
    }

    /// Deletes every expired invite; runs after invite writes so the
    /// table never accumulates dead rows.
    pub async fn prune_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_invites WHERE expires_at < NOW()")
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

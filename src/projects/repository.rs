// src/projects/repository.rs
//! Project persistence
//!
//! Every query touching `projects` or `projects_users` lives here;
//! handlers only call named operations.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Project, ProjectMember};
use crate::common::helpers::generate_slug;

#[derive(Clone)]
pub struct ProjectRepository {
    db: PgPool,
}

impl ProjectRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Projects the user belongs to, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT p.*
            FROM projects p
            JOIN projects_users pu ON pu.project_id = p.id
            WHERE pu.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
    }

    pub async fn find_by_id(&self, project_id: i64) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn is_member(&self, project_id: i64, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM projects_users WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.is_some())
    }

    pub async fn members_count(&self, project_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM projects_users WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    /// All member profiles, oldest membership first.
    pub async fn members(&self, project_id: i64) -> Result<Vec<ProjectMember>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT pu.user_id, u.email, u.name, u.avatar_url
            FROM projects_users pu
            JOIN users u ON u.id = pu.user_id
            WHERE pu.project_id = $1
            ORDER BY pu.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.db)
        .await
    }

    /// The first `limit` member profiles, for list views.
    pub async fn members_preview(
        &self,
        project_id: i64,
        limit: i64,
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT pu.user_id, u.email, u.name, u.avatar_url
            FROM projects_users pu
            JOIN users u ON u.id = pu.user_id
            WHERE pu.project_id = $1
            ORDER BY pu.id
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
    }

    /// Creates the project and the creator's membership in one
    /// transaction. The slug comes from the name; collisions get a
    /// numeric suffix (`demo`, `demo-2`, `demo-3`, ...).
    pub async fn create_with_member(
        &self,
        name: &str,
        user_id: Uuid,
    ) -> Result<Project, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let base = match generate_slug(name) {
            s if s.is_empty() => "projekt".to_string(),
            s => s,
        };
        let mut candidate = base.clone();
        let mut counter = 2;
        loop {
            let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM projects WHERE slug = $1")
                .bind(&candidate)
                .fetch_optional(&mut *tx)
                .await?;
            if taken.is_none() {
                break;
            }
            candidate = format!("{}-{}", base, counter);
            counter += 1;
        }

        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, slug) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(&candidate)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO projects_users (project_id, user_id) VALUES ($1, $2)")
            .bind(project.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(project)
    }

    /// Renames without touching the slug; the slug names the storage
    /// namespace for every file under the project.
    pub async fn rename(&self, project_id: i64, name: &str) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "UPDATE projects SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(project_id)
        .bind(name)
        .fetch_optional(&self.db)
        .await
    }

    pub async fn add_member(&self, project_id: i64, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO projects_users (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn remove_member(&self, project_id: i64, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM projects_users WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(&self.db)
                .await?;
        Ok(result.rows_affected())
    }
}

// src/auth/repository.rs
//! Local user rows mirroring the credential authority's principals.
//!
//! The authority owns identity; the `users` table only mirrors the
//! fields other tables join against (name, avatar). The auth entry
//! points (login, register, OAuth callback) write the mirror, so a row
//! exists before any project membership can reference it.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{AuthorityUser, User};

#[derive(Clone)]
pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Inserts or refreshes the mirror row for an authority principal.
    /// Name and avatar only overwrite when the authority has a value, so
    /// a metadata-less token does not blank a profile.
    pub async fn upsert_from_authority(&self, user: &AuthorityUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                name = COALESCE(EXCLUDED.name, users.name),
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(user.display_name())
        .bind(user.avatar_url())
        .fetch_one(&self.db)
        .await
    }

    pub async fn update_name(&self, user_id: Uuid, name: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET name = $2 WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.db)
        .await
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
    }
}

// src/tracks/repository.rs
//! Track persistence: tracks, their files, comments and categories.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    NewTrackFile, Track, TrackCategory, TrackComment, TrackFile, TrackFileDetails,
};
use crate::common::helpers::generate_slug;

#[derive(Clone)]
pub struct TrackRepository {
    db: PgPool,
}

impl TrackRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates a track with a globally unique slug (`demo`, `demo-2`,
    /// ...); the slug doubles as the storage directory name under the
    /// project prefix.
    pub async fn create(
        &self,
        project_id: i64,
        name: &str,
        created_by: Uuid,
    ) -> Result<Track, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let base = match generate_slug(name) {
            s if s.is_empty() => "utwor".to_string(),
            s => s,
        };
        let mut candidate = base.clone();
        let mut counter = 2;
        loop {
            let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM tracks WHERE slug = $1")
                .bind(&candidate)
                .fetch_optional(&mut *tx)
                .await?;
            if taken.is_none() {
                break;
            }
            candidate = format!("{}-{}", base, counter);
            counter += 1;
        }

        let track = sqlx::query_as::<_, Track>(
            r#"
            INSERT INTO tracks (project_id, name, slug, uploaded_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(name)
        .bind(&candidate)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(track)
    }

    pub async fn find_by_id(&self, track_id: i64) -> Result<Option<Track>, sqlx::Error> {
        sqlx::query_as::<_, Track>("SELECT * FROM tracks WHERE id = $1")
            .bind(track_id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Track>, sqlx::Error> {
        sqlx::query_as::<_, Track>("SELECT * FROM tracks WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.db)
            .await
    }

    /// All tracks of a project, newest first.
    pub async fn for_project(&self, project_id: i64) -> Result<Vec<Track>, sqlx::Error> {
        sqlx::query_as::<_, Track>(
            "SELECT * FROM tracks WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.db)
        .await
    }

    /// The `limit` newest tracks of a project, for list views.
    pub async fn recent_for_project(
        &self,
        project_id: i64,
        limit: i64,
    ) -> Result<Vec<Track>, sqlx::Error> {
        sqlx::query_as::<_, Track>(
            "SELECT * FROM tracks WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
    }

    pub async fn files_count(&self, track_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM track_files WHERE track_id = $1")
                .bind(track_id)
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    /// Files with uploader and category context, primary first.
    pub async fn files_for_track(
        &self,
        track_id: i64,
    ) -> Result<Vec<TrackFileDetails>, sqlx::Error> {
        sqlx::query_as::<_, TrackFileDetails>(
            r#"
            SELECT
                tf.*,
                u.name AS uploader_name,
                u.email AS uploader_email,
                c.name AS category_name,
                c.slug AS category_slug
            FROM track_files tf
            LEFT JOIN users u ON u.id = tf.uploaded_by
            LEFT JOIN track_categories c ON c.id = tf.category_id
            WHERE tf.track_id = $1
            ORDER BY tf.is_primary DESC, tf.created_at ASC
            "#,
        )
        .bind(track_id)
        .fetch_all(&self.db)
        .await
    }

    /// Inserts the file row; a primary upload also demotes earlier
    /// primaries and refreshes the track's primary-file pointer, all in
    /// one transaction.
    pub async fn insert_file(&self, file: NewTrackFile) -> Result<TrackFile, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        if file.is_primary {
            sqlx::query(
                "UPDATE track_files SET is_primary = false, updated_at = NOW() WHERE track_id = $1 AND is_primary",
            )
            .bind(file.track_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, TrackFile>(
            r#"
            INSERT INTO track_files
                (track_id, category_id, file_name, file_url, file_extension,
                 file_size, description, is_primary, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(file.track_id)
        .bind(file.category_id)
        .bind(&file.file_name)
        .bind(&file.file_url)
        .bind(&file.file_extension)
        .bind(file.file_size)
        .bind(&file.description)
        .bind(file.is_primary)
        .bind(file.uploaded_by)
        .fetch_one(&mut *tx)
        .await?;

        if file.is_primary {
            sqlx::query("UPDATE tracks SET file_name = $2, storage_file_path = $3 WHERE id = $1")
                .bind(file.track_id)
                .bind(&file.file_name)
                .bind(&file.storage_path)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    /// Comments oldest first, each with its author.
    pub async fn comments_for_track(
        &self,
        track_id: i64,
    ) -> Result<Vec<TrackComment>, sqlx::Error> {
        sqlx::query_as::<_, TrackComment>(
            r#"
            SELECT
                tc.id, tc.track_id, tc.user_id, tc.content, tc.created_at,
                u.name AS author_name,
                u.email AS author_email,
                u.avatar_url AS author_avatar_url
            FROM track_comments tc
            JOIN users u ON u.id = tc.user_id
            WHERE tc.track_id = $1
            ORDER BY tc.created_at ASC
            "#,
        )
        .bind(track_id)
        .fetch_all(&self.db)
        .await
    }

    pub async fn add_comment(
        &self,
        track_id: i64,
        user_id: Uuid,
        content: &str,
    ) -> Result<TrackComment, sqlx::Error> {
        let (comment_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO track_comments (track_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(track_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.db)
        .await?;

        sqlx::query_as::<_, TrackComment>(
            r#"
            SELECT
                tc.id, tc.track_id, tc.user_id, tc.content, tc.created_at,
                u.name AS author_name,
                u.email AS author_email,
                u.avatar_url AS author_avatar_url
            FROM track_comments tc
            JOIN users u ON u.id = tc.user_id
            WHERE tc.id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_one(&self.db)
        .await
    }

    pub async fn categories(&self) -> Result<Vec<TrackCategory>, sqlx::Error> {
        sqlx::query_as::<_, TrackCategory>("SELECT * FROM track_categories ORDER BY id")
            .fetch_all(&self.db)
            .await
    }
}

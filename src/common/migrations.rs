// src/common/migrations.rs
//! Database migration and schema management

use sqlx::PgPool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Only drop tables if RESET_DB environment variable is set to "true"
    // This prevents data loss on server restarts
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    } else {
        info!("ℹ️  Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    create_user_tables(pool).await?;
    create_project_tables(pool).await?;
    create_track_tables(pool).await?;
    create_indexes(pool).await?;

    // Seed default track categories when the table is empty
    init_track_categories(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

async fn drop_all_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Drop tables in reverse dependency order
    let tables = vec![
        "track_comments",
        "track_files",
        "tracks",
        "track_categories",
        "project_invites",
        "projects_users",
        "projects",
        "users",
    ];

    for table in tables {
        let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
            .execute(pool)
            .await;
    }

    Ok(())
}

async fn create_user_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Users table mirrors the credential authority's accounts; ids come from
    // the authority, rows are upserted at login/registration.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT UNIQUE,
            name TEXT,
            avatar_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_project_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Projects table; the slug names the project's blob-storage namespace
    // and never changes after creation
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            slug TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Membership table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects_users (
            id BIGSERIAL PRIMARY KEY,
            project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE (project_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Invite links (24h expiry, pruned opportunistically)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_invites (
            id BIGSERIAL PRIMARY KEY,
            project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            token TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_track_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track_categories (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            parent_id BIGINT REFERENCES track_categories(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Tracks table; the slug is globally unique and names the track's
    // blob-storage prefix underneath the project's
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id BIGSERIAL PRIMARY KEY,
            project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            name TEXT NOT NULL DEFAULT '',
            slug TEXT NOT NULL UNIQUE,
            file_name TEXT,
            storage_file_path TEXT,
            uploaded_by UUID REFERENCES users(id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track_files (
            id BIGSERIAL PRIMARY KEY,
            track_id BIGINT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
            category_id BIGINT NOT NULL REFERENCES track_categories(id),
            file_name TEXT NOT NULL,
            file_url TEXT NOT NULL,
            file_extension TEXT,
            file_size BIGINT,
            duration DOUBLE PRECISION,
            description TEXT,
            is_primary BOOLEAN NOT NULL DEFAULT FALSE,
            uploaded_by UUID REFERENCES users(id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track_comments (
            id BIGSERIAL PRIMARY KEY,
            track_id BIGINT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), sqlx::Error> {
    let indexes = vec![
        // Membership lookups run on every guarded project/track operation
        "CREATE INDEX IF NOT EXISTS idx_projects_users_project_id ON projects_users(project_id)",
        "CREATE INDEX IF NOT EXISTS idx_projects_users_user_id ON projects_users(user_id)",
        // Invite pruning scans by expiry
        "CREATE INDEX IF NOT EXISTS idx_project_invites_expires_at ON project_invites(expires_at)",
        // Track listings are per-project, newest first
        "CREATE INDEX IF NOT EXISTS idx_tracks_project_id ON tracks(project_id)",
        "CREATE INDEX IF NOT EXISTS idx_tracks_project_created ON tracks(project_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_track_files_track_id ON track_files(track_id)",
        "CREATE INDEX IF NOT EXISTS idx_track_comments_track_id ON track_comments(track_id)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

/// Seed default track categories, only when none exist yet
async fn init_track_categories(pool: &PgPool) -> Result<(), sqlx::Error> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM track_categories LIMIT 1")
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let defaults = vec![
        ("Demo", "demo"),
        ("Mix", "mix"),
        ("Master", "master"),
        ("Wokal", "wokal"),
        ("Instrumental", "instrumental"),
    ];

    for (name, slug) in defaults {
        sqlx::query("INSERT INTO track_categories (name, slug) VALUES ($1, $2)")
            .bind(name)
            .bind(slug)
            .execute(pool)
            .await?;
        info!(category = %name, "Seeded track category");
    }

    Ok(())
}

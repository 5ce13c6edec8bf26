// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod cors_middleware;
mod guard;
mod invites;
mod pages;
mod profile;
mod projects;
mod services;
mod tracks;

use auth::AuthApiClient;
use common::AppState;
use services::cascade::PgRowDeleter;
use services::{BlobStore, CascadeDelete, S3Storage, StorageConfig};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/bandspace".to_string());
    let auth_url = env::var("AUTH_URL").unwrap_or_else(|_| "http://localhost:9999".to_string());
    let auth_service_key = env::var("AUTH_SERVICE_KEY").unwrap_or_default();
    let cookie_name =
        env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "sb-auth-token".to_string());
    let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    if auth_service_key.is_empty() {
        warn!("AUTH_SERVICE_KEY is empty; the credential authority will reject every request");
    }

    let storage_config = StorageConfig {
        bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "project-files".to_string()),
        region: env::var("STORAGE_REGION").unwrap_or_else(|_| "eu-central-1".to_string()),
        endpoint: env::var("STORAGE_ENDPOINT").ok(),
        cdn_domain: env::var("STORAGE_CDN_DOMAIN").ok(),
    };

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    // Run database migrations
    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // COLLABORATOR INITIALIZATION
    // ========================================================================

    let authority = Arc::new(AuthApiClient::new(
        &auth_url,
        &auth_service_key,
        &cookie_name,
    ));
    info!("Credential authority client initialized");

    let storage: Arc<dyn BlobStore> = Arc::new(S3Storage::new(storage_config).await);
    info!("Blob storage initialized");

    let cascade = CascadeDelete::new(storage.clone(), Arc::new(PgRowDeleter::new(pool.clone())));

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let state = AppState {
        db: pool.clone(),
        authority,
        storage,
        cascade,
        projects: projects::ProjectRepository::new(pool.clone()),
        tracks: tracks::TrackRepository::new(pool.clone()),
        invites: invites::InviteRepository::new(pool.clone()),
        users: auth::UserRepository::new(pool),
        app_url,
        cookie_name,
    };

    let shared = Arc::new(state);

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    // The guard pipeline runs inside the CORS layer, so its terminal
    // responses carry CORS headers and preflights never reach it.
    let app = Router::new()
        .merge(auth::auth_routes())
        .merge(projects::project_routes())
        .merge(tracks::track_routes())
        .merge(invites::invite_routes())
        .merge(profile::profile_routes())
        .merge(pages::page_routes())
        .layer(middleware::from_fn(guard::pipeline))
        .layer(middleware::from_fn(cors_middleware::cors))
        .layer(Extension(shared))
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

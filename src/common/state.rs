// Application state shared across all modules

use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::authority::CredentialAuthority;
use crate::auth::repository::UserRepository;
use crate::invites::repository::InviteRepository;
use crate::projects::repository::ProjectRepository;
use crate::services::cascade::CascadeDelete;
use crate::services::storage::BlobStore;
use crate::tracks::repository::TrackRepository;

/// Application state containing the database pool, external collaborators
/// and configuration. Built once in `main` and shared read-only via
/// `Extension(Arc<AppState>)`; nothing in here mutates after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub authority: Arc<dyn CredentialAuthority>,
    pub storage: Arc<dyn BlobStore>,
    pub cascade: CascadeDelete,
    pub projects: ProjectRepository,
    pub tracks: TrackRepository,
    pub invites: InviteRepository,
    pub users: UserRepository,
    /// Public base URL of this deployment, used for invite links and
    /// password-reset redirects.
    pub app_url: String,
    /// Name of the session cookie the credential authority's SSR clients use.
    pub cookie_name: String,
}

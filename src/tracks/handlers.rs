// src/tracks/handlers.rs
//! Track endpoints: CRUD, file uploads, comments and categories.
//!
//! Access always goes through the owning project's membership; a track
//! id alone never grants anything.

use axum::body::Bytes;
use axum::extract::{Multipart, Path};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::{
    CreateCommentPayload, CreateTrackPayload, NewTrackFile, Track, TrackCategory,
    TrackComment, TrackFile, TrackFileDetails,
};
use crate::auth::CurrentUser;
use crate::common::{ApiError, AppState};
use crate::projects::handlers::ensure_member;
use crate::projects::models::Project;
use crate::services::cascade::{DeleteJob, ResourceKind};

/// POST /api/tracks
///
/// Request: `{ "name": "Demo", "project_id": 7 }`
/// Response: `201` with the created track. Files come later through
/// the upload endpoint.
pub async fn create_track(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    body: Bytes,
) -> Result<(StatusCode, Json<Track>), ApiError> {
    let payload: CreateTrackPayload = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Nieprawidłowy format danych".to_string()))?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::ValidationError("Nie podano nazwy utworu".to_string()))?;
    let project_id = payload
        .project_id
        .ok_or_else(|| ApiError::ValidationError("Nie podano ID projektu".to_string()))?;

    ensure_member(&state, project_id, identity.id).await?;

    let track = state
        .tracks
        .create(project_id, name, identity.id)
        .await
        .map_err(|e| {
            error!(project_id, error = %e, "Failed to create track");
            ApiError::DependencyFailure {
                context: "Błąd podczas tworzenia utworu".to_string(),
                detail: e.to_string(),
            }
        })?;

    info!(track_id = track.id, slug = %track.slug, project_id, "✅ Track created");
    Ok((StatusCode::CREATED, Json(track)))
}

/// GET /api/tracks/:track_id
pub async fn get_track(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(track_id): Path<String>,
) -> Result<Json<Track>, ApiError> {
    let track_id = parse_track_id(&track_id)?;

    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Utwór nie został znaleziony".to_string()))?;

    ensure_member(&state, track.project_id, identity.id).await?;

    Ok(Json(track))
}

/// DELETE /api/tracks/:track_id
///
/// Storage first, then the row, with the track's own prefix
/// (`{project_slug}/{track_slug}`); other tracks of the project are
/// untouched.
pub async fn delete_track(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(track_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let track_id = parse_track_id(&track_id)?;

    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Utwór nie został znaleziony".to_string()))?;
    let project = owning_project(&state, &track).await?;

    ensure_member(&state, project.id, identity.id).await?;

    state
        .cascade
        .run(DeleteJob {
            kind: ResourceKind::Track,
            id: track.id,
            prefix: format!("{}/{}", project.slug, track.slug),
        })
        .await
        .map_err(|e| ApiError::DependencyFailure {
            context: "Wystąpił błąd podczas usuwania utworu".to_string(),
            detail: e.to_string(),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Utwór został pomyślnie usunięty",
    })))
}

/// GET /api/tracks/:track_id/files
///
/// Response: files with uploader and category context, primary first.
pub async fn list_track_files(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(track_id): Path<String>,
) -> Result<Json<Vec<TrackFileDetails>>, ApiError> {
    let track_id = parse_track_id(&track_id)?;

    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Pliki utworu nie zostały znalezione".to_string()))?;

    ensure_member(&state, track.project_id, identity.id).await?;

    let files = state.tracks.files_for_track(track.id).await?;
    Ok(Json(files))
}

/// POST /api/tracks/:track_id/files (multipart)
///
/// Fields: `file` (the audio payload), `category_id`, optional
/// `description` and `is_primary`. The payload is sniffed; anything
/// that is not a recognized audio container is rejected. The blob
/// lands at `{project_slug}/{track_slug}/{file_name}` before the row
/// is written; a failed row insert removes the blob again.
pub async fn upload_track_file(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(track_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<TrackFile>), ApiError> {
    let track_id = parse_track_id(&track_id)?;

    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Utwór nie został znaleziony".to_string()))?;
    let project = owning_project(&state, &track).await?;

    ensure_member(&state, project.id, identity.id).await?;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_name: Option<String> = None;
    let mut category_id: Option<i64> = None;
    let mut description: Option<String> = None;
    let mut primary_requested = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Nieprawidłowe dane formularza: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                original_name = field.file_name().map(|s| s.to_string());
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::BadRequest(format!("Nie udało się odczytać pliku: {}", e))
                        })?
                        .to_vec(),
                );
            }
            "category_id" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Nieprawidłowe dane formularza: {}", e))
                })?;
                category_id = text.trim().parse().ok();
            }
            "description" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Nieprawidłowe dane formularza: {}", e))
                })?;
                description = Some(text).filter(|t| !t.trim().is_empty());
            }
            "is_primary" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Nieprawidłowe dane formularza: {}", e))
                })?;
                primary_requested = text.trim() == "true";
            }
            _ => {}
        }
    }

    let bytes =
        file_bytes.ok_or_else(|| ApiError::ValidationError("Nie podano pliku".to_string()))?;
    let original_name = original_name
        .ok_or_else(|| ApiError::ValidationError("Nie podano nazwy pliku".to_string()))?;
    let category_id = category_id
        .ok_or_else(|| ApiError::ValidationError("Nie podano ID kategorii".to_string()))?;

    let content_type = detect_audio_type(&bytes).ok_or_else(|| {
        ApiError::ValidationError("Nieprawidłowy format pliku audio".to_string())
    })?;

    let file_name = sanitize_file_name(&original_name);
    let storage_path = format!("{}/{}/{}", project.slug, track.slug, file_name);
    let file_size = bytes.len() as i64;

    let file_url = state
        .storage
        .put(&storage_path, bytes, content_type)
        .await
        .map_err(|e| ApiError::DependencyFailure {
            context: "Błąd podczas dodawania pliku".to_string(),
            detail: e.to_string(),
        })?;

    // First upload becomes the primary file even when not requested.
    let existing = state.tracks.files_count(track.id).await?;
    let is_primary = primary_requested || existing == 0;

    let new_file = NewTrackFile {
        track_id: track.id,
        category_id,
        file_name: file_name.clone(),
        file_url,
        storage_path: storage_path.clone(),
        file_extension: file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase()),
        file_size,
        description,
        is_primary,
        uploaded_by: identity.id,
    };

    let file = match state.tracks.insert_file(new_file).await {
        Ok(file) => file,
        Err(e) => {
            error!(track_id = track.id, error = %e, "File row insert failed; removing uploaded blob");
            if let Err(cleanup) = state.storage.remove_many(&[storage_path.clone()]).await {
                warn!(path = %storage_path, error = %cleanup, "Orphaned blob left behind");
            }
            return Err(ApiError::DependencyFailure {
                context: "Błąd podczas dodawania pliku".to_string(),
                detail: e.to_string(),
            });
        }
    };

    info!(
        track_id = track.id,
        file_id = file.id,
        path = %storage_path,
        size = file_size,
        "📥 Track file uploaded"
    );
    Ok((StatusCode::CREATED, Json(file)))
}

/// GET /api/tracks/:track_id/comments
pub async fn list_comments(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(track_id): Path<String>,
) -> Result<Json<Vec<TrackComment>>, ApiError> {
    let track_id = parse_track_id(&track_id)?;

    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Utwór nie został znaleziony".to_string()))?;

    ensure_member(&state, track.project_id, identity.id).await?;

    let comments = state.tracks.comments_for_track(track.id).await?;
    Ok(Json(comments))
}

/// POST /api/tracks/:track_id/comments
///
/// Request: `{ "content": "Świetny refren!" }`
/// Response: `201` with the comment and its author.
pub async fn add_comment(
    Extension(state): Extension<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(track_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<TrackComment>), ApiError> {
    let track_id = parse_track_id(&track_id)?;

    let payload: CreateCommentPayload = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Nieprawidłowy format danych".to_string()))?;

    let content = payload
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            ApiError::ValidationError("Treść komentarza jest wymagana".to_string())
        })?;

    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Utwór nie został znaleziony".to_string()))?;

    ensure_member(&state, track.project_id, identity.id).await?;

    let comment = state
        .tracks
        .add_comment(track.id, identity.id, content)
        .await
        .map_err(|e| {
            error!(track_id = track.id, error = %e, "Failed to add comment");
            ApiError::InternalServer("Nie udało się dodać komentarza".to_string())
        })?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/track-categories
pub async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<TrackCategory>>, ApiError> {
    let categories = state.tracks.categories().await.map_err(|e| {
        error!(error = %e, "Failed to load track categories");
        ApiError::InternalServer("Wystąpił błąd podczas pobierania kategorii".to_string())
    })?;
    Ok(Json(categories))
}

// Helper functions

/// The project a track belongs to; missing only in a delete race.
async fn owning_project(state: &AppState, track: &Track) -> Result<Project, ApiError> {
    state
        .projects
        .find_by_id(track.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Projekt nie został znaleziony".to_string()))
}

fn parse_track_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest("Nieprawidłowe ID utworu".to_string()))
}

/// Sniffs the payload; only recognized audio containers pass.
pub(crate) fn detect_audio_type(data: &[u8]) -> Option<&'static str> {
    let infer = infer::Infer::new();
    let info = infer.get(data)?;
    if info.matcher_type() == infer::MatcherType::Audio {
        Some(info.mime_type())
    } else {
        None
    }
}

/// Strips any path components a client smuggles into the filename.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        "plik".to_string()
    } else {
        base.to_string()
    }
}

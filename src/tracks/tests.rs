// src/tracks/tests.rs
//! Tests for the tracks module
//!
//! Handler tests cover the validation paths that terminate before any
//! database query; the audio sniffing and filename sanitizing helpers
//! are tested directly with crafted payloads.

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::{Extension, Router};
    use tower::util::ServiceExt;

    use crate::auth::models::AuthSession;
    use crate::common::testing::{authenticated_session, test_state, FakeAuthority};
    use crate::tracks::handlers::{detect_audio_type, sanitize_file_name};

    fn app(authority: &std::sync::Arc<FakeAuthority>) -> Router {
        track_routes().layer(Extension(test_state(authority.clone())))
    }

    fn api_request(
        method: &str,
        path: &str,
        body: Option<&str>,
        auth: Option<AuthSession>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let mut request = builder
            .body(
                body.map(|b| Body::from(b.to_string()))
                    .unwrap_or_else(Body::empty),
            )
            .unwrap();
        if let Some(auth) = auth {
            request.extensions_mut().insert(auth);
        }
        request
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_a_track_name() {
        let authority = FakeAuthority::accepting(&["t"]);
        let auth = authenticated_session(&authority, "t");

        let response = app(&authority)
            .oneshot(api_request(
                "POST",
                "/api/tracks",
                Some(r#"{"project_id": 7}"#),
                Some(auth),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Nie podano nazwy utworu");
    }

    #[tokio::test]
    async fn test_create_requires_a_project_id() {
        let authority = FakeAuthority::accepting(&["t"]);
        let auth = authenticated_session(&authority, "t");

        let response = app(&authority)
            .oneshot(api_request(
                "POST",
                "/api/tracks",
                Some(r#"{"name": "Demo"}"#),
                Some(auth),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Nie podano ID projektu");
    }

    #[tokio::test]
    async fn test_track_id_must_be_numeric() {
        let authority = FakeAuthority::accepting(&["t"]);
        let auth = authenticated_session(&authority, "t");

        let response = app(&authority)
            .oneshot(api_request("GET", "/api/tracks/abc", None, Some(auth)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Nieprawidłowe ID utworu");
    }

    #[tokio::test]
    async fn test_comment_requires_content() {
        let authority = FakeAuthority::accepting(&["t"]);
        let auth = authenticated_session(&authority, "t");

        let response = app(&authority)
            .oneshot(api_request(
                "POST",
                "/api/tracks/7/comments",
                Some(r#"{"content": "   "}"#),
                Some(auth),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Treść komentarza jest wymagana"
        );
    }

    #[tokio::test]
    async fn test_handlers_reject_unidentified_requests() {
        let authority = FakeAuthority::accepting(&["t"]);

        let response = app(&authority)
            .oneshot(api_request(
                "POST",
                "/api/tracks",
                Some(r#"{"name": "Demo", "project_id": 7}"#),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Nieautoryzowany dostęp");
    }

    #[test]
    fn test_detect_audio_type_mp3() {
        // ID3v2 tag header
        let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x0a".to_vec();
        data.extend_from_slice(&[0u8; 32]);
        assert_eq!(detect_audio_type(&data), Some("audio/mpeg"));
    }

    #[test]
    fn test_detect_audio_type_wav() {
        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        data.extend_from_slice(b"WAVE");
        data.extend_from_slice(&[0u8; 32]);
        assert_eq!(detect_audio_type(&data), Some("audio/x-wav"));
    }

    #[test]
    fn test_detect_audio_type_rejects_images() {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&[0u8; 32]);
        assert_eq!(detect_audio_type(&data), None);
    }

    #[test]
    fn test_detect_audio_type_rejects_garbage() {
        assert_eq!(detect_audio_type(b"to nie jest audio"), None);
        assert_eq!(detect_audio_type(&[]), None);
    }

    #[test]
    fn test_sanitize_file_name_strips_paths() {
        assert_eq!(sanitize_file_name("nagranie.mp3"), "nagranie.mp3");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\muzyka\\demo.wav"), "demo.wav");
        assert_eq!(sanitize_file_name("  "), "plik");
        assert_eq!(sanitize_file_name("sciezka/"), "plik");
    }
}

// src/guard/tests.rs
//! Tests for the request pipeline
//!
//! These tests run real requests through the full middleware stack
//! (CORS first, then the stage pipeline) against probe routes, with a
//! fake credential authority that records every validation call.

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::body::Body;
    use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, COOKIE, LOCATION};
    use axum::http::{Method, Request, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Extension, Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::auth::CurrentUser;
    use crate::common::testing::{cookie_pair, test_state, FakeAuthority};
    use crate::common::AppState;

    async fn whoami(CurrentUser(identity): CurrentUser) -> Json<serde_json::Value> {
        Json(serde_json::json!({"id": identity.id}))
    }

    async fn page_probe() -> &'static str {
        "ok"
    }

    /// Probe routes behind the same middleware stack main() builds,
    /// minus tracing. `hits` counts API handler executions.
    fn app(state: Arc<AppState>, hits: Arc<AtomicUsize>) -> Router {
        let api_probe = {
            let hits = hits.clone();
            move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({"ok": true}))
                }
            }
        };
        let auth_probe = {
            let hits = hits.clone();
            move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({"ok": true}))
                }
            }
        };

        Router::new()
            .route("/", get(page_probe))
            .route("/login", get(page_probe))
            .route("/dashboard", get(page_probe))
            .route("/projects/:id", get(page_probe))
            .route("/api/projects", get(api_probe))
            .route("/api/auth/ping", get(auth_probe))
            .route("/api/whoami", get(whoami))
            .layer(middleware::from_fn(pipeline))
            .layer(middleware::from_fn(crate::cors_middleware::cors))
            .layer(Extension(state))
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_protected_api_without_credentials_is_rejected() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let response = app.oneshot(get_request("/api/projects")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Nieautoryzowany dostęp"})
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0, "handler must not run");
    }

    #[tokio::test]
    async fn test_public_api_passes_without_credentials() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let response = app.oneshot(get_request("/api/auth/ping")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(authority.user_validations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_cookie_session_reaches_the_handler() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .uri("/api/whoami")
            .header(COOKIE, cookie_pair(&authority, "good-token"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"id": authority.user.id})
        );
        assert_eq!(authority.user_validations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cookie_session_is_revalidated_not_trusted() {
        // Parseable cookie, but the authority no longer honors the token.
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .uri("/dashboard")
            .header(COOKIE, cookie_pair(&authority, "revoked-token"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/login?redirect=%2Fdashboard"
        );
        assert_eq!(authority.user_validations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_cookie_on_protected_api_is_401() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .uri("/api/projects")
            .header(COOKIE, cookie_pair(&authority, "revoked-token"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bearer_fallback_authenticates_protected_api() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .uri("/api/whoami")
            .header(AUTHORIZATION, "Bearer good-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"id": authority.user.id})
        );
        assert_eq!(authority.bearer_validations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_bearer_is_terminal() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .uri("/api/projects")
            .header(AUTHORIZATION, "Bearer forged-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0, "handler must not run");
        assert_eq!(authority.bearer_validations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bearer_is_ignored_on_pages() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .uri("/dashboard")
            .header(AUTHORIZATION, "Bearer good-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(authority.bearer_validations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authenticated_auth_page_redirects_to_dashboard() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .uri("/login")
            .header(COOKIE, cookie_pair(&authority, "good-token"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/dashboard");
    }

    #[tokio::test]
    async fn test_root_is_public_in_both_states() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let state = test_state(authority.clone());

        let response = app(state.clone(), hits.clone())
            .oneshot(get_request("/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .uri("/")
            .header(COOKIE, cookie_pair(&authority, "good-token"))
            .body(Body::empty())
            .unwrap();
        let response = app(state, hits).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/dashboard");
    }

    #[tokio::test]
    async fn test_login_redirect_keeps_path_and_query() {
        let authority = FakeAuthority::accepting(&[]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority), hits);

        let response = app
            .oneshot(get_request("/projects/42?tab=files"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/login?redirect=%2Fprojects%2F42%3Ftab%3Dfiles"
        );
    }

    #[tokio::test]
    async fn test_preflight_never_reaches_authority_or_handler() {
        let authority = FakeAuthority::accepting(&["good-token"]);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_state(authority.clone()), hits.clone());

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/projects")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(authority.user_validations.load(Ordering::SeqCst), 0);
        assert_eq!(authority.bearer_validations.load(Ordering::SeqCst), 0);
    }
}

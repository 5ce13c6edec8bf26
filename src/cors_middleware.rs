// src/cors_middleware.rs
//! Cross-origin policy for the API surface
//!
//! Applies one fixed header set to every `/api/...` response and
//! answers preflight probes directly with 204, without ever invoking
//! the downstream stack. Non-api requests pass through untouched.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::guard::RouteClass;

/// Middleware wrapping API responses with the cross-origin header set.
pub async fn cors(request: Request, next: Next) -> Response {
    if !RouteClass::of(request.uri().path()).is_api() {
        return next.run(request).await;
    }

    if request.method() == Method::OPTIONS {
        debug!(path = %request.uri().path(), "Answering CORS preflight");
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("authorization, x-client-info, apikey, content-type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("content-range, x-api-version"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn test_router(hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/api/ping",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "pong"
                    }
                }),
            )
            .route("/strona", get(|| async { "ok" }))
            .layer(middleware::from_fn(cors))
    }

    #[tokio::test]
    async fn test_preflight_answers_204_without_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = test_router(hits.clone());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS),
            Some(&HeaderValue::from_static(
                "GET, POST, PUT, DELETE, PATCH, OPTIONS"
            ))
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_responses_carry_cors_headers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = test_router(hits.clone());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_HEADERS),
            Some(&HeaderValue::from_static(
                "authorization, x-client-info, apikey, content-type"
            ))
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_EXPOSE_HEADERS),
            Some(&HeaderValue::from_static("content-range, x-api-version"))
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_api_requests_pass_through_untouched() {
        let app = test_router(Arc::new(AtomicUsize::new(0)));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/strona")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}

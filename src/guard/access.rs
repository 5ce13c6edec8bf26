// src/guard/access.rs
//! Access decision stage
//!
//! Turns `{route class, authenticated?}` into continue / redirect /
//! reject. The decision table is ordered; the first matching rule wins.

use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect};
use tracing::debug;

use super::classify::RouteClass;
use super::{GuardContext, StageFuture, StageOutcome};
use crate::common::{ApiError, AppState};

/// Outcome of the decision table, before it is turned into a response.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Continue,
    Redirect(String),
    Reject,
}

/// Stage 2: apply the access policy for the resolved session state.
pub(crate) fn authorize<'a>(
    _state: &'a AppState,
    parts: &'a Parts,
    ctx: &'a mut GuardContext,
) -> StageFuture<'a> {
    Box::pin(async move {
        let decision = decide(
            ctx.class,
            ctx.auth.is_authenticated(),
            parts.uri.path(),
            parts.uri.query(),
        );

        match decision {
            Decision::Continue => StageOutcome::Continue,
            Decision::Redirect(location) => {
                debug!(
                    path = %parts.uri.path(),
                    location = %location,
                    "Redirecting by access policy"
                );
                StageOutcome::Terminal(Redirect::to(&location).into_response())
            }
            Decision::Reject => StageOutcome::Terminal(
                ApiError::Unauthorized(format!(
                    "no valid session for {}",
                    parts.uri.path()
                ))
                .into_response(),
            ),
        }
    })
}

/// The decision table. Root and auth routes classify as public pages, so
/// the protected-page rule can never bounce the login flow into itself.
pub(crate) fn decide(
    class: RouteClass,
    authenticated: bool,
    path: &str,
    query: Option<&str>,
) -> Decision {
    match class {
        RouteClass::ProtectedApi if !authenticated => Decision::Reject,
        RouteClass::PublicApi | RouteClass::ProtectedApi => Decision::Continue,
        RouteClass::ProtectedPage if !authenticated => {
            Decision::Redirect(login_redirect(path, query))
        }
        RouteClass::PublicPage if authenticated => Decision::Redirect("/dashboard".to_string()),
        _ => Decision::Continue,
    }
}

/// Login location carrying the original path+query, percent-encoded, so
/// the post-login hop can restore it exactly.
fn login_redirect(path: &str, query: Option<&str>) -> String {
    let original = match query {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    };
    format!("/login?redirect={}", urlencoding::encode(&original))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_api_without_session_rejects() {
        assert_eq!(
            decide(RouteClass::ProtectedApi, false, "/api/projects", None),
            Decision::Reject
        );
    }

    #[test]
    fn test_protected_api_with_session_continues() {
        assert_eq!(
            decide(RouteClass::ProtectedApi, true, "/api/projects", None),
            Decision::Continue
        );
    }

    #[test]
    fn test_public_api_continues_either_way() {
        assert_eq!(
            decide(RouteClass::PublicApi, false, "/api/auth/login", None),
            Decision::Continue
        );
        assert_eq!(
            decide(RouteClass::PublicApi, true, "/api/auth/logout", None),
            Decision::Continue
        );
    }

    #[test]
    fn test_protected_page_without_session_redirects_to_login() {
        assert_eq!(
            decide(RouteClass::ProtectedPage, false, "/dashboard", None),
            Decision::Redirect("/login?redirect=%2Fdashboard".to_string())
        );
    }

    #[test]
    fn test_login_redirect_preserves_path_and_query() {
        let Decision::Redirect(location) = decide(
            RouteClass::ProtectedPage,
            false,
            "/projects/42",
            Some("tab=files"),
        ) else {
            panic!("expected a redirect");
        };

        let encoded = location.strip_prefix("/login?redirect=").unwrap();
        assert_eq!(
            urlencoding::decode(encoded).unwrap(),
            "/projects/42?tab=files"
        );
    }

    #[test]
    fn test_public_page_with_session_goes_to_dashboard() {
        assert_eq!(
            decide(RouteClass::PublicPage, true, "/", None),
            Decision::Redirect("/dashboard".to_string())
        );
        assert_eq!(
            decide(RouteClass::PublicPage, true, "/login", None),
            Decision::Redirect("/dashboard".to_string())
        );
    }

    #[test]
    fn test_public_page_without_session_continues() {
        assert_eq!(
            decide(RouteClass::PublicPage, false, "/", None),
            Decision::Continue
        );
        assert_eq!(
            decide(RouteClass::PublicPage, false, "/login", None),
            Decision::Continue
        );
    }

    #[test]
    fn test_protected_page_with_session_continues() {
        assert_eq!(
            decide(RouteClass::ProtectedPage, true, "/dashboard", None),
            Decision::Continue
        );
    }
}

// src/guard/classify.rs
//! Route classification
//!
//! Every request path maps to exactly one class; the access stage picks
//! its policy from the class alone. Classification is derived per
//! request and never stored.

/// Policy class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// `/api/auth/...`: reachable without credentials (login happens here).
    PublicApi,
    /// Any other `/api/...` path: requires a validated session.
    ProtectedApi,
    /// `/`, the auth pages and `/auth/...`: never redirected to login.
    PublicPage,
    /// Every remaining page path: requires a session, redirects to login.
    ProtectedPage,
}

impl RouteClass {
    pub fn of(path: &str) -> Self {
        if path == "/api" || path.starts_with("/api/") {
            if path == "/api/auth" || path.starts_with("/api/auth/") {
                RouteClass::PublicApi
            } else {
                RouteClass::ProtectedApi
            }
        } else if path == "/" || is_auth_page(path) {
            RouteClass::PublicPage
        } else {
            RouteClass::ProtectedPage
        }
    }

    pub fn is_api(self) -> bool {
        matches!(self, RouteClass::PublicApi | RouteClass::ProtectedApi)
    }
}

/// Auth pages stay public in both directions of the login flow, so an
/// unauthenticated visit never bounces back to `/login` in a loop.
fn is_auth_page(path: &str) -> bool {
    path == "/login"
        || path == "/signup"
        || path == "/auth"
        || path.starts_with("/login/")
        || path.starts_with("/signup/")
        || path.starts_with("/auth/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_paths() {
        assert_eq!(RouteClass::of("/api/projects"), RouteClass::ProtectedApi);
        assert_eq!(RouteClass::of("/api/projects/42"), RouteClass::ProtectedApi);
        assert_eq!(RouteClass::of("/api/me"), RouteClass::ProtectedApi);
        assert_eq!(RouteClass::of("/api"), RouteClass::ProtectedApi);
    }

    #[test]
    fn test_auth_api_paths_are_public() {
        assert_eq!(RouteClass::of("/api/auth/login"), RouteClass::PublicApi);
        assert_eq!(RouteClass::of("/api/auth/logout"), RouteClass::PublicApi);
        assert_eq!(RouteClass::of("/api/auth"), RouteClass::PublicApi);
    }

    #[test]
    fn test_root_is_always_public() {
        assert_eq!(RouteClass::of("/"), RouteClass::PublicPage);
    }

    #[test]
    fn test_auth_pages_are_public() {
        assert_eq!(RouteClass::of("/login"), RouteClass::PublicPage);
        assert_eq!(RouteClass::of("/signup"), RouteClass::PublicPage);
        assert_eq!(RouteClass::of("/auth/callback"), RouteClass::PublicPage);
        assert_eq!(RouteClass::of("/auth/update-password"), RouteClass::PublicPage);
    }

    #[test]
    fn test_other_pages_are_protected() {
        assert_eq!(RouteClass::of("/dashboard"), RouteClass::ProtectedPage);
        assert_eq!(RouteClass::of("/moj-projekt"), RouteClass::ProtectedPage);
        assert_eq!(
            RouteClass::of("/moj-projekt/demo-1"),
            RouteClass::ProtectedPage
        );
        assert_eq!(RouteClass::of("/invite/abc123"), RouteClass::ProtectedPage);
    }

    #[test]
    fn test_prefix_lookalikes() {
        // Segment boundaries matter: these only resemble special paths.
        assert_eq!(RouteClass::of("/apiary"), RouteClass::ProtectedPage);
        assert_eq!(RouteClass::of("/api/authors"), RouteClass::ProtectedApi);
        assert_eq!(RouteClass::of("/loginy"), RouteClass::ProtectedPage);
    }

    #[test]
    fn test_is_api() {
        assert!(RouteClass::PublicApi.is_api());
        assert!(RouteClass::ProtectedApi.is_api());
        assert!(!RouteClass::PublicPage.is_api());
        assert!(!RouteClass::ProtectedPage.is_api());
    }
}

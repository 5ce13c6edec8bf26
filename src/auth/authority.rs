// src/auth/authority.rs
//! Credential authority client
//!
//! The service never verifies credentials itself; every authentication
//! decision is delegated to a GoTrue-style HTTP auth service. The
//! `CredentialAuthority` trait is the capability boundary: session
//! parsing from cookies, token validation, password grants, sign-up,
//! recovery, user updates and the OAuth authorize/exchange pair.

use async_trait::async_trait;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::models::{AuthorityUser, Session, SignUpOutcome, TokenClaims, TokenGrant, UserUpdate};

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("auth service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("auth service returned a malformed payload: {0}")]
    Malformed(String),
}

/// Capabilities the rest of the service may ask of the credential
/// authority. Implementations must be fail-closed: any doubt is an Err.
#[async_trait]
pub trait CredentialAuthority: Send + Sync {
    /// Parse a session from request cookies. Pure local parse; the result
    /// is untrusted until `validate_user` accepts its access token.
    fn session_from_cookies(&self, headers: &HeaderMap) -> Option<Session>;

    /// Re-validate an access token by fetching its principal from the
    /// authority. This is the network round trip that makes a cookie
    /// session trustworthy.
    async fn validate_user(&self, access_token: &str) -> Result<AuthorityUser, AuthorityError>;

    /// Validate a bearer token presented in the Authorization header.
    async fn validate_bearer(&self, token: &str) -> Result<AuthorityUser, AuthorityError>;

    /// Password grant.
    async fn sign_in(&self, email: &str, password: &str) -> Result<TokenGrant, AuthorityError>;

    /// Registration; `name` lands in the authority-side user metadata.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, AuthorityError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthorityError>;

    /// Send a password-recovery email with a redirect target.
    async fn recover(&self, email: &str, redirect_to: &str) -> Result<(), AuthorityError>;

    /// Update password and/or metadata of the token's user.
    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<AuthorityUser, AuthorityError>;

    /// Authorize URL for an OAuth provider flow. No network call.
    fn oauth_authorize_url(&self, provider: &str, redirect_to: &str) -> String;

    /// Exchange an OAuth authorization code for a token grant.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenGrant, AuthorityError>;
}

/// HTTP client for the credential authority's REST surface.
pub struct AuthApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    cookie_name: String,
}

impl AuthApiClient {
    pub fn new(base_url: &str, api_key: &str, cookie_name: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cookie_name: cookie_name.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reads the error message out of an authority error body. The
    /// service versions disagree on the field name, so try them in turn.
    async fn rejection(status: reqwest::StatusCode, resp: reqwest::Response) -> AuthorityError {
        let message = match resp.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("msg")
                .or_else(|| body.get("error_description"))
                .or_else(|| body.get("message"))
                .or_else(|| body.get("error"))
                .and_then(|v| v.as_str())
                .unwrap_or("request rejected")
                .to_string(),
            Err(_) => "request rejected".to_string(),
        };
        AuthorityError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<AuthorityUser, AuthorityError> {
        let resp = self
            .http
            .get(self.endpoint("/user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            debug!(http_status = %status, "Authority declined the access token");
            return Err(Self::rejection(status, resp).await);
        }

        resp.json::<AuthorityUser>()
            .await
            .map_err(|e| AuthorityError::Malformed(e.to_string()))
    }

    async fn token_grant(&self, resp: reqwest::Response) -> Result<TokenGrant, AuthorityError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::rejection(status, resp).await);
        }
        resp.json::<TokenGrant>()
            .await
            .map_err(|e| AuthorityError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CredentialAuthority for AuthApiClient {
    fn session_from_cookies(&self, headers: &HeaderMap) -> Option<Session> {
        let raw = collect_cookie_value(headers, &self.cookie_name)?;
        parse_session_cookie(&raw)
    }

    async fn validate_user(&self, access_token: &str) -> Result<AuthorityUser, AuthorityError> {
        self.fetch_user(access_token).await
    }

    async fn validate_bearer(&self, token: &str) -> Result<AuthorityUser, AuthorityError> {
        self.fetch_user(token).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<TokenGrant, AuthorityError> {
        let resp = self
            .http
            .post(self.endpoint("/token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        self.token_grant(resp).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, AuthorityError> {
        let resp = self
            .http
            .post(self.endpoint("/signup"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::rejection(status, resp).await);
        }

        // With auto-confirm the body is a full grant; with email
        // confirmation pending it is just the user object.
        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AuthorityError::Malformed(e.to_string()))?;

        if body.get("access_token").is_some() {
            let grant: TokenGrant = serde_json::from_value(body)
                .map_err(|e| AuthorityError::Malformed(e.to_string()))?;
            Ok(SignUpOutcome {
                user: grant.user.clone(),
                grant: Some(grant),
            })
        } else {
            let user: AuthorityUser = serde_json::from_value(body)
                .map_err(|e| AuthorityError::Malformed(e.to_string()))?;
            Ok(SignUpOutcome { user, grant: None })
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthorityError> {
        let resp = self
            .http
            .post(self.endpoint("/logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::rejection(status, resp).await);
        }
        Ok(())
    }

    async fn recover(&self, email: &str, redirect_to: &str) -> Result<(), AuthorityError> {
        let url = format!(
            "{}?redirect_to={}",
            self.endpoint("/recover"),
            urlencoding::encode(redirect_to)
        );
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::rejection(status, resp).await);
        }
        Ok(())
    }

    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<AuthorityUser, AuthorityError> {
        let resp = self
            .http
            .put(self.endpoint("/user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .json(&update)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::rejection(status, resp).await);
        }

        resp.json::<AuthorityUser>()
            .await
            .map_err(|e| AuthorityError::Malformed(e.to_string()))
    }

    fn oauth_authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}?provider={}&redirect_to={}",
            self.endpoint("/authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to)
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenGrant, AuthorityError> {
        let mut body = serde_json::json!({ "auth_code": code });
        if let Some(verifier) = code_verifier {
            body["code_verifier"] = serde_json::Value::String(verifier.to_string());
        }

        let resp = self
            .http
            .post(self.endpoint("/token?grant_type=pkce"))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP error during authorization-code exchange");
                AuthorityError::Transport(e)
            })?;

        self.token_grant(resp).await
    }
}

// ---- Cookie and token helpers ----

/// Collects a cookie value by name from all `Cookie` headers. The
/// authority's SSR clients split large sessions into `{name}.0`,
/// `{name}.1`, ... chunks; those are reassembled in index order.
pub(crate) fn collect_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let mut cookies: Vec<(String, String)> = Vec::new();

    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else { continue };
        for pair in value.split(';') {
            if let Some((k, v)) = pair.trim().split_once('=') {
                cookies.push((k.to_string(), v.to_string()));
            }
        }
    }

    if let Some((_, v)) = cookies.iter().find(|(k, _)| k == name) {
        return Some(v.clone());
    }

    let mut chunks: Vec<(usize, &str)> = cookies
        .iter()
        .filter_map(|(k, v)| {
            let idx = k.strip_prefix(name)?.strip_prefix('.')?;
            idx.parse::<usize>().ok().map(|i| (i, v.as_str()))
        })
        .collect();

    if chunks.is_empty() {
        return None;
    }

    chunks.sort_by_key(|(i, _)| *i);
    Some(chunks.into_iter().map(|(_, v)| v).collect::<String>())
}

/// Parses the session cookie payload: `base64-` prefixed base64url JSON
/// (current SSR clients) or percent-encoded plain JSON (older ones).
pub(crate) fn parse_session_cookie(raw: &str) -> Option<Session> {
    if let Some(encoded) = raw.strip_prefix("base64-") {
        let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
        return serde_json::from_slice::<Session>(&bytes).ok();
    }

    let decoded = urlencoding::decode(raw).ok()?;
    serde_json::from_str::<Session>(&decoded).ok()
}

/// Parses token claims locally without verifying the signature. Only
/// good for log hints; never use the result to authorize anything.
pub(crate) fn peek_claims(token: &str) -> Option<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    match decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            warn!(error = %e, "Failed to parse access-token claims");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn session_json() -> String {
        serde_json::json!({
            "access_token": "token-abc",
            "token_type": "bearer",
            "expires_at": 9999999999i64,
            "refresh_token": "refresh-xyz",
            "user": { "id": "4f9c6f8e-8d1a-4f2b-9a35-2f54d63f3a11" }
        })
        .to_string()
    }

    #[test]
    fn test_collect_cookie_value_exact_name() {
        let headers = headers_with_cookie("other=1; session=abc; more=2");
        assert_eq!(
            collect_cookie_value(&headers, "session"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_collect_cookie_value_chunked() {
        let headers = headers_with_cookie("session.1=def; session.0=abc");
        assert_eq!(
            collect_cookie_value(&headers, "session"),
            Some("abcdef".to_string())
        );
    }

    #[test]
    fn test_collect_cookie_value_missing() {
        let headers = headers_with_cookie("other=1");
        assert_eq!(collect_cookie_value(&headers, "session"), None);
    }

    #[test]
    fn test_parse_session_cookie_base64() {
        let encoded = format!("base64-{}", URL_SAFE_NO_PAD.encode(session_json()));
        let session = parse_session_cookie(&encoded).unwrap();
        assert_eq!(session.access_token, "token-abc");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-xyz"));
    }

    #[test]
    fn test_parse_session_cookie_plain_json() {
        let raw = urlencoding::encode(&session_json()).to_string();
        let session = parse_session_cookie(&raw).unwrap();
        assert_eq!(session.access_token, "token-abc");
    }

    #[test]
    fn test_parse_session_cookie_garbage() {
        assert!(parse_session_cookie("base64-!!notbase64!!").is_none());
        assert!(parse_session_cookie("just a string").is_none());
    }

    #[test]
    fn test_peek_claims_ignores_signature() {
        let claims = TokenClaims {
            sub: "user-1".to_string(),
            exp: 9999999999,
            email: Some("user@example.com".to_string()),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"some-unknown-secret"),
        )
        .unwrap();

        let peeked = peek_claims(&token).expect("claims should parse");
        assert_eq!(peeked.sub, "user-1");
        assert_eq!(peeked.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn test_peek_claims_rejects_junk() {
        assert!(peek_claims("not-a-jwt").is_none());
    }

    #[test]
    fn test_oauth_authorize_url() {
        let client = AuthApiClient::new("https://auth.example.com/auth/v1/", "key", "session");
        let url = client.oauth_authorize_url("google", "https://app.example.com/auth/callback");
        assert_eq!(
            url,
            "https://auth.example.com/auth/v1/authorize?provider=google&redirect_to=https%3A%2F%2Fapp.example.com%2Fauth%2Fcallback"
        );
    }
}

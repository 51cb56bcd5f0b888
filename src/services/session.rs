/// Session resolution
///
/// The list routes only need "who is calling, if anyone". Where that answer
/// comes from is pluggable: a header stamped by an auth gateway, or the auth
/// server's own session endpoint.
use axum::http::{header, HeaderMap};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Trait for session providers
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolves the caller from request headers; `None` when not signed in.
    async fn resolve(&self, headers: &HeaderMap) -> AppResult<Option<Session>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Reads the user id from a header set by a trusted upstream
#[derive(Debug, Clone)]
pub struct HeaderSessionProvider {
    header_name: String,
}

impl HeaderSessionProvider {
    pub fn new(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
        }
    }
}

#[async_trait::async_trait]
impl SessionProvider for HeaderSessionProvider {
    async fn resolve(&self, headers: &HeaderMap) -> AppResult<Option<Session>> {
        let session = headers
            .get(self.header_name.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user_id| !user_id.is_empty())
            .map(|user_id| Session {
                user_id: user_id.to_string(),
            });

        Ok(session)
    }

    fn name(&self) -> &'static str {
        "header"
    }
}

/// Asks the auth server which user owns the request's cookies
///
/// Calls `GET {auth_url}/api/auth/get-session`, which answers with
/// `{"user": {"id": ...}, ...}` or `null`.
#[derive(Clone)]
pub struct RemoteSessionProvider {
    http_client: HttpClient,
    auth_url: String,
}

#[derive(Debug, Deserialize)]
struct RemoteSession {
    user: Option<RemoteUser>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
}

impl RemoteSessionProvider {
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn session_from_body(body: Option<RemoteSession>) -> Option<Session> {
        body.and_then(|s| s.user)
            .filter(|user| !user.id.is_empty())
            .map(|user| Session { user_id: user.id })
    }
}

#[async_trait::async_trait]
impl SessionProvider for RemoteSessionProvider {
    async fn resolve(&self, headers: &HeaderMap) -> AppResult<Option<Session>> {
        let cookie = headers.get(header::COOKIE);
        let authorization = headers.get(header::AUTHORIZATION);

        // Nothing to forward, so nobody can be signed in.
        if cookie.is_none() && authorization.is_none() {
            return Ok(None);
        }

        let url = format!("{}/api/auth/get-session", self.auth_url);
        let mut request = self.http_client.get(&url);
        if let Some(cookie) = cookie.and_then(|v| v.to_str().ok()) {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(authorization) = authorization.and_then(|v| v.to_str().ok()) {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Auth server returned status {}: {}",
                status, body
            )));
        }

        let body: Option<RemoteSession> = response.json().await?;
        let session = Self::session_from_body(body);

        tracing::debug!(
            authenticated = session.is_some(),
            provider = self.name(),
            "Session resolved"
        );

        Ok(session)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

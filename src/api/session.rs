use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{
    error::{AppError, AppResult},
    services::Session,
};

use super::AppState;

/// The caller's session, resolved once per request from its headers
///
/// Never rejects for a missing session by itself. Handlers that read a body
/// call `require` first, so an anonymous caller gets a 401 whatever the body.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }

    pub fn require(&self) -> AppResult<&Session> {
        self.session().ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = state.sessions.resolve(&parts.headers).await?;
        Ok(MaybeSession(session))
    }
}

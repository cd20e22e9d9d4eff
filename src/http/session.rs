use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::app::auth::IssuedSession;
use crate::domain::account::Identity;
use crate::http::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The identity behind the request's session cookie. Rejects anonymous
/// requests with 401.
#[derive(Debug, Clone)]
pub struct Viewer(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("login required"))?;

        let identity = state.auth.open(token).map_err(|err| {
            tracing::error!(error = ?err, "failed to open session");
            AppError::internal("failed to read session")
        })?;

        identity
            .map(Viewer)
            .ok_or_else(|| AppError::unauthorized("login required"))
    }
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

pub fn session_cookie(session: &IssuedSession, ttl_hours: u64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        session.token,
        ttl_hours * 60 * 60
    )
}

pub fn cleared_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;
use crate::models::AuthSession;
use crate::provider::DataProvider;
use crate::repository;
use crate::state::AppState;

/// Bearer token for LMS calls, resolved per request.
///
/// Order: `Authorization: Bearer` header, the persisted session, then the
/// configured fallback token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn header_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() { None } else { Some(token.to_string()) }
}

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(token) = header_token(parts) {
            return Ok(BearerToken(token));
        }
        if let Some(session) = repository::load_session(&state.db).await? {
            return Ok(BearerToken(session.token));
        }
        if let Some(token) = state.config.canvas.default_token.clone() {
            return Ok(BearerToken(token));
        }
        Err(AppError::Unauthorized("No LMS token; log in first".to_string()))
    }
}

pub async fn login(
    db: &SqlitePool,
    provider: &dyn DataProvider,
    code: &str,
    redirect_uri: &str,
) -> Result<AuthSession, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::BadRequest("code is required".to_string()));
    }
    let session = provider.exchange_code(code, redirect_uri).await?;
    repository::save_session(db, &session).await?;
    info!("logged in as user {}", session.user_id);
    Ok(session)
}

pub async fn logout(db: &SqlitePool) -> Result<bool, AppError> {
    let cleared = repository::clear_session(db).await?;
    if cleared {
        info!("session cleared");
    }
    Ok(cleared)
}

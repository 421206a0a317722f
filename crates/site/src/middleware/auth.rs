//! Access extractors.
//!
//! `RequireUnlocked` admits visitors holding a valid unlock record.
//! `RequireEditor` admits the owner after an edit token login.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use heartgate_core::{CacheCheck, UnlockSession};
use tower_sessions::Session;

use crate::session_cache;

/// Extractor that requires a valid unlock.
///
/// If the visitor is not unlocked, returns a redirect to the gate.
///
/// # Example
///
/// ```rust,ignore
/// async fn gallery(RequireUnlocked(unlock): RequireUnlocked) -> impl IntoResponse {
///     format!("open until {}", unlock.expires_at)
/// }
/// ```
pub struct RequireUnlocked(pub UnlockSession);

/// Extractor that requires an owner login.
pub struct RequireEditor;

/// Error returned when access is required but missing.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect (for HTML requests).
    Redirect(&'static str),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AuthRejection {
    fn for_path(parts: &Parts, html_target: &'static str) -> Self {
        // Nested routers see the path without their prefix.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |original| original.0.path());
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::Redirect(html_target)
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(to) => Redirect::to(to).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireUnlocked
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        match session_cache::read_unlock(session, Utc::now()).await {
            CacheCheck::Valid(unlock) => Ok(Self(unlock)),
            _ => Err(AuthRejection::for_path(parts, "/")),
        }
    }
}

impl<S> FromRequestParts<S> for RequireEditor
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        if session_cache::is_editor(session).await {
            Ok(Self)
        } else {
            Err(AuthRejection::for_path(parts, "/edit"))
        }
    }
}

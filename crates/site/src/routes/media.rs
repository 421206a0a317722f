//! Photo bytes for the in-memory backend.
//!
//! Supabase photos are served by Supabase; this route only exists so local
//! preview can show uploads. Only unlocked visitors and the editor may read.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::services::photo::JPEG_CONTENT_TYPE;
use crate::session_cache;
use crate::state::AppState;

/// Serve a stored blob.
pub async fn media(
    State(state): State<AppState>,
    session: Session,
    Path(path): Path<String>,
) -> Result<Response> {
    let allowed = session_cache::is_unlocked(&session, Utc::now()).await
        || session_cache::is_editor(&session).await;
    if !allowed {
        return Err(AppError::Unauthorized("locked".to_string()));
    }

    let memory = state
        .store()
        .backend()
        .memory()
        .ok_or_else(|| AppError::NotFound(path.clone()))?;
    let bytes = memory
        .blob(&path)
        .await
        .ok_or_else(|| AppError::NotFound(path.clone()))?;

    Ok((
        [
            (header::CONTENT_TYPE, JPEG_CONTENT_TYPE),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}

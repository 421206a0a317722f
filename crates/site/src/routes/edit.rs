//! Edit panel: owner login, text fields, reasons, photos and reset.
//!
//! Every mutating endpoint requires [`RequireEditor`]. Text and reason edits
//! return immediately and are saved after the debounce period.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use heartgate_core::{PhotoId, PhotoRecord, SiteContent, TextFields};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireEditor;
use crate::session_cache;
use crate::state::AppState;
use crate::store::PhotoEdit;

/// Edit panel login.
#[derive(Template, WebTemplate)]
#[template(path = "edit_login.html")]
pub struct EditLoginTemplate {
    pub enabled: bool,
    pub error: Option<String>,
}

/// Edit panel.
#[derive(Template, WebTemplate)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub content: SiteContent,
    pub start_date: String,
    pub offline: bool,
}

/// Generic JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub token: String,
}

/// Show the panel, or the login form.
pub async fn panel(State(state): State<AppState>, session: Session) -> Response {
    if !session_cache::is_editor(&session).await {
        return EditLoginTemplate {
            enabled: state.config().edit_token.is_some(),
            error: None,
        }
        .into_response();
    }

    let content = state.store().snapshot().await;
    EditTemplate {
        start_date: content.start_date.format("%Y-%m-%d").to_string(),
        offline: state.store().backend().is_offline(),
        content,
    }
    .into_response()
}

/// Check the edit token and start an editor session.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if !state.config().edit_token_matches(&form.token) {
        tracing::warn!("Edit panel login refused");
        let page = EditLoginTemplate {
            enabled: state.config().edit_token.is_some(),
            error: Some("Wrong token".to_string()),
        };
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    }

    // New id for the privileged session
    session.cycle_id().await?;
    session_cache::set_editor(&session, true).await?;
    add_breadcrumb("edit", "Editor logged in", None);
    tracing::info!("Editor logged in");
    Ok(Redirect::to("/edit").into_response())
}

/// End the editor session.
pub async fn logout(session: Session) -> Result<Redirect> {
    session_cache::set_editor(&session, false).await?;
    Ok(Redirect::to("/"))
}

/// Replace every text field.
#[instrument(skip_all)]
pub async fn update_site(
    _editor: RequireEditor,
    State(state): State<AppState>,
    Json(fields): Json<TextFields>,
) -> Json<SiteContent> {
    Json(state.store().update_text(fields).await)
}

#[derive(Debug, Deserialize)]
pub struct NewReason {
    pub text: String,
}

/// Append a reason.
pub async fn add_reason(
    _editor: RequireEditor,
    State(state): State<AppState>,
    Json(body): Json<NewReason>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.store().add_reason(&body.text).await?))
}

/// Remove the reason at `index`.
pub async fn remove_reason(
    _editor: RequireEditor,
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<String>>> {
    state.store().remove_reason(index).await?;
    Ok(Json(state.store().snapshot().await.reasons))
}

/// Upload one or more photos.
///
/// Every file part is processed in order. A `caption` text part applies to
/// the files that follow it.
#[instrument(skip_all)]
pub async fn upload_photos(
    _editor: RequireEditor,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<PhotoRecord>>> {
    let mut caption = String::new();
    let mut added = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("caption") {
            caption = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            continue;
        }
        if field.file_name().is_none() {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        added.push(state.store().add_photo(bytes.to_vec(), caption.trim()).await?);
    }

    if added.is_empty() {
        return Err(AppError::BadRequest("no files".to_string()));
    }
    tracing::info!(count = added.len(), "Photos uploaded");
    Ok(Json(added))
}

#[derive(Debug, Deserialize)]
pub struct PhotoEditBody {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(default)]
    pub position: Option<usize>,
}

/// Edit a photo's caption, story or position.
pub async fn update_photo(
    _editor: RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PhotoEditBody>,
) -> Result<Json<PhotoRecord>> {
    let edit = PhotoEdit {
        caption: body.caption,
        story: body.story,
        position: body.position,
    };
    Ok(Json(state.store().update_photo(&PhotoId::new(id), edit).await?))
}

/// Remove a photo.
pub async fn delete_photo(
    _editor: RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>> {
    state.store().remove_photo(&PhotoId::new(id)).await?;
    Ok(Json(ApiResponse::ok()))
}

/// Delete all content and restore the defaults.
#[instrument(skip_all)]
pub async fn reset(
    _editor: RequireEditor,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse>> {
    state.store().reset_site().await?;
    add_breadcrumb("edit", "Site reset", None);
    Ok(Json(ApiResponse {
        success: true,
        message: Some("Site reset to defaults".to_string()),
    }))
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::photo::PhotoError;
use crate::store::StoreError;
use crate::supabase::SupabaseError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Content store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Supabase call failed.
    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Visitor is not unlocked, or not the owner.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Supabase(_) | Self::Session(_) | Self::Internal(_) => true,
            Self::Store(err) => matches!(
                err,
                StoreError::Supabase(_)
                    | StoreError::Photo(PhotoError::Encode(_) | PhotoError::Worker(_))
            ),
            _ => false,
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Supabase(_) => StatusCode::BAD_GATEWAY,
            Self::Store(err) => match err {
                StoreError::Supabase(_) => StatusCode::BAD_GATEWAY,
                StoreError::Offline => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Rejected(_)
                | StoreError::Photo(PhotoError::Empty | PhotoError::Decode(_)) => {
                    StatusCode::BAD_REQUEST
                }
                StoreError::Photo(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Supabase(_) => "External service error".to_string(),
            Self::Store(err) => match err {
                StoreError::Supabase(_) => "External service error".to_string(),
                StoreError::Offline => "No backend configured".to_string(),
                StoreError::NotFound(what) => format!("Not found: {what}"),
                StoreError::Rejected(why) => why.clone(),
                StoreError::Photo(PhotoError::Empty | PhotoError::Decode(_)) => {
                    "Unsupported image".to_string()
                }
                StoreError::Photo(_) => "Internal server error".to_string(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("gate", "Unlock rejected", Some(&[("attempts", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("scene 9".to_string());
        assert_eq!(err.to_string(), "Not found: scene 9");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_status_codes() {
        assert_eq!(
            get_status(StoreError::Offline.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(StoreError::Rejected("reason is empty".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(StoreError::Photo(PhotoError::Empty).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                StoreError::Supabase(SupabaseError::Api {
                    status: 500,
                    message: "boom".to_string()
                })
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }
}

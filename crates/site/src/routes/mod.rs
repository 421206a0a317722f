//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Intro, gate or scenes, depending on session
//! GET  /health                 - Liveness check
//!
//! # Gate
//! POST /intro                  - Mark the intro as seen
//! POST /unlock                 - Gate submission (rate limited)
//! POST /lock                   - Drop the unlock
//! GET  /api/gate               - Gate status JSON
//!
//! # Scenes (requires unlock)
//! GET  /scene/{n}              - Navigate to panel n
//! POST /api/scenes/visibility  - Report panel visibility ratios
//! POST /gift                   - Open today's gift
//! GET  /api/site               - Site content JSON
//! GET  /media/{*path}          - Photo bytes (memory backend)
//!
//! # Edit panel
//! GET  /edit                   - Panel, or login form
//! POST /edit/login             - Owner login (rate limited)
//! POST /edit/logout            - Owner logout
//!
//! # Edit API (requires editor)
//! PUT    /api/site             - Replace text fields (debounced save)
//! POST   /api/reasons          - Add reason
//! DELETE /api/reasons/{index}  - Remove reason
//! POST   /api/photos           - Multipart upload, one or more files
//! PATCH  /api/photos/{id}      - Caption, story or position
//! DELETE /api/photos/{id}      - Remove photo
//! POST   /api/reset            - Reset all content
//! ```

pub mod edit;
pub mod experience;
pub mod gate;
pub mod media;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};

use crate::middleware::{edit_login_rate_limiter, unlock_rate_limiter};
use crate::state::AppState;

/// Largest accepted upload request (all files together).
const UPLOAD_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Create the gate routes router.
pub fn gate_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/unlock",
            post(gate::unlock).layer(unlock_rate_limiter()),
        )
        .route("/intro", post(experience::intro_seen))
        .route("/lock", post(experience::lock))
}

/// Create the scene routes router.
pub fn scene_routes() -> Router<AppState> {
    Router::new()
        .route("/scene/{n}", get(experience::scene))
        .route("/gift", post(experience::open_gift))
        .route("/media/{*path}", get(media::media))
}

/// Create the edit panel routes router.
pub fn edit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(edit::panel))
        .route("/login", post(edit::login).layer(edit_login_rate_limiter()))
        .route("/logout", post(edit::logout))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/gate", get(gate::status))
        .route("/scenes/visibility", post(experience::visibility))
        .route("/site", get(experience::site).put(edit::update_site))
        .route("/reasons", post(edit::add_reason))
        .route("/reasons/{index}", delete(edit::remove_reason))
        .route(
            "/photos",
            post(edit::upload_photos).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/photos/{id}",
            patch(edit::update_photo).delete(edit::delete_photo),
        )
        .route("/reset", post(edit::reset))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(experience::index))
        .route("/health", get(health))
        .merge(gate_routes())
        .merge(scene_routes())
        .nest("/edit", edit_routes())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

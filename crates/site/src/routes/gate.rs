//! Gate route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use heartgate_core::gate::messages;
use heartgate_core::{
    CacheCheck, GateAttemptState, GateOutcome, GatePolicy, Language, UnlockSession,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::session_cache;
use crate::state::AppState;

/// Gate form submission.
#[derive(Debug, Deserialize)]
pub struct UnlockForm {
    #[serde(default)]
    pub date: String,
}

/// Gate page template.
#[derive(Template, WebTemplate)]
#[template(path = "gate.html")]
pub struct GateTemplate {
    pub lang: &'static str,
    pub dir: &'static str,
    pub heading: &'static str,
    pub attempts: u32,
    pub max_attempts: u32,
    pub message: Option<String>,
    pub locked: bool,
    pub seconds_left: i64,
    pub shake: bool,
    pub value: String,
    pub format_example: &'static str,
}

impl GateTemplate {
    /// Render the gate for `attempts` at `now`.
    #[must_use]
    pub fn new(
        attempts: &GateAttemptState,
        policy: &GatePolicy,
        language: Language,
        now: DateTime<Utc>,
    ) -> Self {
        let locked = attempts.is_locked(now);
        Self {
            lang: language.code(),
            dir: language.direction(),
            heading: attempts.hint(policy).message(),
            attempts: attempts.attempt_count(),
            max_attempts: policy.max_attempts,
            message: locked.then(|| {
                GateOutcome::StillLocked {
                    until: attempts.lockout_ends_at().unwrap_or(now),
                }
                .message(policy, now)
                .unwrap_or_default()
            }),
            locked,
            seconds_left: attempts.seconds_left(now),
            shake: false,
            value: String::new(),
            format_example: messages::FORMAT_EXAMPLE,
        }
    }
}

/// Handle a gate submission.
///
/// Success stores the unlock record (and any disclosed photos) and redirects
/// to the scenes. Anything else re-renders the gate.
#[instrument(skip(state, session, form))]
pub async fn unlock(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UnlockForm>,
) -> Result<Response> {
    let now = Utc::now();
    if session_cache::is_unlocked(&session, now).await {
        return Ok(Redirect::to("/").into_response());
    }

    let policy = *state.policy();
    let mut attempts = session_cache::gate_attempts(&session, now).await;
    let outcome = attempts
        .submit(&policy, state.verifier(), &form.date, now)
        .await;

    if let GateOutcome::Unlocked { disclosed } = &outcome {
        let unlock = UnlockSession::grant(now, state.config().gate.unlock_ttl);
        session_cache::write_unlock(&session, &unlock).await?;
        session_cache::clear_gate_attempts(&session).await?;
        if let Some(photos) = disclosed {
            session_cache::store_disclosed_photos(&session, photos).await?;
        }
        add_breadcrumb("gate", "Unlocked", None);
        tracing::info!(expires_at = %unlock.expires_at, "Gate unlocked");
        return Ok(Redirect::to("/").into_response());
    }

    session_cache::store_gate_attempts(&session, &attempts).await?;

    let attempt_count = attempts.attempt_count().to_string();
    match &outcome {
        GateOutcome::Rejected { .. } => {
            add_breadcrumb(
                "gate",
                "Unlock rejected",
                Some(&[("attempts", attempt_count.as_str())]),
            );
            tracing::info!(attempts = attempts.attempt_count(), "Gate rejected");
        }
        GateOutcome::LockedOut { until } => {
            tracing::warn!(%until, "Gate locked after repeated failures");
        }
        GateOutcome::Unavailable => {
            tracing::warn!("Gate verification unavailable");
        }
        _ => {}
    }

    let language = state.store().snapshot().await.language;
    let mut page = GateTemplate::new(&attempts, &policy, language, now);
    page.message = outcome.message(&policy, now).or(page.message);
    page.shake =
        matches!(outcome, GateOutcome::Rejected { .. }) && attempts.should_shake(&policy);
    if !outcome.clears_input() && !matches!(outcome, GateOutcome::Ignored) {
        page.value = form.date.trim().to_string();
    }

    let status = if matches!(outcome, GateOutcome::Unavailable) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    Ok((status, page).into_response())
}

/// Gate status for scripts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateStatus {
    pub unlocked: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub intro_seen: bool,
    pub attempts: u32,
    pub max_attempts: u32,
    pub locked: bool,
    pub seconds_left: i64,
    pub hint: &'static str,
}

/// Report the visitor's gate status.
pub async fn status(State(state): State<AppState>, session: Session) -> Json<GateStatus> {
    let now = Utc::now();
    let policy = state.policy();
    let unlock = session_cache::read_unlock(&session, now).await;
    let attempts = session_cache::gate_attempts(&session, now).await;

    Json(GateStatus {
        unlocked: unlock.is_unlocked(),
        expires_at: match unlock {
            CacheCheck::Valid(record) => Some(record.expires_at),
            _ => None,
        },
        intro_seen: session_cache::intro_seen(&session).await,
        attempts: attempts.attempt_count(),
        max_attempts: policy.max_attempts,
        locked: attempts.is_locked(now),
        seconds_left: attempts.seconds_left(now),
        hint: attempts.hint(policy).message(),
    })
}

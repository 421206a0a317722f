//! The visitor experience: intro, gate or scenes on `/`, plus scene
//! navigation, the daily gift and the explicit lock.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Datelike, Utc};
use heartgate_core::moments::{AnniversaryDay, Elapsed, daily_message};
use heartgate_core::{DayFlag, Scene, SceneSequence, SiteContent, Visibility};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireUnlocked;
use crate::session_cache;
use crate::state::AppState;

use super::gate::GateTemplate;

/// One-time intro screen.
#[derive(Template, WebTemplate)]
#[template(path = "intro.html")]
pub struct IntroTemplate {
    pub lang: &'static str,
    pub dir: &'static str,
    pub her_name: String,
}

/// A link in the progress navigation.
pub struct SceneLink {
    pub index: usize,
    pub anchor: &'static str,
    pub label: &'static str,
    pub current: bool,
}

/// The unlocked experience.
#[derive(Template, WebTemplate)]
#[template(path = "scenes.html")]
pub struct ScenesTemplate {
    pub lang: &'static str,
    pub dir: &'static str,
    pub content: SiteContent,
    pub start_date: String,
    pub elapsed: Elapsed,
    pub daily_message: &'static str,
    pub scenes: Vec<SceneLink>,
    pub current_anchor: &'static str,
    /// Index of the panel after the current one, for the scroll hint.
    pub next_index: Option<usize>,
    pub gift_opened: bool,
    pub show_anniversary: bool,
    pub years_together: i32,
}

fn scene_links(sequence: &SceneSequence) -> Vec<SceneLink> {
    Scene::ALL
        .iter()
        .map(|scene| SceneLink {
            index: scene.index(),
            anchor: scene.anchor(),
            label: scene.label(),
            current: *scene == sequence.current(),
        })
        .collect()
}

/// Site content as this visitor sees it: the gallery is the photos the
/// unlock disclosed, when it disclosed any.
async fn visitor_content(state: &AppState, session: &Session) -> SiteContent {
    let mut content = state.store().snapshot().await;
    if let Some(photos) = session_cache::disclosed_photos(session).await {
        content.photos = photos;
    }
    content
}

/// Render the intro, the gate or the scenes, depending on the session.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Response> {
    let now = Utc::now();

    if !session_cache::is_unlocked(&session, now).await {
        let content = state.store().snapshot().await;
        if !session_cache::intro_seen(&session).await {
            return Ok(IntroTemplate {
                lang: content.language.code(),
                dir: content.language.direction(),
                her_name: content.her_name,
            }
            .into_response());
        }

        let attempts = session_cache::gate_attempts(&session, now).await;
        session_cache::store_gate_attempts(&session, &attempts).await?;
        return Ok(
            GateTemplate::new(&attempts, state.policy(), content.language, now).into_response(),
        );
    }

    let content = visitor_content(&state, &session).await;
    let today = now.date_naive();
    let sequence = session_cache::scene_sequence(&session).await;

    let anniversary = state
        .config()
        .anniversary
        .unwrap_or_else(|| AnniversaryDay::of(content.start_date));
    let show_anniversary = anniversary.matches(today)
        && !session_cache::day_flag(&session, DayFlag::AnniversaryShown, today).await;
    if show_anniversary {
        session_cache::set_day_flag(&session, DayFlag::AnniversaryShown, today).await?;
        add_breadcrumb("scenes", "Anniversary shown", None);
    }

    Ok(ScenesTemplate {
        lang: content.language.code(),
        dir: content.language.direction(),
        start_date: content.start_date.format("%d/%m/%Y").to_string(),
        elapsed: Elapsed::since(content.start_date, now),
        daily_message: daily_message(today),
        scenes: scene_links(&sequence),
        current_anchor: sequence.current().anchor(),
        next_index: sequence.next().map(Scene::index),
        gift_opened: session_cache::day_flag(&session, DayFlag::GiftOpened, today).await,
        show_anniversary,
        years_together: (today.year() - content.start_date.year()).max(0),
        content,
    }
    .into_response())
}

/// Mark the intro as seen.
pub async fn intro_seen(session: Session) -> Result<Redirect> {
    session_cache::mark_intro_seen(&session).await?;
    Ok(Redirect::to("/"))
}

/// Drop the unlock; the next load shows the gate.
#[instrument(skip(session))]
pub async fn lock(session: Session) -> Result<Redirect> {
    session_cache::clear_unlock(&session).await?;
    add_breadcrumb("gate", "Locked", None);
    tracing::info!("Visitor locked the site");
    Ok(Redirect::to("/"))
}

/// Navigate to panel `n` (zero-based) and scroll to it.
pub async fn scene(
    _unlocked: RequireUnlocked,
    session: Session,
    Path(n): Path<usize>,
) -> Result<Redirect> {
    let mut sequence = session_cache::scene_sequence(&session).await;
    let scene = sequence
        .navigate(n)
        .ok_or_else(|| AppError::NotFound(format!("scene {n}")))?;
    session_cache::store_scene(&session, &sequence).await?;
    Ok(Redirect::to(&format!("/#{}", scene.anchor())))
}

/// Batch of visibility reports from the page script.
#[derive(Debug, Deserialize)]
pub struct VisibilityReport {
    pub entries: Vec<Visibility>,
}

/// Current panel after a report.
#[derive(Debug, Serialize)]
pub struct SceneState {
    pub current: usize,
    pub anchor: &'static str,
    pub changed: bool,
}

/// Apply visibility reports and remember the current panel.
pub async fn visibility(
    _unlocked: RequireUnlocked,
    session: Session,
    Json(report): Json<VisibilityReport>,
) -> Result<Json<SceneState>> {
    let mut sequence = session_cache::scene_sequence(&session).await;
    let changed = sequence.observe(&report.entries).is_some();
    if changed {
        session_cache::store_scene(&session, &sequence).await?;
    }
    Ok(Json(SceneState {
        current: sequence.current_index(),
        anchor: sequence.current().anchor(),
        changed,
    }))
}

/// Open today's gift. It stays open for the rest of the day.
pub async fn open_gift(_unlocked: RequireUnlocked, session: Session) -> Result<Response> {
    let today = Utc::now().date_naive();
    if !session_cache::day_flag(&session, DayFlag::GiftOpened, today).await {
        session_cache::set_day_flag(&session, DayFlag::GiftOpened, today).await?;
        add_breadcrumb("scenes", "Gift opened", None);
    }
    Ok(Redirect::to(&format!("/#{}", Scene::Reveal.anchor())).into_response())
}

/// Site content JSON for the unlocked visitor.
pub async fn site(
    _unlocked: RequireUnlocked,
    State(state): State<AppState>,
    session: Session,
) -> Json<SiteContent> {
    Json(visitor_content(&state, &session).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_links_mark_current() {
        let sequence = SceneSequence::resume(2);
        let links = scene_links(&sequence);
        assert_eq!(links.len(), 5);
        assert!(links.iter().filter(|l| l.current).all(|l| l.index == 2));
        assert_eq!(links.iter().filter(|l| l.current).count(), 1);
    }
}

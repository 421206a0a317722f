//! Per-visitor state kept in the session.
//!
//! The unlock record is read defensively: a missing, malformed or expired
//! value reads as "not unlocked", and anything other than a valid record is
//! deleted on the way. Reads never fail the request.

use chrono::{DateTime, NaiveDate, Utc};
use heartgate_core::unlock::keys;
use heartgate_core::{
    CacheCheck, DayFlag, GateAttemptState, PhotoRecord, SceneSequence, UnlockSession,
};
use tower_sessions::Session;
use tower_sessions::session::Error;

/// Read the unlock record, deleting it if it is expired or malformed.
pub async fn read_unlock(session: &Session, now: DateTime<Utc>) -> CacheCheck {
    let raw = match session.get_value(keys::UNLOCK).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read unlock record");
            return CacheCheck::Absent;
        }
    };

    let check = UnlockSession::check(raw.as_ref(), now);
    if check.needs_clear() {
        tracing::debug!(?check, "Discarding stale unlock record");
        if let Err(e) = session.remove_value(keys::UNLOCK).await {
            tracing::warn!(error = %e, "Failed to discard unlock record");
        }
    }
    check
}

/// Whether the visitor holds a valid unlock at `now`.
pub async fn is_unlocked(session: &Session, now: DateTime<Utc>) -> bool {
    read_unlock(session, now).await.is_unlocked()
}

/// Store an unlock record.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn write_unlock(session: &Session, unlock: &UnlockSession) -> Result<(), Error> {
    session.insert(keys::UNLOCK, unlock).await
}

/// Remove the unlock record and anything it disclosed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_unlock(session: &Session) -> Result<(), Error> {
    session.remove_value(keys::UNLOCK).await?;
    session.remove_value(keys::DISCLOSED_PHOTOS).await?;
    Ok(())
}

/// Gate bookkeeping, with an elapsed lockout already reset.
pub async fn gate_attempts(session: &Session, now: DateTime<Utc>) -> GateAttemptState {
    let mut state = session
        .get::<GateAttemptState>(keys::GATE_ATTEMPTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    state.refresh(now);
    state
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_gate_attempts(
    session: &Session,
    state: &GateAttemptState,
) -> Result<(), Error> {
    session.insert(keys::GATE_ATTEMPTS, state).await
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_gate_attempts(session: &Session) -> Result<(), Error> {
    session.remove_value(keys::GATE_ATTEMPTS).await?;
    Ok(())
}

pub async fn intro_seen(session: &Session) -> bool {
    session
        .get::<bool>(keys::INTRO_SEEN)
        .await
        .ok()
        .flatten()
        .unwrap_or(false)
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn mark_intro_seen(session: &Session) -> Result<(), Error> {
    session.insert(keys::INTRO_SEEN, true).await
}

/// The visitor's scene position, resumed from the stored index.
pub async fn scene_sequence(session: &Session) -> SceneSequence {
    session
        .get::<usize>(keys::CURRENT_SCENE)
        .await
        .ok()
        .flatten()
        .map_or_else(SceneSequence::new, SceneSequence::resume)
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_scene(session: &Session, sequence: &SceneSequence) -> Result<(), Error> {
    session
        .insert(keys::CURRENT_SCENE, sequence.current_index())
        .await
}

/// Photos disclosed by a remote unlock, if any.
pub async fn disclosed_photos(session: &Session) -> Option<Vec<PhotoRecord>> {
    session
        .get::<Vec<PhotoRecord>>(keys::DISCLOSED_PHOTOS)
        .await
        .ok()
        .flatten()
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_disclosed_photos(
    session: &Session,
    photos: &[PhotoRecord],
) -> Result<(), Error> {
    session.insert(keys::DISCLOSED_PHOTOS, photos).await
}

/// Whether `flag` has been set for `day`.
pub async fn day_flag(session: &Session, flag: DayFlag, day: NaiveDate) -> bool {
    session
        .get::<bool>(&flag.key(day))
        .await
        .ok()
        .flatten()
        .unwrap_or(false)
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_day_flag(session: &Session, flag: DayFlag, day: NaiveDate) -> Result<(), Error> {
    session.insert(&flag.key(day), true).await
}

pub async fn is_editor(session: &Session) -> bool {
    session
        .get::<bool>(keys::EDITOR)
        .await
        .ok()
        .flatten()
        .unwrap_or(false)
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_editor(session: &Session, editor: bool) -> Result<(), Error> {
    if editor {
        session.insert(keys::EDITOR, true).await
    } else {
        session.remove_value(keys::EDITOR).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone};
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 21, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_unlock_round_trip() {
        let session = session();
        write_unlock(&session, &UnlockSession::grant(at(10), TimeDelta::days(7)))
            .await
            .unwrap();
        assert!(is_unlocked(&session, at(11)).await);

        clear_unlock(&session).await.unwrap();
        assert!(!is_unlocked(&session, at(11)).await);
    }

    #[tokio::test]
    async fn test_expired_unlock_is_deleted_and_reads_stay_absent() {
        let session = session();
        write_unlock(&session, &UnlockSession::grant(at(10), TimeDelta::hours(1)))
            .await
            .unwrap();

        assert_eq!(read_unlock(&session, at(12)).await, CacheCheck::Expired);
        assert!(session.get_value(keys::UNLOCK).await.unwrap().is_none());
        assert_eq!(read_unlock(&session, at(12)).await, CacheCheck::Absent);
        assert_eq!(read_unlock(&session, at(12)).await, CacheCheck::Absent);
    }

    #[tokio::test]
    async fn test_malformed_unlock_is_deleted() {
        let session = session();
        session
            .insert(keys::UNLOCK, "definitely not json object")
            .await
            .unwrap();

        assert_eq!(read_unlock(&session, at(10)).await, CacheCheck::Corrupt);
        assert_eq!(read_unlock(&session, at(10)).await, CacheCheck::Absent);
    }

    #[tokio::test]
    async fn test_scene_and_day_flags() {
        let session = session();
        assert_eq!(scene_sequence(&session).await.current_index(), 0);

        let mut sequence = SceneSequence::new();
        sequence.navigate(3);
        store_scene(&session, &sequence).await.unwrap();
        assert_eq!(scene_sequence(&session).await.current_index(), 3);

        let day = NaiveDate::from_ymd_opt(2026, 3, 21).unwrap();
        assert!(!day_flag(&session, DayFlag::GiftOpened, day).await);
        set_day_flag(&session, DayFlag::GiftOpened, day).await.unwrap();
        assert!(day_flag(&session, DayFlag::GiftOpened, day).await);
        assert!(!day_flag(&session, DayFlag::GiftOpened, day.succ_opt().unwrap()).await);
    }
}

//! Unlock session cache and per-day flags.
//!
//! A successful unlock is remembered for a fixed lifetime measured from the
//! moment of unlock. Expiry is absolute: reading the record never extends it.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Session keys shared by the site and its tests.
pub mod keys {
    /// The [`UnlockSession`](super::UnlockSession) record.
    pub const UNLOCK: &str = "love-unlock";
    /// The visitor's [`GateAttemptState`](crate::GateAttemptState).
    pub const GATE_ATTEMPTS: &str = "gate-attempts";
    /// Set once the intro overlay has been dismissed.
    pub const INTRO_SEEN: &str = "intro-seen";
    /// Index of the scene currently in view.
    pub const CURRENT_SCENE: &str = "current-scene";
    /// Photos disclosed by a remote unlock, with signed URLs.
    pub const DISCLOSED_PHOTOS: &str = "disclosed-photos";
    /// Set after a successful edit panel login.
    pub const EDITOR: &str = "editor";
}

/// Default lifetime of an unlock.
pub const DEFAULT_UNLOCK_TTL: TimeDelta = TimeDelta::days(7);

/// Persisted unlock record.
///
/// Stored as `{"isUnlocked": true, "expires": <epoch millis>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockSession {
    pub is_unlocked: bool,
    #[serde(rename = "expires", with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl UnlockSession {
    /// Record an unlock at `now` that lasts for `ttl`.
    ///
    /// An expiry past the representable range saturates at the maximum.
    #[must_use]
    pub fn grant(now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            is_unlocked: true,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whether the record still grants access at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_unlocked && now < self.expires_at
    }

    /// Classify whatever was found under [`keys::UNLOCK`].
    ///
    /// Anything other than a valid, unexpired record should be removed from
    /// storage by the caller.
    #[must_use]
    pub fn check(raw: Option<&serde_json::Value>, now: DateTime<Utc>) -> CacheCheck {
        let Some(raw) = raw else {
            return CacheCheck::Absent;
        };
        match serde_json::from_value::<Self>(raw.clone()) {
            Ok(record) if record.is_valid_at(now) => CacheCheck::Valid(record),
            Ok(_) => CacheCheck::Expired,
            Err(_) => CacheCheck::Corrupt,
        }
    }
}

/// Result of reading the unlock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCheck {
    /// Nothing stored.
    Absent,
    /// Stored and still valid.
    Valid(UnlockSession),
    /// Stored but expired or not unlocked.
    Expired,
    /// Stored value did not parse.
    Corrupt,
}

impl CacheCheck {
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Whether the stored value should be discarded.
    #[must_use]
    pub const fn needs_clear(&self) -> bool {
        matches!(self, Self::Expired | Self::Corrupt)
    }
}

/// Flags remembered once per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayFlag {
    /// The gift box was opened.
    GiftOpened,
    /// The anniversary overlay was shown.
    AnniversaryShown,
}

impl DayFlag {
    const fn prefix(self) -> &'static str {
        match self {
            Self::GiftOpened => "gift-opened",
            Self::AnniversaryShown => "anniversary-shown",
        }
    }

    /// Storage key for `day`, e.g. `gift-opened-2026-02-14`.
    #[must_use]
    pub fn key(self, day: NaiveDate) -> String {
        format!("{}-{}", self.prefix(), day.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 14, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_until_expiry() {
        let record = UnlockSession::grant(t0(), DEFAULT_UNLOCK_TTL);
        assert!(record.is_valid_at(t0()));
        assert!(record.is_valid_at(t0() + TimeDelta::days(7) - TimeDelta::seconds(1)));
        assert!(!record.is_valid_at(t0() + TimeDelta::days(7)));
    }

    #[test]
    fn test_grant_saturates_far_expiry() {
        let record = UnlockSession::grant(t0(), TimeDelta::MAX);
        assert_eq!(record.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(record.is_valid_at(t0()));
    }

    #[test]
    fn test_stored_shape() {
        let record = UnlockSession::grant(t0(), TimeDelta::hours(1));
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["isUnlocked"], true);
        assert_eq!(
            json["expires"],
            (t0() + TimeDelta::hours(1)).timestamp_millis()
        );
    }

    #[test]
    fn test_check_classifies_records() {
        let now = t0();
        assert_eq!(UnlockSession::check(None, now), CacheCheck::Absent);

        let fresh = serde_json::to_value(UnlockSession::grant(now, DEFAULT_UNLOCK_TTL)).unwrap();
        assert!(UnlockSession::check(Some(&fresh), now).is_unlocked());

        let stale = json!({ "isUnlocked": true, "expires": now.timestamp_millis() - 1 });
        let check = UnlockSession::check(Some(&stale), now);
        assert_eq!(check, CacheCheck::Expired);
        assert!(check.needs_clear());

        let revoked = json!({ "isUnlocked": false, "expires": now.timestamp_millis() + 10_000 });
        assert_eq!(UnlockSession::check(Some(&revoked), now), CacheCheck::Expired);

        let garbage = json!("not a record");
        let check = UnlockSession::check(Some(&garbage), now);
        assert_eq!(check, CacheCheck::Corrupt);
        assert!(check.needs_clear());
        assert!(!check.is_unlocked());
    }

    #[test]
    fn test_day_flag_keys() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();
        assert_eq!(DayFlag::GiftOpened.key(day), "gift-opened-2026-02-04");
        assert_eq!(
            DayFlag::AnniversaryShown.key(day),
            "anniversary-shown-2026-02-04"
        );
    }
}

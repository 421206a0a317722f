//! Time-based touches: the "since the first day" counter, the message of the
//! day and the anniversary check.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

const SECS_PER_DAY: i64 = 86_400;

/// Time elapsed since the relationship started, broken into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Elapsed {
    /// Time from midnight UTC on `start` to `now`. Never negative.
    #[must_use]
    pub fn since(start: NaiveDate, now: DateTime<Utc>) -> Self {
        let start = start.and_time(chrono::NaiveTime::MIN).and_utc();
        let total = (now - start).num_seconds().max(0);

        Self {
            days: total / SECS_PER_DAY,
            hours: (total % SECS_PER_DAY) / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    /// Units with their Arabic labels, in display order.
    #[must_use]
    pub const fn units(&self) -> [(i64, &'static str); 4] {
        [
            (self.days, "يوم"),
            (self.hours, "ساعة"),
            (self.minutes, "دقيقة"),
            (self.seconds, "ثانية"),
        ]
    }
}

/// Messages rotated one per day.
pub const DAILY_MESSAGES: &[&str] = &[
    "صباحك حب… وكل يوم معك عيد 💌",
    "لو تعرفين كم مرة فكرت فيك اليوم ❤️",
    "إنتِ السبب في ابتسامتي من غير سبب 😊",
    "كل يوم معك أحلى من اللي قبله 🌹",
    "وجودك في حياتي أجمل صدفة 💫",
    "قلبي اختارك… وكل يوم يختارك من جديد 💞",
    "إنتِ وطني الصغير 🏡❤️",
];

/// Message for the given day.
///
/// The index is the day of the year (1 for January 1st) modulo the number of
/// messages, so the rotation restarts every year.
#[must_use]
pub fn daily_message(today: NaiveDate) -> &'static str {
    let index = usize::try_from(today.ordinal()).unwrap_or(0) % DAILY_MESSAGES.len();
    DAILY_MESSAGES.get(index).copied().unwrap_or_default()
}

/// Error parsing an [`AnniversaryDay`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("anniversary must be MM-DD, got {0:?}")]
pub struct AnniversaryParseError(String);

/// A recurring month and day, written `MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnniversaryDay {
    month: u32,
    day: u32,
}

impl AnniversaryDay {
    /// Whether `date` falls on this anniversary.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }

    /// Anniversary of a start date.
    #[must_use]
    pub fn of(start: NaiveDate) -> Self {
        Self {
            month: start.month(),
            day: start.day(),
        }
    }
}

impl FromStr for AnniversaryDay {
    type Err = AnniversaryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AnniversaryParseError(s.to_string());
        let (mm, dd) = s.trim().split_once('-').ok_or_else(err)?;
        if mm.len() != 2 || dd.len() != 2 {
            return Err(err());
        }
        let month: u32 = mm.parse().map_err(|_| err())?;
        let day: u32 = dd.parse().map_err(|_| err())?;

        // 2024 is a leap year, so 02-29 is accepted.
        NaiveDate::from_ymd_opt(2024, month, day).ok_or_else(err)?;
        Ok(Self { month, day })
    }
}

impl fmt::Display for AnniversaryDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

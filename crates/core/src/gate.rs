//! Unlock gate state machine.
//!
//! ```text
//! idle ──submit──▶ checking ──▶ unlocked
//!                     │
//!                     ├──▶ rejected (attempt + 1) ──▶ idle
//!                     └──▶ locked out ──(cooldown)──▶ idle (attempts = 0)
//! ```
//!
//! The state machine is pure apart from the [`Verifier`] it is handed: the
//! caller supplies `now`, persists [`GateAttemptState`] wherever it likes and
//! renders the returned [`GateOutcome`].

use std::future::Future;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DateInputError, GateDate, PhotoRecord};

/// User-facing gate copy.
pub mod messages {
    /// Heading before any failure.
    pub const WELCOME: &str = "دخلي تاريخ بدايتنا ❤️";
    /// Heading once the gentle threshold is reached.
    pub const GENTLE: &str = "راجعي ذاكرتك 💭";
    /// Heading once the escalated threshold is reached.
    pub const ESCALATED: &str = "ركّزي معاي شوية 😅❤️";
    /// Error line for an early wrong answer.
    pub const WRONG_DATE: &str = "التاريخ غلط 💔";
    /// Error line once the format reminder threshold is reached.
    pub const FORMAT_REMINDER: &str = "راجعي ذاكرتك… التاريخ بصيغة 21/03/2024 💭";
    /// Error line when verification could not be reached.
    pub const UNAVAILABLE: &str = "حصل خطأ في التحقق… جرّبي مرة ثانية.";
    /// Example shown under the heading.
    pub const FORMAT_EXAMPLE: &str = "21/03/2024";
}

/// Failure policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    /// Failures that trigger a lockout.
    pub max_attempts: u32,
    /// How long submissions stay disabled once locked.
    pub lockout: TimeDelta,
    /// Failures after which the heading turns gentle.
    pub gentle_hint_after: u32,
    /// Failures after which the heading escalates.
    pub escalated_hint_after: u32,
    /// Failures after which the error line reminds of the expected format.
    pub format_reminder_after: u32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: TimeDelta::seconds(30),
            gentle_hint_after: 2,
            escalated_hint_after: 4,
            format_reminder_after: 3,
        }
    }
}

/// Heading shown above the date input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Welcome,
    Gentle,
    Escalated,
}

impl Hint {
    /// The heading text.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Welcome => messages::WELCOME,
            Self::Gentle => messages::GENTLE,
            Self::Escalated => messages::ESCALATED,
        }
    }
}

/// Result of asking a [`Verifier`] about a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The date is right. A remote verifier may disclose the protected
    /// photos (with signed URLs) alongside.
    Accepted { disclosed: Option<Vec<PhotoRecord>> },
    /// The date is wrong. A remote verifier may supply its own message.
    Denied { message: Option<String> },
}

/// Verification could not produce a verdict.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("verification unavailable: {0}")]
    Unavailable(String),
}

/// Decides whether a well-formed date opens the gate.
pub trait Verifier {
    /// Check `date` against the secret.
    fn verify(&self, date: GateDate)
    -> impl Future<Output = Result<Verdict, VerifyError>> + Send;
}

/// Compares against a reference date held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVerifier {
    reference: GateDate,
}

impl LocalVerifier {
    #[must_use]
    pub const fn new(reference: GateDate) -> Self {
        Self { reference }
    }

    #[must_use]
    pub const fn reference(&self) -> GateDate {
        self.reference
    }
}

impl Verifier for LocalVerifier {
    fn verify(
        &self,
        date: GateDate,
    ) -> impl Future<Output = Result<Verdict, VerifyError>> + Send {
        let verdict = if date == self.reference {
            Verdict::Accepted { disclosed: None }
        } else {
            Verdict::Denied { message: None }
        };
        std::future::ready(Ok(verdict))
    }
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The input never reached the verifier.
    Malformed(DateInputError),
    /// The verifier said no.
    Incorrect { message: Option<String> },
}

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Blank input; nothing changed.
    Ignored,
    /// The gate opened. Attempts are reset.
    Unlocked { disclosed: Option<Vec<PhotoRecord>> },
    /// A counted failure below the lockout threshold.
    Rejected { attempts: u32, reason: RejectReason },
    /// This failure reached the threshold; the gate is now locked.
    LockedOut { until: DateTime<Utc> },
    /// Submitted while locked; refused without counting.
    StillLocked { until: DateTime<Utc> },
    /// The verifier could not be reached; not counted.
    Unavailable,
}

impl GateOutcome {
    /// Error line to show under the input, if any.
    #[must_use]
    pub fn message(&self, policy: &GatePolicy, now: DateTime<Utc>) -> Option<String> {
        match self {
            Self::Ignored | Self::Unlocked { .. } => None,
            Self::Rejected { attempts, reason } => {
                if *attempts >= policy.format_reminder_after {
                    return Some(messages::FORMAT_REMINDER.to_string());
                }
                match reason {
                    RejectReason::Incorrect { message: Some(m) } if !m.is_empty() => {
                        Some(m.clone())
                    }
                    _ => Some(messages::WRONG_DATE.to_string()),
                }
            }
            Self::LockedOut { until } | Self::StillLocked { until } => {
                Some(lockout_message(seconds_until(*until, now)))
            }
            Self::Unavailable => Some(messages::UNAVAILABLE.to_string()),
        }
    }

    /// Whether the text field should be emptied when re-rendering.
    #[must_use]
    pub const fn clears_input(&self) -> bool {
        matches!(
            self,
            Self::Unlocked { .. } | Self::LockedOut { .. } | Self::StillLocked { .. }
        )
    }
}

/// Per-visitor gate bookkeeping.
///
/// Serialized into the visitor session while the gate is on screen and
/// dropped on unlock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateAttemptState {
    attempt_count: u32,
    lockout_ends_at: Option<DateTime<Utc>>,
}

impl GateAttemptState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Failed submissions since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// When the current lockout ends, if one is active or pending refresh.
    #[must_use]
    pub const fn lockout_ends_at(&self) -> Option<DateTime<Utc>> {
        self.lockout_ends_at
    }

    /// Whether submissions are disabled at `now`.
    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lockout_ends_at.is_some_and(|end| now < end)
    }

    /// Whole seconds left on the lockout (rounded up), zero when unlocked.
    #[must_use]
    pub fn seconds_left(&self, now: DateTime<Utc>) -> i64 {
        self.lockout_ends_at
            .map_or(0, |end| seconds_until(end, now))
    }

    /// End an elapsed lockout. Returns `true` if the state changed.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        match self.lockout_ends_at {
            Some(end) if now >= end => {
                *self = Self::default();
                true
            }
            _ => false,
        }
    }

    /// Heading for the current attempt count.
    #[must_use]
    pub const fn hint(&self, policy: &GatePolicy) -> Hint {
        if self.attempt_count >= policy.escalated_hint_after {
            Hint::Escalated
        } else if self.attempt_count >= policy.gentle_hint_after {
            Hint::Gentle
        } else {
            Hint::Welcome
        }
    }

    /// Whether the gate card should shake on render.
    #[must_use]
    pub const fn should_shake(&self, policy: &GatePolicy) -> bool {
        self.attempt_count >= policy.format_reminder_after
    }

    /// Run one submission through the gate.
    ///
    /// Malformed input is counted as a failure without consulting the
    /// verifier. Verifier outages are reported but never counted.
    pub async fn submit<V>(
        &mut self,
        policy: &GatePolicy,
        verifier: &V,
        raw: &str,
        now: DateTime<Utc>,
    ) -> GateOutcome
    where
        V: Verifier + Sync,
    {
        self.refresh(now);

        if let Some(until) = self.lockout_ends_at {
            return GateOutcome::StillLocked { until };
        }

        let date = match GateDate::parse(raw) {
            Ok(date) => date,
            Err(DateInputError::Empty) => return GateOutcome::Ignored,
            Err(e) => return self.record_failure(policy, RejectReason::Malformed(e), now),
        };

        match verifier.verify(date).await {
            Ok(Verdict::Accepted { disclosed }) => {
                *self = Self::default();
                GateOutcome::Unlocked { disclosed }
            }
            Ok(Verdict::Denied { message }) => {
                self.record_failure(policy, RejectReason::Incorrect { message }, now)
            }
            Err(_) => GateOutcome::Unavailable,
        }
    }

    fn record_failure(
        &mut self,
        policy: &GatePolicy,
        reason: RejectReason,
        now: DateTime<Utc>,
    ) -> GateOutcome {
        self.attempt_count = self.attempt_count.saturating_add(1);

        if self.attempt_count >= policy.max_attempts {
            let until = now
                .checked_add_signed(policy.lockout)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.lockout_ends_at = Some(until);
            return GateOutcome::LockedOut { until };
        }

        GateOutcome::Rejected {
            attempts: self.attempt_count,
            reason,
        }
    }
}

fn seconds_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (end - now).num_milliseconds().max(0);
    (millis + 999) / 1000
}

fn lockout_message(seconds: i64) -> String {
    format!("اتقفلت {seconds} ثانية… استني شوية 💔")
}

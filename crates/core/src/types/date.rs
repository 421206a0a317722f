//! Typed gate date.

use core::fmt;
use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`GateDate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateInputError {
    /// The input string is empty (after trimming).
    #[error("date cannot be empty")]
    Empty,
    /// The input is neither `DD/MM/YYYY` nor `YYYY-MM-DD`.
    #[error("date must look like DD/MM/YYYY or YYYY-MM-DD")]
    BadShape,
    /// The input has the right shape but names a day that does not exist.
    #[error("no such calendar day: {0}")]
    NoSuchDay(String),
}

/// A calendar date typed into the unlock gate.
///
/// ## Accepted formats
///
/// - `DD/MM/YYYY` with exactly two, two and four digits
/// - ISO `YYYY-MM-DD`
///
/// Surrounding whitespace is ignored and Eastern Arabic digits (`٠`-`٩`) are
/// read as their ASCII counterparts, since the gate is mostly typed on an
/// Arabic keyboard.
///
/// ## Examples
///
/// ```
/// use heartgate_core::GateDate;
///
/// let slash = GateDate::parse("21/03/2024").unwrap();
/// let iso = GateDate::parse("2024-03-21").unwrap();
/// assert_eq!(slash, iso);
///
/// assert!(GateDate::parse("21-03-2024").is_err());  // wrong delimiter
/// assert!(GateDate::parse("1/3/2024").is_err());    // digits must be padded
/// assert!(GateDate::parse("31/02/2024").is_err());  // no such day
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateDate(NaiveDate);

impl GateDate {
    /// Parse a `GateDate` from raw user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, does not match one of the
    /// accepted shapes, or names a day that does not exist.
    pub fn parse(input: &str) -> Result<Self, DateInputError> {
        let normalized = normalize_digits(input.trim());
        if normalized.is_empty() {
            return Err(DateInputError::Empty);
        }

        let (year, month, day) = split_slashed(&normalized)
            .or_else(|| split_iso(&normalized))
            .ok_or(DateInputError::BadShape)?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(DateInputError::NoSuchDay(normalized))
    }

    /// Wrap an already-valid calendar date.
    #[must_use]
    pub const fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The underlying calendar date.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Render as `DD/MM/YYYY`, the format the remote verifier expects.
    #[must_use]
    pub fn to_slashed(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }

    /// Render as ISO `YYYY-MM-DD`.
    #[must_use]
    pub fn to_iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for GateDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_slashed())
    }
}

impl FromStr for GateDate {
    type Err = DateInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Map Eastern Arabic and Persian digits onto ASCII digits.
fn normalize_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            _ => c,
        })
        .collect()
}

/// `DD/MM/YYYY` → (year, month, day).
fn split_slashed(s: &str) -> Option<(i32, u32, u32)> {
    let mut parts = s.split('/');
    let day = digits(parts.next()?, 2)?;
    let month = digits(parts.next()?, 2)?;
    let year = digits(parts.next()?, 4)?;
    if parts.next().is_some() {
        return None;
    }
    Some((i32::try_from(year).ok()?, month, day))
}

/// `YYYY-MM-DD` → (year, month, day).
fn split_iso(s: &str) -> Option<(i32, u32, u32)> {
    let mut parts = s.split('-');
    let year = digits(parts.next()?, 4)?;
    let month = digits(parts.next()?, 2)?;
    let day = digits(parts.next()?, 2)?;
    if parts.next().is_some() {
        return None;
    }
    Some((i32::try_from(year).ok()?, month, day))
}

/// Parse a run of exactly `width` ASCII digits.
fn digits(part: &str, width: usize) -> Option<u32> {
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

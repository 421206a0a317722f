//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Render ASCII digits as Eastern Arabic digits.
///
/// Usage in templates: `{{ elapsed.days|arabic_digits }}`
#[askama::filter_fn]
pub fn arabic_digits(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(to_arabic_digits(&value.to_string()))
}

fn to_arabic_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => char::from_u32(0x0660 + d).unwrap_or(c),
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_arabic_digits() {
        assert_eq!(to_arabic_digits("2024 / 5"), "٢٠٢٤ / ٥");
        assert_eq!(to_arabic_digits("abc"), "abc");
    }
}

//! Bounded-dimension resize math for uploaded photos.

/// Default longest side of a stored photo, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1200;

/// Default JPEG quality for stored photos.
pub const DEFAULT_JPEG_QUALITY: u8 = 82;

/// Target size for an image of `width` x `height` so that neither side
/// exceeds `max`.
///
/// Images already within bounds are returned unchanged. Otherwise the longest
/// side becomes exactly `max` and the other side is scaled and rounded to the
/// nearest pixel, never below one.
///
/// ```
/// use heartgate_core::imaging::fit_within;
///
/// assert_eq!(fit_within(4000, 3000, 1200), (1200, 900));
/// assert_eq!(fit_within(800, 600, 1200), (800, 600));
/// ```
#[must_use]
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };

    // Round half up in integer arithmetic: (short * max + long / 2) / long.
    let scaled = (u64::from(short) * u64::from(max) + u64::from(long) / 2) / u64::from(long);
    let scaled = u32::try_from(scaled).unwrap_or(max).max(1);

    if width >= height {
        (max, scaled)
    } else {
        (scaled, max)
    }
}

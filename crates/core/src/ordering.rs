//! Dense position bookkeeping.
//!
//! Photos and reasons are displayed by `position`. After any removal or move
//! the surviving items are renumbered `0..len` in their previous relative
//! order.

use crate::types::{PhotoId, PhotoRecord};

/// Renumber `photos` so each position equals its index.
///
/// Returns the `(id, position)` pairs that changed, which is what a backend
/// needs to write.
pub fn resequence(photos: &mut [PhotoRecord]) -> Vec<(PhotoId, u32)> {
    let mut changed = Vec::new();
    for (index, photo) in photos.iter_mut().enumerate() {
        let position = u32::try_from(index).unwrap_or(u32::MAX);
        if photo.position != position {
            photo.position = position;
            changed.push((photo.id.clone(), position));
        }
    }
    changed
}

/// Sort by stored position, then renumber. Used on freshly fetched rows whose
/// positions may have gaps.
pub fn normalize(photos: &mut [PhotoRecord]) -> Vec<(PhotoId, u32)> {
    photos.sort_by_key(|p| p.position);
    resequence(photos)
}

/// Remove the photo with `id` and close the gap.
///
/// Returns the removed record and the position updates for the rest.
pub fn remove_photo(
    photos: &mut Vec<PhotoRecord>,
    id: &PhotoId,
) -> Option<(PhotoRecord, Vec<(PhotoId, u32)>)> {
    let index = photos.iter().position(|p| &p.id == id)?;
    let removed = photos.remove(index);
    let changed = resequence(photos);
    Some((removed, changed))
}

/// Move the photo at `from` to `to`, shifting the others.
///
/// Returns `None` when either index is out of range.
pub fn move_photo(
    photos: &mut Vec<PhotoRecord>,
    from: usize,
    to: usize,
) -> Option<Vec<(PhotoId, u32)>> {
    if from >= photos.len() || to >= photos.len() {
        return None;
    }
    let photo = photos.remove(from);
    photos.insert(to, photo);
    Some(resequence(photos))
}

/// Position for a photo appended to `photos`.
#[must_use]
pub fn next_position(photos: &[PhotoRecord]) -> u32 {
    u32::try_from(photos.len()).unwrap_or(u32::MAX)
}

/// Remove the reason at `index`. Reasons are positioned by index, so the
/// remaining ones are dense by construction.
pub fn remove_reason(reasons: &mut Vec<String>, index: usize) -> Option<String> {
    (index < reasons.len()).then(|| reasons.remove(index))
}

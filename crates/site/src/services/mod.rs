//! Background and blocking work behind the content store.
//!
//! # Services
//!
//! - `debounce` - Collapses bursts of edits into one save
//! - `photo` - Decode, shrink and re-encode uploads as JPEG

pub mod debounce;
pub mod photo;

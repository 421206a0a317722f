//! Core types for Heartgate.
//!
//! This module provides type-safe wrappers for the site's domain concepts.

pub mod content;
pub mod date;
pub mod id;

pub use content::{Language, PhotoRecord, SiteContent, TextFields};
pub use date::{DateInputError, GateDate};
pub use id::*;

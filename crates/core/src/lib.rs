//! Heartgate Core - Shared types and gate logic.
//!
//! This crate provides the pieces shared by every Heartgate component:
//! - `site` - The server that renders the gate, the scenes and the edit panel
//! - `cli` - Owner tooling for photos and content
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure state machines - no
//! HTTP clients, no storage, no clocks. Every function that depends on time
//! takes `now` as an argument so behaviour is reproducible in tests.
//!
//! # Modules
//!
//! - [`types`] - Ids, typed gate dates, site content and photo records
//! - [`gate`] - Unlock gate state machine and verification seam
//! - [`unlock`] - Unlock session with absolute expiry, per-day flags
//! - [`ordering`] - Dense position bookkeeping for photos and reasons
//! - [`scene`] - Scene sequence controller
//! - [`moments`] - Elapsed-time counter, daily message, anniversary check
//! - [`imaging`] - Bounded-dimension resize math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod gate;
pub mod imaging;
pub mod moments;
pub mod ordering;
pub mod scene;
pub mod types;
pub mod unlock;

pub use gate::{
    GateAttemptState, GateOutcome, GatePolicy, Hint, LocalVerifier, RejectReason, Verdict,
    Verifier, VerifyError,
};
pub use scene::{Scene, SceneSequence, Visibility};
pub use types::*;
pub use unlock::{CacheCheck, DayFlag, UnlockSession};

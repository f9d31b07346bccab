//! Scrapbook - a three-level browser keepsake
//!
//! Core modules:
//! - `state`: Persisted progress with one owned slot per level
//! - `platform`: Browser/native key-value storage abstraction
//! - `analytics`: Session id, device fingerprint, fire-and-forget event log
//! - `admin`: Query-string overrides (admin mode, level jump, reset)
//! - `level1` / `level2` / `level3`: Per-level interaction engines
//! - `orchestrator`: Boot sequence and level transition
//! - `markup`: Page skeletons with text-only content slots
//! - `tuning`: Data-driven constants

pub mod admin;
pub mod analytics;
pub mod content;
pub mod context;
pub mod level1;
pub mod level2;
pub mod level3;
pub mod markup;
pub mod orchestrator;
pub mod platform;
pub mod sched;
pub mod state;
pub mod tuning;

pub use admin::AdminOverrides;
pub use content::{ContentDescriptor, ContentError};
pub use context::Context;
pub use orchestrator::{ActiveLevel, BootError, Orchestrator};
pub use state::{PersistedState, StateStore};
pub use tuning::Tuning;

use glam::Vec2;

/// Convert a fractional (0..1) position to screen pixels
#[inline]
pub fn fraction_to_screen(fraction: Vec2, viewport: Vec2) -> Vec2 {
    fraction * viewport
}

/// Shared viewport helper: `(width, height)` in CSS pixels as a vector
#[inline]
pub fn viewport_vec(width: u32, height: u32) -> Vec2 {
    Vec2::new(width as f32, height as f32)
}

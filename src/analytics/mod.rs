//! Analytics instrumentation
//!
//! Fire-and-forget: nothing here may block or fail gameplay.
//! - `session`: tab-scoped session id
//! - `device`: memoized user-agent/device fingerprint
//! - `logger`: event queue with a pluggable transport

pub mod device;
pub mod logger;
pub mod session;

pub use device::{DeviceClass, DeviceInfo, Environment};
pub use logger::{EventLogger, LOG_ENDPOINT, MemoryTransport, NullTransport, Transport, TransportError};
pub use session::Session;

#[cfg(target_arch = "wasm32")]
pub use logger::BeaconTransport;

/// Event names sent to the collector
pub mod events {
    pub const PAGE_VIEW: &str = "page_view";
    pub const LEVEL_TRANSITION: &str = "level_transition";
    pub const SPARKLE_FOUND: &str = "level1_sparkle_found";
    pub const LEVEL1_COMPLETED: &str = "level1_completed";
    pub const PAIR_MATCHED: &str = "level2_pair_matched";
    pub const LEVEL2_COMPLETED: &str = "level2_completed";
    pub const WORD_CAPTURED: &str = "level3_word_captured";
    pub const LEVEL3_COMPLETED: &str = "level3_completed";
    pub const RESET: &str = "reset";
}

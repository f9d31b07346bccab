//! Admin overrides from the page query string
//!
//! - `admin=true`: reveal everything, one-click captures, labelled cards
//! - `level=<n>`: jump straight to level n
//! - `reset=true`: clear progress before anything reads it

use crate::state::StateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminOverrides {
    pub is_admin: bool,
    pub override_level: Option<u32>,
    pub should_reset: bool,
}

impl AdminOverrides {
    /// Parse a query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let mut overrides = Self::default();
        for (key, value) in query_pairs(query) {
            match key {
                "admin" => overrides.is_admin = value == "true",
                "level" => overrides.override_level = parse_level(value),
                "reset" => overrides.should_reset = value == "true",
                _ => {}
            }
        }
        overrides
    }

    /// Read the overrides from `window.location.search`
    #[cfg(target_arch = "wasm32")]
    pub fn from_location() -> Self {
        let search = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        Self::from_query(&search)
    }

    /// Clear progress if requested. Must run before the first read.
    pub fn apply(&self, store: &StateStore) {
        if self.should_reset {
            log::info!("Reset requested via query string");
            store.reset();
        }
        if self.is_admin {
            log::info!("Admin mode enabled");
        }
    }
}

/// First occurrence of each key wins, as with `URLSearchParams.get`
fn query_pairs(query: &str) -> Vec<(&str, &str)> {
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for part in query.trim_start_matches('?').split('&') {
        if part.is_empty() {
            continue;
        }
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        if !pairs.iter().any(|(k, _)| *k == key) {
            pairs.push((key, value));
        }
    }
    pairs
}

/// Leading decimal digits, like `parseInt`. Zero or no digits means no override.
fn parse_level(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok().filter(|&level| level > 0)
}

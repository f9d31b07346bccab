//! Shallow-merge patches
//!
//! Record-valued keys merge field by field; sequence and primitive values
//! replace what was there.

use std::collections::BTreeMap;

use super::progress::{IdSet, PersistedState, SparklePosition};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level1Patch {
    pub found_sparkles: Option<IdSet>,
    pub sparkle_positions: Option<BTreeMap<String, SparklePosition>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level2Patch {
    pub matched_pairs: Option<IdSet>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level3Patch {
    pub captured_words: Option<IdSet>,
}

/// A partial update of [`PersistedState`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialState {
    pub current_level: Option<u32>,
    pub level1: Option<Level1Patch>,
    pub level2: Option<Level2Patch>,
    pub level3: Option<Level3Patch>,
}

impl PartialState {
    pub fn current_level(level: u32) -> Self {
        Self {
            current_level: Some(level),
            ..Default::default()
        }
    }
}

impl PersistedState {
    /// Apply a patch in place. Applying the same patch twice equals applying it once.
    pub fn merge(&mut self, patch: &PartialState) {
        if let Some(level) = patch.current_level {
            self.current_level = level.max(1);
        }
        if let Some(p) = &patch.level1 {
            if let Some(found) = &p.found_sparkles {
                self.level1.found_sparkles = found.clone();
            }
            if let Some(positions) = &p.sparkle_positions {
                self.level1.sparkle_positions = positions.clone();
            }
        }
        if let Some(p) = &patch.level2 {
            if let Some(matched) = &p.matched_pairs {
                self.level2.matched_pairs = matched.clone();
            }
        }
        if let Some(p) = &patch.level3 {
            if let Some(captured) = &p.captured_words {
                self.level3.captured_words = captured.clone();
            }
        }
    }
}

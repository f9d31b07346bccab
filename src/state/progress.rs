//! Persisted progress record
//!
//! Decoding is lenient per field: a corrupt or missing field falls back to its
//! default without discarding its valid siblings.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A set of content item ids
pub type IdSet = BTreeSet<String>;

/// Fractional position of a sparkle, both axes in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparklePosition {
    pub x: f32,
    pub y: f32,
}

impl SparklePosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for SparklePosition {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Level 1 slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level1Progress {
    pub found_sparkles: IdSet,
    pub sparkle_positions: BTreeMap<String, SparklePosition>,
}

/// Level 2 slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level2Progress {
    pub matched_pairs: IdSet,
}

/// Level 3 slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level3Progress {
    pub captured_words: IdSet,
}

/// The whole persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Which level boots next (1-based)
    pub current_level: u32,
    pub level1: Level1Progress,
    pub level2: Level2Progress,
    pub level3: Level3Progress,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            current_level: 1,
            level1: Level1Progress::default(),
            level2: Level2Progress::default(),
            level3: Level3Progress::default(),
        }
    }
}

impl PersistedState {
    /// Decode a stored blob, filling every missing or malformed field with its default
    pub fn from_stored(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                log::warn!("Stored progress is not JSON ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Field-wise decode of an arbitrary JSON value
    pub fn from_value(value: &Value) -> Self {
        let current_level = value
            .get("currentLevel")
            .and_then(Value::as_u64)
            .filter(|&level| level >= 1)
            .and_then(|level| u32::try_from(level).ok())
            .unwrap_or(1);

        let level1 = value.get("level1");
        let level2 = value.get("level2");
        let level3 = value.get("level3");

        Self {
            current_level,
            level1: Level1Progress {
                found_sparkles: id_set(level1.and_then(|v| v.get("foundSparkles"))),
                sparkle_positions: positions(level1.and_then(|v| v.get("sparklePositions"))),
            },
            level2: Level2Progress {
                matched_pairs: id_set(level2.and_then(|v| v.get("matchedPairs"))),
            },
            level3: Level3Progress {
                captured_words: id_set(level3.and_then(|v| v.get("capturedWords"))),
            },
        }
    }
}

/// Array of string ids; non-string entries are dropped, duplicates collapse
fn id_set(value: Option<&Value>) -> IdSet {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Object of `id -> {x, y}`; malformed entries are dropped
fn positions(value: Option<&Value>) -> BTreeMap<String, SparklePosition> {
    let Some(map) = value.and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(id, pos)| {
            let x = pos.get("x")?.as_f64()?;
            let y = pos.get("y")?.as_f64()?;
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            Some((id.clone(), SparklePosition::new(x as f32, y as f32)))
        })
        .collect()
}

/// A slot of [`PersistedState`] owned by exactly one level engine
pub trait LevelProgress: Sized {
    /// Top-level key of the slot in the stored record
    const KEY: &'static str;

    fn slot(state: &mut PersistedState) -> &mut Self;
}

impl LevelProgress for Level1Progress {
    const KEY: &'static str = "level1";

    fn slot(state: &mut PersistedState) -> &mut Self {
        &mut state.level1
    }
}

impl LevelProgress for Level2Progress {
    const KEY: &'static str = "level2";

    fn slot(state: &mut PersistedState) -> &mut Self {
        &mut state.level2
    }
}

impl LevelProgress for Level3Progress {
    const KEY: &'static str = "level3";

    fn slot(state: &mut PersistedState) -> &mut Self {
        &mut state.level3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_blob_is_default() {
        assert_eq!(PersistedState::from_stored(None), PersistedState::default());
    }

    #[test]
    fn test_garbage_blob_is_default() {
        assert_eq!(
            PersistedState::from_stored(Some("{not json")),
            PersistedState::default()
        );
        assert_eq!(
            PersistedState::from_stored(Some("42")),
            PersistedState::default()
        );
    }

    #[test]
    fn test_corrupt_field_keeps_valid_siblings() {
        let raw = r#"{
            "currentLevel": 2,
            "level1": {"foundSparkles": ["s1", 7, "s2", "s1"], "sparklePositions": "oops"},
            "level2": "broken",
            "level3": {"capturedWords": ["w1"]}
        }"#;
        let state = PersistedState::from_stored(Some(raw));
        assert_eq!(state.current_level, 2);
        assert_eq!(state.level1.found_sparkles.len(), 2);
        assert!(state.level1.sparkle_positions.is_empty());
        assert!(state.level2.matched_pairs.is_empty());
        assert!(state.level3.captured_words.contains("w1"));
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let state = PersistedState::from_stored(Some(r#"{"currentLevel": 0}"#));
        assert_eq!(state.current_level, 1);
        let state = PersistedState::from_stored(Some(r#"{"currentLevel": "3"}"#));
        assert_eq!(state.current_level, 1);
    }

    #[test]
    fn test_positions_are_clamped() {
        let raw = r#"{"level1": {"sparklePositions": {
            "a": {"x": 1.5, "y": -0.2},
            "b": {"x": "left"}
        }}}"#;
        let state = PersistedState::from_stored(Some(raw));
        let a = state.level1.sparkle_positions["a"];
        assert_eq!((a.x, a.y), (1.0, 0.0));
        assert!(!state.level1.sparkle_positions.contains_key("b"));
    }
}

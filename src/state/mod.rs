//! Persisted progress store
//!
//! One JSON blob in a key-value backend, shared by every level engine.
//! - Reads never fail (per-field fallback to defaults)
//! - Writes are shallow merges, persisted whole
//! - Each engine writes only its own slot via [`StateStore::update`]

pub mod patch;
pub mod progress;

use std::rc::Rc;

pub use patch::{Level1Patch, Level2Patch, Level3Patch, PartialState};
pub use progress::{
    IdSet, Level1Progress, Level2Progress, Level3Progress, LevelProgress, PersistedState,
    SparklePosition,
};

use crate::platform::KeyValueStore;

/// Storage key of the progress blob
pub const STATE_KEY: &str = "anniversary_state";

/// Handle to the persisted progress. Clones share the same backend.
#[derive(Clone)]
pub struct StateStore {
    backend: Rc<dyn KeyValueStore>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

impl StateStore {
    pub fn new(backend: Rc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Current progress; defaults for anything missing or corrupt
    pub fn read(&self) -> PersistedState {
        PersistedState::from_stored(self.backend.get(STATE_KEY).as_deref())
    }

    /// Merge a patch into the stored record and persist the result
    pub fn write(&self, patch: &PartialState) -> PersistedState {
        let mut state = self.read();
        state.merge(patch);
        self.persist(&state);
        state
    }

    /// Mutate one level's slot and persist the result
    pub fn update<P: LevelProgress>(&self, f: impl FnOnce(&mut P)) -> PersistedState {
        let mut state = self.read();
        f(P::slot(&mut state));
        log::debug!("Progress '{}' updated", P::KEY);
        self.persist(&state);
        state
    }

    /// Select the level that boots next
    pub fn set_current_level(&self, level: u32) -> PersistedState {
        self.write(&PartialState::current_level(level))
    }

    /// Clear everything and return the defaults
    pub fn reset(&self) -> PersistedState {
        if let Err(e) = self.backend.remove(STATE_KEY) {
            log::warn!("Failed to clear progress: {e}");
        } else {
            log::info!("Progress cleared");
        }
        PersistedState::default()
    }

    fn persist(&self, state: &PersistedState) {
        match serde_json::to_string(state) {
            Ok(json) => {
                if let Err(e) = self.backend.set(STATE_KEY, &json) {
                    log::warn!("Failed to persist progress: {e}");
                }
            }
            Err(e) => log::warn!("Failed to encode progress: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use proptest::prelude::*;

    fn store_with(raw: Option<&str>) -> (StateStore, MemoryStorage) {
        let backend = MemoryStorage::new();
        if let Some(raw) = raw {
            backend.set(STATE_KEY, raw).unwrap();
        }
        (StateStore::new(Rc::new(backend.clone())), backend)
    }

    fn ids(items: &[&str]) -> IdSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_update_touches_only_its_slot() {
        let (store, _) = store_with(None);
        store.update::<Level2Progress>(|p| {
            p.matched_pairs.insert("p1".into());
        });
        store.update::<Level3Progress>(|p| {
            p.captured_words.insert("w1".into());
        });

        let state = store.read();
        assert_eq!(state.level2.matched_pairs, ids(&["p1"]));
        assert_eq!(state.level3.captured_words, ids(&["w1"]));
        assert!(state.level1.found_sparkles.is_empty());
        assert_eq!(state.current_level, 1);
    }

    #[test]
    fn test_slot_keys_match_stored_record() {
        let stored = serde_json::to_value(PersistedState::default()).unwrap();
        for key in [Level1Progress::KEY, Level2Progress::KEY, Level3Progress::KEY] {
            assert!(stored.get(key).is_some_and(|v| v.is_object()), "{key}");
        }
    }

    #[test]
    fn test_write_is_visible_to_next_read() {
        let (store, _) = store_with(None);
        let written = store.set_current_level(3);
        assert_eq!(written.current_level, 3);
        assert_eq!(store.read().current_level, 3);
    }

    #[test]
    fn test_reset_returns_defaults() {
        let (store, backend) = store_with(Some(r#"{"currentLevel": 3}"#));
        store.update::<Level1Progress>(|p| {
            p.found_sparkles.insert("s1".into());
        });

        assert_eq!(store.reset(), PersistedState::default());
        assert_eq!(store.read(), PersistedState::default());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_write_merges_over_corrupt_blob() {
        let (store, _) = store_with(Some("\u{0}\u{1}garbage"));
        let state = store.write(&PartialState {
            level2: Some(Level2Patch {
                matched_pairs: Some(ids(&["p2"])),
            }),
            ..Default::default()
        });
        assert_eq!(state.current_level, 1);
        assert_eq!(store.read().level2.matched_pairs, ids(&["p2"]));
    }

    fn arb_ids() -> impl Strategy<Value = IdSet> {
        prop::collection::btree_set("[a-z][0-9]", 0..5)
    }

    fn arb_patch() -> impl Strategy<Value = PartialState> {
        (
            prop::option::of(1u32..5),
            prop::option::of(arb_ids()),
            prop::option::of(arb_ids()),
            prop::option::of(arb_ids()),
        )
            .prop_map(|(level, found, matched, captured)| PartialState {
                current_level: level,
                level1: found.map(|f| Level1Patch {
                    found_sparkles: Some(f),
                    sparkle_positions: None,
                }),
                level2: matched.map(|m| Level2Patch {
                    matched_pairs: Some(m),
                }),
                level3: captured.map(|c| Level3Patch {
                    captured_words: Some(c),
                }),
            })
    }

    proptest! {
        #[test]
        fn prop_read_never_fails(raw in ".{0,64}") {
            let (store, _) = store_with(Some(&raw));
            let state = store.read();
            prop_assert!(state.current_level >= 1);
        }

        #[test]
        fn prop_read_fills_defaults_for_json_shapes(
            level in prop::option::of(any::<i64>()),
            found in prop::option::of(prop::collection::vec(any::<i32>(), 0..4)),
        ) {
            let mut obj = serde_json::Map::new();
            if let Some(level) = level {
                obj.insert("currentLevel".into(), level.into());
            }
            if let Some(found) = found {
                obj.insert("level1".into(), serde_json::json!({ "foundSparkles": found }));
            }
            let raw = serde_json::Value::Object(obj).to_string();
            let (store, _) = store_with(Some(&raw));
            let state = store.read();
            prop_assert!(state.current_level >= 1);
            prop_assert!(state.level1.found_sparkles.is_empty());
            prop_assert!(state.level2.matched_pairs.is_empty());
            prop_assert!(state.level3.captured_words.is_empty());
        }

        #[test]
        fn prop_write_is_idempotent(patch in arb_patch()) {
            let (store, _) = store_with(None);
            let once = store.write(&patch);
            let twice = store.write(&patch);
            prop_assert_eq!(once, twice);
        }
    }
}

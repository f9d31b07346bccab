//! Tab-scoped session id

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::platform::KeyValueStore;

/// Session storage key
pub const SESSION_KEY: &str = "analytics_session";

/// Lazily generated v4 UUID, persisted for the tab session
pub struct Session {
    store: Rc<dyn KeyValueStore>,
    id: OnceCell<String>,
    rng: RefCell<Pcg32>,
}

impl Session {
    /// `store` should be tab-scoped (sessionStorage in the browser)
    pub fn new(store: Rc<dyn KeyValueStore>, seed: u64) -> Self {
        Self {
            store,
            id: OnceCell::new(),
            rng: RefCell::new(Pcg32::seed_from_u64(seed)),
        }
    }

    /// The session id; generated and stored on first call, stable afterwards
    pub fn id(&self) -> &str {
        self.id.get_or_init(|| {
            if let Some(existing) = self.store.get(SESSION_KEY).filter(|s| !s.is_empty()) {
                return existing;
            }
            let id = random_uuid(&mut *self.rng.borrow_mut());
            if let Err(e) = self.store.set(SESSION_KEY, &id) {
                log::debug!("Session id not persisted: {e}");
            }
            log::debug!("New analytics session {id}");
            id
        })
    }
}

/// Random (version 4) UUID from the given RNG
pub fn random_uuid(rng: &mut impl Rng) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes[..]);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

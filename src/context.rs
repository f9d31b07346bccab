//! Services shared by every level engine for one page load

use crate::admin::AdminOverrides;
use crate::analytics::EventLogger;
use crate::state::StateStore;
use crate::tuning::Tuning;

/// Everything an engine may touch outside itself
pub struct Context {
    pub store: StateStore,
    pub logger: EventLogger,
    pub admin: AdminOverrides,
    pub tuning: Tuning,
}

impl Context {
    pub fn new(store: StateStore, logger: EventLogger, admin: AdminOverrides, tuning: Tuning) -> Self {
        Self {
            store,
            logger,
            admin,
            tuning,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin.is_admin
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::rc::Rc;

    use super::*;
    use crate::analytics::{Environment, MemoryTransport, Session};
    use crate::platform::MemoryStorage;

    /// A context over in-memory storage and a recording transport
    pub(crate) fn context(admin: bool) -> (Context, MemoryStorage, MemoryTransport) {
        let storage = MemoryStorage::new();
        let transport = MemoryTransport::new();
        let session = Session::new(Rc::new(MemoryStorage::new()), 1);
        let logger = EventLogger::new(Box::new(transport.clone()), session, Environment::default);
        let ctx = Context::new(
            StateStore::new(Rc::new(storage.clone())),
            logger,
            AdminOverrides {
                is_admin: admin,
                ..Default::default()
            },
            Tuning::default(),
        );
        (ctx, storage, transport)
    }
}

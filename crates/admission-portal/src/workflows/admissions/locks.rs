use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::identity::RecordKey;

/// Per-offering critical sections. Submissions for the same offering run one at a time;
/// submissions for different offerings never contend.
#[derive(Default)]
pub struct OfferingLocks {
    slots: Mutex<HashMap<RecordKey, Arc<Mutex<()>>>>,
}

impl OfferingLocks {
    fn slot(&self, offering: &RecordKey) -> Arc<Mutex<()>> {
        // Poisoning is ignored: the slots guard `()` and the map has no cross-entry invariants.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(offering.clone()).or_default().clone()
    }

    /// Run `section` while holding the offering's lock.
    pub fn with_lock<T>(&self, offering: &RecordKey, section: impl FnOnce() -> T) -> T {
        let slot = self.slot(offering);
        let _held = slot.lock().unwrap_or_else(PoisonError::into_inner);
        section()
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-complaint async mutexes that serialize read-decide-commit sequences.
///
/// Entries are weak: a complaint's lock lives only while some task holds or awaits it.
#[derive(Default)]
pub struct ComplaintLocks {
    inner: Mutex<HashMap<Uuid, Weak<AsyncMutex<()>>>>,
}

impl ComplaintLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `complaint_id`. Released when the guard drops.
    pub async fn acquire(&self, complaint_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, weak| weak.strong_count() > 0);
            match map.get(&complaint_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    map.insert(complaint_id, Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn live(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.values().filter(|weak| weak.strong_count() > 0).count()
    }
}

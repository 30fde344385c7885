use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::session::SessionSnapshot;

type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Change-notification callbacks, called in subscription order.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl Listeners {
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    /// Call every listener with `snapshot`. The list is copied first, so a
    /// listener may subscribe or unsubscribe without deadlocking.
    pub fn notify(&self, snapshot: &SessionSnapshot) {
        let current: Vec<Listener> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in current {
            listener(snapshot);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

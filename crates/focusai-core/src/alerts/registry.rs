//! Subscriber registry.
//!
//! Callbacks are kept in registration order and invoked synchronously. The
//! list is snapshotted before dispatch so a callback may subscribe or
//! unsubscribe without deadlocking; such changes take effect on the next alert.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::Alert;

/// Callback invoked with every alert the monitor fires.
pub type AlertCallback = Arc<dyn Fn(&Alert) + Send + Sync>;

/// Handle returned by [`SubscriberRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, AlertCallback)>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Unknown or already-removed handles are a no-op;
    /// returns whether anything was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every subscriber with `alert`, in registration order.
    /// Returns the number of callbacks run.
    pub fn dispatch(&self, alert: &Alert) -> usize {
        let snapshot: Vec<AlertCallback> =
            self.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for callback in &snapshot {
            callback(alert);
        }
        snapshot.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, AlertCallback)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

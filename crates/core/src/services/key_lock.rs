//! Per-key async mutual exclusion.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One key's mutex and the number of lock calls holding or awaiting it.
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    users: usize,
}

type Slots<K> = Arc<Mutex<HashMap<K, Slot>>>;

/// Serializes critical sections that share a key while letting different
/// keys proceed in parallel.
///
/// Slots are created on demand and dropped when the last holder or waiter
/// for a key goes away, including waiters whose future is cancelled.
pub struct KeyedLock<K> {
    slots: Slots<K>,
}

impl<K> Clone for KeyedLock<K> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLock<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> KeyedLock<K> {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: K) -> KeyGuard<K> {
        let (mutex, handle) = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            let handle = SlotHandle {
                key,
                slots: Arc::clone(&self.slots),
            };
            (Arc::clone(&slot.mutex), handle)
        };

        // Dropping this future while waiting drops `handle`, which releases
        // the registration.
        let guard = mutex.lock_owned().await;

        KeyGuard {
            _guard: guard,
            _handle: handle,
        }
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One registration on a slot; the slot is removed when the last one drops.
struct SlotHandle<K: Eq + Hash> {
    key: K,
    slots: Slots<K>,
}

impl<K: Eq + Hash> Drop for SlotHandle<K> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyGuard<K: Eq + Hash> {
    // Fields drop in order: the mutex is unlocked before the slot can go.
    _guard: OwnedMutexGuard<()>,
    _handle: SlotHandle<K>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks: KeyedLock<String> = KeyedLock::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let locks = locks.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            tokio::spawn(async move {
                let _guard = locks.lock("blog-1/alice".to_string()).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            })
        });
        for result in futures::future::join_all(tasks).await {
            assert!(result.is_ok());
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks: KeyedLock<String> = KeyedLock::new();
        let _first = locks.lock("a".to_string()).await;

        let second = tokio::time::timeout(Duration::from_millis(100), locks.lock("b".to_string())).await;
        assert!(second.is_ok());
        assert_eq!(locks.active_keys(), 2);
    }

    #[tokio::test]
    async fn test_slot_released_after_drop() {
        let locks: KeyedLock<String> = KeyedLock::new();
        {
            let _guard = locks.lock("a".to_string()).await;
            assert_eq!(locks.active_keys(), 1);
        }
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_slot() {
        use futures::FutureExt;

        let locks: KeyedLock<String> = KeyedLock::new();
        let holder = locks.lock("a".to_string()).await;

        let mut waiter = Box::pin(locks.lock("a".to_string()));
        assert!(waiter.as_mut().now_or_never().is_none());
        assert_eq!(locks.active_keys(), 1);

        // Holder releases, then the woken waiter is abandoned unpolled
        drop(holder);
        drop(waiter);
        assert_eq!(locks.active_keys(), 0);

        let _again = locks.lock("a".to_string()).await;
        assert_eq!(locks.active_keys(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_keeps_holder_exclusive() {
        use futures::FutureExt;

        let locks: KeyedLock<String> = KeyedLock::new();
        let holder = locks.lock("a".to_string()).await;

        let mut waiter = Box::pin(locks.lock("a".to_string()));
        assert!(waiter.as_mut().now_or_never().is_none());
        drop(waiter);
        assert_eq!(locks.active_keys(), 1);

        let blocked =
            tokio::time::timeout(Duration::from_millis(20), locks.lock("a".to_string())).await;
        assert!(blocked.is_err());

        drop(holder);
        assert_eq!(locks.active_keys(), 0);
    }
}

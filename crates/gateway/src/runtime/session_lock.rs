//! Per-session concurrency control.
//!
//! Only one exchange runs per session at a time. A second message for the
//! same session waits until the first one has appended its turns. Entries
//! are dropped from the map as soon as no permit holder or waiter remains,
//! so the map only tracks sessions with work in flight.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Manages per-session exchange locks.
///
/// Each session id maps to an async mutex. Holding the [`SessionPermit`]
/// gives exclusive access to the session's history for one exchange.
pub struct SessionLockMap {
    locks: LockTable,
}

impl Default for SessionLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Acquire the lock for a session, waiting for any exchange already in
    /// flight. The permit releases on drop.
    pub async fn acquire(&self, session_id: &str) -> SessionPermit {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(session_id.to_owned())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let registration = Registration {
            session_id: session_id.to_owned(),
            lock,
            locks: self.locks.clone(),
        };

        let guard = registration.lock.clone().lock_owned().await;
        SessionPermit {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of sessions with a permit held or awaited.
    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Exclusive access to one session. Field order matters: the guard is
/// released before the registration checks whether the entry is still in use.
pub struct SessionPermit {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

/// One holder's claim on a map entry.
struct Registration {
    session_id: String,
    lock: Arc<AsyncMutex<()>>,
    locks: LockTable,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // Map entry plus this handle. Waiters clone under the map lock, so
        // any other claim shows up in the count.
        if Arc::strong_count(&self.lock) == 2 {
            let ours = locks
                .get(&self.session_id)
                .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock));
            if ours {
                locks.remove(&self.session_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequential_access() {
        let map = SessionLockMap::new();

        let permit1 = map.acquire("s1").await;
        assert_eq!(map.session_count(), 1);
        drop(permit1);

        let permit2 = map.acquire("s1").await;
        drop(permit2);
        assert_eq!(map.session_count(), 0);
    }

    #[tokio::test]
    async fn different_sessions_concurrent() {
        let map = SessionLockMap::new();

        let _p1 = map.acquire("s1").await;
        let _p2 = map.acquire("s2").await;

        assert_eq!(map.session_count(), 2);
    }

    #[tokio::test]
    async fn same_session_waits() {
        let map = Arc::new(SessionLockMap::new());
        let map2 = map.clone();

        let p1 = map.acquire("s1").await;

        let handle = tokio::spawn(async move {
            let _p2 = map2.acquire("s1").await;
            42
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        assert_eq!(map.session_count(), 1);

        drop(p1);

        let result = handle.await.unwrap();
        assert_eq!(result, 42);
        assert_eq!(map.session_count(), 0);
    }

    #[tokio::test]
    async fn released_one_off_sessions_leave_no_entries() {
        let map = SessionLockMap::new();
        for i in 0..10_000 {
            let permit = map.acquire(&format!("one-off-{i}")).await;
            drop(permit);
        }
        assert_eq!(map.session_count(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_a_waiter_is_queued() {
        let map = Arc::new(SessionLockMap::new());
        let p1 = map.acquire("s1").await;

        let map2 = map.clone();
        let waiter = tokio::spawn(async move {
            let _p2 = map2.acquire("s1").await;
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        drop(p1);
        tokio::task::yield_now().await;

        // A third caller queues on the same lock rather than a fresh one.
        let p3 = map.acquire("s1").await;
        assert_eq!(map.session_count(), 1);
        drop(p3);
        waiter.await.unwrap();
        assert_eq!(map.session_count(), 0);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use backend_domain::EventId;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = Arc<StdMutex<HashMap<EventId, Arc<Mutex<()>>>>>;

/// Serialises attendance mutations per event, so read-decide-commit
/// sequences on the same event never interleave. An event's entry lives only
/// while someone holds or waits for its lock.
#[derive(Default)]
pub struct EventLocks {
    locks: Registry,
}

/// Held for the duration of one mutation.
pub struct EventGuard {
    event_id: EventId,
    registry: Registry,
    guard: Option<OwnedMutexGuard<()>>,
}

impl EventLocks {
    pub async fn acquire(&self, event_id: EventId) -> EventGuard {
        // The registry mutex is never held across an await.
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(event_id).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        EventGuard {
            event_id,
            registry: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Events with a live entry.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for EventGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the registry's own handle left: nobody holds or waits.
        let idle = locks
            .get(&self.event_id)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false);
        if idle {
            locks.remove(&self.event_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_event_is_exclusive() {
        let locks = Arc::new(EventLocks::default());
        let guard = locks.acquire(EventId(1)).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(EventId(1)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender");
    }

    #[tokio::test]
    async fn different_events_do_not_block() {
        let locks = EventLocks::default();
        let _first = locks.acquire(EventId(1)).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(EventId(2))).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_forgotten() {
        let locks = EventLocks::default();
        for id in 0..100 {
            let _guard = locks.acquire(EventId(id)).await;
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_a_waiter_is_queued() {
        let locks = Arc::new(EventLocks::default());
        let guard = locks.acquire(EventId(7)).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(EventId(7)).await;
                locks.tracked()
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
        assert_eq!(locks.tracked(), 1);

        let seen_inside = waiter.await.expect("waiter");
        assert_eq!(seen_inside, 1);
        assert_eq!(locks.tracked(), 0);
    }
}

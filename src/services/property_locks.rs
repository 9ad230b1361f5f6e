//! Per-property mutation locks
//!
//! Refresh, edit and background ingestion of the same property run one at
//! a time. Different properties never share a lock. Entries are weak so the
//! map only holds locks somebody is currently using.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct PropertyLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl PropertyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `property_id`. Released on drop.
    pub async fn acquire(&self, property_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.handle(property_id);
        lock.lock_owned().await
    }

    fn handle(&self, property_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();

        if let Some(lock) = locks.get(property_id).and_then(Weak::upgrade) {
            return lock;
        }

        // Drop entries whose guards and waiters are all gone
        locks.retain(|_, weak| weak.strong_count() > 0);

        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(property_id.to_string(), Arc::downgrade(&lock));
        lock
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_property_is_serialized() {
        let locks = Arc::new(PropertyLocks::new());
        let guard = locks.acquire("a").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("a").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_properties_do_not_contend() {
        let locks = PropertyLocks::new();
        let _a = locks.acquire("a").await;

        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = PropertyLocks::new();
        {
            let _a = locks.acquire("a").await;
            let _b = locks.acquire("b").await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }
}

//! Resource lock registry
//!
//! One lock per account id, created lazily on first use and kept for the
//! lifetime of the registry. Locks are never removed, only acquired and
//! released, so every caller asking for the same id gets the same lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::core_types::AccountId;

pub type LockHandle = Arc<Mutex<()>>;

#[derive(Default)]
pub struct LockRegistry {
    locks: DashMap<AccountId, LockHandle>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Get or create the lock for `id`. Creation is race-free: the entry API
    /// holds the shard lock between lookup and insert.
    pub fn acquire_lock_handle(&self, id: AccountId) -> LockHandle {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Number of distinct ids ever locked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_same_handle() {
        let registry = LockRegistry::new();
        let a = registry.acquire_lock_handle(1);
        let b = registry.acquire_lock_handle(1);
        let c = registry.acquire_lock_handle(2);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creation_yields_one_lock() {
        let registry = Arc::new(LockRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(
                async move { registry.acquire_lock_handle(42) },
            ));
        }

        let mut locks = Vec::new();
        for h in handles {
            locks.push(h.await.unwrap());
        }
        assert!(locks.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }
}

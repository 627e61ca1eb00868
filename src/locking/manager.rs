//! Account Lock Manager
//!
//! Acquires one or two account locks in ascending id order so that two
//! transactions touching the same pair in opposite roles can never wait on
//! each other. Locks are held as owned guards inside [`AccountLocks`] and are
//! released highest id first when it is dropped, on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::backoff;
use super::config::LockingConfig;
use super::error::LockError;
use super::registry::LockRegistry;
use crate::core_types::AccountId;

/// Locks held for one critical section, in acquisition order
#[derive(Debug)]
pub struct AccountLocks {
    guards: Vec<(AccountId, OwnedMutexGuard<()>)>,
    released: Arc<AtomicU64>,
}

impl AccountLocks {
    /// Locked ids in acquisition (ascending) order
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.guards.iter().map(|(id, _)| *id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for AccountLocks {
    fn drop(&mut self) {
        // Reverse of acquisition: highest id first
        while let Some((account_id, guard)) = self.guards.pop() {
            drop(guard);
            self.released.fetch_add(1, Ordering::Relaxed);
            debug!(account_id, "Account lock released");
        }
    }
}

pub struct AccountLockManager {
    registry: Arc<LockRegistry>,
    config: LockingConfig,
    acquired: AtomicU64,
    released: Arc<AtomicU64>,
}

impl AccountLockManager {
    pub fn new(registry: Arc<LockRegistry>, config: LockingConfig) -> Self {
        Self {
            registry,
            config,
            acquired: AtomicU64::new(0),
            released: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &LockingConfig {
        &self.config
    }

    /// Lock `from` and `to` (either may be absent) in ascending id order.
    ///
    /// The same id given twice is locked once. If the second lock cannot be
    /// acquired the first is released before the error is returned.
    pub async fn lock_accounts(
        &self,
        from: Option<AccountId>,
        to: Option<AccountId>,
    ) -> Result<AccountLocks, LockError> {
        let mut locks = AccountLocks {
            guards: Vec::with_capacity(2),
            released: self.released.clone(),
        };
        for account_id in lock_order(from, to) {
            let guard = self.acquire(account_id).await?;
            locks.guards.push((account_id, guard));
        }
        Ok(locks)
    }

    /// Release `locks`, checking they cover exactly `from` and `to`.
    ///
    /// The locks are released in every case; a mismatch is reported as
    /// [`LockError::NotHeld`] for the first id that was expected but not held
    /// (or held but not expected).
    pub fn unlock_accounts(
        &self,
        locks: AccountLocks,
        from: Option<AccountId>,
        to: Option<AccountId>,
    ) -> Result<(), LockError> {
        let expected = lock_order(from, to);
        let held = locks.account_ids();
        drop(locks);

        if let Some(account_id) = expected
            .iter()
            .chain(held.iter())
            .find(|id| !(expected.contains(*id) && held.contains(*id)))
        {
            return Err(LockError::NotHeld {
                account_id: *account_id,
            });
        }
        Ok(())
    }

    /// Successful lock acquisitions so far
    pub fn acquired_count(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Lock releases so far
    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    async fn acquire(&self, account_id: AccountId) -> Result<OwnedMutexGuard<()>, LockError> {
        let handle = self.registry.acquire_lock_handle(account_id);
        let max_attempts = self.config.max_attempts();
        let started = Instant::now();

        for attempt in 0..max_attempts {
            match tokio::time::timeout(self.config.timeout(), handle.clone().lock_owned()).await {
                Ok(guard) => {
                    self.acquired.fetch_add(1, Ordering::Relaxed);
                    debug!(account_id, attempt, "Account lock acquired");
                    return Ok(guard);
                }
                Err(_) if attempt + 1 < max_attempts => {
                    let wait = backoff::delay(
                        attempt,
                        self.config.base_delay(),
                        self.config.max_delay(),
                    );
                    debug!(account_id, attempt, ?wait, "Account lock busy, backing off");
                    tokio::time::sleep(wait).await;
                }
                Err(_) => {}
            }
        }

        let elapsed = started.elapsed();
        warn!(account_id, attempts = max_attempts, ?elapsed, "Account lock acquisition failed");
        Err(LockError::AcquisitionTimeout {
            account_id,
            attempts: max_attempts,
            elapsed,
        })
    }
}

/// Distinct ids, ascending
fn lock_order(from: Option<AccountId>, to: Option<AccountId>) -> Vec<AccountId> {
    let mut ids: Vec<AccountId> = from.into_iter().chain(to).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn manager(config: LockingConfig) -> AccountLockManager {
        AccountLockManager::new(Arc::new(LockRegistry::new()), config)
    }

    #[test]
    fn test_lock_order() {
        assert_eq!(lock_order(Some(5), Some(3)), vec![3, 5]);
        assert_eq!(lock_order(Some(3), Some(5)), vec![3, 5]);
        assert_eq!(lock_order(Some(4), Some(4)), vec![4]);
        assert_eq!(lock_order(None, Some(-1)), vec![-1]);
        assert!(lock_order(None, None).is_empty());
    }

    #[tokio::test]
    async fn test_locks_ascending_and_releases_on_drop() {
        let mgr = manager(LockingConfig::default());

        let locks = mgr.lock_accounts(Some(9), Some(2)).await.unwrap();
        assert_eq!(locks.account_ids(), vec![2, 9]);
        assert_eq!(mgr.acquired_count(), 2);

        drop(locks);
        assert_eq!(mgr.released_count(), 2);

        // free again
        let again = mgr.lock_accounts(Some(2), None).await.unwrap();
        assert_eq!(again.account_ids(), vec![2]);
    }

    #[tokio::test]
    async fn test_neither_account_is_noop() {
        let mgr = manager(LockingConfig::default());
        let locks = mgr.lock_accounts(None, None).await.unwrap();
        assert!(locks.is_empty());
        assert!(mgr.unlock_accounts(locks, None, None).is_ok());
        assert_eq!(mgr.acquired_count(), 0);
    }

    #[tokio::test]
    async fn test_same_account_locked_once() {
        let mgr = manager(LockingConfig::default());
        let locks = mgr.lock_accounts(Some(7), Some(7)).await.unwrap();
        assert_eq!(locks.account_ids(), vec![7]);
        assert!(mgr.unlock_accounts(locks, Some(7), Some(7)).is_ok());
    }

    #[tokio::test]
    async fn test_unlock_mismatch_still_releases() {
        let mgr = manager(LockingConfig::default());
        let locks = mgr.lock_accounts(Some(1), None).await.unwrap();

        let err = mgr.unlock_accounts(locks, Some(1), Some(2)).unwrap_err();
        assert_eq!(err, LockError::NotHeld { account_id: 2 });
        assert_eq!(mgr.released_count(), 1);
        assert!(mgr.lock_accounts(Some(1), None).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquisition_times_out_after_max_attempts() {
        let mgr = manager(LockingConfig::new(3, 10, 40, 20));
        let _held = mgr.lock_accounts(Some(1), None).await.unwrap();

        let err = mgr.lock_accounts(Some(1), None).await.unwrap_err();
        match err {
            LockError::AcquisitionTimeout {
                account_id,
                attempts,
                elapsed,
            } => {
                assert_eq!(account_id, 1);
                assert_eq!(attempts, 3);
                // 3 x 20ms timeouts plus at least two backoff waits
                assert!(elapsed >= Duration::from_millis(60));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_releases_first_lock() {
        let mgr = manager(LockingConfig::new(1, 1, 1, 5));
        let _held = mgr.lock_accounts(Some(2), None).await.unwrap();

        let err = mgr.lock_accounts(Some(1), Some(2)).await.unwrap_err();
        assert_eq!(err.account_id(), 2);
        // account 1 was taken and given back
        assert!(mgr.lock_accounts(Some(1), None).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_gets_lock_after_release() {
        let mgr = Arc::new(manager(LockingConfig::new(5, 10, 100, 50)));
        let held = mgr.lock_accounts(Some(1), None).await.unwrap();

        let waiter = {
            let mgr = mgr.clone();
            tokio::spawn(async move { mgr.lock_accounts(Some(1), None).await.is_ok() })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(held);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_pairs_do_not_deadlock() {
        let mgr = Arc::new(manager(LockingConfig::new(50, 1, 10, 1000)));
        let mut tasks = Vec::new();
        for i in 0..100 {
            let mgr = mgr.clone();
            let (from, to) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
            tasks.push(tokio::spawn(async move {
                let locks = mgr.lock_accounts(Some(from), Some(to)).await?;
                tokio::task::yield_now().await;
                mgr.unlock_accounts(locks, Some(from), Some(to))
            }));
        }

        let all = tokio::time::timeout(Duration::from_secs(10), async {
            for t in tasks {
                t.await.unwrap().unwrap();
            }
        })
        .await;
        assert!(all.is_ok(), "lock pairs deadlocked");
        assert_eq!(mgr.acquired_count(), 200);
        assert_eq!(mgr.released_count(), 200);
    }
}

//! Transaction status management
//!
//! [`TransactionStatusManager`] is the only writer of transaction status.
//! Every write is checked against the state machine and persisted as a
//! compare-and-set on the status read by the caller.

use std::sync::Arc;

use tracing::debug;

use crate::persistence::TransactionRepository;
use crate::transaction::{StatusError, Transaction, TransactionError, TransactionStatus};

pub struct TransactionStatusManager {
    repository: Arc<dyn TransactionRepository>,
}

impl TransactionStatusManager {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// Move `transaction` to `status` in storage, then in memory.
    ///
    /// # Errors
    /// - `InvalidTransition` if the state machine forbids the edge
    /// - `Conflict` if the stored status is no longer the one `transaction` holds
    /// - `Repository` if the write itself failed
    pub async fn set_status(
        &self,
        transaction: &mut Transaction,
        status: TransactionStatus,
    ) -> Result<(), StatusError> {
        let id = transaction.id();
        let current = transaction.status();
        if !current.can_transition_to(status) {
            return Err(StatusError::InvalidTransition {
                id,
                from: current,
                to: status,
            });
        }

        match self.repository.update_status(id, current, status).await {
            Ok(true) => {
                transaction.set_status(status);
                debug!(tx_id = id, from = %current, to = %status, "Status updated");
                Ok(())
            }
            Ok(false) => Err(StatusError::Conflict {
                id,
                expected: current,
            }),
            Err(source) => Err(StatusError::Repository { id, source }),
        }
    }
}

/// Precondition check: only NEW transactions may be processed
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusChecker;

impl StatusChecker {
    pub fn new() -> Self {
        Self
    }

    /// Reject anything not in NEW. Never changes the status.
    pub fn validate_for_processing(&self, transaction: &Transaction) -> Result<(), TransactionError> {
        let id = transaction.id();
        match transaction.status() {
            TransactionStatus::New => Ok(()),
            TransactionStatus::Done => Err(TransactionError::AlreadyProcessed(id)),
            TransactionStatus::Pending => Err(TransactionError::InProgress(id)),
            status => Err(TransactionError::CannotBeProcessed { id, status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, Iban};
    use crate::persistence::{InMemoryAccountRepository, InMemoryTransactionRepository};
    use rust_decimal_macros::dec;

    async fn setup() -> (Arc<InMemoryTransactionRepository>, TransactionStatusManager, Transaction) {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let account = Account::new(1, 1, Iban::generate(1, 1).unwrap());
        accounts.insert(account.clone());
        let repo = Arc::new(InMemoryTransactionRepository::new(accounts));
        let tx = repo
            .insert(Transaction::deposit(account, dec!(10), "d").unwrap())
            .await
            .unwrap();
        (repo.clone(), TransactionStatusManager::new(repo), tx)
    }

    #[tokio::test]
    async fn test_forward_transitions_persist() {
        let (repo, manager, mut tx) = setup().await;

        manager.set_status(&mut tx, TransactionStatus::Pending).await.unwrap();
        manager.set_status(&mut tx, TransactionStatus::Done).await.unwrap();

        assert_eq!(tx.status(), TransactionStatus::Done);
        assert_eq!(
            repo.get_by_id(tx.id()).await.unwrap().status(),
            TransactionStatus::Done
        );
    }

    #[tokio::test]
    async fn test_new_to_done_rejected() {
        let (repo, manager, mut tx) = setup().await;

        let err = manager
            .set_status(&mut tx, TransactionStatus::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::InvalidTransition { .. }));
        assert_eq!(tx.status(), TransactionStatus::New);
        assert_eq!(
            repo.get_by_id(tx.id()).await.unwrap().status(),
            TransactionStatus::New
        );
    }

    #[tokio::test]
    async fn test_terminal_status_is_final() {
        let (_, manager, mut tx) = setup().await;
        manager
            .set_status(&mut tx, TransactionStatus::ValidationError)
            .await
            .unwrap();

        for next in [TransactionStatus::New, TransactionStatus::Pending, TransactionStatus::Done] {
            assert!(manager.set_status(&mut tx, next).await.is_err());
        }
        assert_eq!(tx.status(), TransactionStatus::ValidationError);
    }

    #[tokio::test]
    async fn test_stale_copy_loses_claim() {
        let (_, manager, mut tx) = setup().await;
        let mut stale = tx.clone();

        manager.set_status(&mut tx, TransactionStatus::Pending).await.unwrap();
        let err = manager
            .set_status(&mut stale, TransactionStatus::Pending)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StatusError::Conflict {
                id: tx.id(),
                expected: TransactionStatus::New
            }
        );
        assert_eq!(stale.status(), TransactionStatus::New);
    }

    #[tokio::test]
    async fn test_checker_rejects_non_new() {
        let (_, manager, mut tx) = setup().await;
        let checker = StatusChecker::new();
        assert!(checker.validate_for_processing(&tx).is_ok());

        manager.set_status(&mut tx, TransactionStatus::Pending).await.unwrap();
        assert_eq!(
            checker.validate_for_processing(&tx),
            Err(TransactionError::InProgress(tx.id()))
        );

        manager.set_status(&mut tx, TransactionStatus::Done).await.unwrap();
        assert_eq!(
            checker.validate_for_processing(&tx),
            Err(TransactionError::AlreadyProcessed(tx.id()))
        );
    }

    #[tokio::test]
    async fn test_checker_rejects_failed() {
        let (_, manager, mut tx) = setup().await;
        manager
            .set_status(&mut tx, TransactionStatus::SystemError)
            .await
            .unwrap();

        assert_eq!(
            StatusChecker::new().validate_for_processing(&tx),
            Err(TransactionError::CannotBeProcessed {
                id: tx.id(),
                status: TransactionStatus::SystemError
            })
        );
    }
}

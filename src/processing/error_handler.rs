//! Transaction Error Handler
//!
//! Turns a processing failure into a terminal status and a notification.
//! Guard rejections (not found, already processed, in progress) carry no
//! failure category and leave the stored status alone.

use std::sync::Arc;

use tracing::{error, warn};

use super::status::TransactionStatusManager;
use crate::transaction::{FailureCategory, Transaction, TransactionError, TransactionStatus};

/// Receives every failure the handler routes. Must not panic.
pub trait ErrorNotifier: Send + Sync {
    fn notify(&self, transaction: &Transaction, error: &TransactionError);
}

/// Reports failures through the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingErrorNotifier;

impl ErrorNotifier for LoggingErrorNotifier {
    fn notify(&self, transaction: &Transaction, error: &TransactionError) {
        error!(
            tx_id = transaction.id(),
            kind = %transaction.kind(),
            amount = %transaction.amount(),
            status = %transaction.status(),
            code = error.code(),
            error = %error,
            "Transaction failure notification"
        );
    }
}

pub struct TransactionErrorHandler {
    status_manager: Arc<TransactionStatusManager>,
    notifier: Arc<dyn ErrorNotifier>,
}

impl TransactionErrorHandler {
    pub fn new(status_manager: Arc<TransactionStatusManager>, notifier: Arc<dyn ErrorNotifier>) -> Self {
        Self {
            status_manager,
            notifier,
        }
    }

    /// Route `error` by its category. Returns the status `transaction` ends in.
    pub async fn handle(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        match error.failure_category() {
            Some(category) => self.fail(transaction, category, error).await,
            None => {
                warn!(
                    tx_id = transaction.id(),
                    status = %transaction.status(),
                    code = error.code(),
                    error = %error,
                    "Transaction rejected"
                );
                transaction.status()
            }
        }
    }

    pub async fn handle_validation_error(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        self.fail(transaction, FailureCategory::Validation, error).await
    }

    pub async fn handle_insufficient_funds(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        self.fail(transaction, FailureCategory::InsufficientFunds, error)
            .await
    }

    pub async fn handle_lock_acquisition_error(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        self.fail(transaction, FailureCategory::LockAcquisition, error)
            .await
    }

    pub async fn handle_lock_release_error(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        self.fail(transaction, FailureCategory::LockRelease, error).await
    }

    pub async fn handle_status_update_error(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        self.fail(transaction, FailureCategory::StatusUpdate, error)
            .await
    }

    pub async fn handle_execution_error(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        self.fail(transaction, FailureCategory::Execution, error).await
    }

    pub async fn handle_unexpected_error(
        &self,
        transaction: &mut Transaction,
        error: &TransactionError,
    ) -> TransactionStatus {
        self.fail(transaction, FailureCategory::Unexpected, error).await
    }

    async fn fail(
        &self,
        transaction: &mut Transaction,
        category: FailureCategory,
        error: &TransactionError,
    ) -> TransactionStatus {
        let target = category.terminal_status();
        error!(
            tx_id = transaction.id(),
            category = ?category,
            code = error.code(),
            error = %error,
            "Transaction failed"
        );

        if transaction.status().is_final() {
            // e.g. release failure after DONE: the written status stays
            warn!(
                tx_id = transaction.id(),
                status = %transaction.status(),
                wanted = %target,
                "Terminal status kept"
            );
        } else if let Err(e) = self.status_manager.set_status(transaction, target).await {
            error!(
                tx_id = transaction.id(),
                wanted = %target,
                error = %e,
                "Failed to record terminal status"
            );
        }

        self.notifier.notify(transaction, error);
        transaction.status()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingNotifier;
    use super::*;
    use crate::account::{Account, Iban};
    use crate::locking::LockError;
    use crate::persistence::{
        InMemoryAccountRepository, InMemoryTransactionRepository, TransactionRepository,
    };
    use crate::transaction::ValidationError;
    use rust_decimal_macros::dec;

    struct Harness {
        repo: Arc<InMemoryTransactionRepository>,
        status: Arc<TransactionStatusManager>,
        notifier: Arc<RecordingNotifier>,
        handler: TransactionErrorHandler,
    }

    impl Harness {
        fn new() -> Self {
            let accounts = Arc::new(InMemoryAccountRepository::new());
            accounts.insert(Account::new(1, 1, Iban::generate(1, 1).unwrap()));
            let repo = Arc::new(InMemoryTransactionRepository::new(accounts));
            let status = Arc::new(TransactionStatusManager::new(repo.clone()));
            let notifier = Arc::new(RecordingNotifier::default());
            let handler = TransactionErrorHandler::new(status.clone(), notifier.clone());
            Self {
                repo,
                status,
                notifier,
                handler,
            }
        }

        async fn new_tx(&self) -> Transaction {
            let account = Account::new(1, 1, Iban::generate(1, 1).unwrap());
            self.repo
                .insert(Transaction::withdrawal(account, dec!(5), "w").unwrap())
                .await
                .unwrap()
        }

        async fn stored(&self, tx: &Transaction) -> TransactionStatus {
            self.repo.get_by_id(tx.id()).await.unwrap().status()
        }
    }

    #[tokio::test]
    async fn test_category_sets_matching_status() {
        let h = Harness::new();
        let cases = [
            (
                TransactionError::Validation(ValidationError::NoAccounts),
                TransactionStatus::ValidationError,
            ),
            (
                TransactionError::InsufficientFunds {
                    account_id: 1,
                    required: dec!(5),
                    available: dec!(0),
                },
                TransactionStatus::InsufficientFunds,
            ),
            (
                TransactionError::LockAcquisition(LockError::NotHeld { account_id: 1 }),
                TransactionStatus::ExecutionError,
            ),
            (
                TransactionError::Execution("boom".into()),
                TransactionStatus::ExecutionError,
            ),
            (
                TransactionError::Unexpected("db down".into()),
                TransactionStatus::SystemError,
            ),
        ];

        for (error, expected) in cases {
            let mut tx = h.new_tx().await;
            let status = h.handler.handle(&mut tx, &error).await;
            assert_eq!(status, expected, "{error}");
            assert_eq!(h.stored(&tx).await, expected);
        }
        assert_eq!(h.notifier.seen().len(), 5);
    }

    #[tokio::test]
    async fn test_guard_rejection_keeps_status() {
        let h = Harness::new();
        let mut tx = h.new_tx().await;
        let tx_id = tx.id();

        let status = h
            .handler
            .handle(&mut tx, &TransactionError::AlreadyProcessed(tx_id))
            .await;

        assert_eq!(status, TransactionStatus::New);
        assert_eq!(h.stored(&tx).await, TransactionStatus::New);
        assert!(h.notifier.seen().is_empty());
    }

    #[tokio::test]
    async fn test_release_failure_after_done_keeps_done() {
        let h = Harness::new();
        let mut tx = h.new_tx().await;
        h.status.set_status(&mut tx, TransactionStatus::Pending).await.unwrap();
        h.status.set_status(&mut tx, TransactionStatus::Done).await.unwrap();

        let error = TransactionError::LockRelease(LockError::NotHeld { account_id: 1 });
        let status = h.handler.handle_lock_release_error(&mut tx, &error).await;

        assert_eq!(status, TransactionStatus::Done);
        assert_eq!(h.stored(&tx).await, TransactionStatus::Done);
        assert_eq!(h.notifier.seen(), vec![(tx.id(), "LOCK_RELEASE_FAILED")]);
    }

    #[tokio::test]
    async fn test_pending_failure_goes_terminal() {
        let h = Harness::new();
        let mut tx = h.new_tx().await;
        h.status.set_status(&mut tx, TransactionStatus::Pending).await.unwrap();

        let error = TransactionError::Execution("executor failed".into());
        let status = h.handler.handle_execution_error(&mut tx, &error).await;

        assert_eq!(status, TransactionStatus::ExecutionError);
        assert_eq!(h.stored(&tx).await, TransactionStatus::ExecutionError);
    }
}

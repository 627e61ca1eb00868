//! Transaction Processor
//!
//! Runs one NEW transaction through the state machine:
//!
//! ```text
//! lock(source, destination) -> PENDING -> executor -> DONE -> unlock
//!            |                   |           |          |
//!            +-------------------+-----------+----------+--> error handler
//! ```
//!
//! The claim to PENDING is a compare-and-set: if another worker already
//! moved the record off NEW this run is dropped without touching balances.
//! Locks are always released, including when a step panics.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error_handler::TransactionErrorHandler;
use super::executor::ExecutorRegistry;
use super::status::TransactionStatusManager;
use crate::account::AccountOperations;
use crate::core_types::AccountId;
use crate::locking::AccountLockManager;
use crate::persistence::TransactionRepository;
use crate::transaction::{StatusError, Transaction, TransactionError, TransactionStatus};

pub struct TransactionProcessor {
    lock_manager: Arc<AccountLockManager>,
    status_manager: Arc<TransactionStatusManager>,
    executors: Arc<ExecutorRegistry>,
    accounts: AccountOperations,
    transactions: Arc<dyn TransactionRepository>,
    error_handler: Arc<TransactionErrorHandler>,
}

impl TransactionProcessor {
    pub fn new(
        lock_manager: Arc<AccountLockManager>,
        status_manager: Arc<TransactionStatusManager>,
        executors: Arc<ExecutorRegistry>,
        accounts: AccountOperations,
        transactions: Arc<dyn TransactionRepository>,
        error_handler: Arc<TransactionErrorHandler>,
    ) -> Self {
        Self {
            lock_manager,
            status_manager,
            executors,
            accounts,
            transactions,
            error_handler,
        }
    }

    pub fn transactions(&self) -> &Arc<dyn TransactionRepository> {
        &self.transactions
    }

    pub fn error_handler(&self) -> &Arc<TransactionErrorHandler> {
        &self.error_handler
    }

    pub fn lock_manager(&self) -> &Arc<AccountLockManager> {
        &self.lock_manager
    }

    /// Process `transaction` to a terminal status and return it.
    ///
    /// A transaction that is not NEW, or whose claim is lost to another
    /// worker, is returned unchanged.
    pub async fn process_transaction(&self, transaction: &mut Transaction) -> TransactionStatus {
        let tx_id = transaction.id();
        if transaction.status() != TransactionStatus::New {
            warn!(tx_id, status = %transaction.status(), "Skipping transaction that is not NEW");
            return transaction.status();
        }

        let (from, to) = self.lock_targets(transaction);
        let locks = match self.lock_manager.lock_accounts(from, to).await {
            Ok(locks) => locks,
            Err(e) => {
                let error = TransactionError::LockAcquisition(e);
                return self
                    .error_handler
                    .handle_lock_acquisition_error(transaction, &error)
                    .await;
            }
        };

        if let Err(error) = self.run_locked(transaction).await {
            self.error_handler.handle(transaction, &error).await;
        }

        if let Err(e) = self.lock_manager.unlock_accounts(locks, from, to) {
            let error = TransactionError::LockRelease(e);
            self.error_handler
                .handle_lock_release_error(transaction, &error)
                .await;
        }

        info!(tx_id, kind = %transaction.kind(), status = %transaction.status(), "Transaction processed");
        transaction.status()
    }

    /// Accounts to lock: source and destination, or the executor's fallback
    /// destination (the bank account for a FEE) when none is set yet
    fn lock_targets(&self, transaction: &Transaction) -> (Option<AccountId>, Option<AccountId>) {
        let destination = transaction
            .destination_id()
            .or_else(|| self.executors.default_destination(transaction.kind()));
        (transaction.source_id(), destination)
    }

    async fn run_locked(&self, transaction: &mut Transaction) -> Result<(), TransactionError> {
        let tx_id = transaction.id();

        match self
            .status_manager
            .set_status(transaction, TransactionStatus::Pending)
            .await
        {
            Ok(()) => {}
            Err(StatusError::Conflict { .. }) => {
                debug!(tx_id, "Transaction already claimed by another worker");
                return Err(TransactionError::InProgress(tx_id));
            }
            Err(e) => return Err(e.into()),
        }

        // Balances may have moved since the caller loaded it
        *transaction = self.transactions.get_by_id(tx_id).await?;

        let had_destination = transaction.destination_id().is_some();
        let executor = self.executors.get_executor(transaction.kind())?;
        executor.execute(transaction, &self.accounts).await?;

        if !had_destination && let Some(destination) = transaction.destination_id() {
            self.transactions
                .assign_destination(tx_id, destination)
                .await?;
        }

        self.status_manager
            .set_status(transaction, TransactionStatus::Done)
            .await?;
        Ok(())
    }
}

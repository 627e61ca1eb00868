//! Transaction Processing Service
//!
//! Entry points for single and batch processing. Each transaction is
//! validated and checked for NEW before it is queued; a rejection is routed
//! to the error handler and never stops a batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use super::error_handler::{ErrorNotifier, TransactionErrorHandler};
use super::executor::ExecutorRegistry;
use super::processor::TransactionProcessor;
use super::status::{StatusChecker, TransactionStatusManager};
use super::worker::{ProcessingTask, WorkerPool};
use crate::account::AccountOperations;
use crate::config::ProcessingConfig;
use crate::core_types::TransactionId;
use crate::locking::{AccountLockManager, LockRegistry, LockingConfig};
use crate::persistence::{AccountRepository, RepositoryError, TransactionRepository};
use crate::transaction::{Transaction, TransactionError, TransactionStatus, TransactionValidator};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome counts of one `process_all_new` pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Queued for asynchronous processing
    pub submitted: usize,
    /// Failed validation or funds check, moved to a failure status
    pub rejected: usize,
    /// Valid but could not be queued, moved to a failure status
    pub failed: usize,
    /// No longer NEW when checked, left alone
    pub skipped: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.submitted + self.rejected + self.failed + self.skipped
    }
}

pub struct TransactionProcessingService {
    processor: Arc<TransactionProcessor>,
    validator: TransactionValidator,
    checker: StatusChecker,
    pool: WorkerPool,
}

impl TransactionProcessingService {
    /// Service around an existing processor. Must run inside a tokio runtime.
    pub fn new(processor: Arc<TransactionProcessor>, config: &ProcessingConfig) -> Self {
        let pool = WorkerPool::start(config.workers, config.queue_capacity, processor.clone());
        Self {
            processor,
            validator: TransactionValidator::new(),
            checker: StatusChecker::new(),
            pool,
        }
    }

    /// Wire the full pipeline with the default executors
    pub fn start(
        accounts: Arc<dyn AccountRepository>,
        transactions: Arc<dyn TransactionRepository>,
        locking: LockingConfig,
        config: &ProcessingConfig,
        notifier: Arc<dyn ErrorNotifier>,
    ) -> Self {
        let registry = Arc::new(ExecutorRegistry::with_defaults(config.bank_account_id));
        Self::start_with_registry(accounts, transactions, locking, config, notifier, registry)
    }

    pub fn start_with_registry(
        accounts: Arc<dyn AccountRepository>,
        transactions: Arc<dyn TransactionRepository>,
        locking: LockingConfig,
        config: &ProcessingConfig,
        notifier: Arc<dyn ErrorNotifier>,
        registry: Arc<ExecutorRegistry>,
    ) -> Self {
        let lock_manager = Arc::new(AccountLockManager::new(
            Arc::new(LockRegistry::new()),
            locking,
        ));
        let status_manager = Arc::new(TransactionStatusManager::new(transactions.clone()));
        let error_handler = Arc::new(TransactionErrorHandler::new(
            status_manager.clone(),
            notifier,
        ));
        let processor = Arc::new(TransactionProcessor::new(
            lock_manager,
            status_manager,
            registry,
            AccountOperations::new(accounts),
            transactions,
            error_handler,
        ));
        Self::new(processor, config)
    }

    pub fn processor(&self) -> &Arc<TransactionProcessor> {
        &self.processor
    }

    /// Load, check and queue one transaction.
    ///
    /// `Ok` means accepted; the final status is read back later.
    pub async fn process_by_id(&self, id: TransactionId) -> Result<(), TransactionError> {
        let transaction = match self.processor.transactions().get_by_id(id).await {
            Ok(transaction) => transaction,
            Err(e) if e.is_not_found() => return Err(TransactionError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };
        self.process_transaction(transaction).await
    }

    /// Check and queue an already loaded transaction
    pub async fn process_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<(), TransactionError> {
        let tx_id = transaction.id();

        if let Err(error) = self
            .checker
            .validate_for_processing(&transaction)
            .and_then(|()| self.validator.validate(&transaction))
        {
            self.processor
                .error_handler()
                .handle(&mut transaction, &error)
                .await;
            return Err(error);
        }

        self.pool
            .submit(ProcessingTask {
                transaction_id: tx_id,
            })
            .await
            .map_err(|e| TransactionError::Unexpected(e.to_string()))?;
        info!(tx_id, kind = %transaction.kind(), amount = %transaction.amount(), "Transaction accepted");
        Ok(())
    }

    /// Queue every NEW transaction. One failing transaction never stops the
    /// rest; only failing to list them is an error.
    pub async fn process_all_new(&self) -> Result<BatchSummary, RepositoryError> {
        let pending = self
            .processor
            .transactions()
            .list_by_status(TransactionStatus::New)
            .await?;

        let mut summary = BatchSummary::default();
        for transaction in pending {
            match self.process_transaction(transaction).await {
                Ok(()) => summary.submitted += 1,
                Err(e) if e.is_pre_execution() => summary.rejected += 1,
                Err(e) if e.failure_category().is_some() => summary.failed += 1,
                Err(_) => summary.skipped += 1,
            }
        }

        info!(
            submitted = summary.submitted,
            rejected = summary.rejected,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch of NEW transactions dispatched"
        );
        Ok(summary)
    }

    /// Poll stored status until it is terminal or `timeout` passes
    pub async fn await_terminal(
        &self,
        id: TransactionId,
        timeout: Duration,
    ) -> Result<Transaction, TransactionError> {
        let deadline = Instant::now() + timeout;
        loop {
            let transaction = match self.processor.transactions().get_by_id(id).await {
                Ok(transaction) => transaction,
                Err(e) if e.is_not_found() => return Err(TransactionError::NotFound(id)),
                Err(e) => return Err(e.into()),
            };
            if transaction.status().is_final() {
                return Ok(transaction);
            }
            if Instant::now() >= deadline {
                warn!(tx_id = id, status = %transaction.status(), "Gave up waiting for transaction");
                return Err(TransactionError::WaitTimeout {
                    id,
                    status: transaction.status(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Stop the worker pool after the queue drains
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}

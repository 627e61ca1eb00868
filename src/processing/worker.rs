//! Processing worker pool
//!
//! Bounded task queue drained by a fixed number of tokio workers. Tasks carry
//! only the transaction id; each worker reloads the record so it always
//! processes the stored state. Submitters never wait for the outcome.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use super::processor::TransactionProcessor;
use crate::core_types::TransactionId;
use crate::persistence::TransactionRepository;
use crate::transaction::TransactionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingTask {
    pub transaction_id: TransactionId,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool is shut down, task for transaction {0} dropped")]
    Closed(TransactionId),
}

pub struct WorkerPool {
    sender: mpsc::Sender<ProcessingTask>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` workers on the current runtime
    pub fn start(workers: usize, queue_capacity: usize, processor: Arc<TransactionProcessor>) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let receiver = receiver.clone();
                let processor = processor.clone();
                tokio::spawn(async move { run_worker(worker_id, receiver, processor).await })
            })
            .collect::<Vec<_>>();

        info!(workers = handles.len(), queue_capacity, "Processing worker pool started");
        Self { sender, handles }
    }

    /// Queue a task. Waits only while the queue is full.
    pub async fn submit(&self, task: ProcessingTask) -> Result<(), PoolError> {
        self.sender
            .send(task)
            .await
            .map_err(|e| PoolError::Closed(e.0.transaction_id))?;
        debug!(tx_id = task.transaction_id, "Task submitted");
        Ok(())
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Stop accepting tasks, drain the queue and wait for every worker
    pub async fn shutdown(self) {
        drop(self.sender);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Processing worker ended abnormally");
            }
        }
        info!("Processing worker pool stopped");
    }
}

async fn run_worker(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<ProcessingTask>>>,
    processor: Arc<TransactionProcessor>,
) {
    loop {
        let task = { receiver.lock().await.recv().await };
        let Some(task) = task else {
            debug!(worker_id, "Queue closed, worker exiting");
            return;
        };

        // A panicking task must not take the worker down with it
        let run = tokio::spawn(run_task(worker_id, task, processor.clone()));
        if let Err(e) = run.await {
            error!(
                worker_id,
                tx_id = task.transaction_id,
                error = %e,
                "Processing task aborted"
            );
            fail_aborted(&processor, task.transaction_id, &e).await;
        }
    }
}

async fn run_task(worker_id: usize, task: ProcessingTask, processor: Arc<TransactionProcessor>) {
    match processor.transactions().get_by_id(task.transaction_id).await {
        Ok(mut transaction) => {
            processor.process_transaction(&mut transaction).await;
        }
        Err(e) => {
            error!(
                worker_id,
                tx_id = task.transaction_id,
                error = %e,
                "Failed to load transaction for processing"
            );
        }
    }
}

/// Move a transaction whose task died to SYSTEM_ERROR. Its locks were
/// released when the task unwound.
async fn fail_aborted(processor: &TransactionProcessor, tx_id: TransactionId, cause: &JoinError) {
    let mut transaction = match processor.transactions().get_by_id(tx_id).await {
        Ok(transaction) => transaction,
        Err(e) => {
            error!(tx_id, error = %e, "Cannot reload aborted transaction");
            return;
        }
    };
    let error = TransactionError::Unexpected(format!("processing task aborted: {cause}"));
    processor
        .error_handler()
        .handle_unexpected_error(&mut transaction, &error)
        .await;
}

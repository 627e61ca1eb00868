//! Transaction processing engine
//!
//! # Flow
//!
//! ```text
//! process_by_id / process_all_new
//!     -> StatusChecker (NEW only) -> TransactionValidator
//!     -> WorkerPool (bounded queue, N workers)
//!     -> TransactionProcessor: lock -> PENDING -> executor -> DONE -> unlock
//!     -> TransactionErrorHandler on any failure
//! ```

pub mod error_handler;
pub mod executor;
pub mod processor;
pub mod scanner;
pub mod service;
pub mod status;
pub mod worker;


pub use error_handler::{ErrorNotifier, LoggingErrorNotifier, TransactionErrorHandler};
pub use executor::{
    DepositExecutor, ExecutorRegistry, FeeExecutor, RegistryError, TransactionExecutor,
    TransferExecutor, WithdrawalExecutor,
};
pub use processor::TransactionProcessor;
pub use scanner::NewTransactionScanner;
pub use service::{BatchSummary, TransactionProcessingService};
pub use status::{StatusChecker, TransactionStatusManager};
pub use worker::{PoolError, ProcessingTask, WorkerPool};

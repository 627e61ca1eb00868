//! Bank Ledger - Transaction Processing Engine
//!
//! Applies persisted, not-yet-executed money movements to account balances
//! under concurrent access.
//!
//! # Modules
//!
//! - [`core_types`] - Core type aliases (AccountId, TransactionId, Amount)
//! - [`account`] - Account model, IBAN, relationship analyzer, balance mutator
//! - [`transaction`] - Transaction model, types, status machine, validation
//! - [`locking`] - Lock registry, backoff and ordered account locking
//! - [`persistence`] - Repository traits and in-memory stores
//! - [`processing`] - Executors, error handling, processor, worker pool, service
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup

// Core types - must be first!
pub mod core_types;

pub mod account;
pub mod config;
pub mod locking;
pub mod logging;
pub mod persistence;
pub mod processing;
pub mod transaction;

// Convenient re-exports at crate root
pub use account::{Account, Iban, IbanAnalyzer};
pub use config::{AppConfig, ProcessingConfig};
pub use core_types::{AccountId, Amount, TransactionId, UserId};
pub use locking::{AccountLockManager, LockRegistry, LockingConfig};
pub use processing::{TransactionProcessingService, TransactionProcessor};
pub use transaction::{Transaction, TransactionError, TransactionStatus, TransactionType};

//! Per-account locking
//!
//! - [`LockRegistry`]: one lazily created lock per account id
//! - [`backoff`]: jittered exponential retry delay
//! - [`AccountLockManager`]: ordered acquisition with bounded retries

pub mod backoff;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;

pub use config::LockingConfig;
pub use error::LockError;
pub use manager::{AccountLockManager, AccountLocks};
pub use registry::{LockHandle, LockRegistry};

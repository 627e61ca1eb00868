//! Persistence boundary
//!
//! Repository traits the engine consumes, plus in-memory implementations.

pub mod memory;
pub mod repository;

pub use memory::{InMemoryAccountRepository, InMemoryTransactionRepository};
pub use repository::{AccountRepository, RepositoryError, TransactionRepository};

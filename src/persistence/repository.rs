//! Repository traits for data access abstraction
//!
//! The processing engine only talks to storage through these traits:
//! - Testability through in-memory implementations
//! - The relational schema stays outside the engine

use async_trait::async_trait;
use thiserror::Error;

use crate::account::Account;
use crate::core_types::{AccountId, TransactionId};
use crate::transaction::{Transaction, TransactionStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn account_not_found(id: AccountId) -> Self {
        RepositoryError::NotFound {
            entity: "Account",
            id,
        }
    }

    pub fn transaction_not_found(id: TransactionId) -> Self {
        RepositoryError::NotFound {
            entity: "Transaction",
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

// ============================================================================
// Account Repository
// ============================================================================

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_by_id(&self, id: AccountId) -> Result<Account, RepositoryError>;

    /// Persist the account and return the stored version
    async fn save(&self, account: Account) -> Result<Account, RepositoryError>;
}

// ============================================================================
// Transaction Repository
// ============================================================================

/// Transactions are returned hydrated: source/destination carry the account
/// state as of the read.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Store a new transaction and return it with its assigned id
    async fn insert(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;

    async fn get_by_id(&self, id: TransactionId) -> Result<Transaction, RepositoryError>;

    /// All transactions currently in `status`, ascending by id
    async fn list_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    /// Single-column status write, applied only if the stored status still
    /// equals `expected`.
    ///
    /// Returns `Ok(false)` when the stored status differs (nothing written).
    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> Result<bool, RepositoryError>;

    /// Record a destination resolved during execution (fee collection)
    async fn assign_destination(
        &self,
        id: TransactionId,
        destination: AccountId,
    ) -> Result<(), RepositoryError>;
}

//! Account mutator handed to transaction executors
//!
//! Every call re-reads the account from the store, applies the change on the
//! model and writes it back. Callers MUST hold the account's lock: the
//! read-modify-write here is only safe under [`AccountLockManager`].
//!
//! [`AccountLockManager`]: crate::locking::AccountLockManager

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::models::{Account, AccountError};
use crate::core_types::{AccountId, Amount};
use crate::persistence::{AccountRepository, RepositoryError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountOpError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Clone)]
pub struct AccountOperations {
    repository: Arc<dyn AccountRepository>,
}

impl AccountOperations {
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self { repository }
    }

    pub async fn get(&self, account_id: AccountId) -> Result<Account, AccountOpError> {
        Ok(self.repository.get_by_id(account_id).await?)
    }

    /// Credit `amount` and persist. Returns the updated account.
    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<Account, AccountOpError> {
        let mut account = self.repository.get_by_id(account_id).await?;
        account.deposit(amount)?;
        let saved = self.repository.save(account).await?;
        debug!(account_id, %amount, balance = %saved.balance(), "Account credited");
        Ok(saved)
    }

    /// Debit `amount` and persist. Nothing is written if funds are insufficient.
    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<Account, AccountOpError> {
        let mut account = self.repository.get_by_id(account_id).await?;
        account.withdraw(amount)?;
        let saved = self.repository.save(account).await?;
        debug!(account_id, %amount, balance = %saved.balance(), "Account debited");
        Ok(saved)
    }
}

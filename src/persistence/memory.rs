//! In-memory repositories
//!
//! DashMap-backed stores used by tests and the demo runner. Transactions are
//! stored as records (account ids only) and hydrated with the current
//! account state on every read.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::repository::{AccountRepository, RepositoryError, TransactionRepository};
use crate::account::Account;
use crate::core_types::{AccountId, TransactionId};
use crate::transaction::{Transaction, TransactionRecord, TransactionStatus};

// ============================================================================
// Accounts
// ============================================================================

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: DashMap<AccountId, Account>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Seed an account (registration / admin path)
    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id(), account);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get_by_id(&self, id: AccountId) -> Result<Account, RepositoryError> {
        self.accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RepositoryError::account_not_found(id))
    }

    async fn save(&self, account: Account) -> Result<Account, RepositoryError> {
        self.accounts.insert(account.id(), account.clone());
        Ok(account)
    }
}

// ============================================================================
// Transactions
// ============================================================================

pub struct InMemoryTransactionRepository {
    records: DashMap<TransactionId, TransactionRecord>,
    accounts: Arc<dyn AccountRepository>,
    next_id: AtomicI64,
}

impl InMemoryTransactionRepository {
    /// `accounts` is used to hydrate source/destination on read
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            records: DashMap::new(),
            accounts,
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn hydrate(&self, record: TransactionRecord) -> Result<Transaction, RepositoryError> {
        let source = match record.source_id {
            Some(id) => Some(self.accounts.get_by_id(id).await?),
            None => None,
        };
        let destination = match record.destination_id {
            Some(id) => Some(self.accounts.get_by_id(id).await?),
            None => None,
        };
        Ok(Transaction::from_record(record, source, destination))
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let transaction = transaction.with_id(id);
        self.records.insert(id, transaction.to_record());
        Ok(transaction)
    }

    async fn get_by_id(&self, id: TransactionId) -> Result<Transaction, RepositoryError> {
        let record = self
            .records
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RepositoryError::transaction_not_found(id))?;
        self.hydrate(record).await
    }

    async fn list_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        // Snapshot first: no map guard may be held across an await
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|r| r.id);

        let mut transactions = Vec::with_capacity(records.len());
        for record in records {
            transactions.push(self.hydrate(record).await?);
        }
        Ok(transactions)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> Result<bool, RepositoryError> {
        // get_mut holds the shard write lock: compare and write are atomic
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::transaction_not_found(id))?;
        if entry.status != expected {
            return Ok(false);
        }
        entry.status = status;
        Ok(true)
    }

    async fn assign_destination(
        &self,
        id: TransactionId,
        destination: AccountId,
    ) -> Result<(), RepositoryError> {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::transaction_not_found(id))?;
        entry.destination_id = Some(destination);
        Ok(())
    }
}

//! Transaction executors
//!
//! One strategy per transaction type, dispatched through [`ExecutorRegistry`].
//! Executors only touch balances of accounts the processor already locked.

mod deposit;
mod fee;
mod transfer;
mod withdrawal;

pub use deposit::DepositExecutor;
pub use fee::FeeExecutor;
pub use transfer::TransferExecutor;
pub use withdrawal::WithdrawalExecutor;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, warn};

use crate::account::AccountOperations;
use crate::core_types::{AccountId, Amount};
use crate::transaction::{Transaction, TransactionError, TransactionType};

#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    /// Type this executor handles
    fn transaction_type(&self) -> TransactionType;

    /// Account credited when the transaction carries no destination. The
    /// processor locks it before calling [`execute`](Self::execute).
    fn default_destination(&self) -> Option<AccountId> {
        None
    }

    /// Apply the balance changes of `transaction`. On success the account
    /// snapshots on `transaction` reflect the new balances.
    async fn execute(
        &self,
        transaction: &mut Transaction,
        accounts: &AccountOperations,
    ) -> Result<(), TransactionError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No executor registered for {0}")]
    NoExecutor(TransactionType),

    #[error("Duplicate executor registered for {0}")]
    DuplicateExecutor(TransactionType),
}

impl From<RegistryError> for TransactionError {
    fn from(e: RegistryError) -> Self {
        TransactionError::Unexpected(e.to_string())
    }
}

/// Executors keyed by transaction type, built once at startup
pub struct ExecutorRegistry {
    executors: HashMap<TransactionType, Arc<dyn TransactionExecutor>>,
}

impl ExecutorRegistry {
    /// Build from `executors`. A type registered twice keeps the later
    /// executor and logs the override.
    pub fn new(executors: Vec<Arc<dyn TransactionExecutor>>) -> Self {
        let mut map: HashMap<TransactionType, Arc<dyn TransactionExecutor>> = HashMap::new();
        for executor in executors {
            let kind = executor.transaction_type();
            if map.insert(kind, executor).is_some() {
                warn!(kind = %kind, "Duplicate executor registration, later one wins");
            }
        }
        Self { executors: map }
    }

    /// Like [`new`](Self::new) but a duplicate type is a startup error
    pub fn strict(executors: Vec<Arc<dyn TransactionExecutor>>) -> Result<Self, RegistryError> {
        let mut map: HashMap<TransactionType, Arc<dyn TransactionExecutor>> = HashMap::new();
        for executor in executors {
            let kind = executor.transaction_type();
            if map.contains_key(&kind) {
                return Err(RegistryError::DuplicateExecutor(kind));
            }
            map.insert(kind, executor);
        }
        Ok(Self { executors: map })
    }

    /// One executor per type; fees are collected on `bank_account_id`
    pub fn with_defaults(bank_account_id: AccountId) -> Self {
        Self::new(vec![
            Arc::new(DepositExecutor),
            Arc::new(WithdrawalExecutor),
            Arc::new(TransferExecutor::new(TransactionType::TransferOwn)),
            Arc::new(TransferExecutor::new(TransactionType::TransferInternal)),
            Arc::new(TransferExecutor::new(TransactionType::TransferExternal)),
            Arc::new(FeeExecutor::new(bank_account_id)),
        ])
    }

    pub fn get_executor(
        &self,
        kind: TransactionType,
    ) -> Result<Arc<dyn TransactionExecutor>, RegistryError> {
        self.executors
            .get(&kind)
            .cloned()
            .ok_or(RegistryError::NoExecutor(kind))
    }

    /// Destination the executor for `kind` falls back to, if any
    pub fn default_destination(&self, kind: TransactionType) -> Option<AccountId> {
        self.executors
            .get(&kind)
            .and_then(|executor| executor.default_destination())
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

/// Debit `source`, credit `destination`. If the credit fails the debit is
/// refunded before the error is returned.
pub(crate) async fn move_funds(
    transaction: &mut Transaction,
    accounts: &AccountOperations,
    source: AccountId,
    destination: AccountId,
    amount: Amount,
) -> Result<(), TransactionError> {
    let debited = accounts.withdraw(source, amount).await?;
    match accounts.deposit(destination, amount).await {
        Ok(credited) => {
            transaction.set_source(debited);
            transaction.set_destination(credited);
            Ok(())
        }
        Err(e) => {
            if let Err(refund) = accounts.deposit(source, amount).await {
                error!(
                    tx_id = transaction.id(),
                    account_id = source,
                    %amount,
                    error = %refund,
                    "CRITICAL: refund after failed credit did not apply"
                );
            }
            Err(e.into())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    struct Named(TransactionType, &'static str);

    #[async_trait]
    impl TransactionExecutor for Named {
        fn transaction_type(&self) -> TransactionType {
            self.0
        }

        async fn execute(
            &self,
            _transaction: &mut Transaction,
            _accounts: &AccountOperations,
        ) -> Result<(), TransactionError> {
            Err(TransactionError::Execution(self.1.to_string()))
        }
    }

    #[test]
    fn test_defaults_cover_every_type() {
        let registry = ExecutorRegistry::with_defaults(-1);
        assert_eq!(registry.len(), TransactionType::ALL.len());
        for kind in TransactionType::ALL {
            assert_eq!(registry.get_executor(kind).unwrap().transaction_type(), kind);
        }
    }

    #[test]
    fn test_missing_executor() {
        let registry = ExecutorRegistry::new(vec![Arc::new(DepositExecutor)]);
        assert_eq!(
            registry.get_executor(TransactionType::Fee).err(),
            Some(RegistryError::NoExecutor(TransactionType::Fee))
        );
    }

    #[tokio::test]
    async fn test_duplicate_last_wins() {
        let registry = ExecutorRegistry::new(vec![
            Arc::new(Named(TransactionType::Deposit, "first")),
            Arc::new(Named(TransactionType::Deposit, "second")),
        ]);
        assert_eq!(registry.len(), 1);

        let (_, ops) = test_support::seeded().await;
        let account = ops.get(1).await.unwrap();
        let mut tx = Transaction::deposit(account, rust_decimal_macros::dec!(1), "d").unwrap();
        let err = registry
            .get_executor(TransactionType::Deposit)
            .unwrap()
            .execute(&mut tx, &ops)
            .await
            .unwrap_err();
        assert_eq!(err, TransactionError::Execution("second".to_string()));
    }

    #[test]
    fn test_strict_rejects_duplicates() {
        let result = ExecutorRegistry::strict(vec![
            Arc::new(Named(TransactionType::Fee, "a")),
            Arc::new(Named(TransactionType::Fee, "b")),
        ]);
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateExecutor(TransactionType::Fee))
        );
    }
}

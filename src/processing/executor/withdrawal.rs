use async_trait::async_trait;
use tracing::debug;

use super::TransactionExecutor;
use crate::account::AccountOperations;
use crate::transaction::{Transaction, TransactionError, TransactionType, ValidationError};

/// Debits the source
pub struct WithdrawalExecutor;

#[async_trait]
impl TransactionExecutor for WithdrawalExecutor {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Withdrawal
    }

    async fn execute(
        &self,
        transaction: &mut Transaction,
        accounts: &AccountOperations,
    ) -> Result<(), TransactionError> {
        let source = transaction
            .source_id()
            .ok_or(ValidationError::MissingSource(TransactionType::Withdrawal))?;
        let debited = accounts.withdraw(source, transaction.amount()).await?;
        debug!(tx_id = transaction.id(), account_id = source, "Withdrawal applied");
        transaction.set_source(debited);
        Ok(())
    }
}

use async_trait::async_trait;
use tracing::debug;

use super::TransactionExecutor;
use crate::account::AccountOperations;
use crate::transaction::{Transaction, TransactionError, TransactionType, ValidationError};

/// Credits the destination
pub struct DepositExecutor;

#[async_trait]
impl TransactionExecutor for DepositExecutor {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Deposit
    }

    async fn execute(
        &self,
        transaction: &mut Transaction,
        accounts: &AccountOperations,
    ) -> Result<(), TransactionError> {
        let destination = transaction
            .destination_id()
            .ok_or(ValidationError::MissingDestination(TransactionType::Deposit))?;
        let credited = accounts.deposit(destination, transaction.amount()).await?;
        debug!(tx_id = transaction.id(), account_id = destination, "Deposit applied");
        transaction.set_destination(credited);
        Ok(())
    }
}

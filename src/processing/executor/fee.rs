use async_trait::async_trait;
use tracing::debug;

use super::{TransactionExecutor, move_funds};
use crate::account::AccountOperations;
use crate::core_types::AccountId;
use crate::transaction::{Transaction, TransactionError, TransactionType, ValidationError};

/// Debits the source and credits the fee-collecting account.
///
/// A FEE without destination is routed to the bank account, which is
/// attached to the transaction before it is credited.
pub struct FeeExecutor {
    bank_account_id: AccountId,
}

impl FeeExecutor {
    pub fn new(bank_account_id: AccountId) -> Self {
        Self { bank_account_id }
    }

    pub fn bank_account_id(&self) -> AccountId {
        self.bank_account_id
    }
}

#[async_trait]
impl TransactionExecutor for FeeExecutor {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Fee
    }

    fn default_destination(&self) -> Option<AccountId> {
        Some(self.bank_account_id)
    }

    async fn execute(
        &self,
        transaction: &mut Transaction,
        accounts: &AccountOperations,
    ) -> Result<(), TransactionError> {
        let source = transaction
            .source_id()
            .ok_or(ValidationError::MissingSource(TransactionType::Fee))?;

        let destination = match transaction.destination_id() {
            Some(id) => id,
            None => {
                let bank = accounts.get(self.bank_account_id).await?;
                transaction.set_destination(bank);
                self.bank_account_id
            }
        };

        let amount = transaction.amount();
        move_funds(transaction, accounts, source, destination, amount).await?;
        debug!(
            tx_id = transaction.id(),
            source,
            destination,
            "Fee collected"
        );
        Ok(())
    }
}

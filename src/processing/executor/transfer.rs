use async_trait::async_trait;
use tracing::debug;

use super::{TransactionExecutor, move_funds};
use crate::account::AccountOperations;
use crate::transaction::{Transaction, TransactionError, TransactionType, ValidationError};

/// Debits the source then credits the destination by the same amount.
///
/// One instance per transfer subtype. Fees are separate FEE transactions,
/// never deducted here.
pub struct TransferExecutor {
    kind: TransactionType,
}

impl TransferExecutor {
    pub fn new(kind: TransactionType) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl TransactionExecutor for TransferExecutor {
    fn transaction_type(&self) -> TransactionType {
        self.kind
    }

    async fn execute(
        &self,
        transaction: &mut Transaction,
        accounts: &AccountOperations,
    ) -> Result<(), TransactionError> {
        let source = transaction
            .source_id()
            .ok_or(ValidationError::MissingSource(self.kind))?;
        let destination = transaction
            .destination_id()
            .ok_or(ValidationError::MissingDestination(self.kind))?;

        let amount = transaction.amount();
        move_funds(transaction, accounts, source, destination, amount).await?;
        debug!(
            tx_id = transaction.id(),
            kind = %self.kind,
            source,
            destination,
            "Transfer applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, Iban};
    use crate::processing::executor::test_support::{balance, seeded};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_transfer_moves_exact_amount() {
        let (repo, ops) = seeded().await;
        let mut tx = Transaction::transfer(
            TransactionType::TransferInternal,
            ops.get(1).await.unwrap(),
            ops.get(3).await.unwrap(),
            dec!(30),
            "rent",
        )
        .unwrap();

        TransferExecutor::new(TransactionType::TransferInternal)
            .execute(&mut tx, &ops)
            .await
            .unwrap();

        assert_eq!(balance(&repo, 1).await, dec!(70));
        assert_eq!(balance(&repo, 3).await, dec!(30));
        assert_eq!(tx.source().unwrap().balance(), dec!(70));
    }

    #[tokio::test]
    async fn test_external_transfer_charges_no_fee() {
        let (repo, ops) = seeded().await;
        let mut tx = Transaction::transfer(
            TransactionType::TransferExternal,
            ops.get(1).await.unwrap(),
            ops.get(3).await.unwrap(),
            dec!(50),
            "abroad",
        )
        .unwrap();

        TransferExecutor::new(TransactionType::TransferExternal)
            .execute(&mut tx, &ops)
            .await
            .unwrap();

        assert_eq!(balance(&repo, 1).await, dec!(50));
        assert_eq!(balance(&repo, 3).await, dec!(50));
    }

    #[tokio::test]
    async fn test_failed_credit_refunds_source() {
        let (repo, ops) = seeded().await;
        // destination that is not stored
        let ghost = Account::new(99, 5, Iban::generate(5, 1).unwrap());
        let mut tx = Transaction::transfer(
            TransactionType::TransferInternal,
            ops.get(1).await.unwrap(),
            ghost,
            dec!(25),
            "lost",
        )
        .unwrap();

        let err = TransferExecutor::new(TransactionType::TransferInternal)
            .execute(&mut tx, &ops)
            .await
            .unwrap_err();

        assert!(matches!(err, TransactionError::Unexpected(_)));
        assert_eq!(balance(&repo, 1).await, dec!(100));
    }
}

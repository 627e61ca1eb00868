//! Transaction validation
//!
//! Stateless checks run before a transaction may be processed. Order
//! matters, the first failing check is reported:
//!
//! 1. amount strictly positive
//! 2. at least one account present
//! 3. type-specific account presence
//! 4. source != destination (own transfers included)
//! 5. own transfer: same owner on both sides
//! 6. source balance covers the amount (reported as `InsufficientFunds`)
//!
//! Presence of the transaction, amount and type is guaranteed by the types.

use rust_decimal::Decimal;
use tracing::debug;

use super::error::{TransactionError, ValidationError};
use super::model::Transaction;
use super::types::{TransactionCategory, TransactionType};

#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionValidator;

impl TransactionValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, transaction: &Transaction) -> Result<(), TransactionError> {
        debug!(tx_id = transaction.id(), kind = %transaction.kind(), "Validating transaction");
        validate_amount(transaction)?;
        validate_any_account(transaction)?;
        validate_accounts_for_type(transaction)?;
        validate_different_accounts(transaction)?;
        validate_same_owner_for_own_transfer(transaction)?;
        validate_sufficient_funds(transaction)?;
        Ok(())
    }

    /// Predicate form of [`validate`](Self::validate)
    pub fn is_valid(&self, transaction: &Transaction) -> bool {
        match self.validate(transaction) {
            Ok(()) => true,
            Err(e) => {
                debug!(tx_id = transaction.id(), error = %e, "Transaction validation failed");
                false
            }
        }
    }
}

fn validate_amount(transaction: &Transaction) -> Result<(), ValidationError> {
    if transaction.amount() <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(transaction.amount()));
    }
    Ok(())
}

fn validate_any_account(transaction: &Transaction) -> Result<(), ValidationError> {
    if transaction.source().is_none() && transaction.destination().is_none() {
        return Err(ValidationError::NoAccounts);
    }
    Ok(())
}

fn validate_accounts_for_type(transaction: &Transaction) -> Result<(), ValidationError> {
    let kind = transaction.kind();
    let needs_source = matches!(
        kind.category(),
        TransactionCategory::Withdrawal | TransactionCategory::Fee | TransactionCategory::Transfer
    );
    let needs_destination = matches!(
        kind.category(),
        TransactionCategory::Deposit | TransactionCategory::Transfer
    );

    if needs_source && transaction.source().is_none() {
        return Err(ValidationError::MissingSource(kind));
    }
    if needs_destination && transaction.destination().is_none() {
        return Err(ValidationError::MissingDestination(kind));
    }
    Ok(())
}

fn validate_different_accounts(transaction: &Transaction) -> Result<(), ValidationError> {
    match (transaction.source_id(), transaction.destination_id()) {
        (Some(source), Some(destination)) if source == destination => {
            Err(ValidationError::SameAccount(source))
        }
        _ => Ok(()),
    }
}

fn validate_same_owner_for_own_transfer(transaction: &Transaction) -> Result<(), ValidationError> {
    if transaction.kind() != TransactionType::TransferOwn {
        return Ok(());
    }
    if let (Some(source), Some(destination)) = (transaction.source(), transaction.destination())
        && source.owner_id() != destination.owner_id()
    {
        return Err(ValidationError::OwnerMismatch {
            source_owner: source.owner_id(),
            destination_owner: destination.owner_id(),
        });
    }
    Ok(())
}

fn validate_sufficient_funds(transaction: &Transaction) -> Result<(), TransactionError> {
    let Some(source) = transaction.source() else {
        return Ok(());
    };
    if transaction.amount() > source.balance() {
        return Err(TransactionError::InsufficientFunds {
            account_id: source.id(),
            required: transaction.amount(),
            available: source.balance(),
        });
    }
    Ok(())
}

//! Transaction Error Types
//!
//! `TransactionError` is the processing taxonomy. Every variant that reaches
//! the error handler maps to exactly one terminal status.

use thiserror::Error;

use super::state::TransactionStatus;
use super::types::TransactionType;
use crate::account::{AccountError, AccountOpError};
use crate::core_types::{AccountId, Amount, TransactionId, UserId};
use crate::locking::LockError;
use crate::persistence::RepositoryError;

/// Structural / business-rule validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Transaction amount must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("Transaction has neither source nor destination account")]
    NoAccounts,

    #[error("{0} transaction must have a source account")]
    MissingSource(TransactionType),

    #[error("{0} transaction must have a destination account")]
    MissingDestination(TransactionType),

    #[error("Source and destination account are the same ({0})")]
    SameAccount(AccountId),

    #[error("Own transfer between different owners ({source_owner} -> {destination_owner})")]
    OwnerMismatch {
        source_owner: UserId,
        destination_owner: UserId,
    },
}

/// Status-machine and status-persistence failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("Transaction {id}: status change {from} -> {to} not allowed")]
    InvalidTransition {
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// Stored status no longer matches what the caller read
    #[error("Transaction {id}: stored status is no longer {expected}")]
    Conflict {
        id: TransactionId,
        expected: TransactionStatus,
    },

    #[error("Transaction {id}: status write failed: {source}")]
    Repository {
        id: TransactionId,
        source: RepositoryError,
    },
}

/// Category a failure is handled under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Validation,
    InsufficientFunds,
    LockAcquisition,
    LockRelease,
    StatusUpdate,
    Execution,
    Unexpected,
}

impl FailureCategory {
    /// Terminal status a failure of this category leaves behind
    pub fn terminal_status(&self) -> TransactionStatus {
        match self {
            FailureCategory::Validation => TransactionStatus::ValidationError,
            FailureCategory::InsufficientFunds => TransactionStatus::InsufficientFunds,
            FailureCategory::LockAcquisition
            | FailureCategory::LockRelease
            | FailureCategory::StatusUpdate
            | FailureCategory::Execution => TransactionStatus::ExecutionError,
            FailureCategory::Unexpected => TransactionStatus::SystemError,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    // === Pre-execution ===
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(
        "Insufficient funds on account {account_id}: required {required}, available {available}"
    )]
    InsufficientFunds {
        account_id: AccountId,
        required: Amount,
        available: Amount,
    },

    // === Processing guard (no status change) ===
    #[error("Transaction {0} not found")]
    NotFound(TransactionId),

    #[error("Transaction {0} has already been processed")]
    AlreadyProcessed(TransactionId),

    #[error("Transaction {0} is in progress")]
    InProgress(TransactionId),

    #[error("Transaction {id} cannot be processed (status {status})")]
    CannotBeProcessed {
        id: TransactionId,
        status: TransactionStatus,
    },

    // === Resource contention ===
    #[error("Lock acquisition failed: {0}")]
    LockAcquisition(LockError),

    #[error("Lock release failed: {0}")]
    LockRelease(LockError),

    // === Execution ===
    #[error("Status update failed: {0}")]
    StatusUpdate(#[from] StatusError),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),

    #[error("Timed out waiting for transaction {id} (last status {status})")]
    WaitTimeout {
        id: TransactionId,
        status: TransactionStatus,
    },
}

impl TransactionError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TransactionError::Validation(_) => "VALIDATION_FAILED",
            TransactionError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransactionError::NotFound(_) => "TRANSACTION_NOT_FOUND",
            TransactionError::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            TransactionError::InProgress(_) => "IN_PROGRESS",
            TransactionError::CannotBeProcessed { .. } => "CANNOT_BE_PROCESSED",
            TransactionError::LockAcquisition(_) => "LOCK_ACQUISITION_FAILED",
            TransactionError::LockRelease(_) => "LOCK_RELEASE_FAILED",
            TransactionError::StatusUpdate(_) => "STATUS_UPDATE_FAILED",
            TransactionError::Execution(_) => "EXECUTION_FAILED",
            TransactionError::Unexpected(_) => "SYSTEM_ERROR",
            TransactionError::WaitTimeout { .. } => "WAIT_TIMEOUT",
        }
    }

    /// Handling category, or `None` for guard rejections that must not
    /// touch the stored status.
    pub fn failure_category(&self) -> Option<FailureCategory> {
        match self {
            TransactionError::Validation(_) => Some(FailureCategory::Validation),
            TransactionError::InsufficientFunds { .. } => Some(FailureCategory::InsufficientFunds),
            TransactionError::LockAcquisition(_) => Some(FailureCategory::LockAcquisition),
            TransactionError::LockRelease(_) => Some(FailureCategory::LockRelease),
            TransactionError::StatusUpdate(_) => Some(FailureCategory::StatusUpdate),
            TransactionError::Execution(_) => Some(FailureCategory::Execution),
            TransactionError::Unexpected(_) => Some(FailureCategory::Unexpected),
            TransactionError::NotFound(_)
            | TransactionError::AlreadyProcessed(_)
            | TransactionError::InProgress(_)
            | TransactionError::CannotBeProcessed { .. }
            | TransactionError::WaitTimeout { .. } => None,
        }
    }

    /// Rejected by the validator before the transaction was queued
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            TransactionError::Validation(_) | TransactionError::InsufficientFunds { .. }
        )
    }
}

impl From<AccountError> for TransactionError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::InsufficientFunds {
                account_id,
                required,
                available,
            } => TransactionError::InsufficientFunds {
                account_id,
                required,
                available,
            },
            AccountError::NonPositiveAmount { amount, .. } => {
                TransactionError::Validation(ValidationError::NonPositiveAmount(amount))
            }
            e @ AccountError::Overflow { .. } => TransactionError::Execution(e.to_string()),
        }
    }
}

impl From<AccountOpError> for TransactionError {
    fn from(e: AccountOpError) -> Self {
        match e {
            AccountOpError::Account(e) => e.into(),
            AccountOpError::Repository(e) => e.into(),
        }
    }
}

impl From<RepositoryError> for TransactionError {
    fn from(e: RepositoryError) -> Self {
        TransactionError::Unexpected(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_category_to_status_table() {
        let cases = [
            (
                TransactionError::Validation(ValidationError::NoAccounts),
                TransactionStatus::ValidationError,
            ),
            (
                TransactionError::InsufficientFunds {
                    account_id: 1,
                    required: dec!(2),
                    available: dec!(1),
                },
                TransactionStatus::InsufficientFunds,
            ),
            (
                TransactionError::LockAcquisition(LockError::NotHeld { account_id: 1 }),
                TransactionStatus::ExecutionError,
            ),
            (
                TransactionError::LockRelease(LockError::NotHeld { account_id: 1 }),
                TransactionStatus::ExecutionError,
            ),
            (
                TransactionError::StatusUpdate(StatusError::Conflict {
                    id: 1,
                    expected: TransactionStatus::New,
                }),
                TransactionStatus::ExecutionError,
            ),
            (
                TransactionError::Unexpected("boom".into()),
                TransactionStatus::SystemError,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(
                err.failure_category().map(|c| c.terminal_status()),
                Some(status),
                "{err}"
            );
        }
    }

    #[test]
    fn test_pre_execution_errors() {
        assert!(TransactionError::Validation(ValidationError::NoAccounts).is_pre_execution());
        assert!(TransactionError::InsufficientFunds {
            account_id: 1,
            required: dec!(2),
            available: dec!(1),
        }
        .is_pre_execution());
        assert!(!TransactionError::Unexpected("queue closed".into()).is_pre_execution());
        assert!(!TransactionError::InProgress(1).is_pre_execution());
    }

    #[test]
    fn test_guard_rejections_have_no_category() {
        assert!(TransactionError::AlreadyProcessed(1)
            .failure_category()
            .is_none());
        assert!(TransactionError::InProgress(1).failure_category().is_none());
        assert!(TransactionError::NotFound(1).failure_category().is_none());
    }

    #[test]
    fn test_account_errors_are_classified() {
        let err: TransactionError = AccountError::InsufficientFunds {
            account_id: 3,
            required: dec!(100),
            available: dec!(50),
        }
        .into();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        let err: TransactionError = AccountError::Overflow {
            account_id: 3,
            balance: rust_decimal::Decimal::MAX,
            amount: dec!(1),
        }
        .into();
        assert_eq!(err.failure_category(), Some(FailureCategory::Execution));

        let err: TransactionError = AccountOpError::Repository(RepositoryError::Storage(
            "disk full".into(),
        ))
        .into();
        assert_eq!(
            err.failure_category(),
            Some(FailureCategory::Unexpected)
        );
    }
}

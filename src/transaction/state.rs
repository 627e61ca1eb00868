//! Transaction status state machine
//!
//! ```text
//! NEW ──▶ PENDING ──▶ DONE
//!  │         │
//!  │         └──────▶ VALIDATION_ERROR | INSUFFICIENT_FUNDS
//!  │                  EXECUTION_ERROR  | SYSTEM_ERROR
//!  └────────────────▶ (same failure set: rejected before execution)
//! ```
//!
//! Forward-only. Terminal states never transition again, and DONE is only
//! reachable through PENDING.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Processing,
    Success,
    Faulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Created, not yet picked up
    New,
    /// Locks held, execution in progress
    Pending,
    /// Terminal: balances applied
    Done,
    /// Terminal: failed structural/business validation
    ValidationError,
    /// Terminal: source balance below amount
    InsufficientFunds,
    /// Terminal: lock, status-write or executor failure
    ExecutionError,
    /// Terminal: anything unexpected
    SystemError,
}

impl TransactionStatus {
    pub fn category(&self) -> StatusCategory {
        match self {
            TransactionStatus::New | TransactionStatus::Pending => StatusCategory::Processing,
            TransactionStatus::Done => StatusCategory::Success,
            TransactionStatus::ValidationError
            | TransactionStatus::InsufficientFunds
            | TransactionStatus::ExecutionError
            | TransactionStatus::SystemError => StatusCategory::Faulty,
        }
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.category() == StatusCategory::Faulty
    }

    /// Terminal state (success or failure) - no more transitions possible
    #[inline]
    pub fn is_final(&self) -> bool {
        *self == TransactionStatus::Done || self.is_failed()
    }

    #[inline]
    pub fn is_processing(&self) -> bool {
        self.category() == StatusCategory::Processing
    }

    /// Whether `self → next` is an allowed edge of the state machine
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        match self {
            TransactionStatus::New => next == TransactionStatus::Pending || next.is_failed(),
            TransactionStatus::Pending => next.is_final(),
            _ => false,
        }
    }

    /// Storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::New => "NEW",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Done => "DONE",
            TransactionStatus::ValidationError => "VALIDATION_ERROR",
            TransactionStatus::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransactionStatus::ExecutionError => "EXECUTION_ERROR",
            TransactionStatus::SystemError => "SYSTEM_ERROR",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionStatus::New => "New",
            TransactionStatus::Pending => "In Progress",
            TransactionStatus::Done => "Completed",
            TransactionStatus::ValidationError => "Validation Failed",
            TransactionStatus::InsufficientFunds => "Insufficient Funds",
            TransactionStatus::ExecutionError => "Execution Failed",
            TransactionStatus::SystemError => "System Error",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

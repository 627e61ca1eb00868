//! Transaction types
//!
//! Each type carries its category, whether an account relationship
//! (IBAN analysis) selects it, and its fee percentage.

use std::fmt;

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionCategory {
    Deposit,
    Withdrawal,
    Transfer,
    Fee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    TransferOwn,
    TransferInternal,
    TransferExternal,
    Fee,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        TransactionType::Deposit,
        TransactionType::Withdrawal,
        TransactionType::TransferOwn,
        TransactionType::TransferInternal,
        TransactionType::TransferExternal,
        TransactionType::Fee,
    ];

    pub fn category(&self) -> TransactionCategory {
        match self {
            TransactionType::Deposit => TransactionCategory::Deposit,
            TransactionType::Withdrawal => TransactionCategory::Withdrawal,
            TransactionType::TransferOwn
            | TransactionType::TransferInternal
            | TransactionType::TransferExternal => TransactionCategory::Transfer,
            TransactionType::Fee => TransactionCategory::Fee,
        }
    }

    /// Whether this type is selected by account-relationship analysis
    pub fn requires_iban(&self) -> bool {
        self.category() == TransactionCategory::Transfer
    }

    /// Fee as a fraction of the amount (0.01 = 1%)
    pub fn fee_percentage(&self) -> Decimal {
        match self {
            TransactionType::TransferExternal => Decimal::new(1, 2),
            _ => Decimal::ZERO,
        }
    }

    pub fn is_fee_required(&self) -> bool {
        self.fee_percentage() > Decimal::ZERO
    }

    /// Storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::TransferOwn => "TRANSFER_OWN",
            TransactionType::TransferInternal => "TRANSFER_INTERNAL",
            TransactionType::TransferExternal => "TRANSFER_EXTERNAL",
            TransactionType::Fee => "FEE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "Deposit",
            TransactionType::Withdrawal => "Withdrawal",
            TransactionType::TransferOwn => "Own Account Transfer",
            TransactionType::TransferInternal => "Internal Transfer",
            TransactionType::TransferExternal => "External Transfer",
            TransactionType::Fee => "Fee",
        }
    }

    /// Case-insensitive lookup by display name
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.display_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

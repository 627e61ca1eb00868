//! Account model
//!
//! The balance field is PRIVATE. All mutations go through `deposit` /
//! `withdraw`, which reject non-positive amounts and any debit that would
//! take the balance below zero. Nothing is mutated on error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use super::iban::Iban;
use crate::core_types::{AccountId, Amount, UserId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Amount must be greater than zero (account {account_id}, amount {amount})")]
    NonPositiveAmount { account_id: AccountId, amount: Amount },

    #[error(
        "Insufficient funds on account {account_id}: required {required}, available {available}"
    )]
    InsufficientFunds {
        account_id: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("Balance of account {account_id} would overflow: {balance} + {amount}")]
    Overflow {
        account_id: AccountId,
        balance: Amount,
        amount: Amount,
    },
}

/// A balance-holding account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    owner_id: UserId,
    iban: Iban,
    balance: Amount,
    /// Incremented on every successful balance mutation
    version: u64,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Create an account with a zero balance
    pub fn new(id: AccountId, owner_id: UserId, iban: Iban) -> Self {
        Self {
            id,
            owner_id,
            iban,
            balance: Decimal::ZERO,
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn iban(&self) -> &Iban {
        &self.iban
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Credit the account
    ///
    /// # Errors
    /// - `Overflow` if the new balance is not representable (balance untouched)
    pub fn deposit(&mut self, amount: Amount) -> Result<(), AccountError> {
        self.check_positive(amount)?;
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(AccountError::Overflow {
                account_id: self.id,
                balance: self.balance,
                amount,
            })?;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Debit the account
    ///
    /// # Errors
    /// - `InsufficientFunds` if `balance < amount` (balance untouched)
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), AccountError> {
        self.check_positive(amount)?;
        if self.balance < amount {
            return Err(AccountError::InsufficientFunds {
                account_id: self.id,
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    fn check_positive(&self, amount: Amount) -> Result<(), AccountError> {
        if amount <= Decimal::ZERO {
            return Err(AccountError::NonPositiveAmount {
                account_id: self.id,
                amount,
            });
        }
        Ok(())
    }
}

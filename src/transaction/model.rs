//! Transaction model and per-type constructors
//!
//! A transaction is built in status NEW by one constructor per type, each
//! enforcing that type's account-presence rules and a positive amount.
//! After it is persisted, only the status manager changes its status.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use super::state::TransactionStatus;
use super::types::{TransactionCategory, TransactionType};
use crate::account::Account;
use crate::core_types::{AccountId, Amount, TransactionId};

/// Id of a transaction not yet stored
pub const UNASSIGNED_ID: TransactionId = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Amount),

    #[error("{0} requires a source account")]
    MissingSource(TransactionType),

    #[error("{0} requires a destination account")]
    MissingDestination(TransactionType),

    #[error("{0} is not a transfer type")]
    NotATransfer(TransactionType),
}

/// Persisted shape of a transaction: accounts by id only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub source_id: Option<AccountId>,
    pub destination_id: Option<AccountId>,
    pub amount: Amount,
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A requested money movement with its hydrated accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: TransactionId,
    source: Option<Account>,
    destination: Option<Account>,
    amount: Amount,
    kind: TransactionType,
    status: TransactionStatus,
    title: String,
    created_at: DateTime<Utc>,
}

impl Transaction {
    // ============================================================
    // CONSTRUCTORS
    // ============================================================

    pub fn deposit(
        destination: Account,
        amount: Amount,
        title: impl Into<String>,
    ) -> Result<Self, BuildError> {
        check_amount(amount)?;
        Ok(Self::create(
            TransactionType::Deposit,
            None,
            Some(destination),
            amount,
            title.into(),
        ))
    }

    pub fn withdrawal(
        source: Account,
        amount: Amount,
        title: impl Into<String>,
    ) -> Result<Self, BuildError> {
        check_amount(amount)?;
        Ok(Self::create(
            TransactionType::Withdrawal,
            Some(source),
            None,
            amount,
            title.into(),
        ))
    }

    /// Transfer of the given subtype (own / internal / external)
    pub fn transfer(
        kind: TransactionType,
        source: Account,
        destination: Account,
        amount: Amount,
        title: impl Into<String>,
    ) -> Result<Self, BuildError> {
        if kind.category() != TransactionCategory::Transfer {
            return Err(BuildError::NotATransfer(kind));
        }
        check_amount(amount)?;
        Ok(Self::create(
            kind,
            Some(source),
            Some(destination),
            amount,
            title.into(),
        ))
    }

    /// Fee charged to `source`. The collecting account is resolved at execution.
    pub fn fee(
        source: Account,
        amount: Amount,
        title: impl Into<String>,
    ) -> Result<Self, BuildError> {
        check_amount(amount)?;
        Ok(Self::create(
            TransactionType::Fee,
            Some(source),
            None,
            amount,
            title.into(),
        ))
    }

    /// Companion FEE transaction for a type with a non-zero fee percentage.
    ///
    /// Returns `Ok(None)` when the type carries no fee or the rounded fee is zero.
    pub fn fee_for(&self) -> Result<Option<Self>, BuildError> {
        if !self.kind.is_fee_required() {
            return Ok(None);
        }
        let source = self
            .source
            .clone()
            .ok_or(BuildError::MissingSource(self.kind))?;
        let fee = (self.amount * self.kind.fee_percentage())
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if fee <= Decimal::ZERO {
            return Ok(None);
        }
        let title = format!("Fee: {}", self.kind.display_name());
        Self::fee(source, fee, title).map(Some)
    }

    fn create(
        kind: TransactionType,
        source: Option<Account>,
        destination: Option<Account>,
        amount: Amount,
        title: String,
    ) -> Self {
        Self {
            id: UNASSIGNED_ID,
            source,
            destination,
            amount,
            kind,
            status: TransactionStatus::New,
            title,
            created_at: Utc::now(),
        }
    }

    /// Rebuild from storage with freshly loaded accounts
    pub fn from_record(
        record: TransactionRecord,
        source: Option<Account>,
        destination: Option<Account>,
    ) -> Self {
        Self {
            id: record.id,
            source,
            destination,
            amount: record.amount,
            kind: record.kind,
            status: record.status,
            title: record.title,
            created_at: record.created_at,
        }
    }

    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            source_id: self.source_id(),
            destination_id: self.destination_id(),
            amount: self.amount,
            kind: self.kind,
            status: self.status,
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }

    /// Id assigned by the store on insert
    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        self
    }

    // ============================================================
    // ACCESSORS
    // ============================================================

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn source(&self) -> Option<&Account> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&Account> {
        self.destination.as_ref()
    }

    pub fn source_id(&self) -> Option<AccountId> {
        self.source.as_ref().map(Account::id)
    }

    pub fn destination_id(&self) -> Option<AccountId> {
        self.destination.as_ref().map(Account::id)
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ============================================================
    // RESTRICTED MUTATIONS
    // ============================================================

    /// Only the status manager writes status, after the store accepted it
    pub(crate) fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
    }

    /// Refresh the source snapshot after a balance change
    pub(crate) fn set_source(&mut self, source: Account) {
        self.source = Some(source);
    }

    /// Attach a destination resolved during execution (fee collection)
    pub(crate) fn set_destination(&mut self, destination: Account) {
        self.destination = Some(destination);
    }
}

fn check_amount(amount: Amount) -> Result<(), BuildError> {
    if amount <= Decimal::ZERO {
        return Err(BuildError::NonPositiveAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Iban;
    use rust_decimal_macros::dec;

    fn account(id: AccountId, owner: i64) -> Account {
        Account::new(id, owner, Iban::generate(owner, 1).unwrap())
    }

    #[test]
    fn test_deposit_has_only_destination() {
        let tx = Transaction::deposit(account(1, 1), dec!(10), "salary").unwrap();
        assert_eq!(tx.kind(), TransactionType::Deposit);
        assert_eq!(tx.status(), TransactionStatus::New);
        assert_eq!(tx.source_id(), None);
        assert_eq!(tx.destination_id(), Some(1));
        assert_eq!(tx.id(), UNASSIGNED_ID);
    }

    #[test]
    fn test_withdrawal_and_fee_have_only_source() {
        let w = Transaction::withdrawal(account(1, 1), dec!(10), "atm").unwrap();
        assert_eq!((w.source_id(), w.destination_id()), (Some(1), None));

        let f = Transaction::fee(account(1, 1), dec!(1), "monthly").unwrap();
        assert_eq!(f.kind(), TransactionType::Fee);
        assert_eq!((f.source_id(), f.destination_id()), (Some(1), None));
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        assert_eq!(
            Transaction::deposit(account(1, 1), Decimal::ZERO, "x").unwrap_err(),
            BuildError::NonPositiveAmount(Decimal::ZERO)
        );
        assert!(Transaction::withdrawal(account(1, 1), dec!(-5), "x").is_err());
    }

    #[test]
    fn test_transfer_requires_transfer_type() {
        let err = Transaction::transfer(
            TransactionType::Deposit,
            account(1, 1),
            account(2, 2),
            dec!(1),
            "x",
        )
        .unwrap_err();
        assert_eq!(err, BuildError::NotATransfer(TransactionType::Deposit));
    }

    #[test]
    fn test_external_transfer_fee() {
        let tx = Transaction::transfer(
            TransactionType::TransferExternal,
            account(1, 1),
            account(2, 2),
            dec!(250.50),
            "rent",
        )
        .unwrap();

        let fee = tx.fee_for().unwrap().unwrap();
        assert_eq!(fee.kind(), TransactionType::Fee);
        assert_eq!(fee.amount(), dec!(2.51));
        assert_eq!(fee.source_id(), Some(1));
        assert_eq!(fee.destination_id(), None);
    }

    #[test]
    fn test_no_fee_for_internal_transfer() {
        let tx = Transaction::transfer(
            TransactionType::TransferInternal,
            account(1, 1),
            account(2, 2),
            dec!(100),
            "gift",
        )
        .unwrap();
        assert!(tx.fee_for().unwrap().is_none());
    }

    #[test]
    fn test_record_roundtrip_keeps_identity() {
        let tx = Transaction::transfer(
            TransactionType::TransferOwn,
            account(1, 1),
            account(2, 1),
            dec!(3),
            "savings",
        )
        .unwrap()
        .with_id(9);

        let record = tx.to_record();
        assert_eq!(record.source_id, Some(1));
        assert_eq!(record.destination_id, Some(2));

        let restored = Transaction::from_record(
            record,
            tx.source().cloned(),
            tx.destination().cloned(),
        );
        assert_eq!(restored, tx);
    }
}

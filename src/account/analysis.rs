//! Account relationship analysis
//!
//! Classifies a source/destination pair into own / internal / external
//! transfer by comparing bank identity first, then the owner segment of the
//! account number.

use thiserror::Error;
use tracing::{debug, trace};

use super::iban::{Iban, IbanError};
use super::models::Account;
use crate::transaction::TransactionType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Cannot parse IBAN {input}: {source}")]
    Parse { input: String, source: IbanError },

    #[error("Cannot compare owners of {source_iban} and {destination_iban}: account number too short")]
    OwnerSegment {
        source_iban: String,
        destination_iban: String,
    },
}

/// Stateless relationship analyzer
#[derive(Debug, Default, Clone, Copy)]
pub struct IbanAnalyzer;

impl IbanAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the transfer subtype between two IBANs
    ///
    /// - different bank or country → `TransferExternal`
    /// - same bank, different owner segment → `TransferInternal`
    /// - same bank, same owner segment → `TransferOwn`
    pub fn resolve_transfer_type(
        &self,
        source: &Iban,
        destination: &Iban,
    ) -> Result<TransactionType, AnalysisError> {
        debug!(
            source = %source.masked(),
            destination = %destination.masked(),
            "Resolving transfer type"
        );

        let kind = if !self.is_same_bank(source, destination) {
            TransactionType::TransferExternal
        } else if !self.is_same_owner(source, destination)? {
            TransactionType::TransferInternal
        } else {
            TransactionType::TransferOwn
        };

        debug!(
            source = %source.masked(),
            destination = %destination.masked(),
            kind = %kind,
            "Transfer type resolved"
        );
        Ok(kind)
    }

    /// Same as [`resolve_transfer_type`](Self::resolve_transfer_type) for raw IBAN strings
    pub fn resolve_transfer_type_str(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<TransactionType, AnalysisError> {
        let source = parse(source)?;
        let destination = parse(destination)?;
        self.resolve_transfer_type(&source, &destination)
    }

    pub fn resolve_for_accounts(
        &self,
        source: &Account,
        destination: &Account,
    ) -> Result<TransactionType, AnalysisError> {
        self.resolve_transfer_type(source.iban(), destination.iban())
    }

    pub fn is_same_bank(&self, source: &Iban, destination: &Iban) -> bool {
        trace!(source = %source.masked(), destination = %destination.masked(), "Comparing bank codes");
        source.bank_code() == destination.bank_code()
            && source.country_code() == destination.country_code()
    }

    pub fn is_same_owner(&self, source: &Iban, destination: &Iban) -> Result<bool, AnalysisError> {
        trace!(source = %source.masked(), destination = %destination.masked(), "Comparing owner segments");
        match (source.owner_segment(), destination.owner_segment()) {
            (Some(a), Some(b)) => Ok(a == b),
            _ => Err(AnalysisError::OwnerSegment {
                source_iban: source.masked(),
                destination_iban: destination.masked(),
            }),
        }
    }
}

fn parse(input: &str) -> Result<Iban, AnalysisError> {
    input.parse().map_err(|source| AnalysisError::Parse {
        input: input.to_string(),
        source,
    })
}

//! Accounts
//!
//! Account model, structured IBAN, the own/internal/external relationship
//! analyzer and the balance mutator used by executors.

pub mod analysis;
pub mod iban;
pub mod models;
pub mod operations;

pub use analysis::{AnalysisError, IbanAnalyzer};
pub use iban::{Iban, IbanError};
pub use models::{Account, AccountError};
pub use operations::{AccountOpError, AccountOperations};

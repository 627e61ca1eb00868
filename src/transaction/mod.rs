//! Transactions
//!
//! Model, type and status definitions, per-type constructors, validation and
//! the processing error taxonomy.

pub mod error;
pub mod model;
pub mod state;
pub mod types;
pub mod validator;

pub use error::{FailureCategory, StatusError, TransactionError, ValidationError};
pub use model::{BuildError, Transaction, TransactionRecord, UNASSIGNED_ID};
pub use state::{StatusCategory, TransactionStatus};
pub use types::{TransactionCategory, TransactionType};
pub use validator::TransactionValidator;

//! Core types used throughout the system
//!
//! Type aliases shared by every module. Identifiers are signed because the
//! bank's own fee-collecting account lives at a negative id.

/// Account ID - unique, immutable after creation.
///
/// # Usage:
/// - Primary key for accounts
/// - Key of the per-account lock in the lock registry
/// - Defines the global lock order (ascending)
pub type AccountId = i64;

/// User ID - owner of one or more accounts
pub type UserId = i64;

/// Transaction ID - assigned by the transaction store on insert
pub type TransactionId = i64;

/// Monetary amount. Always an exact decimal, never floating point.
pub type Amount = rust_decimal::Decimal;

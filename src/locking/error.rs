use std::time::Duration;

use thiserror::Error;

use crate::core_types::AccountId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("Failed to acquire lock for account {account_id} after {attempts} attempts ({elapsed:?})")]
    AcquisitionTimeout {
        account_id: AccountId,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("Cannot release lock that is not held for account {account_id}")]
    NotHeld { account_id: AccountId },
}

impl LockError {
    pub fn account_id(&self) -> AccountId {
        match self {
            LockError::AcquisitionTimeout { account_id, .. } | LockError::NotHeld { account_id } => {
                *account_id
            }
        }
    }
}

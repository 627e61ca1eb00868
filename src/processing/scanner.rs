//! NEW Transaction Scanner
//!
//! Background loop that periodically dispatches every NEW transaction.
//! Records queued twice are harmless: the processor's claim drops the
//! duplicate.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::service::{BatchSummary, TransactionProcessingService};
use crate::persistence::RepositoryError;

pub struct NewTransactionScanner {
    service: Arc<TransactionProcessingService>,
    scan_interval: Duration,
}

impl NewTransactionScanner {
    pub fn new(service: Arc<TransactionProcessingService>, scan_interval: Duration) -> Self {
        Self {
            service,
            scan_interval,
        }
    }

    /// Run forever, scanning every `scan_interval`
    pub async fn run(&self) -> ! {
        info!(
            scan_interval_ms = self.scan_interval.as_millis() as u64,
            "Starting NEW transaction scanner"
        );

        loop {
            if let Err(e) = self.scan().await {
                error!(error = %e, "NEW transaction scan failed");
            }

            tokio::time::sleep(self.scan_interval).await;
        }
    }

    /// Run a single scan
    pub async fn scan(&self) -> Result<BatchSummary, RepositoryError> {
        let summary = self.service.process_all_new().await?;
        if summary.total() == 0 {
            debug!("No NEW transactions found");
        }
        Ok(summary)
    }
}

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::core_types::AccountId;
use crate::locking::LockingConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Per-module level overrides, e.g. `bank_ledger::locking: info`
    #[serde(default)]
    pub log_targets: BTreeMap<String, String>,
    #[serde(default)]
    pub locking: LockingConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
/// Fee-collecting account used when a FEE has no destination
pub const DEFAULT_BANK_ACCOUNT_ID: AccountId = -1;
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 30_000;

#[derive(Debug, Deserialize)]
struct RawProcessingConfig {
    #[serde(default)]
    workers: usize,
    #[serde(default)]
    queue_capacity: usize,
    #[serde(default = "default_bank_account_id")]
    bank_account_id: AccountId,
    #[serde(default)]
    scan_interval_ms: u64,
}

fn default_bank_account_id() -> AccountId {
    DEFAULT_BANK_ACCOUNT_ID
}

/// Worker pool and batch scanning. Zero values fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawProcessingConfig")]
pub struct ProcessingConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub bank_account_id: AccountId,
    pub scan_interval: Duration,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            bank_account_id: DEFAULT_BANK_ACCOUNT_ID,
            scan_interval: Duration::from_millis(DEFAULT_SCAN_INTERVAL_MS),
        }
    }
}

impl From<RawProcessingConfig> for ProcessingConfig {
    fn from(raw: RawProcessingConfig) -> Self {
        let non_zero = |v: usize, d: usize| if v == 0 { d } else { v };
        Self {
            workers: non_zero(raw.workers, DEFAULT_WORKERS),
            queue_capacity: non_zero(raw.queue_capacity, DEFAULT_QUEUE_CAPACITY),
            bank_account_id: raw.bank_account_id,
            scan_interval: Duration::from_millis(if raw.scan_interval_ms == 0 {
                DEFAULT_SCAN_INTERVAL_MS
            } else {
                raw.scan_interval_ms
            }),
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

//! Configuration schema definitions.
//!
//! All types derive `Deserialize` for loading from config files.
//! Every section has defaults, so an empty file is a valid configuration.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::transaction::GasMultiplier;

/// Root configuration for a transfer run.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TransferConfig {
    /// JSON-RPC endpoint settings.
    pub rpc: RpcConfig,

    /// Token contract binding.
    pub token: TokenConfig,

    /// Transfer pipeline tuning.
    pub transfer: PipelineConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://rpc.ankr.com/arbitrum".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Token contract configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Token contract address.
    pub address: String,

    /// JSON ABI descriptor; the bundled ERC-20 ABI when unset.
    pub abi_path: Option<PathBuf>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            // USDC on Arbitrum One
            address: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".to_string(),
            abi_path: None,
        }
    }
}

/// Transfer pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Gas limit multiplier over the estimate (1.2 = 20% headroom).
    pub gas_multiplier: GasMultiplier,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum time to wait for a receipt, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Re-read the sender nonce right before broadcast.
    pub recheck_nonce: bool,

    /// Block explorer base URL for transaction links.
    pub explorer_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gas_multiplier: GasMultiplier::DEFAULT,
            poll_interval_ms: 100,
            confirmation_timeout_secs: 120,
            recheck_nonce: true,
            explorer_url: "https://arbiscan.io/".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

//! Run configuration.
//!
//! ```text
//! erc20-transfer.toml
//!     → loader.rs (read, toml deserialize)
//!     → validation.rs (every bad field reported at once)
//!     → TransferConfig, handed by reference to constructors
//! ```
//!
//! Every section and field is optional; an empty file selects the Arbitrum
//! USDC defaults. Private keys are never read from configuration.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ObservabilityConfig, PipelineConfig, RpcConfig, TokenConfig, TransferConfig};

//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! rpc.rs (EthRpc: the JSON-RPC seam, faked in tests)
//!     → client.rs (alloy HTTP provider with timeouts)
//!     → transaction.rs (precondition, nonce, gas, chain id → UnsignedTransfer)
//!     → wallet.rs (offline signing → SignedTransfer)
//!     → broadcast.rs (eth_sendRawTransaction)
//!     → confirmation.rs (receipt polling under a deadline)
//! ```
//!
//! # Security Constraints
//! - Private keys are supplied per run and never logged
//! - All RPC calls have configurable timeouts
//! - No automatic retries; a failed run is restarted from scratch

pub mod broadcast;
pub mod client;
pub mod confirmation;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use broadcast::Broadcaster;
pub use client::BlockchainClient;
pub use confirmation::ConfirmationWaiter;
pub use rpc::EthRpc;
pub use transaction::{BuiltTransfer, GasMultiplier, SignedTransfer, TxBuilder, UnsignedTransfer};
pub use types::{parse_address, ChainId, Receipt, TransferError, TransferResult};
pub use wallet::Wallet;

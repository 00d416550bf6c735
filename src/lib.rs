//! ERC-20 token transfers over JSON-RPC.
//!
//! Converts a human amount to base units, checks the sender balance, builds,
//! signs and broadcasts a `transfer` call, then waits for the receipt.

pub mod blockchain;
pub mod config;
pub mod observability;
pub mod token;
pub mod transfer;

pub use blockchain::{BlockchainClient, EthRpc, TransferError, TransferResult, Wallet};
pub use config::TransferConfig;
pub use token::{Erc20Token, TokenAmount, TokenContract};
pub use transfer::{TransferEvent, TransferPipeline, TransferReport};

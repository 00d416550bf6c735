//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::token::units::TokenAmount;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur while moving tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Amount is negative, not finite, or does not fit in 256 bits.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Text is not a 20-byte hex account address.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// Private key is not a valid secp256k1 scalar.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Sender holds fewer base units than requested.
    #[error(
        "Insufficient token balance: have {}, need {}",
        TokenAmount::new(*balance, *decimals),
        TokenAmount::new(*required, *decimals)
    )]
    InsufficientBalance {
        balance: U256,
        required: U256,
        decimals: u8,
    },

    /// RPC connection, request or timeout failure.
    #[error("RPC error during {method}: {message}")]
    Rpc { method: &'static str, message: String },

    /// Node refused the raw transaction before pool admission.
    #[error("Transaction rejected by node (code {code}): {message}")]
    RejectedTransaction { code: i64, message: String },

    /// Node has no receipt for the hash yet.
    #[error("Transaction {0} not found")]
    TransactionNotFound(TxHash),

    /// No receipt appeared within the confirmation window.
    #[error("Transaction {tx_hash} not confirmed after {waited:?}")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    /// Transaction was mined but execution failed; gas was still spent.
    #[error("Transaction {tx_hash} reverted in block {block_number:?} (gas used {gas_used})")]
    RevertedExecution {
        tx_hash: TxHash,
        block_number: Option<u64>,
        gas_used: u64,
    },

    /// Sender nonce moved between build and broadcast.
    #[error("Sender nonce changed from {expected} to {actual} before broadcast")]
    NonceChanged { expected: u64, actual: u64 },

    /// Token interface descriptor lacks a required function.
    #[error("Token interface mismatch: {0}")]
    InterfaceMismatch(String),

    /// Reading caller input failed.
    #[error("Input error: {0}")]
    Input(String),
}

impl TransferError {
    /// Errors detected from caller input alone, before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_) | Self::InvalidAddress(_) | Self::InvalidKey(_)
        )
    }

    pub(crate) fn rpc(method: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Rpc {
            method,
            message: message.to_string(),
        }
    }
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Parse a hex account address. Letter case is not checked against EIP-55.
pub fn parse_address(text: &str) -> TransferResult<Address> {
    let trimmed = text.trim();
    let hex = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    if hex.len() != 40 {
        return Err(TransferError::InvalidAddress(trimmed.to_string()));
    }
    Address::from_str(hex).map_err(|_| TransferError::InvalidAddress(trimmed.to_string()))
}

/// Execution outcome reported by the node for a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    /// `None` only for nodes that serve receipts for pending blocks.
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Execution status; `false` means the transaction reverted.
    pub success: bool,
}

impl From<alloy::rpc::types::TransactionReceipt> for Receipt {
    fn from(receipt: alloy::rpc::types::TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(42161u64);
        assert_eq!(chain_id.0, 42161);
        assert_eq!(u64::from(chain_id), 42161);
    }

    #[test]
    fn test_validation_classification() {
        assert!(TransferError::InvalidAmount("-1".into()).is_validation());
        assert!(TransferError::InvalidAddress("0x12".into()).is_validation());
        assert!(TransferError::InvalidKey("short".into()).is_validation());
        assert!(!TransferError::rpc("eth_chainId", "connection refused").is_validation());
        assert!(!TransferError::InsufficientBalance {
            balance: U256::ZERO,
            required: U256::from(1),
            decimals: 6,
        }
        .is_validation());
    }

    #[test]
    fn test_parse_address_ignores_case() {
        let lower = parse_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        let upper = parse_address("0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266").unwrap();
        let bare = parse_address("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, bare);
        assert_eq!(lower.to_string(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        for text in ["", "0x", "0x1234", "0xzz9fd6e51aad88f6f4ce6ab8827279cfffb92266", "hello"] {
            assert!(matches!(parse_address(text), Err(TransferError::InvalidAddress(_))), "{text}");
        }
    }

    #[test]
    fn test_error_display() {
        let err = TransferError::rpc("eth_gasPrice", "timed out after 10s");
        assert_eq!(err.to_string(), "RPC error during eth_gasPrice: timed out after 10s");

        let err = TransferError::InsufficientBalance {
            balance: U256::from(100_000_000u64),
            required: U256::from(100_000_001u64),
            decimals: 7,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient token balance: have 10, need 10.0000001"
        );

        let err = TransferError::ConfirmationTimeout {
            tx_hash: TxHash::ZERO,
            waited: Duration::from_secs(120),
        };
        assert!(err.to_string().contains("after 120s"));

        let err = TransferError::ConfirmationTimeout {
            tx_hash: TxHash::ZERO,
            waited: Duration::from_millis(250),
        };
        assert!(err.to_string().contains("after 250ms"));
    }
}

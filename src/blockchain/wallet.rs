//! Wallet and offline transaction signing.
//!
//! # Security
//! - The private key is supplied by the caller for one run and never stored
//! - Keys are never logged or serialized; `Debug` shows the address only

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::transaction::{SignedTransfer, UnsignedTransfer};
use crate::blockchain::types::{TransferError, TransferResult};

/// Environment variable the CLI reads the private key from, when set.
pub const PRIVATE_KEY_ENV_VAR: &str = "ERC20_TRANSFER_PRIVATE_KEY";

/// Signing key for the sending account.
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string, optionally prefixed with `0x` or `0X`
    pub fn from_private_key(private_key_hex: &str) -> TransferResult<Self> {
        let trimmed = private_key_hex.trim();
        let key_hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|_| TransferError::InvalidKey("not a valid secp256k1 private key".to_string()))?;

        tracing::debug!(address = %signer.address(), "Wallet initialized");

        Ok(Self { signer })
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a transfer as an EIP-155 legacy transaction.
    ///
    /// Pure and deterministic (RFC 6979 nonces): the same transfer and key
    /// always produce the same bytes.
    pub fn sign(&self, unsigned: UnsignedTransfer) -> TransferResult<SignedTransfer> {
        if unsigned.sender != self.address() {
            return Err(TransferError::InvalidKey(format!(
                "key controls {}, transfer is from {}",
                self.address(),
                unsigned.sender
            )));
        }

        let mut tx = TxLegacy {
            chain_id: Some(unsigned.chain_id.into()),
            nonce: unsigned.nonce,
            gas_price: unsigned.gas_price,
            gas_limit: unsigned.gas_limit,
            to: TxKind::Call(unsigned.token),
            value: U256::ZERO,
            input: unsigned.calldata.clone(),
        };

        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| TransferError::InvalidKey(format!("signing failed: {e}")))?;

        let signed = tx.into_signed(signature);
        let tx_hash: TxHash = *signed.hash();
        let raw: Bytes = TxEnvelope::Legacy(signed).encoded_2718().into();

        tracing::info!(
            tx_hash = %tx_hash,
            nonce = unsigned.nonce,
            gas_limit = unsigned.gas_limit,
            "Transaction signed"
        );

        Ok(SignedTransfer::new(unsigned, raw, tx_hash))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").field("address", &self.address()).finish()
    }
}

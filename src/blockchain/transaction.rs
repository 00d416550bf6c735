//! Transaction building for token transfers.
//!
//! # Responsibilities
//! - Enforce the sender balance precondition before anything is built
//! - Read nonce, gas price, gas estimate and chain id fresh from the node
//! - Apply the gas-limit multiplier in integer arithmetic

use alloy::primitives::{Address, Bytes, TxHash};
use serde::Deserialize;
use std::sync::Arc;

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{ChainId, TransferError, TransferResult};
use crate::token::erc20::{transfer_calldata, Erc20Token};
use crate::token::units::TokenAmount;

/// Gas-limit headroom over the node's estimate, in basis points.
///
/// Deserializes from a plain ratio (`gas_multiplier = 1.2`); values outside
/// [`GasMultiplier::MIN_RATIO`]..=[`GasMultiplier::MAX_RATIO`] are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "f64")]
pub struct GasMultiplier {
    bps: u64,
}

impl GasMultiplier {
    const SCALE: u64 = 10_000;

    pub const MIN_RATIO: f64 = 1.0;
    pub const MAX_RATIO: f64 = 10.0;

    /// 1.2x, the headroom used when nothing is configured.
    pub const DEFAULT: Self = Self { bps: 12_000 };

    /// Convert a ratio such as `1.2`. `None` unless finite and within range.
    pub fn from_ratio(ratio: f64) -> Option<Self> {
        if !ratio.is_finite() || !(Self::MIN_RATIO..=Self::MAX_RATIO).contains(&ratio) {
            return None;
        }
        Some(Self {
            bps: (ratio * Self::SCALE as f64).round() as u64,
        })
    }

    pub fn bps(&self) -> u64 {
        self.bps
    }

    /// `ceil(estimate × ratio)`, saturating at `u64::MAX`.
    pub fn apply(&self, estimate: u64) -> u64 {
        let scaled = (estimate as u128 * self.bps as u128).div_ceil(Self::SCALE as u128);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

impl Default for GasMultiplier {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for GasMultiplier {
    type Error = String;

    fn try_from(ratio: f64) -> Result<Self, Self::Error> {
        Self::from_ratio(ratio).ok_or_else(|| {
            format!(
                "gas multiplier {ratio} is outside {}..={}",
                Self::MIN_RATIO,
                Self::MAX_RATIO
            )
        })
    }
}

/// Everything needed to sign one token transfer.
///
/// Built fresh for every attempt and consumed by signing, so a nonce is never
/// reused across attempts.
#[derive(Debug, PartialEq, Eq)]
pub struct UnsignedTransfer {
    pub sender: Address,
    pub recipient: Address,
    /// Token contract; the transaction's `to`.
    pub token: Address,
    pub amount: TokenAmount,
    /// `transfer(recipient, amount)` calldata.
    pub calldata: Bytes,
    pub chain_id: ChainId,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
}

/// Signed, encoded transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    raw: Bytes,
    tx_hash: TxHash,
    sender: Address,
    nonce: u64,
    chain_id: ChainId,
}

impl SignedTransfer {
    pub(crate) fn new(unsigned: UnsignedTransfer, raw: Bytes, tx_hash: TxHash) -> Self {
        Self {
            raw,
            tx_hash,
            sender: unsigned.sender,
            nonce: unsigned.nonce,
            chain_id: unsigned.chain_id,
        }
    }

    /// EIP-2718 encoded bytes for `eth_sendRawTransaction`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

/// Output of a successful build: the transaction plus the balances read on the way.
#[derive(Debug)]
pub struct BuiltTransfer {
    pub unsigned: UnsignedTransfer,
    pub sender_balance: TokenAmount,
    /// Informational only; not part of any guard.
    pub recipient_balance: TokenAmount,
}

/// Transaction builder for token transfers.
pub struct TxBuilder<R> {
    rpc: Arc<R>,
    token: Erc20Token<R>,
}

impl<R: EthRpc> TxBuilder<R> {
    /// Create a new transaction builder.
    pub fn new(rpc: Arc<R>, token: Erc20Token<R>) -> Self {
        Self { rpc, token }
    }

    /// Build an unsigned transfer of `amount` from `sender` to `recipient`.
    ///
    /// `amount` must have been converted with decimals fetched in the same
    /// run. Each step is a separate request, in order: sender balance,
    /// recipient balance, nonce, gas price, gas estimate, chain id. A short
    /// sender balance stops the build after the first request.
    pub async fn build(
        &self,
        sender: Address,
        recipient: Address,
        amount: TokenAmount,
        multiplier: GasMultiplier,
    ) -> TransferResult<BuiltTransfer> {
        let decimals = amount.decimals();

        let sender_balance = self.token.balance_of(sender).await?;
        if sender_balance < amount.base() {
            tracing::warn!(
                sender = %sender,
                balance = %TokenAmount::new(sender_balance, decimals),
                required = %amount,
                "Insufficient token balance"
            );
            return Err(TransferError::InsufficientBalance {
                balance: sender_balance,
                required: amount.base(),
                decimals,
            });
        }

        let recipient_balance = self.token.balance_of(recipient).await?;

        let nonce = self.rpc.transaction_count(sender).await?;
        let gas_price = self.rpc.gas_price().await?;

        let calldata = transfer_calldata(recipient, amount.base());
        let gas_estimate = self
            .rpc
            .estimate_gas(sender, self.token.address(), calldata.clone())
            .await?;

        let chain_id = ChainId(self.rpc.chain_id().await?);
        let gas_limit = multiplier.apply(gas_estimate);

        tracing::info!(
            nonce,
            gas_price,
            gas_estimate,
            gas_limit,
            chain_id = chain_id.0,
            "Transaction built"
        );

        Ok(BuiltTransfer {
            unsigned: UnsignedTransfer {
                sender,
                recipient,
                token: self.token.address(),
                amount,
                calldata,
                chain_id,
                nonce,
                gas_limit,
                gas_price,
            },
            sender_balance: TokenAmount::new(sender_balance, decimals),
            recipient_balance: TokenAmount::new(recipient_balance, decimals),
        })
    }
}

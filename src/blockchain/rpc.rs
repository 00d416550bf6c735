//! JSON-RPC surface the transfer pipeline depends on.
//!
//! Every method is exactly one round trip to the node. Implementations must
//! not cache: nonce, gas price and balances are read fresh on every call.

use alloy::primitives::{Address, Bytes, TxHash};
use std::future::Future;

use crate::blockchain::types::{Receipt, TransferResult};

/// Ethereum JSON-RPC methods used by the token transfer flow.
pub trait EthRpc: Send + Sync {
    /// `eth_call` against the latest block.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = TransferResult<Bytes>> + Send;

    /// `eth_estimateGas` for a call from `from` to `to` with `data`.
    fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> impl Future<Output = TransferResult<u64>> + Send;

    /// `eth_getTransactionCount` (the account nonce).
    fn transaction_count(&self, address: Address) -> impl Future<Output = TransferResult<u64>> + Send;

    /// `eth_gasPrice` in wei.
    fn gas_price(&self) -> impl Future<Output = TransferResult<u128>> + Send;

    /// `eth_chainId`.
    fn chain_id(&self) -> impl Future<Output = TransferResult<u64>> + Send;

    /// `eth_sendRawTransaction`.
    ///
    /// A JSON-RPC error payload from the node is reported as
    /// [`TransferError::RejectedTransaction`](crate::blockchain::TransferError::RejectedTransaction);
    /// transport failures as `Rpc`.
    fn send_raw_transaction(&self, raw: Bytes) -> impl Future<Output = TransferResult<TxHash>> + Send;

    /// `eth_getTransactionReceipt`; `None` while the transaction is unmined.
    fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = TransferResult<Option<Receipt>>> + Send;
}

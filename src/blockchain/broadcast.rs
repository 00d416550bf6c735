//! Raw transaction submission.

use alloy::primitives::TxHash;
use std::sync::Arc;

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::transaction::SignedTransfer;
use crate::blockchain::types::TransferResult;

/// Submits signed transfers to the node.
pub struct Broadcaster<R> {
    rpc: Arc<R>,
}

impl<R: EthRpc> Broadcaster<R> {
    pub fn new(rpc: Arc<R>) -> Self {
        Self { rpc }
    }

    /// Send the raw transaction and return its hash.
    ///
    /// Node rejections (nonce too low, underpriced, ...) come back as
    /// `RejectedTransaction`, distinct from a transaction that is accepted
    /// and later reverts.
    pub async fn submit(&self, signed: &SignedTransfer) -> TransferResult<TxHash> {
        let node_hash = self.rpc.send_raw_transaction(signed.raw().clone()).await?;

        if node_hash != signed.tx_hash() {
            tracing::warn!(
                local = %signed.tx_hash(),
                node = %node_hash,
                "Node reported a different transaction hash"
            );
        }

        tracing::info!(tx_hash = %signed.tx_hash(), "Transaction broadcast");
        Ok(signed.tx_hash())
    }
}

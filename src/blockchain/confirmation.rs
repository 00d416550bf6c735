//! Confirmation monitoring.
//!
//! Polls for the receipt at a fixed interval inside a hard deadline. The wait
//! is an ordinary future: dropping it (for example from `tokio::select!`)
//! stops polling immediately.

use alloy::primitives::TxHash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{Receipt, TransferError, TransferResult};
use crate::observability::metrics;

/// Waits for a broadcast transaction to be mined.
pub struct ConfirmationWaiter<R> {
    rpc: Arc<R>,
    poll_interval: Duration,
    timeout: Duration,
}

impl<R: EthRpc> ConfirmationWaiter<R> {
    /// A zero `poll_interval` is raised to one millisecond.
    pub fn new(rpc: Arc<R>, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            rpc,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            timeout,
        }
    }

    /// One receipt lookup; `TransactionNotFound` while the transaction is unmined.
    pub async fn poll_receipt(&self, tx_hash: TxHash) -> TransferResult<Receipt> {
        self.rpc
            .transaction_receipt(tx_hash)
            .await?
            .ok_or(TransferError::TransactionNotFound(tx_hash))
    }

    /// Wait until a receipt exists or the timeout elapses.
    ///
    /// The receipt's execution status is returned as-is; a reverted
    /// transaction still has a receipt.
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> TransferResult<Receipt> {
        let started = Instant::now();

        let result = timeout(self.timeout, async {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.poll_receipt(tx_hash).await {
                    Ok(receipt) => return Ok(receipt),
                    Err(TransferError::TransactionNotFound(_)) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    }
                    Err(e) => return Err(e),
                }
            }
        })
        .await;

        match result {
            Ok(Ok(receipt)) => {
                metrics::record_confirmation_latency(started.elapsed());
                tracing::info!(
                    tx_hash = %tx_hash,
                    block_number = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    success = receipt.success,
                    "Receipt received"
                );
                Ok(receipt)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransferError::ConfirmationTimeout {
                tx_hash,
                waited: self.timeout,
            }),
        }
    }
}

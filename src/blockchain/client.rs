//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a JSON-RPC endpoint over HTTP(S)
//! - Query chain state (nonce, gas price, chain id, receipts, contract calls)
//! - Submit raw signed transactions
//! - Bound every request with a timeout and surface failures as `Rpc`
//!
//! Failed calls are never retried here; a failed transfer is re-run from the
//! start by the caller with freshly fetched state.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportResult;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{Receipt, TransferError, TransferResult};
use crate::config::RpcConfig;
use crate::observability::metrics;

/// Blockchain RPC client wrapper around a single alloy HTTP provider.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    config: RpcConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is made here; the endpoint is first contacted by the
    /// pipeline's initial read.
    pub fn new(config: &RpcConfig) -> TransferResult<Self> {
        let url: url::Url = config.url.parse().map_err(|e| {
            TransferError::rpc("connect", format!("invalid RPC URL '{}': {}", config.url, e))
        })?;
        let provider = Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        tracing::info!(
            rpc_url = %config.url,
            timeout_secs = config.timeout_secs,
            "Blockchain client initialized"
        );

        Ok(Self {
            provider,
            config: config.clone(),
            timeout_duration: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    async fn request<T, F>(&self, method: &'static str, fut: F) -> TransferResult<T>
    where
        F: IntoFuture<Output = TransportResult<T>> + Send,
        F::IntoFuture: Send,
        T: Send,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => {
                metrics::record_rpc_call(method, "ok");
                tracing::debug!(method, "RPC call succeeded");
                Ok(result)
            }
            Ok(Err(e)) => {
                metrics::record_rpc_call(method, "error");
                tracing::warn!(method, error = %e, "RPC error");
                Err(TransferError::rpc(method, e))
            }
            Err(_) => {
                metrics::record_rpc_call(method, "timeout");
                tracing::warn!(method, timeout_secs = self.config.timeout_secs, "RPC timeout");
                Err(TransferError::rpc(
                    method,
                    format!("timed out after {}s", self.config.timeout_secs),
                ))
            }
        }
    }
}

impl EthRpc for BlockchainClient {
    async fn call(&self, to: Address, data: Bytes) -> TransferResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.request("eth_call", self.provider.call(request)).await
    }

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> TransferResult<u64> {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data);
        self.request("eth_estimateGas", self.provider.estimate_gas(request))
            .await
    }

    async fn transaction_count(&self, address: Address) -> TransferResult<u64> {
        self.request(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address),
        )
        .await
    }

    async fn gas_price(&self) -> TransferResult<u128> {
        self.request("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn chain_id(&self) -> TransferResult<u64> {
        self.request("eth_chainId", self.provider.get_chain_id()).await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> TransferResult<TxHash> {
        const METHOD: &str = "eth_sendRawTransaction";
        match timeout(self.timeout_duration, self.provider.send_raw_transaction(&raw)).await {
            Ok(Ok(pending)) => {
                metrics::record_rpc_call(METHOD, "ok");
                Ok(*pending.tx_hash())
            }
            Ok(Err(e)) => {
                if let Some(payload) = e.as_error_resp() {
                    metrics::record_rpc_call(METHOD, "rejected");
                    tracing::warn!(code = payload.code, message = %payload.message, "Node rejected transaction");
                    return Err(TransferError::RejectedTransaction {
                        code: payload.code,
                        message: payload.message.to_string(),
                    });
                }
                metrics::record_rpc_call(METHOD, "error");
                tracing::warn!(method = METHOD, error = %e, "RPC error");
                Err(TransferError::rpc(METHOD, e))
            }
            Err(_) => {
                metrics::record_rpc_call(METHOD, "timeout");
                Err(TransferError::rpc(
                    METHOD,
                    format!("timed out after {}s", self.config.timeout_secs),
                ))
            }
        }
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> TransferResult<Option<Receipt>> {
        let receipt = self
            .request(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(tx_hash),
            )
            .await?;
        Ok(receipt.map(Receipt::from))
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

//! Shared fixtures for integration tests: an in-memory ERC-20 chain.
#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{address, Address, Bytes, TxHash, U256};
use alloy::sol_types::{SolCall, SolInterface, SolValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use erc20_transfer::blockchain::{EthRpc, Receipt, TransferError, TransferResult};
use erc20_transfer::config::PipelineConfig;
use erc20_transfer::token::erc20::IERC20;
use erc20_transfer::token::{TokenContract, TokenInterface};
use erc20_transfer::TransferPipeline;

// Anvil accounts #0 and #1; publicly known, never use for real funds.
pub const SENDER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const SENDER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const RECIPIENT: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const TOKEN: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");

pub const CHAIN_ID: u64 = 42161;
pub const GAS_PRICE: u128 = 10_000_000;
pub const GAS_ESTIMATE: u64 = 52_000;
pub const GAS_USED: u64 = 41_000;

/// What the chain does with a broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Succeeds,
    Reverts,
    NeverMined,
}

#[derive(Debug)]
struct Pending {
    transfer: Option<(Address, Address, U256)>,
    polls: u32,
    mined: bool,
    success: bool,
}

#[derive(Debug)]
struct State {
    decimals: u8,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    calls: Vec<&'static str>,
    sent: Vec<Bytes>,
    pending: HashMap<TxHash, Pending>,
    polls_before_receipt: u32,
    execution: Execution,
    rejection: Option<(i64, String)>,
    failing: Option<&'static str>,
    external_nonce_bump: bool,
    foreign_hash: bool,
    next_block: u64,
}

/// In-memory token ledger speaking the `EthRpc` surface.
#[derive(Debug)]
pub struct FakeChain {
    state: Mutex<State>,
}

impl FakeChain {
    pub fn new(decimals: u8) -> Self {
        Self {
            state: Mutex::new(State {
                decimals,
                balances: HashMap::new(),
                nonces: HashMap::new(),
                calls: Vec::new(),
                sent: Vec::new(),
                pending: HashMap::new(),
                polls_before_receipt: 0,
                execution: Execution::Succeeds,
                rejection: None,
                failing: None,
                external_nonce_bump: false,
                foreign_hash: false,
                next_block: 1_000,
            }),
        }
    }

    pub fn with_balance(self, owner: Address, base_units: u64) -> Self {
        self.lock().balances.insert(owner, U256::from(base_units));
        self
    }

    pub fn with_nonce(self, owner: Address, nonce: u64) -> Self {
        self.lock().nonces.insert(owner, nonce);
        self
    }

    /// Serve `None` for the first `polls` receipt lookups of each transaction.
    pub fn with_polls_before_receipt(self, polls: u32) -> Self {
        self.lock().polls_before_receipt = polls;
        self
    }

    pub fn with_execution(self, execution: Execution) -> Self {
        self.lock().execution = execution;
        self
    }

    /// Refuse every raw transaction with a JSON-RPC error.
    pub fn with_rejection(self, code: i64, message: &str) -> Self {
        self.lock().rejection = Some((code, message.to_string()));
        self
    }

    /// Fail every call of `method` with a transport error.
    pub fn failing(self, method: &'static str) -> Self {
        self.lock().failing = Some(method);
        self
    }

    /// Another transaction from the same key lands right after the first nonce read.
    pub fn with_external_nonce_bump(self) -> Self {
        self.lock().external_nonce_bump = true;
        self
    }

    /// Accept raw transactions but answer with an unrelated hash.
    pub fn with_foreign_hash(self) -> Self {
        self.lock().foreign_hash = true;
        self
    }

    /// Track a transaction that was not sent through `send_raw_transaction`.
    pub fn register_pending(&self, tx_hash: TxHash, success: bool) {
        self.lock().pending.insert(
            tx_hash,
            Pending {
                transfer: None,
                polls: 0,
                mined: false,
                success,
            },
        );
    }

    pub fn balance(&self, owner: Address) -> U256 {
        self.lock().balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|m| **m == method).count()
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn enter(&self, method: &'static str) -> TransferResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(method);
        if state.failing == Some(method) {
            return Err(TransferError::Rpc {
                method,
                message: "connection reset by peer".to_string(),
            });
        }
        Ok(state)
    }
}

fn reverted(method: &'static str, reason: &str) -> TransferError {
    TransferError::Rpc {
        method,
        message: format!("execution reverted: {reason}"),
    }
}

impl EthRpc for FakeChain {
    async fn call(&self, to: Address, data: Bytes) -> TransferResult<Bytes> {
        let state = self.enter("eth_call")?;
        if to != TOKEN {
            return Err(reverted("eth_call", "no contract at address"));
        }
        let output = match <IERC20::IERC20Calls as SolInterface>::abi_decode(&data) {
            Ok(IERC20::IERC20Calls::balanceOf(call)) => state
                .balances
                .get(&call.account)
                .copied()
                .unwrap_or_default()
                .abi_encode(),
            Ok(IERC20::IERC20Calls::decimals(_)) => U256::from(state.decimals).abi_encode(),
            Ok(IERC20::IERC20Calls::transfer(_)) => true.abi_encode(),
            Err(_) => return Err(reverted("eth_call", "unknown selector")),
        };
        Ok(output.into())
    }

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> TransferResult<u64> {
        let state = self.enter("eth_estimateGas")?;
        if to != TOKEN {
            return Err(reverted("eth_estimateGas", "no contract at address"));
        }
        let call = <IERC20::transferCall as SolCall>::abi_decode(&data)
            .map_err(|_| reverted("eth_estimateGas", "bad calldata"))?;
        let balance = state.balances.get(&from).copied().unwrap_or_default();
        if balance < call.amount {
            return Err(reverted("eth_estimateGas", "transfer amount exceeds balance"));
        }
        Ok(GAS_ESTIMATE)
    }

    async fn transaction_count(&self, address: Address) -> TransferResult<u64> {
        let mut state = self.enter("eth_getTransactionCount")?;
        let nonce = state.nonces.get(&address).copied().unwrap_or_default();
        if state.external_nonce_bump {
            state.external_nonce_bump = false;
            state.nonces.insert(address, nonce + 1);
        }
        Ok(nonce)
    }

    async fn gas_price(&self) -> TransferResult<u128> {
        self.enter("eth_gasPrice")?;
        Ok(GAS_PRICE)
    }

    async fn chain_id(&self) -> TransferResult<u64> {
        self.enter("eth_chainId")?;
        Ok(CHAIN_ID)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> TransferResult<TxHash> {
        let mut state = self.enter("eth_sendRawTransaction")?;
        if let Some((code, message)) = state.rejection.clone() {
            return Err(TransferError::RejectedTransaction { code, message });
        }

        let mut buf: &[u8] = raw.as_ref();
        let envelope = TxEnvelope::decode_2718(&mut buf).map_err(|e| TransferError::RejectedTransaction {
            code: -32602,
            message: format!("invalid raw transaction: {e}"),
        })?;

        if envelope.chain_id() != Some(CHAIN_ID) {
            return Err(TransferError::RejectedTransaction {
                code: -32000,
                message: "invalid chain id".to_string(),
            });
        }
        let expected_nonce = state.nonces.get(&SENDER).copied().unwrap_or_default();
        if envelope.nonce() != expected_nonce {
            return Err(TransferError::RejectedTransaction {
                code: -32000,
                message: format!("nonce too low: next nonce {expected_nonce}, tx nonce {}", envelope.nonce()),
            });
        }
        let call = <IERC20::transferCall as SolCall>::abi_decode(envelope.input()).map_err(|_| {
            TransferError::RejectedTransaction {
                code: -32000,
                message: "unexpected calldata".to_string(),
            }
        })?;

        let tx_hash = *envelope.tx_hash();
        let success = state.execution == Execution::Succeeds;
        state.sent.push(raw.clone());
        state.pending.insert(
            tx_hash,
            Pending {
                transfer: Some((SENDER, call.to, call.amount)),
                polls: 0,
                mined: false,
                success,
            },
        );
        if state.foreign_hash {
            return Ok(TxHash::repeat_byte(0xee));
        }
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> TransferResult<Option<Receipt>> {
        let mut guard = self.enter("eth_getTransactionReceipt")?;
        let state = &mut *guard;
        let never = state.execution == Execution::NeverMined;
        let polls_before_receipt = state.polls_before_receipt;

        let Some(pending) = state.pending.get_mut(&tx_hash) else {
            return Ok(None);
        };
        pending.polls += 1;
        if never || pending.polls <= polls_before_receipt {
            return Ok(None);
        }

        if !pending.mined {
            pending.mined = true;
            if let Some((from, to, amount)) = pending.transfer {
                *state.nonces.entry(from).or_default() += 1;
                if pending.success {
                    *state.balances.entry(from).or_default() -= amount;
                    *state.balances.entry(to).or_default() += amount;
                }
            }
            state.next_block += 1;
        }

        Ok(Some(Receipt {
            tx_hash,
            block_number: Some(state.next_block),
            gas_used: GAS_USED,
            success: pending.success,
        }))
    }
}

/// Pipeline config with millisecond-scale confirmation timing.
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        poll_interval_ms: 5,
        confirmation_timeout_secs: 2,
        ..PipelineConfig::default()
    }
}

pub fn token_contract() -> Arc<TokenContract> {
    Arc::new(TokenContract::new(TOKEN, TokenInterface::bundled().unwrap()))
}

pub fn pipeline(chain: &Arc<FakeChain>, config: &PipelineConfig) -> TransferPipeline<FakeChain> {
    TransferPipeline::new(chain.clone(), token_contract(), config)
}

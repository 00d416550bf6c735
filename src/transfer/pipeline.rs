//! Single-shot token transfer orchestration.
//!
//! # Flow
//! ```text
//! Validating   key, recipient, amount checked offline
//! Building     decimals → base units → TxBuilder (balance precondition first)
//! Signing      Wallet::sign, offline
//! Broadcasting nonce re-check, eth_sendRawTransaction
//! Confirming   receipt under deadline, execution status checked
//! Done         post-transfer balances read
//! ```
//!
//! Nothing built in one run is reused by another. Transfers from the same
//! sender must be serialized by the caller; concurrent runs would race on the
//! account nonce.

use alloy::primitives::{Address, TxHash};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::broadcast::Broadcaster;
use crate::blockchain::confirmation::ConfirmationWaiter;
use crate::blockchain::rpc::EthRpc;
use crate::blockchain::transaction::{BuiltTransfer, GasMultiplier, TxBuilder};
use crate::blockchain::types::{parse_address, Receipt, TransferError, TransferResult};
use crate::blockchain::wallet::Wallet;
use crate::config::PipelineConfig;
use crate::observability::metrics;
use crate::token::erc20::Erc20Token;
use crate::token::interface::TokenContract;
use crate::token::units::{to_base_units, TokenAmount};
use crate::transfer::source::TransferSource;
use crate::transfer::state::{StateMachine, TransferFailure, TransferState};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct TransferReport {
    pub run_id: Uuid,
    pub tx_hash: TxHash,
    pub receipt: Receipt,
    pub sender: Address,
    pub recipient: Address,
    pub amount: TokenAmount,
    pub sender_before: TokenAmount,
    pub recipient_before: TokenAmount,
    /// `None` if the post-transfer read failed; the transfer itself succeeded.
    pub sender_after: Option<TokenAmount>,
    pub recipient_after: Option<TokenAmount>,
    pub explorer_link: Option<String>,
}

/// Milestones reported while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Inputs passed offline validation; nothing has been sent to the node.
    Requested {
        sender: Address,
        recipient: Address,
        amount: f64,
    },
    /// Transaction built from fresh chain state, about to be signed.
    Prepared {
        amount: TokenAmount,
        sender_balance: TokenAmount,
        recipient_balance: TokenAmount,
    },
    /// Node accepted the transaction; a receipt is being awaited.
    Broadcast {
        tx_hash: TxHash,
        explorer_link: Option<String>,
    },
    /// Receipt received and execution succeeded.
    Confirmed { receipt: Receipt },
}

/// Wires builder, signer, broadcaster and waiter into one transfer.
pub struct TransferPipeline<R> {
    rpc: Arc<R>,
    token: Erc20Token<R>,
    builder: TxBuilder<R>,
    broadcaster: Broadcaster<R>,
    waiter: ConfirmationWaiter<R>,
    gas_multiplier: GasMultiplier,
    recheck_nonce: bool,
    explorer_url: String,
}

struct ValidatedInput {
    wallet: Wallet,
    recipient: Address,
    amount: f64,
}

impl<R: EthRpc> TransferPipeline<R> {
    pub fn new(rpc: Arc<R>, contract: Arc<TokenContract>, config: &PipelineConfig) -> Self {
        let token = Erc20Token::new(rpc.clone(), contract);
        Self {
            builder: TxBuilder::new(rpc.clone(), token.clone()),
            broadcaster: Broadcaster::new(rpc.clone()),
            waiter: ConfirmationWaiter::new(
                rpc.clone(),
                config.poll_interval(),
                config.confirmation_timeout(),
            ),
            token,
            rpc,
            gas_multiplier: config.gas_multiplier,
            recheck_nonce: config.recheck_nonce,
            explorer_url: config.explorer_url.clone(),
        }
    }

    /// The token reader the pipeline uses.
    pub fn token(&self) -> &Erc20Token<R> {
        &self.token
    }

    /// Run one transfer with inputs read from `source`.
    pub async fn run(&self, source: &mut dyn TransferSource) -> Result<TransferReport, TransferFailure> {
        self.run_with_progress(source, &mut |_: &TransferEvent| {}).await
    }

    /// Like [`run`](Self::run), calling `progress` at each milestone as it
    /// happens. `Broadcast` fires before the confirmation wait starts, so the
    /// hash is known even if the wait is abandoned.
    pub async fn run_with_progress(
        &self,
        source: &mut dyn TransferSource,
        progress: &mut dyn FnMut(&TransferEvent),
    ) -> Result<TransferReport, TransferFailure> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("transfer", %run_id);

        let result = self.execute(run_id, source, progress).instrument(span).await;

        metrics::record_transfer(match &result {
            Ok(_) => TransferState::Done.as_str(),
            Err(failure) => failure.stage.as_str(),
        });
        result
    }

    async fn execute(
        &self,
        run_id: Uuid,
        source: &mut dyn TransferSource,
        progress: &mut dyn FnMut(&TransferEvent),
    ) -> Result<TransferReport, TransferFailure> {
        let mut machine = StateMachine::new();

        machine.advance(TransferState::Validating);
        let input = Self::validate(source).map_err(|e| machine.fail(e))?;
        let sender = input.wallet.address();
        tracing::info!(
            sender = %sender,
            recipient = %input.recipient,
            amount = input.amount,
            "Transfer requested"
        );
        progress(&TransferEvent::Requested {
            sender,
            recipient: input.recipient,
            amount: input.amount,
        });

        machine.advance(TransferState::Building);
        let built = self
            .build(sender, input.recipient, input.amount)
            .await
            .map_err(|e| machine.fail(e))?;
        let BuiltTransfer {
            unsigned,
            sender_balance,
            recipient_balance,
        } = built;
        let amount = unsigned.amount;
        tracing::info!(
            sender_balance = %sender_balance,
            recipient_balance = %recipient_balance,
            "Balances before transfer"
        );
        progress(&TransferEvent::Prepared {
            amount,
            sender_balance,
            recipient_balance,
        });

        machine.advance(TransferState::Signing);
        let signed = input.wallet.sign(unsigned).map_err(|e| machine.fail(e))?;

        machine.advance(TransferState::Broadcasting);
        if self.recheck_nonce {
            self.check_nonce(sender, signed.nonce())
                .await
                .map_err(|e| machine.fail(e))?;
        }
        let tx_hash = self
            .broadcaster
            .submit(&signed)
            .await
            .map_err(|e| machine.fail(e))?;
        let explorer_link = explorer_link(&self.explorer_url, tx_hash);
        if let Some(link) = &explorer_link {
            tracing::info!(link = %link, "Explorer link");
        }
        progress(&TransferEvent::Broadcast {
            tx_hash,
            explorer_link: explorer_link.clone(),
        });

        machine.advance(TransferState::Confirming);
        let receipt = self
            .waiter
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| machine.fail(e))?;
        if !receipt.success {
            return Err(machine.fail(TransferError::RevertedExecution {
                tx_hash,
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
            }));
        }
        progress(&TransferEvent::Confirmed {
            receipt: receipt.clone(),
        });

        let sender_after = self.balance_after(sender).await;
        let recipient_after = self.balance_after(input.recipient).await;
        machine.advance(TransferState::Done);

        Ok(TransferReport {
            run_id,
            tx_hash,
            receipt,
            sender,
            recipient: input.recipient,
            amount,
            sender_before: sender_balance,
            recipient_before: recipient_balance,
            sender_after,
            recipient_after,
            explorer_link,
        })
    }

    fn validate(source: &mut dyn TransferSource) -> TransferResult<ValidatedInput> {
        let wallet = Wallet::from_private_key(&source.private_key()?)?;
        let recipient = parse_address(&source.recipient()?)?;
        let amount = source.amount()?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(TransferError::InvalidAmount(format!(
                "{amount} must be a finite, non-negative number"
            )));
        }
        Ok(ValidatedInput {
            wallet,
            recipient,
            amount,
        })
    }

    async fn build(&self, sender: Address, recipient: Address, amount: f64) -> TransferResult<BuiltTransfer> {
        let decimals = self.token.decimals().await?;
        let amount = to_base_units(amount, decimals)?;
        tracing::debug!(decimals, base_units = %amount.base(), "Amount converted");
        self.builder
            .build(sender, recipient, amount, self.gas_multiplier)
            .await
    }

    async fn check_nonce(&self, sender: Address, signed_nonce: u64) -> TransferResult<()> {
        let current = self.rpc.transaction_count(sender).await?;
        if current != signed_nonce {
            return Err(TransferError::NonceChanged {
                expected: signed_nonce,
                actual: current,
            });
        }
        Ok(())
    }

    async fn balance_after(&self, owner: Address) -> Option<TokenAmount> {
        match self.token.amount_of(owner).await {
            Ok(amount) => Some(amount),
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "Post-transfer balance read failed");
                None
            }
        }
    }
}

/// `<base>tx/<hash>`, or `None` when no explorer is configured.
pub fn explorer_link(base: &str, tx_hash: TxHash) -> Option<String> {
    let base = base.trim();
    if base.is_empty() {
        return None;
    }
    Some(format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
}

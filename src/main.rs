//! ERC-20 transfer CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   prompts / flags ──▶ TransferSource
//!                            │
//!                            ▼
//!                   ┌──────────────────┐      ┌───────────────┐
//!                   │ TransferPipeline │─────▶│ Erc20Token    │── balanceOf / decimals
//!                   │  validate        │      └───────────────┘
//!                   │  build  ─────────┼────▶ TxBuilder ────────── nonce / gas / chain id
//!                   │  sign   ─────────┼────▶ Wallet (offline)
//!                   │  broadcast ──────┼────▶ Broadcaster ──────── eth_sendRawTransaction
//!                   │  confirm ────────┼────▶ ConfirmationWaiter ─ eth_getTransactionReceipt
//!                   └──────────────────┘
//!                            │ all RPC through
//!                            ▼
//!                   BlockchainClient (alloy HTTP provider, per-call timeout)
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use erc20_transfer::blockchain::wallet::PRIVATE_KEY_ENV_VAR;
use erc20_transfer::config::{load_config, TransferConfig};
use erc20_transfer::observability::logging::init_logging;
use erc20_transfer::transfer::{TerminalSource, TransferEvent};
use erc20_transfer::{BlockchainClient, Erc20Token, TokenContract, TransferPipeline, TransferReport};

#[derive(Parser)]
#[command(name = "erc20-transfer")]
#[command(about = "Send ERC-20 tokens through a JSON-RPC node", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer tokens from the account of the supplied private key
    Send {
        /// Recipient address (prompted when omitted)
        #[arg(long)]
        to: Option<String>,

        /// Amount in whole tokens (prompted when omitted)
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Show the token balance of an address
    Balance {
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TransferConfig::default(),
    };
    init_logging(&config.observability);

    tracing::info!(
        rpc_url = %config.rpc.url,
        token = %config.token.address,
        "erc20-transfer v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let contract = Arc::new(TokenContract::from_config(&config.token)?);
    let client = Arc::new(BlockchainClient::new(&config.rpc)?);

    match cli.command {
        Commands::Balance { address } => {
            let balance = Erc20Token::new(client, contract).balance(&address).await?;
            println!("Balance of {address}: {balance}");
        }
        Commands::Send { to, amount } => {
            let mut source = TerminalSource::stdio()
                .with_private_key(std::env::var(PRIVATE_KEY_ENV_VAR).ok())
                .with_recipient(to)
                .with_amount(amount);
            let pipeline = TransferPipeline::new(client, contract, &config.transfer);
            let mut progress = print_progress;

            let outcome = tokio::select! {
                result = pipeline.run_with_progress(&mut source, &mut progress) => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Interrupted; transfer abandoned");
                    eprintln!("Interrupted. A broadcast transaction may still be mined.");
                    std::process::exit(130);
                }
            };
            match outcome {
                Ok(report) => print_report(&report),
                Err(failure) => {
                    eprintln!("{failure}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn print_progress(event: &TransferEvent) {
    match event {
        TransferEvent::Requested {
            sender,
            recipient,
            amount,
        } => {
            println!("Sender:    {sender}");
            println!("Recipient: {recipient}");
            println!("Amount:    {amount}");
        }
        TransferEvent::Prepared {
            sender_balance,
            recipient_balance,
            ..
        } => {
            println!("Sender balance before:    {sender_balance}");
            println!("Recipient balance before: {recipient_balance}");
        }
        TransferEvent::Broadcast {
            tx_hash,
            explorer_link,
        } => {
            println!("Transaction sent: {tx_hash}");
            if let Some(link) = explorer_link {
                println!("Explorer: {link}");
            }
            println!("Waiting for confirmation...");
        }
        TransferEvent::Confirmed { receipt } => {
            match receipt.block_number {
                Some(block) => println!("Confirmed in block {block}, gas used {}", receipt.gas_used),
                None => println!("Confirmed, gas used {}", receipt.gas_used),
            }
        }
    }
}

fn print_report(report: &TransferReport) {
    let unknown = || "unavailable".to_string();

    println!(
        "Sender balance after:     {}",
        report.sender_after.map(|a| a.to_string()).unwrap_or_else(unknown)
    );
    println!(
        "Recipient balance after:  {}",
        report.recipient_after.map(|a| a.to_string()).unwrap_or_else(unknown)
    );
}

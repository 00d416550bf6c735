//! Token interface descriptor and the contract reference bound at startup.

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use std::path::Path;

use crate::blockchain::types::{parse_address, TransferError, TransferResult};
use crate::config::TokenConfig;

/// Interface shipped with the crate, used when no descriptor file is configured.
const BUNDLED_ERC20_ABI: &str = include_str!("../../abi/erc20.json");

/// Functions the transfer flow calls: (name, signature, return type).
const REQUIRED_FUNCTIONS: [(&str, &str, &str); 3] = [
    ("balanceOf", "balanceOf(address)", "uint256"),
    ("decimals", "decimals()", "uint8"),
    ("transfer", "transfer(address,uint256)", "bool"),
];

/// A JSON ABI checked to expose the ERC-20 functions the pipeline relies on.
#[derive(Debug, Clone)]
pub struct TokenInterface {
    abi: JsonAbi,
}

impl TokenInterface {
    /// Parse and check a JSON ABI document.
    pub fn from_json(json: &str) -> TransferResult<Self> {
        let abi: JsonAbi = serde_json::from_str(json)
            .map_err(|e| TransferError::InterfaceMismatch(format!("malformed ABI JSON: {e}")))?;
        Self::check(&abi)?;
        Ok(Self { abi })
    }

    /// The bundled standard ERC-20 interface.
    pub fn bundled() -> TransferResult<Self> {
        Self::from_json(BUNDLED_ERC20_ABI)
    }

    /// Load from `path`, or the bundled interface when `None`.
    pub fn load(path: Option<&Path>) -> TransferResult<Self> {
        let Some(path) = path else {
            return Self::bundled();
        };
        let json = std::fs::read_to_string(path).map_err(|e| {
            TransferError::InterfaceMismatch(format!("cannot read {}: {e}", path.display()))
        })?;
        let interface = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "Token interface loaded");
        Ok(interface)
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    fn check(abi: &JsonAbi) -> TransferResult<()> {
        for (name, signature, returns) in REQUIRED_FUNCTIONS {
            let found = abi
                .function(name)
                .into_iter()
                .flatten()
                .find(|f| f.signature() == signature)
                .ok_or_else(|| TransferError::InterfaceMismatch(format!("missing function {signature}")))?;

            let outputs: Vec<&str> = found.outputs.iter().map(|p| p.ty.as_str()).collect();
            if outputs != [returns] {
                return Err(TransferError::InterfaceMismatch(format!(
                    "{signature} returns ({}), expected ({returns})",
                    outputs.join(",")
                )));
            }
        }
        Ok(())
    }
}

/// Immutable (address, interface) pair for the token being moved.
#[derive(Debug, Clone)]
pub struct TokenContract {
    pub address: Address,
    pub interface: TokenInterface,
}

impl TokenContract {
    pub fn new(address: Address, interface: TokenInterface) -> Self {
        Self { address, interface }
    }

    /// Bind the configured token address and interface descriptor.
    pub fn from_config(config: &TokenConfig) -> TransferResult<Self> {
        let address = parse_address(&config.address)?;
        let interface = TokenInterface::load(config.abi_path.as_deref())?;
        Ok(Self::new(address, interface))
    }
}

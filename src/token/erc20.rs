//! ERC-20 contract calls: balance reads, decimals, transfer calldata.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{parse_address, TransferError, TransferResult};
use crate::token::interface::TokenContract;
use crate::token::units::TokenAmount;

sol! {
    /// Subset of the ERC-20 interface used by the transfer flow.
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Read access to one token contract through an RPC transport.
pub struct Erc20Token<R> {
    rpc: Arc<R>,
    contract: Arc<TokenContract>,
}

impl<R> Clone for Erc20Token<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            contract: self.contract.clone(),
        }
    }
}

impl<R: EthRpc> Erc20Token<R> {
    pub fn new(rpc: Arc<R>, contract: Arc<TokenContract>) -> Self {
        Self { rpc, contract }
    }

    /// Token contract address.
    pub fn address(&self) -> Address {
        self.contract.address
    }

    /// Fetch `decimals()`. Never cached.
    pub async fn decimals(&self) -> TransferResult<u8> {
        let data = IERC20::decimalsCall {}.abi_encode();
        let output = self.rpc.call(self.contract.address, data.into()).await?;
        IERC20::decimalsCall::abi_decode_returns(&output)
            .map_err(|e| TransferError::rpc("decimals", format!("malformed return data: {e}")))
    }

    /// Fetch the raw `balanceOf(owner)` in base units.
    pub async fn balance_of(&self, owner: Address) -> TransferResult<U256> {
        let data = IERC20::balanceOfCall { account: owner }.abi_encode();
        let output = self.rpc.call(self.contract.address, data.into()).await?;
        IERC20::balanceOfCall::abi_decode_returns(&output)
            .map_err(|e| TransferError::rpc("balanceOf", format!("malformed return data: {e}")))
    }

    /// Current balance of `address` with the token's current decimals.
    ///
    /// The address is validated before any request is made.
    pub async fn balance(&self, address: &str) -> TransferResult<TokenAmount> {
        let owner = parse_address(address)?;
        self.amount_of(owner).await
    }

    /// `balanceOf(owner)` followed by `decimals()`, both read fresh.
    pub async fn amount_of(&self, owner: Address) -> TransferResult<TokenAmount> {
        let raw = self.balance_of(owner).await?;
        let decimals = self.decimals().await?;
        Ok(TokenAmount::new(raw, decimals))
    }
}

/// ABI-encoded `transfer(recipient, amount)` call.
pub fn transfer_calldata(recipient: Address, amount: U256) -> Bytes {
    IERC20::transferCall {
        to: recipient,
        amount,
    }
    .abi_encode()
    .into()
}

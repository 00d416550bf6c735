//! Token subsystem.
//!
//! # Data Flow
//! ```text
//! interface descriptor (JSON ABI)
//!     → interface.rs (shape check, TokenContract binding)
//!     → erc20.rs (balanceOf / decimals reads, transfer calldata)
//!     → units.rs (human amount ⇄ base units)
//! ```

pub mod erc20;
pub mod interface;
pub mod units;

pub use erc20::Erc20Token;
pub use interface::{TokenContract, TokenInterface};
pub use units::{to_base_units, to_decimal, TokenAmount};

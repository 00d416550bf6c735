//! Conversion between human token amounts and on-chain base units.
//!
//! The base-unit integer is authoritative. Floating point only appears at the
//! edges: as caller input (parsed through its shortest decimal rendering, never
//! multiplied) and as a display value.

use alloy::primitives::U256;
use std::fmt;

use crate::blockchain::types::{TransferError, TransferResult};

/// A token quantity in base units, tagged with the decimals used to derive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    base: U256,
    decimals: u8,
}

impl TokenAmount {
    pub fn new(base: U256, decimals: u8) -> Self {
        Self { base, decimals }
    }

    /// Integer amount in the token's smallest denomination.
    pub fn base(&self) -> U256 {
        self.base
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Approximate human value. Display only.
    pub fn as_f64(&self) -> f64 {
        to_decimal(self.base, self.decimals)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_exact(self.base, self.decimals))
    }
}

/// Convert a human amount to base units, truncating toward zero.
pub fn to_base_units(amount: f64, decimals: u8) -> TransferResult<TokenAmount> {
    if !amount.is_finite() {
        return Err(TransferError::InvalidAmount(format!("{amount} is not a finite number")));
    }
    if amount < 0.0 {
        return Err(TransferError::InvalidAmount(format!("{amount} is negative")));
    }
    // `abs` folds -0.0 into 0.0; Display never uses exponent notation.
    parse_base_units(&amount.abs().to_string(), decimals)
}

/// Convert base units to a human amount. Display only.
pub fn to_decimal(base: U256, decimals: u8) -> f64 {
    format_exact(base, decimals).parse().unwrap_or(f64::NAN)
}

/// Parse exact decimal text (`"12"`, `"0.5"`, `".25"`) into base units.
///
/// Fraction digits beyond `decimals` are dropped.
pub fn parse_base_units(text: &str, decimals: u8) -> TransferResult<TokenAmount> {
    let text = text.trim();
    let invalid = || TransferError::InvalidAmount(format!("'{text}' is not a decimal amount"));

    let (int_digits, frac_digits) = text.split_once('.').unwrap_or((text, ""));
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(invalid());
    }
    if !int_digits.bytes().all(|b| b.is_ascii_digit()) || !frac_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let overflow = || TransferError::InvalidAmount(format!("'{text}' overflows 256 bits at {decimals} decimals"));
    let scale = pow10(decimals).ok_or_else(overflow)?;

    let width = decimals as usize;
    let kept = &frac_digits[..frac_digits.len().min(width)];
    let padded = format!("{:0<width$}", kept, width = width);

    let int_part = if int_digits.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_digits, 10).map_err(|_| overflow())?
    };
    let frac_part = if padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&padded, 10).map_err(|_| overflow())?
    };

    let base = int_part
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_part))
        .ok_or_else(overflow)?;

    Ok(TokenAmount::new(base, decimals))
}

fn pow10(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

fn format_exact(base: U256, decimals: u8) -> String {
    let digits = base.to_string();
    if decimals == 0 {
        return digits;
    }
    let width = decimals as usize;
    let padded = if digits.len() <= width {
        format!("{}{}", "0".repeat(width + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - width);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

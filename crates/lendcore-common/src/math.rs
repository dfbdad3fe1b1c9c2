//! Fixed-point arithmetic
//!
//! Every non-integer quantity in the protocol (interest index, rates, utilization,
//! ratios, prices) is a [`Fixed`] value scaled by [`SCALE`]. Amounts stay `u64` in
//! the smallest indivisible unit. Products are formed in `u128` and every operation
//! is checked; the caller picks the rounding direction explicitly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The raw value that represents 1.0
pub const SCALE: u128 = 1_000_000_000_000;

/// Number of decimal digits in [`SCALE`]
pub const SCALE_DECIMALS: u32 = 12;

/// Arithmetic failures
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Negative value cannot be represented")]
    Negative,
}

/// `a * b / c`, rounded down
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Result<u128, MathError> {
    if c == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    Ok(product / c)
}

/// `a * b / c`, rounded up
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> Result<u128, MathError> {
    if c == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    let quotient = product / c;
    if product % c == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(MathError::Overflow)
    }
}

/// Narrow a `u128` intermediate back to an amount
pub fn to_amount(value: u128) -> Result<u64, MathError> {
    u64::try_from(value).map_err(|_| MathError::Overflow)
}

/// Unsigned fixed-point number with [`SCALE`] as 1.0
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(u128);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(SCALE);

    /// Wrap a raw scaled value
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Raw scaled value
    #[inline]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Whole-percent constructor: `from_percent(75)` is 0.75
    pub const fn from_percent(percent: u64) -> Self {
        Self(percent as u128 * (SCALE / 100))
    }

    /// Basis-point constructor: `from_bps(250)` is 0.025
    pub const fn from_bps(bps: u64) -> Self {
        Self(bps as u128 * (SCALE / 10_000))
    }

    /// `numerator / denominator`, rounded down
    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self, MathError> {
        mul_div_floor(numerator, SCALE, denominator).map(Self)
    }

    /// Convert a decimal percentage (`2.5` meaning 2.5%), rounding down
    pub fn from_percent_decimal(percent: Decimal) -> Result<Self, MathError> {
        if percent.is_sign_negative() && !percent.is_zero() {
            return Err(MathError::Negative);
        }
        let scaled = percent
            .checked_mul(Decimal::from(SCALE as u64 / 100))
            .ok_or(MathError::Overflow)?;
        scaled
            .floor()
            .to_u128()
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    /// Value as a decimal number (1.0 for [`Fixed::ONE`])
    pub fn to_decimal(self) -> Decimal {
        i128::try_from(self.0)
            .ok()
            .and_then(|raw| Decimal::try_from_i128_with_scale(raw, SCALE_DECIMALS).ok())
            .unwrap_or(Decimal::MAX)
    }

    /// Value as a percentage (75 for 0.75)
    pub fn to_percent(self) -> Decimal {
        i128::try_from(self.0)
            .ok()
            .and_then(|raw| Decimal::try_from_i128_with_scale(raw, SCALE_DECIMALS - 2).ok())
            .unwrap_or(Decimal::MAX)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Fixed) -> Result<Fixed, MathError> {
        self.0.checked_add(other.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(self, other: Fixed) -> Result<Fixed, MathError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn saturating_sub(self, other: Fixed) -> Fixed {
        Self(self.0.saturating_sub(other.0))
    }

    /// `self * other`, rounded down
    pub fn mul_floor(self, other: Fixed) -> Result<Fixed, MathError> {
        mul_div_floor(self.0, other.0, SCALE).map(Self)
    }

    /// Scale an amount by this factor, rounding down
    pub fn apply_floor(self, amount: u64) -> Result<u64, MathError> {
        to_amount(mul_div_floor(amount as u128, self.0, SCALE)?)
    }

    pub fn min(self, other: Fixed) -> Fixed {
        if self <= other {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal().normalize())
    }
}

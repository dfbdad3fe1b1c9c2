//! # LendCore Common
//!
//! Shared math, types and errors for the LendCore lending accounting core.
//!
//! ## Core Types
//!
//! - [`Fixed`]: unsigned fixed-point value at [`SCALE`] (index, rates, ratios, prices)
//! - [`AccountId`]: identity of a position owner
//! - [`Position`]: per-account collateral and debt record
//! - [`HealthFactor`]: percentage health of a position, or the no-debt sentinel
//! - [`LiquidationRecord`]/[`LiquidationStats`]: liquidation log entry and running totals
//!
//! ## Errors
//!
//! - [`LendingError`]: every typed failure a pool operation can return
//! - [`PriceError`]: read failures reported by a price feed
//! - [`LendCoreError`]: workspace-level error wrapping the above plus config failures

pub mod error;
pub mod math;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{LendCoreError, LendingError, PriceError, Result};
pub use math::{Fixed, MathError, SCALE};
pub use types::{
    account::AccountId,
    liquidation::{LiquidationOutcome, LiquidationQuote, LiquidationRecord, LiquidationStats},
    position::{HealthFactor, Position},
};

/// LendCore version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Share of a position's debt a single liquidation may repay (50%)
pub const CLOSE_FACTOR: Fixed = Fixed::from_percent(50);

/// Logical clock periods (blocks) per year used to annualise rates
pub const DEFAULT_PERIODS_PER_YEAR: u64 = 52_560;

/// Default maximum borrow against collateral (75% LTV)
pub const DEFAULT_COLLATERAL_RATIO_PERCENT: u64 = 75;

/// Health factor floor for withdrawals, in percent (1.20x)
pub const DEFAULT_MIN_HEALTH_FACTOR: u64 = 120;

/// Health factor below which a position may be liquidated, in percent
pub const DEFAULT_LIQUIDATION_THRESHOLD: u64 = 120;

/// Default liquidator premium on seized collateral (5%)
pub const DEFAULT_LIQUIDATION_BONUS_PERCENT: u64 = 5;

/// Default asset symbol for both sides of the pool
pub const DEFAULT_ASSET: &str = "STX";

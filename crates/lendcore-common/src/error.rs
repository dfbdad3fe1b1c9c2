//! Error types for LendCore
//!
//! [`LendingError`] is what every pool operation returns. [`LendCoreError`] is the
//! workspace-level error for callers that also load configuration or decode input.

use crate::math::MathError;
use thiserror::Error;

/// Result type alias using LendCoreError
pub type Result<T> = std::result::Result<T, LendCoreError>;

/// Unified error type for LendCore callers
#[derive(Debug, Error)]
pub enum LendCoreError {
    #[error("Lending error: {0}")]
    Lending(#[from] LendingError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the lending core. None of them leave partial state behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LendingError {
    #[error("Caller {caller} is not authorized for this operation")]
    Unauthorized { caller: String },

    #[error("Insufficient collateral: requested {requested}, allowed {allowed}")]
    InsufficientCollateral { requested: u64, allowed: u64 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Position of {account} is not liquidatable")]
    NotLiquidatable { account: String },

    #[error("Repay amount {requested} exceeds close factor limit {max}")]
    AmountExceedsCloseFactor { requested: u64, max: u64 },

    #[error("Health factor too low: {resulting}% < {minimum}%")]
    HealthFactorTooLow { resulting: u64, minimum: u64 },

    #[error("Collateral to seize {required} exceeds position collateral {available}")]
    InsufficientCollateralToSeize { required: u64, available: u64 },

    #[error("Price unavailable: {0}")]
    PriceUnavailable(#[from] PriceError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Height regression: current {current}, requested {requested}")]
    HeightRegression { current: u64, requested: u64 },

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] MathError),
}

impl LendingError {
    /// Stable numeric code for callers that bind to integers (RPC, tx dispatch)
    pub fn code(&self) -> u32 {
        match self {
            LendingError::Unauthorized { .. } => 100,
            LendingError::InsufficientCollateral { .. } => 101,
            LendingError::InvalidAmount => 102,
            LendingError::NotLiquidatable { .. } => 103,
            LendingError::AmountExceedsCloseFactor { .. } => 104,
            LendingError::HealthFactorTooLow { .. } => 105,
            LendingError::InsufficientCollateralToSeize { .. } => 106,
            LendingError::PriceUnavailable(_) => 107,
            LendingError::InvalidParameter(_) => 108,
            LendingError::HeightRegression { .. } => 109,
            LendingError::Arithmetic(_) => 110,
        }
    }
}

/// Read failures of a price feed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("No price for asset {0}")]
    UnknownAsset(String),

    #[error("Price for {asset} is stale: updated at {updated_at}, now {current}")]
    Stale {
        asset: String,
        updated_at: u64,
        current: u64,
    },

    #[error("Price feed is paused")]
    Paused,

    #[error("Price for {0} is zero")]
    Zero(String),
}

impl From<serde_json::Error> for LendCoreError {
    fn from(err: serde_json::Error) -> Self {
        LendCoreError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for LendCoreError {
    fn from(err: anyhow::Error) -> Self {
        LendCoreError::Internal(err.to_string())
    }
}

//! # LendCore Engine
//!
//! Accounting core of a collateralized lending pool: interest accrual, the
//! position ledger, lending operations and partial liquidation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        LendingPool                           │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │ operations │  │ liquidation  │  │ update_parameter     │  │
//! │  └─────┬──────┘  └──────┬───────┘  └──────────┬───────────┘  │
//! │        │                │                     │              │
//! │  ┌─────▼────────────────▼─────────────────────▼───────────┐  │
//! │  │   GlobalPool (index, totals)  +  PositionLedger        │  │
//! │  └─────┬──────────────────────────────────────────────────┘  │
//! │        │                        │                            │
//! │  ┌─────▼──────┐          ┌──────▼──────┐                     │
//! │  │ RateModel  │          │  PriceFeed  │ (liquidation only)  │
//! │  └────────────┘          └─────────────┘                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Health Factor
//!
//! ```text
//! health = floor(collateral × collateral_ratio × 100 / debt)
//! ```
//!
//! Withdrawals must leave `health >= min_health_factor`; positions with
//! `health < liquidation_threshold` may be liquidated.

pub mod config;
pub mod ledger;
pub mod liquidation;
pub mod metrics;
pub mod operations;
pub mod params;
pub mod pool;
pub mod rates;

pub use config::ProtocolConfig;
pub use ledger::PositionLedger;
pub use liquidation::LiquidationLog;
pub use metrics::PoolMetrics;
pub use params::{ParameterUpdate, ProtocolParams, RiskParams};
pub use pool::{LendingPool, PoolStats};
pub use rates::{GlobalPool, RateModel, RateSnapshot};

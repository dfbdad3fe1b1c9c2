//! # LendCore Oracle
//!
//! The read contract the lending core consumes for liquidation pricing, and an
//! in-memory feed implementing it.
//!
//! The core only ever calls [`PriceFeed::get_price`] and [`PriceFeed::is_fresh`].
//! Asset registration, updater authorization and the emergency pause live on
//! [`InMemoryPriceFeed`] and are never touched by the core.

pub mod feed;
pub mod memory;

pub use feed::PriceFeed;
pub use memory::{AssetConfig, InMemoryPriceFeed, OracleError, PriceEntry};

/// Default freshness window, in logical heights
pub const DEFAULT_MAX_PRICE_AGE: u64 = 150;

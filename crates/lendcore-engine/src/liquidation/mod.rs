//! Liquidation of under-collateralized positions

pub mod engine;
pub mod log;

pub use engine::{apply, is_liquidatable, quote, seize_amount};
pub use log::LiquidationLog;

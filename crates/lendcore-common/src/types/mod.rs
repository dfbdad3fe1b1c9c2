//! Core data types for LendCore

pub mod account;
pub mod liquidation;
pub mod position;

//! Rate model and interest accrual index
//!
//! - [`model`]: pure utilization → (borrow rate, supply rate) curve
//! - [`index`]: pool aggregates and the compounding interest index

pub mod index;
pub mod model;

pub use index::{Accrual, GlobalPool};
pub use model::{utilization, RateModel, RateSnapshot};

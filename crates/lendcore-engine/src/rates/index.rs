//! Global pool state and the interest accrual index
//!
//! The index starts at 1.0 and compounds once per accrual step:
//!
//! ```text
//! index' = index × (1 + borrow_rate × elapsed / periods_per_year)
//! ```
//!
//! Both the growth term and the product are rounded down. Accrual at the height
//! of the previous accrual leaves the index untouched.

use super::model::{utilization, RateModel, RateSnapshot};
use lendcore_common::math::mul_div_floor;
use lendcore_common::{Fixed, LendingError, MathError, Position, SCALE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Process-wide pool aggregates and interest index.
///
/// Passed by reference into every ledger operation; the engine holds the only
/// writable copy behind its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPool {
    pub total_collateral: u64,
    /// Sum of recorded principals across all positions
    pub total_borrowed: u64,
    pub interest_index: Fixed,
    pub last_accrual_height: u64,
    /// Incremented on every committed mutation
    pub version: u64,
}

/// What a single accrual step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub elapsed: u64,
    pub borrow_rate: Fixed,
    pub previous_index: Fixed,
    pub index: Fixed,
}

impl GlobalPool {
    /// Empty pool with the index at 1.0
    pub fn genesis(height: u64) -> Self {
        Self {
            total_collateral: 0,
            total_borrowed: 0,
            interest_index: Fixed::ONE,
            last_accrual_height: height,
            version: 0,
        }
    }

    pub fn utilization(&self) -> Fixed {
        utilization(self.total_borrowed, self.total_collateral)
    }

    /// Collateral not currently lent out
    pub fn available_liquidity(&self) -> u64 {
        self.total_collateral.saturating_sub(self.total_borrowed)
    }

    /// Rates implied by current utilization
    pub fn rates(&self, model: &RateModel) -> Result<RateSnapshot, MathError> {
        model.rate(self.utilization())
    }

    /// Bring the index up to `height`
    pub fn accrue(
        &mut self,
        model: &RateModel,
        height: u64,
        periods_per_year: u64,
    ) -> Result<Accrual, LendingError> {
        if height < self.last_accrual_height {
            return Err(LendingError::HeightRegression {
                current: self.last_accrual_height,
                requested: height,
            });
        }

        let elapsed = height - self.last_accrual_height;
        let previous_index = self.interest_index;
        let borrow_rate = model.borrow_rate(self.utilization())?;

        if elapsed > 0 {
            let growth = mul_div_floor(borrow_rate.raw(), elapsed as u128, periods_per_year as u128)?;
            let factor = Fixed::from_raw(SCALE.checked_add(growth).ok_or(MathError::Overflow)?);
            self.interest_index = self.interest_index.mul_floor(factor)?;

            debug!(
                elapsed,
                borrow_rate = %borrow_rate,
                index = %self.interest_index,
                "Accrued interest index"
            );
        }
        self.last_accrual_height = height;

        Ok(Accrual {
            elapsed,
            borrow_rate,
            previous_index,
            index: self.interest_index,
        })
    }

    /// Fold a position's accrued interest into its principal and into
    /// `total_borrowed`, re-anchoring it on the current index.
    ///
    /// Returns the position's debt, which now equals its principal.
    pub fn settle_position(&mut self, position: &mut Position) -> Result<u64, LendingError> {
        let interest = position.settle(self.interest_index)?;
        self.total_borrowed = self
            .total_borrowed
            .checked_add(interest)
            .ok_or(MathError::Overflow)?;
        Ok(position.principal_borrowed)
    }
}

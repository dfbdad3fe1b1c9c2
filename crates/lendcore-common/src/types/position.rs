//! Position - per-account collateral and debt record
//!
//! A position stores the principal owed as of its last interaction together with
//! the global interest index at that moment. Live debt is recovered by replaying
//! the index growth since then:
//!
//! ```text
//! debt = principal × index_now / index_snapshot   (rounded up)
//! ```
//!
//! Key characteristics:
//! - Created on first touch via [`Position::open`]; never explicitly deleted
//! - A zeroed position is equivalent to an absent one
//! - Interest is folded into principal whenever the position is touched

use crate::math::{mul_div_ceil, mul_div_floor, to_amount, Fixed, MathError, SCALE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collateral and debt held by one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Collateral in smallest units
    pub collateral: u64,

    /// Debt recorded at the last interaction, before interest accrued since
    pub principal_borrowed: u64,

    /// Global interest index at the last interaction
    pub index_snapshot: Fixed,

    /// Logical height of the last mutating operation
    pub last_interaction_height: u64,
}

impl Position {
    /// Default construction rule for an account the ledger has never seen
    pub fn open(index: Fixed, height: u64) -> Self {
        Self {
            collateral: 0,
            principal_borrowed: 0,
            index_snapshot: index,
            last_interaction_height: height,
        }
    }

    /// No collateral and no debt
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.collateral == 0 && self.principal_borrowed == 0
    }

    /// Debt including interest accrued up to `index`, rounded in the protocol's favor
    pub fn debt_at(&self, index: Fixed) -> Result<u64, MathError> {
        if self.principal_borrowed == 0 {
            return Ok(0);
        }
        if index == self.index_snapshot {
            return Ok(self.principal_borrowed);
        }
        let debt = mul_div_ceil(
            self.principal_borrowed as u128,
            index.raw(),
            self.index_snapshot.raw(),
        )?;
        // Index never decreases, so debt never drops below principal
        Ok(to_amount(debt)?.max(self.principal_borrowed))
    }

    /// Fold accrued interest into principal and re-anchor on `index`.
    ///
    /// Returns the interest that was folded in.
    pub fn settle(&mut self, index: Fixed) -> Result<u64, MathError> {
        let debt = self.debt_at(index)?;
        let interest = debt - self.principal_borrowed;
        self.principal_borrowed = debt;
        self.index_snapshot = index;
        Ok(interest)
    }

    /// Mark the position as touched at `height`
    pub fn touch(&mut self, height: u64) {
        self.last_interaction_height = height;
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position(collateral={}, principal={}, snapshot={}, height={})",
            self.collateral, self.principal_borrowed, self.index_snapshot, self.last_interaction_height
        )
    }
}

/// Health of a position as a percentage (150 means 1.50x), or the no-debt sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthFactor {
    /// Nothing borrowed; the position can never be liquidated
    NoDebt,
    /// `collateral × collateral_ratio / debt`, in whole percent, rounded down
    Percent(u64),
}

impl HealthFactor {
    /// Health of `collateral` against `debt` at the given collateral ratio
    pub fn from_balances(
        collateral: u64,
        debt: u64,
        collateral_ratio: Fixed,
    ) -> Result<Self, MathError> {
        if debt == 0 {
            return Ok(HealthFactor::NoDebt);
        }
        let percent = mul_div_floor(
            collateral as u128 * 100,
            collateral_ratio.raw(),
            debt as u128 * SCALE,
        )?;
        Ok(HealthFactor::Percent(
            u64::try_from(percent).unwrap_or(u64::MAX),
        ))
    }

    /// Whether the factor is strictly below `threshold` percent
    pub fn is_below(&self, threshold: u64) -> bool {
        match self {
            HealthFactor::NoDebt => false,
            HealthFactor::Percent(p) => *p < threshold,
        }
    }

    pub fn percent(&self) -> Option<u64> {
        match self {
            HealthFactor::NoDebt => None,
            HealthFactor::Percent(p) => Some(*p),
        }
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthFactor::NoDebt => f.write_str("no debt"),
            HealthFactor::Percent(p) => write!(f, "{}%", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio() -> Fixed {
        Fixed::from_percent(75)
    }

    #[test]
    fn test_open_position() {
        let position = Position::open(Fixed::ONE, 7);
        assert!(position.is_empty());
        assert_eq!(position.index_snapshot, Fixed::ONE);
        assert_eq!(position.debt_at(Fixed::from_percent(200)).unwrap(), 0);
    }

    #[test]
    fn test_debt_replays_index_growth() {
        let mut position = Position::open(Fixed::ONE, 0);
        position.principal_borrowed = 1_000;

        assert_eq!(position.debt_at(Fixed::ONE).unwrap(), 1_000);
        assert_eq!(position.debt_at(Fixed::from_percent(110)).unwrap(), 1_100);

        // 1000 * 1.0000001 = 1000.0001 -> rounds up
        let index = Fixed::from_raw(SCALE + 100_000);
        assert_eq!(position.debt_at(index).unwrap(), 1_001);
    }

    #[test]
    fn test_settle_folds_interest() {
        let mut position = Position::open(Fixed::ONE, 0);
        position.principal_borrowed = 5_000;

        let index = Fixed::from_percent(102);
        let folded = position.settle(index).unwrap();
        assert_eq!(folded, 100);
        assert_eq!(position.principal_borrowed, 5_100);
        assert_eq!(position.index_snapshot, index);
        assert_eq!(position.debt_at(index).unwrap(), 5_100);
    }

    #[test]
    fn test_health_factor() {
        let hf = HealthFactor::from_balances(10_000_000, 5_000_000, ratio()).unwrap();
        assert_eq!(hf, HealthFactor::Percent(150));

        let hf = HealthFactor::from_balances(10_000_000, 7_400_000, ratio()).unwrap();
        assert_eq!(hf, HealthFactor::Percent(101));
        assert!(hf.is_below(120));
        assert!(!hf.is_below(100));

        let hf = HealthFactor::from_balances(10_000_000, 0, ratio()).unwrap();
        assert_eq!(hf, HealthFactor::NoDebt);
        assert!(!hf.is_below(u64::MAX));
        assert_eq!(hf.percent(), None);
    }

    #[test]
    fn test_health_factor_saturates() {
        let hf = HealthFactor::from_balances(u64::MAX, 1, ratio()).unwrap();
        assert_eq!(hf, HealthFactor::Percent(u64::MAX));
    }
}

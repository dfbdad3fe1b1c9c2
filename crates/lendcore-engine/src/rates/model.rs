//! Kinked utilization rate curve
//!
//! ```text
//!            max_rate ─┤                    ╱
//!                      │                  ╱
//!        optimal_rate ─┤──────────────●╱
//!                      │          ╱
//!           base_rate ─┤──────╱
//!                      └──────────────┬──────┤
//!                                 optimal   100%
//!                               utilization
//! ```
//!
//! Rates are annual fractions at `SCALE` (2% is `Fixed::from_percent(2)`).

use lendcore_common::math::mul_div_floor;
use lendcore_common::{Fixed, LendingError, MathError};
use serde::{Deserialize, Serialize};

/// Rate curve parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateModel {
    /// Borrow rate at zero utilization
    pub base_rate: Fixed,
    /// Borrow rate at the kink
    pub optimal_rate: Fixed,
    /// Borrow rate at full utilization
    pub max_rate: Fixed,
    /// Utilization where the curve steepens
    pub optimal_utilization: Fixed,
    /// Share of borrow interest withheld from suppliers
    pub reserve_factor: Fixed,
}

/// Utilization and the rates it implies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub utilization: Fixed,
    pub borrow_rate: Fixed,
    pub supply_rate: Fixed,
}

impl Default for RateModel {
    fn default() -> Self {
        Self {
            base_rate: Fixed::from_percent(2),
            optimal_rate: Fixed::from_percent(10),
            max_rate: Fixed::from_percent(50),
            optimal_utilization: Fixed::from_percent(80),
            reserve_factor: Fixed::ZERO,
        }
    }
}

/// `total_borrowed / total_collateral`, clamped to `[0, 1]`; zero for an empty pool
pub fn utilization(total_borrowed: u64, total_collateral: u64) -> Fixed {
    if total_collateral == 0 {
        return Fixed::ZERO;
    }
    Fixed::from_ratio(total_borrowed as u128, total_collateral as u128)
        .map(|u| u.min(Fixed::ONE))
        .unwrap_or(Fixed::ONE)
}

impl RateModel {
    /// Reject curves that would not be monotonic or that divide by zero
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.base_rate > self.optimal_rate || self.optimal_rate > self.max_rate {
            return Err(LendingError::InvalidParameter(format!(
                "rates must satisfy base <= optimal <= max (got {} / {} / {})",
                self.base_rate, self.optimal_rate, self.max_rate
            )));
        }
        if self.optimal_utilization.is_zero() || self.optimal_utilization > Fixed::ONE {
            return Err(LendingError::InvalidParameter(format!(
                "optimal utilization must be in (0, 1], got {}",
                self.optimal_utilization
            )));
        }
        if self.reserve_factor > Fixed::ONE {
            return Err(LendingError::InvalidParameter(format!(
                "reserve factor must be <= 1, got {}",
                self.reserve_factor
            )));
        }
        Ok(())
    }

    /// Annual borrow rate at `utilization`
    pub fn borrow_rate(&self, utilization: Fixed) -> Result<Fixed, MathError> {
        let u = utilization.min(Fixed::ONE);

        if u <= self.optimal_utilization {
            if u.is_zero() {
                return Ok(self.base_rate);
            }
            let slope = self.optimal_rate.checked_sub(self.base_rate)?;
            let step = mul_div_floor(u.raw(), slope.raw(), self.optimal_utilization.raw())?;
            self.base_rate.checked_add(Fixed::from_raw(step))
        } else {
            let excess = u.checked_sub(self.optimal_utilization)?;
            let span = Fixed::ONE.checked_sub(self.optimal_utilization)?;
            let slope = self.max_rate.checked_sub(self.optimal_rate)?;
            let step = mul_div_floor(excess.raw(), slope.raw(), span.raw())?;
            self.optimal_rate.checked_add(Fixed::from_raw(step))
        }
    }

    /// Annual supply rate: `borrow_rate × utilization × (1 - reserve_factor)`
    pub fn supply_rate(&self, utilization: Fixed, borrow_rate: Fixed) -> Result<Fixed, MathError> {
        let u = utilization.min(Fixed::ONE);
        let kept = Fixed::ONE.saturating_sub(self.reserve_factor);
        borrow_rate.mul_floor(u)?.mul_floor(kept)
    }

    /// Both rates at `utilization`
    pub fn rate(&self, utilization: Fixed) -> Result<RateSnapshot, MathError> {
        let utilization = utilization.min(Fixed::ONE);
        let borrow_rate = self.borrow_rate(utilization)?;
        let supply_rate = self.supply_rate(utilization, borrow_rate)?;
        Ok(RateSnapshot {
            utilization,
            borrow_rate,
            supply_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_utilization() {
        let model = RateModel::default();
        let snapshot = model.rate(utilization(0, 0)).unwrap();

        assert_eq!(snapshot.utilization, Fixed::ZERO);
        assert_eq!(snapshot.borrow_rate, Fixed::from_percent(2));
        assert_eq!(snapshot.supply_rate, Fixed::ZERO);
    }

    #[test]
    fn test_below_kink() {
        let model = RateModel::default();
        // 40% utilization: 2% + (40/80) * 8% = 6%
        let rate = model.borrow_rate(utilization(40, 100)).unwrap();
        assert_eq!(rate, Fixed::from_percent(6));
        assert!(rate > Fixed::from_percent(2) && rate < Fixed::from_percent(10));
    }

    #[test]
    fn test_kink_and_above() {
        let model = RateModel::default();
        assert_eq!(
            model.borrow_rate(Fixed::from_percent(80)).unwrap(),
            Fixed::from_percent(10)
        );
        // 90%: 10% + (10/20) * 40% = 30%
        assert_eq!(
            model.borrow_rate(Fixed::from_percent(90)).unwrap(),
            Fixed::from_percent(30)
        );
        assert_eq!(model.borrow_rate(Fixed::ONE).unwrap(), Fixed::from_percent(50));
    }

    #[test]
    fn test_utilization_clamped() {
        assert_eq!(utilization(150, 100), Fixed::ONE);
        let model = RateModel::default();
        assert_eq!(
            model.borrow_rate(Fixed::from_percent(300)).unwrap(),
            Fixed::from_percent(50)
        );
    }

    #[test]
    fn test_supply_rate_with_reserve() {
        let model = RateModel {
            reserve_factor: Fixed::from_percent(10),
            ..RateModel::default()
        };
        // 50% utilization: borrow 7%, supply 7% * 0.5 * 0.9 = 3.15%
        let snapshot = model.rate(Fixed::from_percent(50)).unwrap();
        assert_eq!(snapshot.borrow_rate, Fixed::from_percent(7));
        assert_eq!(snapshot.supply_rate, Fixed::from_bps(315));
    }

    #[test]
    fn test_full_optimal_utilization_curve() {
        let model = RateModel {
            optimal_utilization: Fixed::ONE,
            ..RateModel::default()
        };
        model.validate().unwrap();
        assert_eq!(model.borrow_rate(Fixed::ONE).unwrap(), Fixed::from_percent(10));
    }

    #[test]
    fn test_validate_rejects_inverted_curve() {
        let model = RateModel {
            base_rate: Fixed::from_percent(20),
            ..RateModel::default()
        };
        assert!(matches!(
            model.validate(),
            Err(LendingError::InvalidParameter(_))
        ));

        let model = RateModel {
            optimal_utilization: Fixed::ZERO,
            ..RateModel::default()
        };
        assert!(model.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_borrow_rate_monotonic(a in 0u64..=1_000_000, b in 0u64..=1_000_000) {
            let model = RateModel::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let u_lo = Fixed::from_ratio(lo as u128, 1_000_000).unwrap();
            let u_hi = Fixed::from_ratio(hi as u128, 1_000_000).unwrap();

            let r_lo = model.rate(u_lo).unwrap();
            let r_hi = model.rate(u_hi).unwrap();
            prop_assert!(r_lo.borrow_rate <= r_hi.borrow_rate);
            prop_assert!(r_lo.supply_rate <= r_hi.supply_rate);
        }

        #[test]
        fn prop_rate_within_curve_bounds(u in 0u64..=2_000_000) {
            let model = RateModel::default();
            let rate = model.borrow_rate(Fixed::from_ratio(u as u128, 1_000_000).unwrap()).unwrap();
            prop_assert!(rate >= model.base_rate && rate <= model.max_rate);
        }
    }
}

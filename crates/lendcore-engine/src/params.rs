//! Protocol parameters and admin updates

use crate::rates::RateModel;
use lendcore_common::{
    Fixed, LendingError, DEFAULT_ASSET, DEFAULT_COLLATERAL_RATIO_PERCENT,
    DEFAULT_LIQUIDATION_BONUS_PERCENT, DEFAULT_LIQUIDATION_THRESHOLD, DEFAULT_MIN_HEALTH_FACTOR,
    DEFAULT_PERIODS_PER_YEAR,
};
use serde::{Deserialize, Serialize};

/// Collateralization and liquidation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Maximum debt as a share of collateral (LTV)
    pub collateral_ratio: Fixed,
    /// Health factor a withdrawal must leave behind, in percent
    pub min_health_factor: u64,
    /// Health factor below which a position is liquidatable, in percent
    pub liquidation_threshold: u64,
    /// Liquidator premium on seized collateral
    pub liquidation_bonus: Fixed,
    /// Accrual periods (heights) per year
    pub periods_per_year: u64,
    /// Price feed symbol of the collateral asset
    pub collateral_asset: String,
    /// Price feed symbol of the borrowed asset
    pub borrow_asset: String,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            collateral_ratio: Fixed::from_percent(DEFAULT_COLLATERAL_RATIO_PERCENT),
            min_health_factor: DEFAULT_MIN_HEALTH_FACTOR,
            liquidation_threshold: DEFAULT_LIQUIDATION_THRESHOLD,
            liquidation_bonus: Fixed::from_percent(DEFAULT_LIQUIDATION_BONUS_PERCENT),
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            collateral_asset: DEFAULT_ASSET.to_string(),
            borrow_asset: DEFAULT_ASSET.to_string(),
        }
    }
}

impl RiskParams {
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.collateral_ratio.is_zero() || self.collateral_ratio > Fixed::ONE {
            return Err(invalid(format!(
                "collateral ratio must be in (0, 1], got {}",
                self.collateral_ratio
            )));
        }
        if self.liquidation_threshold == 0 {
            return Err(invalid("liquidation threshold must be positive".to_string()));
        }
        if self.liquidation_threshold > self.min_health_factor {
            return Err(invalid(format!(
                "liquidation threshold {}% exceeds minimum health factor {}%",
                self.liquidation_threshold, self.min_health_factor
            )));
        }
        if self.liquidation_bonus > Fixed::ONE {
            return Err(invalid(format!(
                "liquidation bonus must be <= 1, got {}",
                self.liquidation_bonus
            )));
        }
        if self.periods_per_year == 0 {
            return Err(invalid("periods per year must be positive".to_string()));
        }
        if self.collateral_asset.is_empty() || self.borrow_asset.is_empty() {
            return Err(invalid("asset symbols must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Every admin-mutable parameter of a pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    pub rates: RateModel,
    pub risk: RiskParams,
}

impl ProtocolParams {
    pub fn validate(&self) -> Result<(), LendingError> {
        self.rates.validate()?;
        self.risk.validate()
    }

    /// Copy of these parameters with `update` applied and validated
    pub fn with_update(&self, update: &ParameterUpdate) -> Result<Self, LendingError> {
        let mut next = self.clone();
        match update {
            ParameterUpdate::RateModel(model) => next.rates = *model,
            ParameterUpdate::ReserveFactor(factor) => next.rates.reserve_factor = *factor,
            ParameterUpdate::CollateralRatio(ratio) => next.risk.collateral_ratio = *ratio,
            ParameterUpdate::MinHealthFactor(percent) => next.risk.min_health_factor = *percent,
            ParameterUpdate::LiquidationThreshold(percent) => {
                next.risk.liquidation_threshold = *percent
            }
            ParameterUpdate::LiquidationBonus(bonus) => next.risk.liquidation_bonus = *bonus,
        }
        next.validate()?;
        Ok(next)
    }
}

/// A single named parameter change requested by the administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "parameter", content = "value", rename_all = "snake_case")]
pub enum ParameterUpdate {
    RateModel(RateModel),
    ReserveFactor(Fixed),
    CollateralRatio(Fixed),
    MinHealthFactor(u64),
    LiquidationThreshold(u64),
    LiquidationBonus(Fixed),
}

impl ParameterUpdate {
    /// Short name used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            ParameterUpdate::RateModel(_) => "rate_model",
            ParameterUpdate::ReserveFactor(_) => "reserve_factor",
            ParameterUpdate::CollateralRatio(_) => "collateral_ratio",
            ParameterUpdate::MinHealthFactor(_) => "min_health_factor",
            ParameterUpdate::LiquidationThreshold(_) => "liquidation_threshold",
            ParameterUpdate::LiquidationBonus(_) => "liquidation_bonus",
        }
    }
}

fn invalid(reason: String) -> LendingError {
    LendingError::InvalidParameter(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = ProtocolParams::default();
        params.validate().unwrap();
        assert_eq!(params.risk.collateral_ratio, Fixed::from_percent(75));
        assert_eq!(params.risk.min_health_factor, 120);
    }

    #[test]
    fn test_update_applies() {
        let params = ProtocolParams::default();
        let next = params
            .with_update(&ParameterUpdate::LiquidationThreshold(100))
            .unwrap();
        assert_eq!(next.risk.liquidation_threshold, 100);
        assert_eq!(params.risk.liquidation_threshold, 120);
    }

    #[test]
    fn test_update_rejects_invalid() {
        let params = ProtocolParams::default();
        assert!(params
            .with_update(&ParameterUpdate::CollateralRatio(Fixed::from_percent(120)))
            .is_err());
        assert!(params
            .with_update(&ParameterUpdate::LiquidationThreshold(150))
            .is_err());
        assert!(params
            .with_update(&ParameterUpdate::ReserveFactor(Fixed::from_percent(101)))
            .is_err());
    }

    #[test]
    fn test_update_serde_shape() {
        let update = ParameterUpdate::MinHealthFactor(130);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["parameter"], "min_health_factor");
        assert_eq!(json["value"], 130);
    }
}

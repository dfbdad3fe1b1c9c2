//! LendCore configuration
//!
//! Defaults, then an optional file, then `LENDCORE__*` environment variables
//! (for example `LENDCORE__RISK__MIN_HEALTH_FACTOR=130`). Percentages are
//! decimals where `2.5` means 2.5%.

use crate::params::{ProtocolParams, RiskParams};
use crate::rates::RateModel;
use config::{Config, Environment, File};
use lendcore_common::{
    Fixed, LendCoreError, LendingError, MathError, Result, DEFAULT_ASSET,
    DEFAULT_COLLATERAL_RATIO_PERCENT, DEFAULT_LIQUIDATION_BONUS_PERCENT,
    DEFAULT_LIQUIDATION_THRESHOLD, DEFAULT_MIN_HEALTH_FACTOR, DEFAULT_PERIODS_PER_YEAR,
};
use lendcore_oracle::DEFAULT_MAX_PRICE_AGE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "LENDCORE";

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Account allowed to change parameters
    pub admin: String,
    /// Rate curve settings
    pub rates: RateSettings,
    /// Collateral and liquidation settings
    pub risk: RiskSettings,
    /// Reference price feed settings
    pub oracle: OracleSettings,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            admin: "deployer".to_string(),
            rates: RateSettings::default(),
            risk: RiskSettings::default(),
            oracle: OracleSettings::default(),
        }
    }
}

/// Rate curve, in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    pub base_rate: Decimal,
    pub optimal_rate: Decimal,
    pub max_rate: Decimal,
    pub optimal_utilization: Decimal,
    pub reserve_factor: Decimal,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            base_rate: Decimal::from(2),
            optimal_rate: Decimal::from(10),
            max_rate: Decimal::from(50),
            optimal_utilization: Decimal::from(80),
            reserve_factor: Decimal::ZERO,
        }
    }
}

/// Collateral and liquidation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSettings {
    /// Loan-to-value, in percent
    pub collateral_ratio: Decimal,
    /// Health factor floor for withdrawals, in percent
    pub min_health_factor: u64,
    /// Health factor below which positions are liquidatable, in percent
    pub liquidation_threshold: u64,
    /// Liquidator premium, in percent
    pub liquidation_bonus: Decimal,
    pub periods_per_year: u64,
    pub collateral_asset: String,
    pub borrow_asset: String,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            collateral_ratio: Decimal::from(DEFAULT_COLLATERAL_RATIO_PERCENT),
            min_health_factor: DEFAULT_MIN_HEALTH_FACTOR,
            liquidation_threshold: DEFAULT_LIQUIDATION_THRESHOLD,
            liquidation_bonus: Decimal::from(DEFAULT_LIQUIDATION_BONUS_PERCENT),
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            collateral_asset: DEFAULT_ASSET.to_string(),
            borrow_asset: DEFAULT_ASSET.to_string(),
        }
    }
}

/// Reference price feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Heights after which a price is stale
    pub max_price_age: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            max_price_age: DEFAULT_MAX_PRICE_AGE,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let cfg: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Convert to engine parameters, enforcing every parameter rule
    pub fn to_params(&self) -> std::result::Result<ProtocolParams, LendingError> {
        let rates = RateModel {
            base_rate: percent("rates.base_rate", self.rates.base_rate)?,
            optimal_rate: percent("rates.optimal_rate", self.rates.optimal_rate)?,
            max_rate: percent("rates.max_rate", self.rates.max_rate)?,
            optimal_utilization: percent(
                "rates.optimal_utilization",
                self.rates.optimal_utilization,
            )?,
            reserve_factor: percent("rates.reserve_factor", self.rates.reserve_factor)?,
        };
        let risk = RiskParams {
            collateral_ratio: percent("risk.collateral_ratio", self.risk.collateral_ratio)?,
            min_health_factor: self.risk.min_health_factor,
            liquidation_threshold: self.risk.liquidation_threshold,
            liquidation_bonus: percent("risk.liquidation_bonus", self.risk.liquidation_bonus)?,
            periods_per_year: self.risk.periods_per_year,
            collateral_asset: self.risk.collateral_asset.clone(),
            borrow_asset: self.risk.borrow_asset.clone(),
        };
        let params = ProtocolParams { rates, risk };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.admin.is_empty() {
            return Err(LendCoreError::Config("admin must not be empty".to_string()));
        }
        if self.oracle.max_price_age == 0 {
            return Err(LendCoreError::Config(
                "oracle.max_price_age must be positive".to_string(),
            ));
        }
        self.to_params()?;
        Ok(())
    }
}

fn percent(name: &str, value: Decimal) -> std::result::Result<Fixed, LendingError> {
    Fixed::from_percent_decimal(value).map_err(|err| match err {
        MathError::Negative => LendingError::InvalidParameter(format!("{name} must not be negative")),
        other => LendingError::InvalidParameter(format!("{name}: {other}")),
    })
}

fn config_error(err: config::ConfigError) -> LendCoreError {
    LendCoreError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_params() {
        let params = ProtocolConfig::default().to_params().unwrap();
        assert_eq!(params, ProtocolParams::default());
    }

    #[test]
    fn test_fractional_percentages() {
        let mut cfg = ProtocolConfig::default();
        cfg.rates.base_rate = dec!(2.5);
        cfg.risk.liquidation_bonus = dec!(7.25);

        let params = cfg.to_params().unwrap();
        assert_eq!(params.rates.base_rate, Fixed::from_bps(250));
        assert_eq!(params.risk.liquidation_bonus, Fixed::from_bps(725));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut cfg = ProtocolConfig::default();
        cfg.rates.base_rate = dec!(-1);
        assert!(matches!(
            cfg.to_params(),
            Err(LendingError::InvalidParameter(_))
        ));

        let mut cfg = ProtocolConfig::default();
        cfg.risk.collateral_ratio = dec!(150);
        assert!(cfg.validate().is_err());

        let mut cfg = ProtocolConfig::default();
        cfg.oracle.max_price_age = 0;
        assert!(matches!(cfg.validate(), Err(LendCoreError::Config(_))));
    }

    #[test]
    fn test_load_defaults() {
        let cfg = ProtocolConfig::load(None).unwrap();
        assert_eq!(cfg.risk.periods_per_year, 52_560);
        assert_eq!(cfg.oracle.max_price_age, 150);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = ProtocolConfig::load(Some("/nonexistent/lendcore.toml"));
        assert!(matches!(result, Err(LendCoreError::Config(_))));
    }
}

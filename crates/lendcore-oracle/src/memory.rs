//! In-memory price feed
//!
//! Holds one price per registered asset together with the height it was written
//! at. A price older than `max_age` heights is reported as stale. Writes are
//! restricted to authorized updaters; asset registration, updater management and
//! the emergency pause are restricted to the feed admin.

use crate::feed::PriceFeed;
use crate::DEFAULT_MAX_PRICE_AGE;
use dashmap::DashMap;
use lendcore_common::{AccountId, Fixed, PriceError, DEFAULT_ASSET};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from feed administration and price updates
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Caller {0} is not authorized")]
    Unauthorized(AccountId),

    #[error("Asset not supported: {0}")]
    UnsupportedAsset(String),

    #[error("Asset already registered: {0}")]
    AssetExists(String),

    #[error("Price {price} outside bounds [{min}, {max}]")]
    PriceOutOfBounds { price: Fixed, min: Fixed, max: Fixed },

    #[error("Invalid asset bounds: min {min} > max {max}")]
    InvalidBounds { min: Fixed, max: Fixed },
}

/// Registration data for a supported asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub symbol: String,
    /// Lowest accepted price
    pub min_price: Fixed,
    /// Highest accepted price
    pub max_price: Fixed,
    pub decimals: u8,
}

/// Latest price written for an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub price: Fixed,
    pub updated_at: u64,
    /// Free-form origin tag supplied by the updater
    pub source: String,
}

/// Price feed backed by concurrent in-memory maps
pub struct InMemoryPriceFeed {
    admin: AccountId,
    assets: DashMap<String, AssetConfig>,
    prices: DashMap<String, PriceEntry>,
    updaters: RwLock<HashSet<AccountId>>,
    paused: AtomicBool,
    current_height: AtomicU64,
    max_age: u64,
}

impl InMemoryPriceFeed {
    /// Create an empty feed administered by `admin`
    pub fn new(admin: AccountId, max_age: u64) -> Self {
        Self {
            admin,
            assets: DashMap::new(),
            prices: DashMap::new(),
            updaters: RwLock::new(HashSet::new()),
            paused: AtomicBool::new(false),
            current_height: AtomicU64::new(0),
            max_age,
        }
    }

    /// Feed with the default asset registered at a price of 1.0
    pub fn with_default_asset(admin: AccountId) -> Self {
        let feed = Self::new(admin, DEFAULT_MAX_PRICE_AGE);
        let config = AssetConfig {
            symbol: DEFAULT_ASSET.to_string(),
            min_price: Fixed::from_percent(1),
            max_price: Fixed::from_percent(100_000),
            decimals: 6,
        };
        feed.prices.insert(
            config.symbol.clone(),
            PriceEntry {
                price: Fixed::ONE,
                updated_at: 0,
                source: "genesis".to_string(),
            },
        );
        feed.assets.insert(config.symbol.clone(), config);
        feed
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), OracleError> {
        if caller != &self.admin {
            warn!(caller = %caller, "Rejected admin call on price feed");
            return Err(OracleError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    /// Register a new asset with price bounds and an initial price
    pub fn add_asset(
        &self,
        caller: &AccountId,
        config: AssetConfig,
        initial_price: Fixed,
    ) -> Result<(), OracleError> {
        self.ensure_admin(caller)?;
        if config.min_price > config.max_price {
            return Err(OracleError::InvalidBounds {
                min: config.min_price,
                max: config.max_price,
            });
        }
        if self.assets.contains_key(&config.symbol) {
            return Err(OracleError::AssetExists(config.symbol));
        }
        Self::check_bounds(&config, initial_price)?;

        info!(asset = %config.symbol, price = %initial_price, "Registered asset");
        self.prices.insert(
            config.symbol.clone(),
            PriceEntry {
                price: initial_price,
                updated_at: self.current_height(),
                source: "registration".to_string(),
            },
        );
        self.assets.insert(config.symbol.clone(), config);
        Ok(())
    }

    /// Allow `updater` to write prices
    pub fn authorize_updater(
        &self,
        caller: &AccountId,
        updater: AccountId,
    ) -> Result<(), OracleError> {
        self.ensure_admin(caller)?;
        info!(updater = %updater, "Authorized price updater");
        self.updaters.write().insert(updater);
        Ok(())
    }

    /// Withdraw write access from `updater`
    pub fn revoke_updater(&self, caller: &AccountId, updater: &AccountId) -> Result<(), OracleError> {
        self.ensure_admin(caller)?;
        self.updaters.write().remove(updater);
        Ok(())
    }

    pub fn is_updater(&self, account: &AccountId) -> bool {
        self.updaters.read().contains(account)
    }

    /// Write a new price for a registered asset at the current height
    pub fn update_price(
        &self,
        caller: &AccountId,
        asset: &str,
        price: Fixed,
        source: &str,
    ) -> Result<(), OracleError> {
        if !self.is_updater(caller) {
            warn!(caller = %caller, asset, "Rejected price update from unauthorized caller");
            return Err(OracleError::Unauthorized(caller.clone()));
        }
        let config = self
            .assets
            .get(asset)
            .map(|c| c.clone())
            .ok_or_else(|| OracleError::UnsupportedAsset(asset.to_string()))?;
        Self::check_bounds(&config, price)?;

        self.prices.insert(
            asset.to_string(),
            PriceEntry {
                price,
                updated_at: self.current_height(),
                source: source.to_string(),
            },
        );
        info!(asset, price = %price, source, "Price updated");
        Ok(())
    }

    fn check_bounds(config: &AssetConfig, price: Fixed) -> Result<(), OracleError> {
        if price < config.min_price || price > config.max_price {
            return Err(OracleError::PriceOutOfBounds {
                price,
                min: config.min_price,
                max: config.max_price,
            });
        }
        Ok(())
    }

    /// Emergency switch: while paused, every read fails
    pub fn set_paused(&self, caller: &AccountId, paused: bool) -> Result<(), OracleError> {
        self.ensure_admin(caller)?;
        self.paused.store(paused, Ordering::SeqCst);
        warn!(paused, "Price feed pause toggled");
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Move the feed's clock forward; lower heights are ignored
    pub fn set_height(&self, height: u64) {
        self.current_height.fetch_max(height, Ordering::SeqCst);
    }

    pub fn current_height(&self) -> u64 {
        self.current_height.load(Ordering::SeqCst)
    }

    /// Latest entry for an asset regardless of freshness
    pub fn entry(&self, asset: &str) -> Option<PriceEntry> {
        self.prices.get(asset).map(|e| e.clone())
    }

    pub fn asset(&self, asset: &str) -> Option<AssetConfig> {
        self.assets.get(asset).map(|c| c.clone())
    }
}

impl PriceFeed for InMemoryPriceFeed {
    fn get_price(&self, asset: &str) -> Result<Fixed, PriceError> {
        if self.is_paused() {
            return Err(PriceError::Paused);
        }
        let entry = self
            .prices
            .get(asset)
            .ok_or_else(|| PriceError::UnknownAsset(asset.to_string()))?;

        let current = self.current_height();
        if current.saturating_sub(entry.updated_at) > self.max_age {
            return Err(PriceError::Stale {
                asset: asset.to_string(),
                updated_at: entry.updated_at,
                current,
            });
        }
        Ok(entry.price)
    }
}

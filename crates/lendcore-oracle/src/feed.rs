//! Price feed read contract

use lendcore_common::{Fixed, PriceError};

/// Source of asset prices, quoted as [`Fixed`] in a common unit of account.
///
/// Reads are synchronous; any fetching is done by the feed before the core asks.
pub trait PriceFeed: Send + Sync {
    /// Current price of `asset`, or why it cannot be used
    fn get_price(&self, asset: &str) -> Result<Fixed, PriceError>;

    /// Whether `asset` has a usable price right now
    fn is_fresh(&self, asset: &str) -> bool {
        self.get_price(asset).is_ok()
    }
}

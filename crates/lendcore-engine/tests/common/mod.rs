//! Shared harness for engine integration tests

#![allow(dead_code)]

use lendcore_common::{AccountId, Fixed};
use lendcore_engine::{LendingPool, ProtocolParams};
use lendcore_oracle::InMemoryPriceFeed;
use std::sync::Arc;

pub const ADMIN: &str = "deployer";
pub const ORACLE: &str = "oracle-1";

/// Pool plus the feed backing it
pub struct TestHarness {
    pub pool: LendingPool,
    pub feed: Arc<InMemoryPriceFeed>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_params(ProtocolParams::default())
    }

    pub fn with_params(params: ProtocolParams) -> Self {
        let feed = Arc::new(InMemoryPriceFeed::with_default_asset(admin()));
        feed.authorize_updater(&admin(), AccountId::new(ORACLE))
            .expect("admin authorizes oracle");
        let pool = LendingPool::new(admin(), params, feed.clone()).expect("valid params");
        Self { pool, feed }
    }

    /// Advance both the pool clock and the feed clock
    pub fn advance_to(&self, height: u64) {
        self.pool.advance_to(height).expect("clock moves forward");
        self.feed.set_height(height);
    }

    pub fn set_price(&self, asset: &str, price: Fixed) {
        self.feed
            .update_price(&AccountId::new(ORACLE), asset, price, "TEST")
            .expect("price update");
    }

    /// Deposit then borrow for `account`
    pub fn open(&self, account: &AccountId, collateral: u64, debt: u64) {
        self.pool.deposit(account, collateral).expect("deposit");
        if debt > 0 {
            self.pool.borrow(account, debt).expect("borrow");
        }
    }

    /// Pool totals must equal the sums over positions
    pub fn assert_aggregates(&self) {
        let state = self.pool.pool_state();
        let (collateral, borrowed) = self
            .pool
            .positions()
            .iter()
            .fold((0u128, 0u128), |(c, b), (_, p)| {
                (c + p.collateral as u128, b + p.principal_borrowed as u128)
            });
        assert_eq!(state.total_collateral as u128, collateral);
        assert_eq!(state.total_borrowed as u128, borrowed);
    }
}

pub fn admin() -> AccountId {
    AccountId::new(ADMIN)
}

pub fn wallet(n: u32) -> AccountId {
    AccountId::new(format!("wallet_{n}"))
}

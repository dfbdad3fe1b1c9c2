//! Lending pool
//!
//! [`LendingPool`] owns all mutable protocol state behind one lock. Every
//! mutating call follows the same shape:
//!
//! 1. copy the pool singleton and accrue it to the current height
//! 2. load (or open) the touched position as a copy
//! 3. validate and mutate the copies
//! 4. on success, commit both and bump the pool version
//!
//! A rejected call therefore leaves no trace in the ledger, the pool or the
//! liquidation log.

use crate::ledger::{self, PositionLedger};
use crate::liquidation::{self, LiquidationLog};
use crate::metrics::PoolMetrics;
use crate::operations;
use crate::params::{ParameterUpdate, ProtocolParams};
use crate::rates::{GlobalPool, RateSnapshot};
use lendcore_common::{
    AccountId, Fixed, HealthFactor, LendingError, LiquidationOutcome, LiquidationQuote,
    LiquidationRecord, LiquidationStats, Position, PriceError,
};
use lendcore_oracle::PriceFeed;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Aggregate view of the pool at the current height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_collateral: u64,
    pub total_borrowed: u64,
    pub available_liquidity: u64,
    pub utilization: Fixed,
    pub borrow_rate: Fixed,
    pub supply_rate: Fixed,
    pub interest_index: Fixed,
    pub height: u64,
}

struct PoolState {
    pool: GlobalPool,
    ledger: PositionLedger,
    liquidations: LiquidationLog,
    params: ProtocolParams,
    admin: AccountId,
    height: u64,
}

impl PoolState {
    /// Pool singleton accrued to the current height, as a copy
    fn accrued(&self) -> Result<GlobalPool, LendingError> {
        let mut pool = self.pool;
        pool.accrue(
            &self.params.rates,
            self.height,
            self.params.risk.periods_per_year,
        )?;
        Ok(pool)
    }

    fn commit(&mut self, mut pool: GlobalPool, account: AccountId, position: Position) {
        pool.version += 1;
        self.pool = pool;
        self.ledger.put(account, position);
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), LendingError> {
        if caller != &self.admin {
            return Err(LendingError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }
}

/// Collateralized lending pool over a single collateral and borrow asset
pub struct LendingPool {
    state: Mutex<PoolState>,
    price_feed: Arc<dyn PriceFeed>,
    metrics: Option<Arc<PoolMetrics>>,
}

impl LendingPool {
    /// Create an empty pool at height 0
    pub fn new(
        admin: AccountId,
        params: ProtocolParams,
        price_feed: Arc<dyn PriceFeed>,
    ) -> Result<Self, LendingError> {
        Self::at_height(admin, params, price_feed, 0)
    }

    /// Create an empty pool whose clock starts at `height`
    pub fn at_height(
        admin: AccountId,
        params: ProtocolParams,
        price_feed: Arc<dyn PriceFeed>,
        height: u64,
    ) -> Result<Self, LendingError> {
        params.validate()?;
        info!(admin = %admin, height, "Creating lending pool");
        Ok(Self {
            state: Mutex::new(PoolState {
                pool: GlobalPool::genesis(height),
                ledger: PositionLedger::new(),
                liquidations: LiquidationLog::new(),
                params,
                admin,
                height,
            }),
            price_feed,
            metrics: None,
        })
    }

    /// Attach Prometheus metrics
    pub fn with_metrics(mut self, metrics: Arc<PoolMetrics>) -> Self {
        metrics.observe_pool(&self.state.lock().pool);
        self.metrics = Some(metrics);
        self
    }

    fn observe<T>(&self, operation: &str, result: &Result<T, LendingError>, pool: GlobalPool) {
        match result {
            Ok(_) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(operation, &pool);
                }
            }
            Err(err) => {
                warn!(operation, error = %err, code = err.code(), "Operation rejected");
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejection(operation, err);
                }
            }
        }
    }

    // ===== Clock =====

    /// Move the logical clock forward. Accrual happens lazily on the next call.
    pub fn advance_to(&self, height: u64) -> Result<(), LendingError> {
        let mut state = self.state.lock();
        if height < state.height {
            return Err(LendingError::HeightRegression {
                current: state.height,
                requested: height,
            });
        }
        state.height = height;
        Ok(())
    }

    pub fn height(&self) -> u64 {
        self.state.lock().height
    }

    // ===== Lending operations =====

    #[instrument(skip(self), fields(account = %account))]
    pub fn deposit(&self, account: &AccountId, amount: u64) -> Result<(), LendingError> {
        let mut state = self.state.lock();
        let result = (|| -> Result<(), LendingError> {
            let mut pool = state.accrued()?;
            let mut position = state.ledger.load_or_open(account, &pool);
            operations::deposit(&mut pool, &mut position, amount)?;
            state.commit(pool, account.clone(), position);
            Ok(())
        })();

        if result.is_ok() {
            info!(amount, total_collateral = state.pool.total_collateral, "Deposit committed");
        }
        self.observe("deposit", &result, state.pool);
        result
    }

    #[instrument(skip(self), fields(account = %account))]
    pub fn borrow(&self, account: &AccountId, amount: u64) -> Result<(), LendingError> {
        let mut state = self.state.lock();
        let result = (|| -> Result<u64, LendingError> {
            let mut pool = state.accrued()?;
            let mut position = state.ledger.load_or_open(account, &pool);
            let debt = operations::borrow(&mut pool, &mut position, amount, &state.params.risk)?;
            state.commit(pool, account.clone(), position);
            Ok(debt)
        })();

        if let Ok(debt) = &result {
            info!(amount, debt = *debt, "Borrow committed");
        }
        self.observe("borrow", &result, state.pool);
        result.map(|_| ())
    }

    /// Repay up to `amount` of debt; returns the amount actually applied
    #[instrument(skip(self), fields(account = %account))]
    pub fn repay(&self, account: &AccountId, amount: u64) -> Result<u64, LendingError> {
        let mut state = self.state.lock();
        let result = (|| -> Result<u64, LendingError> {
            let mut pool = state.accrued()?;
            let mut position = state.ledger.load_or_open(account, &pool);
            let applied = operations::repay(&mut pool, &mut position, amount)?;
            state.commit(pool, account.clone(), position);
            Ok(applied)
        })();

        if let Ok(applied) = &result {
            info!(amount, applied = *applied, "Repay committed");
        }
        self.observe("repay", &result, state.pool);
        result
    }

    #[instrument(skip(self), fields(account = %account))]
    pub fn withdraw(&self, account: &AccountId, amount: u64) -> Result<(), LendingError> {
        let mut state = self.state.lock();
        let result = (|| -> Result<(), LendingError> {
            let mut pool = state.accrued()?;
            let mut position = state.ledger.load_or_open(account, &pool);
            operations::withdraw(&mut pool, &mut position, amount, &state.params.risk)?;
            state.commit(pool, account.clone(), position);
            Ok(())
        })();

        if result.is_ok() {
            info!(amount, total_collateral = state.pool.total_collateral, "Withdraw committed");
        }
        self.observe("withdraw", &result, state.pool);
        result
    }

    // ===== Liquidation =====

    fn quote_for(
        &self,
        state: &PoolState,
        pool: &GlobalPool,
        account: &AccountId,
        position: &Position,
    ) -> Result<LiquidationQuote, LendingError> {
        let risk = &state.params.risk;
        let debt = ledger::current_debt(pool, position)?;
        let health = HealthFactor::from_balances(position.collateral, debt, risk.collateral_ratio)?;
        if !liquidation::is_liquidatable(health, risk) {
            return Err(LendingError::NotLiquidatable {
                account: account.to_string(),
            });
        }

        let borrow_price = self.usable_price(&risk.borrow_asset)?;
        let collateral_price = self.usable_price(&risk.collateral_asset)?;
        liquidation::quote(debt, risk, borrow_price, collateral_price)
    }

    /// A zero price cannot value either side of a liquidation
    fn usable_price(&self, asset: &str) -> Result<Fixed, PriceError> {
        let price = self.price_feed.get_price(asset)?;
        if price.is_zero() {
            return Err(PriceError::Zero(asset.to_string()));
        }
        Ok(price)
    }

    /// Repay part of an unhealthy position's debt in exchange for its collateral
    #[instrument(skip(self), fields(liquidator = %liquidator, account = %account))]
    pub fn liquidate(
        &self,
        liquidator: &AccountId,
        account: &AccountId,
        repay_amount: u64,
    ) -> Result<LiquidationOutcome, LendingError> {
        let mut state = self.state.lock();
        let result = (|| -> Result<LiquidationOutcome, LendingError> {
            let mut pool = state.accrued()?;
            if repay_amount == 0 {
                return Err(LendingError::InvalidAmount);
            }
            let mut position = state.ledger.get(account).ok_or_else(|| {
                LendingError::NotLiquidatable {
                    account: account.to_string(),
                }
            })?;

            let quote = self.quote_for(&state, &pool, account, &position)?;
            let collateral_seized = liquidation::seize_amount(&quote, repay_amount)?;

            let debt = pool.settle_position(&mut position)?;
            liquidation::apply(&mut pool, &mut position, debt, repay_amount, collateral_seized)?;

            let height = pool.last_accrual_height;
            state.commit(pool, account.clone(), position);
            let liquidation_id = state.liquidations.append(
                liquidator.clone(),
                account.clone(),
                collateral_seized,
                repay_amount,
                height,
            );
            Ok(LiquidationOutcome {
                collateral_seized,
                debt_repaid: repay_amount,
                liquidation_id,
            })
        })();

        if let Ok(outcome) = &result {
            info!(
                liquidation_id = outcome.liquidation_id,
                debt_repaid = outcome.debt_repaid,
                collateral_seized = outcome.collateral_seized,
                "Liquidation executed"
            );
            if let Some(metrics) = &self.metrics {
                metrics.liquidations_total.inc();
            }
        }
        self.observe("liquidate", &result, state.pool);
        result
    }

    /// Amounts a liquidator may act on right now
    pub fn compute_liquidation(&self, account: &AccountId) -> Result<LiquidationQuote, LendingError> {
        let state = self.state.lock();
        let pool = state.accrued()?;
        let position = state
            .ledger
            .get(account)
            .ok_or_else(|| LendingError::NotLiquidatable {
                account: account.to_string(),
            })?;
        self.quote_for(&state, &pool, account, &position)
    }

    pub fn is_liquidatable(&self, account: &AccountId) -> Result<bool, LendingError> {
        let state = self.state.lock();
        let health = Self::health_of(&state, account)?;
        Ok(liquidation::is_liquidatable(health, &state.params.risk))
    }

    pub fn liquidation_stats(&self) -> LiquidationStats {
        self.state.lock().liquidations.stats()
    }

    pub fn liquidation_history(&self) -> Vec<LiquidationRecord> {
        self.state.lock().liquidations.records().to_vec()
    }

    pub fn liquidation(&self, id: u64) -> Option<LiquidationRecord> {
        self.state.lock().liquidations.get(id).cloned()
    }

    // ===== Reads =====

    /// Stored position; `None` for unknown or fully unwound accounts
    pub fn get_position(&self, account: &AccountId) -> Option<Position> {
        self.state.lock().ledger.get(account)
    }

    /// Debt including interest up to the current height
    pub fn current_debt(&self, account: &AccountId) -> Result<u64, LendingError> {
        let state = self.state.lock();
        let pool = state.accrued()?;
        match state.ledger.get(account) {
            Some(position) => ledger::current_debt(&pool, &position),
            None => Ok(0),
        }
    }

    pub fn get_health_factor(&self, account: &AccountId) -> Result<HealthFactor, LendingError> {
        Self::health_of(&self.state.lock(), account)
    }

    fn health_of(state: &PoolState, account: &AccountId) -> Result<HealthFactor, LendingError> {
        let pool = state.accrued()?;
        match state.ledger.get(account) {
            Some(position) => {
                ledger::health_factor(&pool, &position, state.params.risk.collateral_ratio)
            }
            None => Ok(HealthFactor::NoDebt),
        }
    }

    /// Additional amount the account could borrow right now
    pub fn max_borrow(&self, account: &AccountId) -> Result<u64, LendingError> {
        let state = self.state.lock();
        let pool = state.accrued()?;
        let Some(position) = state.ledger.get(account) else {
            return Ok(0);
        };
        let debt = ledger::current_debt(&pool, &position)?;
        let limit = operations::borrow_limit(&position, &state.params.risk)?;
        Ok(limit.saturating_sub(debt))
    }

    pub fn rates(&self) -> Result<RateSnapshot, LendingError> {
        let state = self.state.lock();
        let pool = state.accrued()?;
        Ok(pool.rates(&state.params.rates)?)
    }

    pub fn pool_stats(&self) -> Result<PoolStats, LendingError> {
        let state = self.state.lock();
        let pool = state.accrued()?;
        let rates = pool.rates(&state.params.rates)?;
        Ok(PoolStats {
            total_collateral: pool.total_collateral,
            total_borrowed: pool.total_borrowed,
            available_liquidity: pool.available_liquidity(),
            utilization: rates.utilization,
            borrow_rate: rates.borrow_rate,
            supply_rate: rates.supply_rate,
            interest_index: pool.interest_index,
            height: state.height,
        })
    }

    /// Committed pool singleton, without projecting accrual
    pub fn pool_state(&self) -> GlobalPool {
        self.state.lock().pool
    }

    pub fn params(&self) -> ProtocolParams {
        self.state.lock().params.clone()
    }

    pub fn admin(&self) -> AccountId {
        self.state.lock().admin.clone()
    }

    /// Snapshot of every stored position
    pub fn positions(&self) -> Vec<(AccountId, Position)> {
        self.state
            .lock()
            .ledger
            .iter()
            .map(|(account, position)| (account.clone(), *position))
            .collect()
    }

    // ===== Administration =====

    /// Change one parameter. Interest up to the current height accrues under
    /// the old parameters.
    #[instrument(skip(self), fields(caller = %caller, parameter = update.name()))]
    pub fn update_parameter(
        &self,
        caller: &AccountId,
        update: ParameterUpdate,
    ) -> Result<(), LendingError> {
        let mut state = self.state.lock();
        let result = (|| -> Result<(), LendingError> {
            state.ensure_admin(caller)?;
            let mut pool = state.accrued()?;
            let params = state.params.with_update(&update)?;
            pool.version += 1;
            state.pool = pool;
            state.params = params;
            Ok(())
        })();

        if result.is_ok() {
            info!(?update, "Parameter updated");
        }
        self.observe("update_parameter", &result, state.pool);
        result
    }

    /// Hand the admin role to `new_admin`
    #[instrument(skip(self), fields(caller = %caller, new_admin = %new_admin))]
    pub fn transfer_admin(
        &self,
        caller: &AccountId,
        new_admin: AccountId,
    ) -> Result<(), LendingError> {
        let mut state = self.state.lock();
        let result = state.ensure_admin(caller);
        if result.is_ok() {
            info!("Admin transferred");
            state.admin = new_admin;
        }
        self.observe("transfer_admin", &result, state.pool);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendcore_oracle::InMemoryPriceFeed;

    fn pool() -> LendingPool {
        let feed = Arc::new(InMemoryPriceFeed::with_default_asset(AccountId::new("deployer")));
        LendingPool::new(AccountId::new("deployer"), ProtocolParams::default(), feed).unwrap()
    }

    #[test]
    fn test_rejected_call_leaves_no_trace() {
        let pool = pool();
        let user = AccountId::new("wallet_1");
        pool.deposit(&user, 10_000_000).unwrap();
        let before = pool.pool_state();

        assert!(pool.borrow(&user, 8_000_000).is_err());
        assert_eq!(pool.pool_state(), before);
        assert_eq!(pool.get_position(&user).unwrap().principal_borrowed, 0);
    }

    #[test]
    fn test_version_bumps_on_commit() {
        let pool = pool();
        let user = AccountId::new("wallet_1");
        assert_eq!(pool.pool_state().version, 0);

        pool.deposit(&user, 100).unwrap();
        pool.withdraw(&user, 50).unwrap();
        assert_eq!(pool.pool_state().version, 2);
        assert!(pool.deposit(&user, 0).is_err());
        assert_eq!(pool.pool_state().version, 2);
    }

    #[test]
    fn test_clock_regression() {
        let pool = pool();
        pool.advance_to(10).unwrap();
        pool.advance_to(10).unwrap();
        assert_eq!(
            pool.advance_to(9),
            Err(LendingError::HeightRegression {
                current: 10,
                requested: 9
            })
        );
        assert_eq!(pool.height(), 10);
    }

    #[test]
    fn test_invalid_params_rejected_at_construction() {
        let feed = Arc::new(InMemoryPriceFeed::with_default_asset(AccountId::new("deployer")));
        let mut params = ProtocolParams::default();
        params.risk.periods_per_year = 0;
        assert!(LendingPool::new(AccountId::new("deployer"), params, feed).is_err());
    }

    #[test]
    fn test_reads_project_accrual_without_committing() {
        let pool = pool();
        let user = AccountId::new("wallet_1");
        pool.deposit(&user, 10_000_000).unwrap();
        pool.borrow(&user, 5_000_000).unwrap();
        let committed = pool.pool_state();

        pool.advance_to(52_560).unwrap();
        assert!(pool.current_debt(&user).unwrap() > 5_000_000);
        assert!(pool.pool_stats().unwrap().interest_index > committed.interest_index);
        assert_eq!(pool.pool_state(), committed);
    }
}

//! Position ledger
//!
//! One [`Position`] per account. Accounts the ledger has never seen, and
//! positions that have been fully unwound, are absent.

use crate::rates::GlobalPool;
use lendcore_common::{AccountId, Fixed, HealthFactor, LendingError, Position};
use std::collections::HashMap;

/// Live debt of `position` at the pool's current index
pub fn current_debt(pool: &GlobalPool, position: &Position) -> Result<u64, LendingError> {
    Ok(position.debt_at(pool.interest_index)?)
}

/// Health factor of `position` at the pool's current index
pub fn health_factor(
    pool: &GlobalPool,
    position: &Position,
    collateral_ratio: Fixed,
) -> Result<HealthFactor, LendingError> {
    let debt = current_debt(pool, position)?;
    Ok(HealthFactor::from_balances(
        position.collateral,
        debt,
        collateral_ratio,
    )?)
}

/// Account to position map
#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    positions: HashMap<AccountId, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account: &AccountId) -> Option<Position> {
        self.positions.get(account).copied()
    }

    /// Stored position, or a fresh one anchored on the pool's index
    pub fn load_or_open(&self, account: &AccountId, pool: &GlobalPool) -> Position {
        self.get(account)
            .unwrap_or_else(|| Position::open(pool.interest_index, pool.last_accrual_height))
    }

    /// Store `position`; an empty position removes the entry
    pub fn put(&mut self, account: AccountId, position: Position) {
        if position.is_empty() {
            self.positions.remove(&account);
        } else {
            self.positions.insert(account, position);
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.positions.iter()
    }
}

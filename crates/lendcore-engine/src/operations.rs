//! Deposit, borrow, repay and withdraw
//!
//! Each function works on a pool whose index has already been accrued to the
//! current height and on the caller's position. The position is settled first,
//! so its principal equals its live debt before any check runs. Callers pass
//! staged copies and commit them only when the function returns `Ok`.

use crate::params::RiskParams;
use crate::rates::GlobalPool;
use lendcore_common::{HealthFactor, LendingError, MathError, Position};

fn ensure_positive(amount: u64) -> Result<(), LendingError> {
    if amount == 0 {
        return Err(LendingError::InvalidAmount);
    }
    Ok(())
}

fn checked_add(a: u64, b: u64) -> Result<u64, LendingError> {
    Ok(a.checked_add(b).ok_or(MathError::Overflow)?)
}

fn checked_sub(a: u64, b: u64) -> Result<u64, LendingError> {
    Ok(a.checked_sub(b).ok_or(MathError::Overflow)?)
}

/// Settle interest and re-anchor the position on the current height
fn settle(pool: &mut GlobalPool, position: &mut Position) -> Result<u64, LendingError> {
    let debt = pool.settle_position(position)?;
    position.touch(pool.last_accrual_height);
    Ok(debt)
}

/// Most the position may owe against its collateral
pub fn borrow_limit(position: &Position, risk: &RiskParams) -> Result<u64, LendingError> {
    Ok(risk.collateral_ratio.apply_floor(position.collateral)?)
}

pub fn deposit(
    pool: &mut GlobalPool,
    position: &mut Position,
    amount: u64,
) -> Result<(), LendingError> {
    ensure_positive(amount)?;
    settle(pool, position)?;

    position.collateral = checked_add(position.collateral, amount)?;
    pool.total_collateral = checked_add(pool.total_collateral, amount)?;
    Ok(())
}

/// Returns the position's debt after borrowing
pub fn borrow(
    pool: &mut GlobalPool,
    position: &mut Position,
    amount: u64,
    risk: &RiskParams,
) -> Result<u64, LendingError> {
    ensure_positive(amount)?;
    let debt = settle(pool, position)?;

    let limit = borrow_limit(position, risk)?;
    let requested = checked_add(debt, amount)?;
    if requested > limit {
        return Err(LendingError::InsufficientCollateral {
            requested,
            allowed: limit,
        });
    }

    position.principal_borrowed = requested;
    pool.total_borrowed = checked_add(pool.total_borrowed, amount)?;
    Ok(requested)
}

/// Returns the amount applied, which is capped at the outstanding debt
pub fn repay(
    pool: &mut GlobalPool,
    position: &mut Position,
    amount: u64,
) -> Result<u64, LendingError> {
    ensure_positive(amount)?;
    let debt = settle(pool, position)?;

    let applied = amount.min(debt);
    position.principal_borrowed = debt - applied;
    pool.total_borrowed = checked_sub(pool.total_borrowed, applied)?;
    Ok(applied)
}

pub fn withdraw(
    pool: &mut GlobalPool,
    position: &mut Position,
    amount: u64,
    risk: &RiskParams,
) -> Result<(), LendingError> {
    ensure_positive(amount)?;
    let debt = settle(pool, position)?;

    if amount > position.collateral {
        return Err(LendingError::InsufficientCollateral {
            requested: amount,
            allowed: position.collateral,
        });
    }
    let remaining = position.collateral - amount;

    if let HealthFactor::Percent(resulting) =
        HealthFactor::from_balances(remaining, debt, risk.collateral_ratio)?
    {
        if resulting < risk.min_health_factor {
            return Err(LendingError::HealthFactorTooLow {
                resulting,
                minimum: risk.min_health_factor,
            });
        }
    }

    position.collateral = remaining;
    pool.total_collateral = checked_sub(pool.total_collateral, amount)?;
    Ok(())
}

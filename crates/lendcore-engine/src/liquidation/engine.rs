//! Liquidation math
//!
//! ```text
//! debt_to_repay       = floor(debt × close_factor)
//! collateral_to_seize = floor(debt_to_repay × (1 + bonus) × borrow_price / collateral_price)
//! collateral_seized   = floor(collateral_to_seize × repay_amount / debt_to_repay)
//! ```

use crate::params::RiskParams;
use crate::rates::GlobalPool;
use lendcore_common::math::{mul_div_floor, to_amount};
use lendcore_common::{
    Fixed, HealthFactor, LendingError, LiquidationQuote, MathError, Position, CLOSE_FACTOR,
    SCALE,
};

/// A position with debt whose health is below the liquidation threshold
pub fn is_liquidatable(health: HealthFactor, risk: &RiskParams) -> bool {
    health.is_below(risk.liquidation_threshold)
}

/// Close-factor-limited repayment and the collateral it releases
pub fn quote(
    debt: u64,
    risk: &RiskParams,
    borrow_price: Fixed,
    collateral_price: Fixed,
) -> Result<LiquidationQuote, LendingError> {
    let debt_to_repay = CLOSE_FACTOR.apply_floor(debt)?;
    let factor = Fixed::ONE.checked_add(risk.liquidation_bonus)?;

    let with_bonus = mul_div_floor(debt_to_repay as u128, factor.raw(), SCALE)?;
    let collateral_to_seize = to_amount(mul_div_floor(
        with_bonus,
        borrow_price.raw(),
        collateral_price.raw(),
    )?)?;

    Ok(LiquidationQuote {
        debt_to_repay,
        collateral_to_seize,
    })
}

/// Collateral released for repaying `repay_amount` of a quote
pub fn seize_amount(quote: &LiquidationQuote, repay_amount: u64) -> Result<u64, LendingError> {
    if repay_amount > quote.debt_to_repay {
        return Err(LendingError::AmountExceedsCloseFactor {
            requested: repay_amount,
            max: quote.debt_to_repay,
        });
    }
    Ok(to_amount(mul_div_floor(
        quote.collateral_to_seize as u128,
        repay_amount as u128,
        quote.debt_to_repay as u128,
    )?)?)
}

/// Apply a validated liquidation to a settled position and the pool totals.
///
/// `debt` must be the position's settled debt.
pub fn apply(
    pool: &mut GlobalPool,
    position: &mut Position,
    debt: u64,
    repay_amount: u64,
    collateral_seized: u64,
) -> Result<(), LendingError> {
    if collateral_seized > position.collateral {
        return Err(LendingError::InsufficientCollateralToSeize {
            required: collateral_seized,
            available: position.collateral,
        });
    }

    position.principal_borrowed = debt.checked_sub(repay_amount).ok_or(MathError::Overflow)?;
    position.collateral -= collateral_seized;
    position.touch(pool.last_accrual_height);

    pool.total_borrowed = pool
        .total_borrowed
        .checked_sub(repay_amount)
        .ok_or(MathError::Overflow)?;
    pool.total_collateral = pool
        .total_collateral
        .checked_sub(collateral_seized)
        .ok_or(MathError::Overflow)?;
    Ok(())
}

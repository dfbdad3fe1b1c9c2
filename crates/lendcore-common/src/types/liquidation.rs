//! Liquidation records, quotes and running statistics

use crate::types::account::AccountId;
use serde::{Deserialize, Serialize};

/// Amounts a liquidator may act on for an unhealthy position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationQuote {
    /// Maximum debt repayable in one call (close factor applied)
    pub debt_to_repay: u64,
    /// Collateral released for repaying all of `debt_to_repay`, bonus included
    pub collateral_to_seize: u64,
}

/// Result of a successful liquidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    pub collateral_seized: u64,
    pub debt_repaid: u64,
    pub liquidation_id: u64,
}

/// Append-only liquidation log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationRecord {
    /// Sequential id, starting at 1
    pub id: u64,
    pub liquidator: AccountId,
    /// Owner of the liquidated position
    pub account: AccountId,
    pub collateral_seized: u64,
    pub debt_repaid: u64,
    pub height: u64,
}

/// Running liquidation totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationStats {
    pub count: u64,
    pub collateral_seized_total: u128,
    pub debt_repaid_total: u128,
}

impl LiquidationStats {
    /// Account for one more liquidation
    pub fn record(&mut self, collateral_seized: u64, debt_repaid: u64) {
        self.count += 1;
        self.collateral_seized_total += collateral_seized as u128;
        self.debt_repaid_total += debt_repaid as u128;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut stats = LiquidationStats::default();
        stats.record(3_885_000, 3_700_000);
        stats.record(100, 50);

        assert_eq!(stats.count, 2);
        assert_eq!(stats.collateral_seized_total, 3_885_100);
        assert_eq!(stats.debt_repaid_total, 3_700_050);
    }
}

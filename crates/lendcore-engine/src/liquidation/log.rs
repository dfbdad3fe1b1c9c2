//! Append-only liquidation log

use lendcore_common::{AccountId, LiquidationRecord, LiquidationStats};

/// Every liquidation ever executed, with running totals
#[derive(Debug, Clone)]
pub struct LiquidationLog {
    records: Vec<LiquidationRecord>,
    stats: LiquidationStats,
    next_id: u64,
}

impl Default for LiquidationLog {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            stats: LiquidationStats::default(),
            next_id: 1,
        }
    }
}

impl LiquidationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and update the totals; returns the record's id
    pub fn append(
        &mut self,
        liquidator: AccountId,
        account: AccountId,
        collateral_seized: u64,
        debt_repaid: u64,
        height: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(LiquidationRecord {
            id,
            liquidator,
            account,
            collateral_seized,
            debt_repaid,
            height,
        });
        self.stats.record(collateral_seized, debt_repaid);
        id
    }

    pub fn stats(&self) -> LiquidationStats {
        self.stats
    }

    pub fn records(&self) -> &[LiquidationRecord] {
        &self.records
    }

    pub fn get(&self, id: u64) -> Option<&LiquidationRecord> {
        // ids start at 1 and are dense
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.records.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut log = LiquidationLog::new();
        assert_eq!(log.stats(), LiquidationStats::default());

        let first = log.append(
            AccountId::new("liquidator"),
            AccountId::new("wallet_1"),
            3_885_000,
            3_700_000,
            10,
        );
        let second = log.append(
            AccountId::new("liquidator"),
            AccountId::new("wallet_2"),
            105,
            100,
            11,
        );

        assert_eq!((first, second), (1, 2));
        assert_eq!(log.get(1).unwrap().account.as_str(), "wallet_1");
        assert_eq!(log.get(2).unwrap().height, 11);
        assert!(log.get(0).is_none());
        assert!(log.get(3).is_none());
        assert_eq!(log.stats().count, 2);
        assert_eq!(log.stats().debt_repaid_total, 3_700_100);
    }
}

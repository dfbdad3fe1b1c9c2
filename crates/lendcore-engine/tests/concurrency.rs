//! Parallel callers against one pool

mod common;

use common::{wallet, TestHarness};
use lendcore_common::AccountId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

const THREADS: u32 = 8;
const ROUNDS: u64 = 500;

mod concurrency_tests {
    use super::*;

    /// Test: mixed operations from many threads keep totals equal to the positions
    #[test]
    fn test_parallel_operations_keep_aggregates() {
        let h = Arc::new(TestHarness::new());
        let liquidated = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let h = Arc::clone(&h);
                let liquidated = Arc::clone(&liquidated);
                thread::spawn(move || {
                    let liquidator = AccountId::new(format!("liquidator_{t}"));
                    for i in 0..ROUNDS {
                        // Neighbouring threads share accounts so calls contend
                        let account = wallet((t + i as u32) % 4);
                        let amount = 1_000 + (i * 7_919 + t as u64 * 104_729) % 2_000_000;
                        let _ = match (i + t as u64) % 5 {
                            0 => h.pool.deposit(&account, amount * 2),
                            1 => h.pool.borrow(&account, amount).map(|_| ()),
                            2 => h.pool.repay(&account, amount).map(|_| ()),
                            3 => h.pool.withdraw(&account, amount),
                            _ => h.pool.liquidate(&liquidator, &account, amount / 4).map(|_| {
                                liquidated.fetch_add(1, Ordering::SeqCst);
                            }),
                        };
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        h.assert_aggregates();
        let stats = h.pool.liquidation_stats();
        assert_eq!(stats.count, liquidated.load(Ordering::SeqCst));

        // Ids are dense and unique across threads
        let history = h.pool.liquidation_history();
        assert_eq!(history.len() as u64, stats.count);
        for (n, record) in history.iter().enumerate() {
            assert_eq!(record.id, n as u64 + 1);
        }
    }

    /// Test: racing borrows against one position never pass the borrow limit
    #[test]
    fn test_parallel_borrows_respect_limit() {
        let h = Arc::new(TestHarness::new());
        let user = wallet(1);
        h.pool.deposit(&user, 10_000_000).unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let h = Arc::clone(&h);
                let user = user.clone();
                thread::spawn(move || h.pool.borrow(&user, 1_000_000).is_ok())
            })
            .collect();

        let granted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // 75% of 10M allows seven 1M borrows
        assert_eq!(granted, 7);
        assert_eq!(h.pool.current_debt(&user).unwrap(), 7_000_000);
        h.assert_aggregates();
    }
}

//! Prometheus metrics for a lending pool

use crate::rates::GlobalPool;
use lendcore_common::LendingError;
use prometheus::{Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use rust_decimal::prelude::ToPrimitive;

/// Prometheus metrics for the pool
pub struct PoolMetrics {
    pub operations_total: IntCounterVec,
    pub rejections_total: IntCounterVec,
    pub liquidations_total: IntCounter,
    pub total_collateral: IntGauge,
    pub total_borrowed: IntGauge,
    pub utilization: Gauge,
    pub interest_index: Gauge,
}

impl PoolMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            operations_total: IntCounterVec::new(
                Opts::new(
                    "lendcore_operations_total",
                    "Committed pool operations by kind",
                ),
                &["operation"],
            )?,
            rejections_total: IntCounterVec::new(
                Opts::new(
                    "lendcore_rejections_total",
                    "Rejected pool operations by kind and error code",
                ),
                &["operation", "code"],
            )?,
            liquidations_total: IntCounter::new(
                "lendcore_liquidations_total",
                "Total liquidations executed",
            )?,
            total_collateral: IntGauge::new(
                "lendcore_total_collateral",
                "Collateral held by the pool",
            )?,
            total_borrowed: IntGauge::new(
                "lendcore_total_borrowed",
                "Recorded principal owed to the pool",
            )?,
            utilization: Gauge::new("lendcore_utilization", "Borrowed share of collateral")?,
            interest_index: Gauge::new(
                "lendcore_interest_index",
                "Global interest accrual index",
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.operations_total.clone()))?;
        registry.register(Box::new(self.rejections_total.clone()))?;
        registry.register(Box::new(self.liquidations_total.clone()))?;
        registry.register(Box::new(self.total_collateral.clone()))?;
        registry.register(Box::new(self.total_borrowed.clone()))?;
        registry.register(Box::new(self.utilization.clone()))?;
        registry.register(Box::new(self.interest_index.clone()))?;
        Ok(())
    }

    pub fn record_success(&self, operation: &str, pool: &GlobalPool) {
        self.operations_total.with_label_values(&[operation]).inc();
        self.observe_pool(pool);
    }

    pub fn record_rejection(&self, operation: &str, error: &LendingError) {
        let code = error.code().to_string();
        self.rejections_total
            .with_label_values(&[operation, code.as_str()])
            .inc();
    }

    pub fn observe_pool(&self, pool: &GlobalPool) {
        self.total_collateral
            .set(i64::try_from(pool.total_collateral).unwrap_or(i64::MAX));
        self.total_borrowed
            .set(i64::try_from(pool.total_borrowed).unwrap_or(i64::MAX));
        self.utilization
            .set(pool.utilization().to_decimal().to_f64().unwrap_or(0.0));
        self.interest_index
            .set(pool.interest_index.to_decimal().to_f64().unwrap_or(0.0));
    }
}

//! LendCore Scenario Simulator
//!
//! Replays a JSON scenario of lending operations against a fresh pool.
//!
//! ```text
//! lendcore-sim <scenario.json> [config.toml]
//! ```

mod scenario;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lendcore_common::{AccountId, VERSION};
use lendcore_engine::{LendingPool, PoolMetrics, ProtocolConfig};
use lendcore_oracle::InMemoryPriceFeed;

use scenario::{Scenario, Simulator};

/// Account the simulator uses to write prices
const SIM_UPDATER: &str = "sim-oracle";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting LendCore simulator v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let scenario_path: PathBuf = args
        .next()
        .context("usage: lendcore-sim <scenario.json> [config.toml]")?
        .into();
    let config_path = args.next();

    // Load configuration
    let config = ProtocolConfig::load(config_path.as_deref())?;
    info!("Loaded configuration: {:?}", config);
    let params = config.to_params()?;

    // Seed the price feed
    let admin = AccountId::new(config.admin.as_str());
    let updater = AccountId::new(SIM_UPDATER);
    let feed = Arc::new(InMemoryPriceFeed::with_default_asset(admin.clone()));
    feed.authorize_updater(&admin, updater.clone())?;

    // Build the pool with metrics
    let registry = Registry::new();
    let metrics = Arc::new(PoolMetrics::new()?);
    metrics.register(&registry)?;
    let pool = LendingPool::new(admin.clone(), params, feed.clone())?.with_metrics(metrics);

    let scenario = Scenario::load(&scenario_path)?;
    info!(
        "Scenario '{}': {} ({} steps)",
        scenario.name,
        scenario.description,
        scenario.steps.len()
    );

    let simulator = Simulator {
        pool,
        feed,
        feed_admin: admin,
        updater,
    };
    let summary = simulator.run(&scenario)?;

    let stats = simulator.pool.pool_stats()?;
    let liquidations = simulator.pool.liquidation_stats();
    info!(
        committed = summary.committed,
        rejected = summary.rejected,
        "Scenario complete"
    );
    info!(
        "Pool: collateral={}, borrowed={}, utilization={}%, borrow_rate={}%, supply_rate={}%, index={}",
        stats.total_collateral,
        stats.total_borrowed,
        stats.utilization.to_percent().normalize(),
        stats.borrow_rate.to_percent().normalize(),
        stats.supply_rate.to_percent().normalize(),
        stats.interest_index
    );
    info!(
        "Liquidations: count={}, seized={}, repaid={}",
        liquidations.count, liquidations.collateral_seized_total, liquidations.debt_repaid_total
    );

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    println!("{}", String::from_utf8(buffer)?);

    Ok(())
}

//! Scenario files and their replay against a pool

use anyhow::{bail, Context, Result};
use lendcore_common::{AccountId, Fixed, LendingError};
use lendcore_engine::{LendingPool, ParameterUpdate};
use lendcore_oracle::InMemoryPriceFeed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// A named list of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

/// One step plus the error code it is expected to fail with, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default)]
    pub expect_error: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Deposit { account: String, amount: u64 },
    Borrow { account: String, amount: u64 },
    Repay { account: String, amount: u64 },
    Withdraw { account: String, amount: u64 },
    Liquidate { liquidator: String, account: String, amount: u64 },
    /// Move the pool and feed clocks to `height`
    Advance { height: u64 },
    /// Write a price through the feed's updater account
    SetPrice { asset: String, price: Decimal },
    PauseFeed { paused: bool },
    UpdateParameter { caller: String, update: ParameterUpdate },
    /// Log the position and health of an account
    Inspect { account: String },
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }
}

/// Pool, feed and the accounts the feed trusts
pub struct Simulator {
    pub pool: LendingPool,
    pub feed: std::sync::Arc<InMemoryPriceFeed>,
    pub feed_admin: AccountId,
    pub updater: AccountId,
}

/// Totals over a replayed scenario
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub committed: usize,
    pub rejected: usize,
}

impl Simulator {
    /// Replay every step; a step whose outcome differs from its expectation aborts
    pub fn run(&self, scenario: &Scenario) -> Result<Summary> {
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "Replaying scenario");
        let mut summary = Summary::default();

        for (i, step) in scenario.steps.iter().enumerate() {
            let outcome = self.apply(&step.action)?;
            match (&outcome, step.expect_error) {
                (Ok(detail), None) => {
                    info!(step = i, detail = %detail, "Step committed");
                    summary.committed += 1;
                }
                (Err(err), Some(code)) if err.code() == code => {
                    info!(step = i, error = %err, "Step rejected as expected");
                    summary.rejected += 1;
                }
                (Ok(detail), Some(code)) => {
                    bail!("step {i} ({detail}) succeeded but was expected to fail with {code}")
                }
                (Err(err), _) => {
                    warn!(step = i, error = %err, code = err.code(), "Step rejected");
                    bail!("step {i} failed unexpectedly: {err} (code {})", err.code())
                }
            }
        }
        Ok(summary)
    }

    /// Outer error aborts the run; inner error is a pool rejection
    fn apply(&self, action: &Action) -> Result<std::result::Result<String, LendingError>> {
        let pool = &self.pool;
        let outcome = match action {
            Action::Deposit { account, amount } => pool
                .deposit(&account.as_str().into(), *amount)
                .map(|_| format!("{account} deposited {amount}")),
            Action::Borrow { account, amount } => pool
                .borrow(&account.as_str().into(), *amount)
                .map(|_| format!("{account} borrowed {amount}")),
            Action::Repay { account, amount } => pool
                .repay(&account.as_str().into(), *amount)
                .map(|applied| format!("{account} repaid {applied} of {amount}")),
            Action::Withdraw { account, amount } => pool
                .withdraw(&account.as_str().into(), *amount)
                .map(|_| format!("{account} withdrew {amount}")),
            Action::Liquidate {
                liquidator,
                account,
                amount,
            } => pool
                .liquidate(&liquidator.as_str().into(), &account.as_str().into(), *amount)
                .map(|o| {
                    format!(
                        "liquidation #{} of {account}: repaid {}, seized {}",
                        o.liquidation_id, o.debt_repaid, o.collateral_seized
                    )
                }),
            Action::Advance { height } => {
                self.feed.set_height(*height);
                pool.advance_to(*height).map(|_| format!("height {height}"))
            }
            Action::SetPrice { asset, price } => {
                let percent = price
                    .checked_mul(Decimal::ONE_HUNDRED)
                    .with_context(|| format!("price {price} for {asset} overflows"))?;
                let fixed = Fixed::from_percent_decimal(percent)
                    .with_context(|| format!("price {price} for {asset}"))?;
                self.feed
                    .update_price(&self.updater, asset, fixed, "scenario")
                    .with_context(|| format!("setting price of {asset}"))?;
                Ok(format!("{asset} = {fixed}"))
            }
            Action::PauseFeed { paused } => {
                self.feed
                    .set_paused(&self.feed_admin, *paused)
                    .context("toggling feed pause")?;
                Ok(format!("feed paused = {paused}"))
            }
            Action::UpdateParameter { caller, update } => pool
                .update_parameter(&caller.as_str().into(), update.clone())
                .map(|_| format!("{} updated", update.name())),
            Action::Inspect { account } => {
                let id = AccountId::from(account.as_str());
                let position = pool.get_position(&id);
                pool.get_health_factor(&id).and_then(|health| {
                    let debt = pool.current_debt(&id)?;
                    let collateral = position.map(|p| p.collateral).unwrap_or(0);
                    Ok(format!(
                        "{account}: collateral {collateral}, debt {debt}, health {health}"
                    ))
                })
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendcore_engine::ProtocolParams;
    use lendcore_oracle::PriceFeed;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn simulator() -> Simulator {
        let admin = AccountId::new("deployer");
        let feed = Arc::new(InMemoryPriceFeed::with_default_asset(admin.clone()));
        feed.authorize_updater(&admin, admin.clone()).unwrap();
        let pool = LendingPool::new(admin.clone(), ProtocolParams::default(), feed.clone()).unwrap();
        Simulator {
            pool,
            feed,
            feed_admin: admin.clone(),
            updater: admin,
        }
    }

    #[test]
    fn test_parse_steps() {
        let json = r#"{
            "name": "parse",
            "steps": [
                {"op": "deposit", "account": "wallet_1", "amount": 100},
                {"op": "set_price", "asset": "STX", "price": "1.5"},
                {"op": "update_parameter", "caller": "deployer",
                 "update": {"parameter": "liquidation_threshold", "value": 100}},
                {"op": "borrow", "account": "wallet_1", "amount": 1000, "expect_error": 101}
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.steps[3].expect_error, Some(101));
        assert!(matches!(
            &scenario.steps[1].action,
            Action::SetPrice { asset, price } if asset == "STX" && *price == dec!(1.5)
        ));
        assert!(matches!(
            scenario.steps[2].action,
            Action::UpdateParameter {
                update: ParameterUpdate::LiquidationThreshold(100),
                ..
            }
        ));
    }

    #[test]
    fn test_replay_liquidation() {
        let sim = simulator();
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "name": "liquidation",
                "steps": [
                    {"op": "deposit", "account": "wallet_1", "amount": 10000000},
                    {"op": "borrow", "account": "wallet_1", "amount": 7400000},
                    {"op": "liquidate", "liquidator": "liq", "account": "wallet_1", "amount": 3700001, "expect_error": 104},
                    {"op": "liquidate", "liquidator": "liq", "account": "wallet_1", "amount": 3700000},
                    {"op": "inspect", "account": "wallet_1"}
                ]
            }"#,
        )
        .unwrap();

        let summary = sim.run(&scenario).unwrap();
        assert_eq!(summary, Summary { committed: 4, rejected: 1 });
        assert_eq!(sim.pool.liquidation_stats().collateral_seized_total, 3_885_000);
    }

    #[test]
    fn test_set_price_writes_feed() {
        let sim = simulator();
        let step = |price| Step {
            action: Action::SetPrice {
                asset: "STX".to_string(),
                price,
            },
            expect_error: None,
        };
        let scenario = Scenario {
            name: "prices".to_string(),
            description: String::new(),
            steps: vec![step(dec!(1.25)), step(dec!(0.05))],
        };
        let summary = sim.run(&scenario).unwrap();
        assert_eq!(summary.committed, 2);
        assert_eq!(sim.feed.get_price("STX").unwrap(), Fixed::from_percent(5));

        // Below the asset's 1% floor
        let below = Scenario {
            steps: vec![step(dec!(0.005))],
            ..scenario
        };
        assert!(sim.run(&below).is_err());
        assert_eq!(sim.feed.get_price("STX").unwrap(), Fixed::from_percent(5));
    }

    #[test]
    fn test_bundled_scenarios_replay() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for name in ["liquidation.json", "full_cycle.json", "oracle_outage.json"] {
            let scenario = Scenario::load(&dir.join(name)).unwrap();
            let summary = simulator().run(&scenario).unwrap();
            assert_eq!(summary.committed + summary.rejected, scenario.steps.len());
        }
    }

    #[test]
    fn test_unexpected_failure_aborts() {
        let sim = simulator();
        let scenario = Scenario {
            name: "bad".to_string(),
            description: String::new(),
            steps: vec![Step {
                action: Action::Borrow {
                    account: "wallet_1".to_string(),
                    amount: 1,
                },
                expect_error: None,
            }],
        };
        assert!(sim.run(&scenario).is_err());
    }
}

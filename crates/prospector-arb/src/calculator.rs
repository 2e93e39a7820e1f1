//! Downstream consumer of the opportunity queue.
//!
//! Refinement is a placeholder today: it replays the finder's estimate and
//! re-checks the profit threshold. Trade construction and submission belong
//! to an executor that lives outside this service.

use crate::OpportunityQueue;
use prospector_core::types::ArbitrageOpportunity;
use prospector_core::{AppConfig, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub struct ArbitrageCalculator {
    queue: Arc<OpportunityQueue>,
    config: AppConfig,
}

impl ArbitrageCalculator {
    pub fn new(queue: Arc<OpportunityQueue>, config: AppConfig) -> Self {
        Self { queue, config }
    }

    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Arbitrage calculator stopped");
                    return Ok(());
                }
                opportunity = self.queue.recv() => self.handle_opportunity(opportunity).await,
            }
        }
    }

    async fn handle_opportunity(&self, opportunity: ArbitrageOpportunity) {
        debug!(
            hops = opportunity.hops(),
            initial = opportunity.initial_amount,
            estimated = opportunity.estimated_return,
            "Opportunity dequeued"
        );

        let (refined, profitable) = self.refine(&opportunity);
        if !profitable {
            info!(
                hops = opportunity.hops(),
                refined,
                path = %opportunity.format_path(),
                "Opportunity discarded after refinement"
            );
            return;
        }

        info!(
            start_token = %opportunity.start_token,
            hops = opportunity.hops(),
            initial = opportunity.initial_amount,
            refined,
            profit = refined - opportunity.initial_amount,
            path = %opportunity.format_path(),
            "Arbitrage confirmed"
        );
        self.submit_execution(&opportunity, refined);
    }

    /// Refined profit check.
    /// TODO: replace the estimate replay with a live re-simulation against
    /// current reserves once the executor contract is settled.
    fn refine(&self, opportunity: &ArbitrageOpportunity) -> (f64, bool) {
        let refined = opportunity.estimated_return;
        (
            refined,
            refined - opportunity.initial_amount >= self.config.arb_min_profit,
        )
    }

    /// Hand-off point for the future executor; logging stands in for it.
    fn submit_execution(&self, opportunity: &ArbitrageOpportunity, expected_return: f64) {
        info!(
            start_token = %opportunity.start_token,
            expected_return,
            hops = opportunity.hops(),
            "Submitting arbitrage for execution (placeholder)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use prospector_core::types::{ArbitrageStep, PoolDetail, Protocol};

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from(bytes)
    }

    fn opportunity(initial: f64, estimated: f64) -> ArbitrageOpportunity {
        let pool = PoolDetail {
            address: addr(0xAA),
            token0: addr(1),
            token1: addr(2),
            fee: 0.30,
            protocol: Protocol::V2Like,
            reserve0: U256::from(1u64),
            reserve1: U256::from(1u64),
        };
        ArbitrageOpportunity {
            path: vec![ArbitrageStep {
                from_token: pool.token0,
                to_token: pool.token1,
                pool,
            }],
            start_token: addr(1),
            initial_amount: initial,
            estimated_return: estimated,
        }
    }

    fn calculator(min_profit: f64) -> ArbitrageCalculator {
        let mut config = AppConfig::from_env().expect("default config");
        config.arb_min_profit = min_profit;
        ArbitrageCalculator::new(Arc::new(OpportunityQueue::new(4)), config)
    }

    #[tokio::test]
    async fn run_returns_promptly_on_shutdown() {
        let calc = calculator(0.0);
        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

        let handle = tokio::spawn(async move { calc.run(shutdown_rx).await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(()).expect("signal");

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("calculator must stop on shutdown")
            .expect("task must not panic")
            .expect("run returns Ok");
    }

    #[test]
    fn refinement_replays_the_estimate() {
        let calc = calculator(0.0);
        let (refined, profitable) = calc.refine(&opportunity(1.0, 1.2));
        assert_eq!(refined, 1.2);
        assert!(profitable);
    }

    #[test]
    fn refinement_applies_the_profit_floor() {
        let calc = calculator(0.5);
        let (_, profitable) = calc.refine(&opportunity(1.0, 1.2));
        assert!(!profitable);

        // Exactly at the floor still passes.
        let (_, profitable) = calc.refine(&opportunity(1.0, 1.5));
        assert!(profitable);
    }
}

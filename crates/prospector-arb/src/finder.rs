//! Periodic cycle search over the pool catalogue.
//!
//! Every tick reloads the store snapshot, rebuilds the token graph,
//! enumerates bounded cycles by backtracking over pools, simulates each
//! candidate and publishes the ones that clear the profit threshold.

use crate::graph::{GraphEdge, TokenGraph};
use crate::sim::simulate_path;
use crate::OpportunityQueue;
use alloy_primitives::{Address, U256};
use prospector_core::types::{ArbitrageOpportunity, ArbitrageStep};
use prospector_core::{AppConfig, Result};
use prospector_db::repositories::PoolRepository;
use prospector_db::DatabasePool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

/// Pools with less than one whole token on either side are dust; walking
/// them wastes enumeration budget and their quotes are meaningless.
const MIN_RESERVE_WEI: u64 = 1_000_000_000_000_000_000;

pub struct ArbitrageFinder {
    db: DatabasePool,
    queue: Arc<OpportunityQueue>,
    config: AppConfig,
    /// Fingerprints published since the last graph rebuild.
    seen_paths: RwLock<HashSet<String>>,
}

impl ArbitrageFinder {
    pub fn new(db: DatabasePool, queue: Arc<OpportunityQueue>, config: AppConfig) -> Self {
        Self {
            db,
            queue,
            config,
            seen_paths: RwLock::new(HashSet::new()),
        }
    }

    /// Run discovery immediately, then on every reload interval, until
    /// shutdown.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let mut interval = tokio::time::interval(self.config.arb_reload_interval);
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Arbitrage finder stopped");
                    return Ok(());
                }
                _ = interval.tick() => self.run_discovery().await,
            }
        }
    }

    /// One full tick: snapshot, rebuild, enumerate, simulate, publish.
    pub async fn run_discovery(&self) {
        let pools = match PoolRepository::list(self.db.inner()).await {
            Ok(pools) => pools,
            Err(e) => {
                error!(error = %e, "Pool snapshot load failed");
                return;
            }
        };

        let graph = TokenGraph::build(&pools);
        info!(
            pools = pools.len(),
            tokens = graph.token_count(),
            edges = graph.edge_count(),
            "Token graph rebuilt"
        );

        // A fresh graph means fresh prices: everything may be re-evaluated.
        self.seen_paths.write().await.clear();

        let max_hops = self.config.arb_max_hops.max(2);
        let mut total_cycles = 0usize;
        let mut published = 0usize;

        for start in 0..graph.token_count() {
            let mut cycles = Vec::new();
            let mut path = Vec::new();
            let mut used_pools = HashSet::new();
            Self::find_cycles(
                &graph,
                start,
                start,
                max_hops,
                &mut path,
                &mut used_pools,
                &mut cycles,
            );

            total_cycles += cycles.len();
            for cycle in cycles {
                if self.handle_cycle(&graph, &cycle).await {
                    published += 1;
                }
            }
        }

        info!(
            cycles = total_cycles,
            published, "Cycle enumeration finished"
        );
    }

    /// Depth-bounded backtracking over pools: extend the path along any
    /// edge whose pool is liquid and not already on the path, emit when
    /// the edge returns to the start token.
    fn find_cycles(
        graph: &TokenGraph,
        start: usize,
        current: usize,
        hops_left: usize,
        path: &mut Vec<usize>,
        used_pools: &mut HashSet<Address>,
        cycles: &mut Vec<Vec<usize>>,
    ) {
        for &edge_index in graph.edges_from(current) {
            let edge = &graph.edges[edge_index];
            if used_pools.contains(&edge.pool.address) {
                continue;
            }
            if !has_min_reserves(edge) {
                continue;
            }

            path.push(edge_index);
            // Strictly more than two hops: a pair of pools on the same
            // token pair is not a cycle worth publishing.
            if edge.to_index == start && path.len() > 2 {
                cycles.push(path.clone());
            } else if hops_left > 1 {
                used_pools.insert(edge.pool.address);
                Self::find_cycles(
                    graph,
                    start,
                    edge.to_index,
                    hops_left - 1,
                    path,
                    used_pools,
                    cycles,
                );
                used_pools.remove(&edge.pool.address);
            }
            path.pop();
        }
    }

    /// Dedup, simulate and possibly publish one enumerated cycle.
    /// Returns whether it was published.
    async fn handle_cycle(&self, graph: &TokenGraph, cycle: &[usize]) -> bool {
        let path: Vec<GraphEdge> = cycle
            .iter()
            .map(|&index| graph.edges[index].clone())
            .collect();

        let key = fingerprint(&path);
        if self.seen_paths.read().await.contains(&key) {
            return false;
        }

        let initial = self.config.arb_initial_capital;
        let Some(estimated) = simulate_path(initial, &path) else {
            return false;
        };
        if !clears_threshold(estimated, initial, self.config.arb_min_profit) {
            return false;
        }

        self.seen_paths.write().await.insert(key);

        let opportunity = to_opportunity(&path, initial, estimated);
        debug!(
            hops = opportunity.hops(),
            initial,
            estimated,
            path = %opportunity.format_path(),
            "Provisionally profitable cycle"
        );
        self.queue.publish(opportunity).await;
        true
    }
}

fn has_min_reserves(edge: &GraphEdge) -> bool {
    let floor = U256::from(MIN_RESERVE_WEI);
    edge.pool.reserve0 >= floor && edge.pool.reserve1 >= floor
}

/// An opportunity at exactly the threshold is still an opportunity.
fn clears_threshold(estimated: f64, initial: f64, min_profit: f64) -> bool {
    estimated - initial >= min_profit
}

/// Canonical, rotation-insensitive cycle identity. Direction matters
/// because each item records its `from->to` orientation.
fn fingerprint(path: &[GraphEdge]) -> String {
    let mut items: Vec<String> = path
        .iter()
        .map(|edge| {
            format!(
                "{}:{}:{}->{}",
                edge.pool.protocol, edge.pool.address, edge.from_token, edge.to_token
            )
        })
        .collect();
    items.sort();
    items.join("|")
}

fn to_opportunity(path: &[GraphEdge], initial: f64, estimated: f64) -> ArbitrageOpportunity {
    ArbitrageOpportunity {
        path: path
            .iter()
            .map(|edge| ArbitrageStep {
                pool: edge.pool.clone(),
                from_token: edge.from_token,
                to_token: edge.to_token,
            })
            .collect(),
        start_token: path
            .first()
            .map(|edge| edge.from_token)
            .unwrap_or(Address::ZERO),
        initial_amount: initial,
        estimated_return: estimated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospector_core::types::{PoolDetail, Protocol};

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from(bytes)
    }

    fn pow10(exp: u64) -> U256 {
        U256::from(10u64).pow(U256::from(exp))
    }

    fn pool(n: u8, token0: Address, token1: Address, reserve0: U256, reserve1: U256) -> PoolDetail {
        PoolDetail {
            address: addr(n),
            token0,
            token1,
            fee: 0.30,
            protocol: Protocol::V2Like,
            reserve0,
            reserve1,
        }
    }

    fn edge_between(pool: &PoolDetail, from: Address, to: Address) -> GraphEdge {
        GraphEdge {
            pool: pool.clone(),
            from_token: from,
            to_token: to,
            fee: pool.fee,
            from_index: 0,
            to_index: 0,
        }
    }

    fn test_config() -> AppConfig {
        AppConfig::from_env().expect("default config")
    }

    async fn finder_with(pools: &[PoolDetail], config: AppConfig) -> (ArbitrageFinder, Arc<OpportunityQueue>) {
        let db = DatabasePool::new(":memory:").await.expect("open :memory:");
        db.migrate().await.expect("migrate");
        for pool in pools {
            PoolRepository::upsert(db.inner(), pool).await.expect("insert");
        }
        let queue = Arc::new(OpportunityQueue::new(64));
        (ArbitrageFinder::new(db, queue.clone(), config), queue)
    }

    #[test]
    fn fingerprint_is_rotation_insensitive() {
        let a = addr(1);
        let b = addr(2);
        let c = addr(3);
        let ab = pool(10, a, b, pow10(21), pow10(21));
        let bc = pool(11, b, c, pow10(21), pow10(21));
        let ca = pool(12, c, a, pow10(21), pow10(21));

        let from_a = vec![
            edge_between(&ab, a, b),
            edge_between(&bc, b, c),
            edge_between(&ca, c, a),
        ];
        let from_b = vec![
            edge_between(&bc, b, c),
            edge_between(&ca, c, a),
            edge_between(&ab, a, b),
        ];
        assert_eq!(fingerprint(&from_a), fingerprint(&from_b));
    }

    #[test]
    fn reversed_direction_fingerprints_differently() {
        let a = addr(1);
        let b = addr(2);
        let c = addr(3);
        let ab = pool(10, a, b, pow10(21), pow10(21));
        let bc = pool(11, b, c, pow10(21), pow10(21));
        let ca = pool(12, c, a, pow10(21), pow10(21));

        let forward = vec![
            edge_between(&ab, a, b),
            edge_between(&bc, b, c),
            edge_between(&ca, c, a),
        ];
        let reverse = vec![
            edge_between(&ca, a, c),
            edge_between(&bc, c, b),
            edge_between(&ab, b, a),
        ];
        assert_ne!(fingerprint(&forward), fingerprint(&reverse));
    }

    #[test]
    fn exact_threshold_still_publishes() {
        assert!(clears_threshold(1.5, 1.0, 0.5));
        assert!(clears_threshold(1.0, 1.0, 0.0));
        assert!(!clears_threshold(1.4999, 1.0, 0.5));
    }

    #[tokio::test]
    async fn balanced_triangle_with_fees_is_not_published() {
        let a = addr(1);
        let b = addr(2);
        let c = addr(3);
        let reserve = pow10(21);
        let pools = [
            pool(10, a, b, reserve, reserve),
            pool(11, b, c, reserve, reserve),
            pool(12, c, a, reserve, reserve),
        ];

        let mut config = test_config();
        config.arb_max_hops = 3;
        config.arb_initial_capital = 1.0;
        config.arb_min_profit = 0.0;

        let (finder, queue) = finder_with(&pools, config).await;
        finder.run_discovery().await;

        // Every cycle simulates to ~0.991, below the zero-profit floor.
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn skewed_triangle_publishes_one_direction_once() {
        let a = addr(1);
        let b = addr(2);
        let c = addr(3);
        let (small, large) = (pow10(21), U256::from(2u64) * pow10(21));
        // Each pool prices its token1 at two of its token0: the
        // a->b->c->a direction multiplies up, the reverse divides.
        let pools = [
            pool(10, a, b, small, large),
            pool(11, b, c, small, large),
            pool(12, c, a, small, large),
        ];

        let mut config = test_config();
        config.arb_max_hops = 3;
        config.arb_initial_capital = 1.0;
        config.arb_min_profit = 0.0;

        let (finder, queue) = finder_with(&pools, config).await;
        finder.run_discovery().await;

        let opportunity = queue.try_recv().await.expect("one opportunity published");
        assert_eq!(opportunity.hops(), 3);
        assert!(opportunity.estimated_profit() > 0.0);
        assert!(
            queue.is_empty().await,
            "rotations of the same cycle must deduplicate within a tick"
        );

        // The next tick rebuilds the graph and clears seen paths, so the
        // same cycle is published again.
        finder.run_discovery().await;
        assert!(queue.try_recv().await.is_some());
    }

    #[tokio::test]
    async fn two_pools_on_one_pair_never_close_a_cycle() {
        let a = addr(1);
        let b = addr(2);
        // Opposite skews: hopping a->b through one pool and back through
        // the other would quadruple the input, but two hops do not make
        // a cycle.
        let pools = [
            pool(10, a, b, pow10(21), U256::from(2u64) * pow10(21)),
            pool(11, a, b, U256::from(2u64) * pow10(21), pow10(21)),
        ];

        let mut config = test_config();
        config.arb_max_hops = 3;
        config.arb_min_profit = 0.0;

        let (finder, queue) = finder_with(&pools, config).await;
        finder.run_discovery().await;
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn dust_pools_are_pruned_from_enumeration() {
        let a = addr(1);
        let b = addr(2);
        let c = addr(3);
        let (small, large) = (pow10(21), U256::from(2u64) * pow10(21));
        let pools = [
            pool(10, a, b, small, large),
            pool(11, b, c, small, large),
            // Below the 1e18 floor on one side: breaks the triangle.
            pool(12, c, a, U256::from(1u64), large),
        ];

        let mut config = test_config();
        config.arb_max_hops = 3;
        config.arb_min_profit = 0.0;

        let (finder, queue) = finder_with(&pools, config).await;
        finder.run_discovery().await;
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn run_returns_promptly_on_shutdown() {
        let (finder, _queue) = finder_with(&[], test_config()).await;
        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

        let handle = tokio::spawn(async move { finder.run(shutdown_rx).await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(()).expect("signal");

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("finder must stop on shutdown")
            .expect("task must not panic")
            .expect("run returns Ok");
    }

    #[tokio::test]
    async fn hop_bound_is_enforced() {
        let a = addr(1);
        let b = addr(2);
        let c = addr(3);
        let d = addr(4);
        let (small, large) = (pow10(21), U256::from(2u64) * pow10(21));
        // Profitable square a->b->c->d->a, but four hops.
        let pools = [
            pool(10, a, b, small, large),
            pool(11, b, c, small, large),
            pool(12, c, d, small, large),
            pool(13, d, a, small, large),
        ];

        let mut config = test_config();
        config.arb_max_hops = 3;
        config.arb_min_profit = 0.0;

        let (finder, queue) = finder_with(&pools, config.clone()).await;
        finder.run_discovery().await;
        assert!(queue.is_empty().await, "4-hop cycle must not fit in 3 hops");

        config.arb_max_hops = 4;
        let (finder, queue) = finder_with(&pools, config).await;
        finder.run_discovery().await;
        assert!(queue.try_recv().await.is_some());
    }
}

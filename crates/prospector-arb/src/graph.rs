//! Token-edge graph rebuilt from a store snapshot on every discovery tick.
//!
//! Tokens get dense indices; every pool contributes one directed edge per
//! direction. Adjacency is an index-keyed map, no back-pointers.

use alloy_primitives::Address;
use prospector_core::types::PoolDetail;
use std::collections::HashMap;

/// One directed hop through a pool.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub pool: PoolDetail,
    pub from_token: Address,
    pub to_token: Address,
    pub fee: f64,
    pub from_index: usize,
    pub to_index: usize,
}

#[derive(Debug, Default)]
pub struct TokenGraph {
    /// Dense index -> token address
    pub tokens: Vec<Address>,
    /// Token address -> dense index
    pub token_index: HashMap<Address, usize>,
    pub edges: Vec<GraphEdge>,
    /// From-token index -> outgoing edge indices
    pub adjacency: HashMap<usize, Vec<usize>>,
}

impl TokenGraph {
    pub fn build(pools: &[PoolDetail]) -> Self {
        let mut graph = Self::default();
        for pool in pools {
            // A pool pairing a token with itself cannot form a useful hop.
            if pool.token0 == pool.token1 {
                continue;
            }
            let index0 = graph.intern(pool.token0);
            let index1 = graph.intern(pool.token1);
            graph.add_edge(pool, pool.token0, pool.token1, index0, index1);
            graph.add_edge(pool, pool.token1, pool.token0, index1, index0);
        }
        graph
    }

    fn intern(&mut self, token: Address) -> usize {
        if let Some(&index) = self.token_index.get(&token) {
            return index;
        }
        let index = self.tokens.len();
        self.tokens.push(token);
        self.token_index.insert(token, index);
        index
    }

    fn add_edge(
        &mut self,
        pool: &PoolDetail,
        from_token: Address,
        to_token: Address,
        from_index: usize,
        to_index: usize,
    ) {
        let edge_index = self.edges.len();
        self.edges.push(GraphEdge {
            pool: pool.clone(),
            from_token,
            to_token,
            fee: pool.fee,
            from_index,
            to_index,
        });
        self.adjacency.entry(from_index).or_default().push(edge_index);
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges of a token, empty when it has none.
    pub fn edges_from(&self, token_index: usize) -> &[usize] {
        self.adjacency
            .get(&token_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

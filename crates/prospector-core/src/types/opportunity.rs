use crate::types::pool::PoolDetail;
use alloy_primitives::Address;
use std::fmt::Write;

/// One hop of a candidate arbitrage path.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrageStep {
    pub pool: PoolDetail,
    pub from_token: Address,
    pub to_token: Address,
}

/// A cyclic path whose simulation cleared the profit threshold,
/// queued for downstream refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrageOpportunity {
    pub path: Vec<ArbitrageStep>,
    pub start_token: Address,
    pub initial_amount: f64,
    pub estimated_return: f64,
}

impl ArbitrageOpportunity {
    pub fn hops(&self) -> usize {
        self.path.len()
    }

    pub fn estimated_profit(&self) -> f64 {
        self.estimated_return - self.initial_amount
    }

    /// Human-readable rendering of the path for log lines.
    pub fn format_path(&self) -> String {
        let mut out = String::new();
        for (idx, step) in self.path.iter().enumerate() {
            if idx > 0 {
                out.push_str(" => ");
            }
            let _ = write!(
                out,
                "{}[{}] {} -> {} (token0={}, token1={})",
                step.pool.protocol,
                step.pool.address,
                step.from_token,
                step.to_token,
                step.pool.token0,
                step.pool.token1,
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pool::Protocol;
    use alloy_primitives::{Address, U256};

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from(bytes)
    }

    #[test]
    fn format_path_lists_every_hop() {
        let pool = PoolDetail {
            address: addr(1),
            token0: addr(2),
            token1: addr(3),
            fee: 0.30,
            protocol: Protocol::V2Like,
            reserve0: U256::ZERO,
            reserve1: U256::ZERO,
        };
        let opportunity = ArbitrageOpportunity {
            path: vec![
                ArbitrageStep {
                    pool: pool.clone(),
                    from_token: addr(2),
                    to_token: addr(3),
                },
                ArbitrageStep {
                    pool,
                    from_token: addr(3),
                    to_token: addr(2),
                },
            ],
            start_token: addr(2),
            initial_amount: 1.0,
            estimated_return: 1.5,
        };

        let rendered = opportunity.format_path();
        assert_eq!(rendered.matches(" => ").count(), 1);
        assert!(rendered.contains("UniswapV2LikeSwap"));
        assert!((opportunity.estimated_profit() - 0.5).abs() < 1e-12);
    }
}

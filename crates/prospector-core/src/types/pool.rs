use alloy_primitives::{Address, U256};
use std::fmt;
use std::str::FromStr;

/// AMM protocol family a pool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Single-sided token/native exchanges
    V1Like,
    /// Constant-product pairs
    V2Like,
    /// Concentrated-liquidity pools
    V3,
    /// Singleton-manager pools sharing the V3 call surface
    V4,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::V1Like => "UniswapV1LikeSwap",
            Protocol::V2Like => "UniswapV2LikeSwap",
            Protocol::V3 => "UniswapV3Swap",
            Protocol::V4 => "UniswapV4Swap",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UniswapV1LikeSwap" => Ok(Protocol::V1Like),
            "UniswapV2LikeSwap" => Ok(Protocol::V2Like),
            "UniswapV3Swap" => Ok(Protocol::V3),
            "UniswapV4Swap" => Ok(Protocol::V4),
            other => Err(format!("unknown protocol tag: {other}")),
        }
    }
}

/// A discovered liquidity pool. The contract address is its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolDetail {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// Fee as a percentage, e.g. 0.30 means 0.30%
    pub fee: f64,
    pub protocol: Protocol,
    /// Wei-scale token balances; zero when the protocol family
    /// does not expose reserves or the read failed
    pub reserve0: U256,
    pub reserve1: U256,
}

// f64 fees are never NaN here: they come from config validation or from a
// bounded uint24 contract read.
impl Eq for PoolDetail {}

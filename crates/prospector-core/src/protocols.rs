use crate::config::AppConfig;
use crate::events::{v1, v2, v3, v4};
use crate::types::pool::Protocol;
use alloy_primitives::{address, Address, B256};
use alloy_sol_types::SolEvent;
use std::collections::HashMap;
use std::sync::Arc;

/// Wrapped-native-token contract. V1-style exchanges always pair their
/// token against it, so descriptors pin it as the fixed `token1`.
pub const WRAPPED_NATIVE: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");

/// Where a pool's token address comes from during inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Read from the pool contract via the named view method
    Method(&'static str),
    /// Protocol-fixed constant, no call needed
    Fixed(Address),
}

/// Everything pool inspection needs to know about a protocol family.
#[derive(Debug, Clone)]
pub struct ProtocolDescriptor {
    pub protocol: Protocol,
    pub swap_topic: B256,
    /// Fee percentage used when `fee_from_contract` is false
    pub static_fee: f64,
    /// When true the fee is read from the contract's `fee()` view
    pub fee_from_contract: bool,
    pub token0: TokenSource,
    pub token1: TokenSource,
}

/// Dispatch table from a log's `topics[0]` to its protocol descriptor.
/// Built once at startup; lookup is an exact hash match.
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    by_topic: HashMap<B256, Arc<ProtocolDescriptor>>,
}

impl ProtocolRegistry {
    pub fn new(config: &AppConfig) -> Self {
        let mut by_topic = HashMap::new();

        // V1 emits two distinct purchase events from one descriptor body.
        let v1_descriptor = Arc::new(ProtocolDescriptor {
            protocol: Protocol::V1Like,
            swap_topic: v1::TokenPurchase::SIGNATURE_HASH,
            static_fee: config.v1_static_fee,
            fee_from_contract: false,
            token0: TokenSource::Method("tokenAddress"),
            token1: TokenSource::Fixed(WRAPPED_NATIVE),
        });
        by_topic.insert(v1::TokenPurchase::SIGNATURE_HASH, v1_descriptor.clone());
        by_topic.insert(
            v1::EthPurchase::SIGNATURE_HASH,
            Arc::new(ProtocolDescriptor {
                swap_topic: v1::EthPurchase::SIGNATURE_HASH,
                ..(*v1_descriptor).clone()
            }),
        );

        by_topic.insert(
            v2::Swap::SIGNATURE_HASH,
            Arc::new(ProtocolDescriptor {
                protocol: Protocol::V2Like,
                swap_topic: v2::Swap::SIGNATURE_HASH,
                static_fee: config.v2_static_fee,
                fee_from_contract: false,
                token0: TokenSource::Method("token0"),
                token1: TokenSource::Method("token1"),
            }),
        );

        by_topic.insert(
            v3::Swap::SIGNATURE_HASH,
            Arc::new(ProtocolDescriptor {
                protocol: Protocol::V3,
                swap_topic: v3::Swap::SIGNATURE_HASH,
                static_fee: 0.0,
                fee_from_contract: true,
                token0: TokenSource::Method("token0"),
                token1: TokenSource::Method("token1"),
            }),
        );

        // V4 shares the V3 view surface; only the swap topic differs.
        by_topic.insert(
            v4::Swap::SIGNATURE_HASH,
            Arc::new(ProtocolDescriptor {
                protocol: Protocol::V4,
                swap_topic: v4::Swap::SIGNATURE_HASH,
                static_fee: 0.0,
                fee_from_contract: true,
                token0: TokenSource::Method("token0"),
                token1: TokenSource::Method("token1"),
            }),
        );

        Self { by_topic }
    }

    /// Exact match on a log's first topic.
    pub fn lookup(&self, topic0: &B256) -> Option<&ProtocolDescriptor> {
        self.by_topic.get(topic0).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.by_topic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }
}

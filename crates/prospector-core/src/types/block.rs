use alloy_primitives::B256;

/// A block announced by the header subscription, queued for discovery.
///
/// The hash is authoritative; the number is kept as a fallback lookup key
/// for nodes that cannot serve the block by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEvent {
    pub number: u64,
    pub hash: B256,
}

pub mod calls;
pub mod provider;

pub use provider::ProviderManager;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use prospector_core::Result;

/// Transaction hashes of one block, as much of the block as discovery needs.
#[derive(Debug, Clone)]
pub struct BlockTxs {
    pub number: u64,
    pub hash: B256,
    pub tx_hashes: Vec<B256>,
}

/// One log from a transaction receipt, reduced to what recognition inspects.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
}

/// Read-side chain client shared by every task.
///
/// Implementations must be safe for concurrent callers; all operations are
/// cancellation-aware through future drop.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn block_by_hash(&self, hash: B256) -> Result<Option<BlockTxs>>;

    async fn block_by_number(&self, number: u64) -> Result<Option<BlockTxs>>;

    /// Logs of a transaction's receipt, `None` when the receipt is unknown.
    async fn receipt_logs(&self, tx_hash: B256) -> Result<Option<Vec<LogEntry>>>;

    /// Raw `eth_call` of pre-encoded calldata against a contract.
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes>;
}

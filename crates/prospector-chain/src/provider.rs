use crate::{BlockTxs, ChainReader, LogEntry};
use alloy::eips::BlockNumberOrTag;
use alloy::network::Ethereum;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use prospector_core::{ProspectorError, Result};
use std::sync::Arc;

/// Boxed provider trait for HTTP connections
pub type BoxedProvider = Arc<dyn Provider<Ethereum> + Send + Sync>;

/// Owns the HTTP provider used for block, receipt and view-call traffic.
/// The WebSocket URL is kept for the header subscription, which speaks
/// raw JSON-RPC and manages its own connection.
pub struct ProviderManager {
    http: BoxedProvider,
    ws_url: String,
}

impl ProviderManager {
    pub fn new(http_url: &str, ws_url: &str) -> Result<Self> {
        let http_url: reqwest::Url = http_url
            .parse()
            .map_err(|e| ProspectorError::Rpc(format!("Invalid HTTP URL: {e}")))?;

        let http = ProviderBuilder::new().connect_http(http_url);

        Ok(Self {
            http: Arc::new(http),
            ws_url: ws_url.to_string(),
        })
    }

    pub fn http(&self) -> &BoxedProvider {
        &self.http
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }
}

fn to_block_txs(block: alloy::rpc::types::Block) -> BlockTxs {
    BlockTxs {
        number: block.header.number,
        hash: block.header.hash,
        tx_hashes: block.transactions.hashes().collect(),
    }
}

#[async_trait]
impl ChainReader for ProviderManager {
    async fn block_by_hash(&self, hash: B256) -> Result<Option<BlockTxs>> {
        let block = self
            .http
            .get_block_by_hash(hash)
            .await
            .map_err(|e| ProspectorError::Rpc(e.to_string()))?;
        Ok(block.map(to_block_txs))
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<BlockTxs>> {
        let block = self
            .http
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(|e| ProspectorError::Rpc(e.to_string()))?;
        Ok(block.map(to_block_txs))
    }

    async fn receipt_logs(&self, tx_hash: B256) -> Result<Option<Vec<LogEntry>>> {
        let receipt = self
            .http
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ProspectorError::Rpc(e.to_string()))?;

        Ok(receipt.map(|receipt| {
            receipt
                .inner
                .logs()
                .iter()
                .map(|log| LogEntry {
                    address: log.address(),
                    topics: log.topics().to_vec(),
                })
                .collect()
        }))
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes> {
        let request = TransactionRequest::default().to(to).input(calldata.into());
        self.http
            .call(request)
            .await
            .map_err(|e| ProspectorError::Rpc(e.to_string()))
    }
}

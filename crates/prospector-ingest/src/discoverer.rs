//! Drains the block queue and mines each block's receipts for pool activity.

use crate::BlockQueue;
use alloy_primitives::{Address, B256, U256};
use dashmap::DashSet;
use futures::{stream, StreamExt};
use prospector_chain::{calls, BlockTxs, ChainReader, LogEntry};
use prospector_core::protocols::{ProtocolDescriptor, ProtocolRegistry, TokenSource};
use prospector_core::types::{BlockEvent, PoolDetail, Protocol};
use prospector_core::Result;
use prospector_db::repositories::PoolRepository;
use prospector_db::DatabasePool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Consumes block events, recognises pool logs through the protocol
/// registry, resolves pool metadata on-chain and persists new pools.
#[derive(Clone)]
pub struct PoolDiscoverer {
    queue: Arc<BlockQueue>,
    client: Arc<dyn ChainReader>,
    db: DatabasePool,
    registry: Arc<ProtocolRegistry>,
    /// Addresses already inspected in this process lifetime. Optimisation
    /// cache only; the catalogue itself deduplicates by primary key.
    known_pools: Arc<DashSet<Address>>,
    concurrency: usize,
}

impl PoolDiscoverer {
    pub fn new(
        queue: Arc<BlockQueue>,
        client: Arc<dyn ChainReader>,
        db: DatabasePool,
        registry: Arc<ProtocolRegistry>,
        concurrency: usize,
    ) -> Self {
        Self {
            queue,
            client,
            db,
            registry,
            known_pools: Arc::new(DashSet::new()),
            concurrency,
        }
    }

    /// Drain the block queue until shutdown, one worker task per block.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Pool discoverer stopped");
                    return Ok(());
                }
                event = self.queue.recv() => {
                    let worker = self.clone();
                    tokio::spawn(async move {
                        worker.handle_block(event).await;
                    });
                }
            }
        }
    }

    /// Process one block end to end. Failures are logged and skipped;
    /// nothing here may stall the pipeline.
    pub async fn handle_block(&self, event: BlockEvent) {
        let started = Instant::now();

        let Some(block) = self.fetch_block(event).await else {
            return;
        };

        debug!(
            block = event.number,
            txs = block.tx_hashes.len(),
            "Scanning block transactions"
        );

        let discovered = self.discover_pools(&block).await;
        for pool in &discovered {
            if let Err(e) = PoolRepository::upsert(self.db.inner(), pool).await {
                warn!(pool = %pool.address, error = %e, "Pool upsert failed, skipping");
                continue;
            }
            info!(
                pool = %pool.address,
                protocol = %pool.protocol,
                token0 = %pool.token0,
                token1 = %pool.token1,
                fee = pool.fee,
                "Pool recorded"
            );
        }

        debug!(
            block = event.number,
            discovered = discovered.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Block processed"
        );
    }

    /// The hash is authoritative; the number is a fallback for nodes that
    /// cannot serve the block by hash.
    async fn fetch_block(&self, event: BlockEvent) -> Option<BlockTxs> {
        match self.client.block_by_hash(event.hash).await {
            Ok(Some(block)) => return Some(block),
            Ok(None) => debug!(block = event.number, "Block not found by hash"),
            Err(e) => debug!(block = event.number, error = %e, "Block fetch by hash failed"),
        }

        match self.client.block_by_number(event.number).await {
            Ok(Some(block)) => Some(block),
            Ok(None) => {
                warn!(block = event.number, "Block unavailable by hash and number, skipping");
                None
            }
            Err(e) => {
                warn!(block = event.number, error = %e, "Block fetch by number failed, skipping");
                None
            }
        }
    }

    /// Fan receipts out over a bounded number of concurrent fetches and
    /// collect every newly recognised pool.
    async fn discover_pools(&self, block: &BlockTxs) -> Vec<PoolDetail> {
        stream::iter(block.tx_hashes.iter().copied())
            .map(|tx_hash| self.scan_transaction(tx_hash))
            .buffer_unordered(self.concurrency)
            .concat()
            .await
    }

    async fn scan_transaction(&self, tx_hash: B256) -> Vec<PoolDetail> {
        let logs = match self.client.receipt_logs(tx_hash).await {
            Ok(Some(logs)) => logs,
            Ok(None) => return Vec::new(),
            Err(e) => {
                debug!(tx = %tx_hash, error = %e, "Receipt fetch failed, skipping transaction");
                return Vec::new();
            }
        };

        let mut found = Vec::new();
        for log in &logs {
            let Some(topic0) = log.topics.first() else {
                continue;
            };
            // Unknown topics are not errors, just other people's events.
            let Some(descriptor) = self.registry.lookup(topic0) else {
                continue;
            };

            match self.inspect_pool(log, descriptor).await {
                Ok(Some(pool)) => found.push(pool),
                Ok(None) => {}
                Err(e) => {
                    debug!(pool = %log.address, error = %e, "Pool inspection failed, skipping")
                }
            }
        }
        found
    }

    /// Resolve a pool's tokens, fee and reserves. Returns `None` when the
    /// address was already inspected, without any view-call traffic.
    pub async fn inspect_pool(
        &self,
        log: &LogEntry,
        descriptor: &ProtocolDescriptor,
    ) -> Result<Option<PoolDetail>> {
        if self.known_pools.contains(&log.address) {
            return Ok(None);
        }

        let token0 = self.resolve_token(log.address, &descriptor.token0).await?;
        let token1 = self.resolve_token(log.address, &descriptor.token1).await?;

        let fee = if descriptor.fee_from_contract {
            calls::pool_fee(self.client.as_ref(), log.address).await?
        } else {
            descriptor.static_fee
        };

        let (reserve0, reserve1) = self
            .load_reserves(log.address, token0, token1, descriptor.protocol)
            .await;

        self.known_pools.insert(log.address);

        Ok(Some(PoolDetail {
            address: log.address,
            token0,
            token1,
            fee,
            protocol: descriptor.protocol,
            reserve0,
            reserve1,
        }))
    }

    async fn resolve_token(&self, pool: Address, source: &TokenSource) -> Result<Address> {
        match source {
            TokenSource::Fixed(address) => Ok(*address),
            TokenSource::Method(method) => {
                calls::token_address(self.client.as_ref(), pool, method).await
            }
        }
    }

    /// Reserve strategy per protocol family. Read failures substitute zeros
    /// so the pool is still recorded and refreshed on a later sighting.
    async fn load_reserves(
        &self,
        pool: Address,
        token0: Address,
        token1: Address,
        protocol: Protocol,
    ) -> (U256, U256) {
        match protocol {
            Protocol::V2Like => match calls::get_reserves(self.client.as_ref(), pool).await {
                Ok(reserves) => reserves,
                Err(e) => {
                    debug!(pool = %pool, error = %e, "getReserves failed, recording zeros");
                    (U256::ZERO, U256::ZERO)
                }
            },
            Protocol::V3 | Protocol::V4 => {
                let reserve0 = match calls::erc20_balance_of(self.client.as_ref(), token0, pool)
                    .await
                {
                    Ok(balance) => balance,
                    Err(e) => {
                        debug!(pool = %pool, token = %token0, error = %e, "balanceOf failed, recording zero");
                        U256::ZERO
                    }
                };
                let reserve1 = match calls::erc20_balance_of(self.client.as_ref(), token1, pool)
                    .await
                {
                    Ok(balance) => balance,
                    Err(e) => {
                        debug!(pool = %pool, token = %token1, error = %e, "balanceOf failed, recording zero");
                        U256::ZERO
                    }
                };
                (reserve0, reserve1)
            }
            // V1 reserve retrieval is not implemented yet.
            Protocol::V1Like => (U256::ZERO, U256::ZERO),
        }
    }
}

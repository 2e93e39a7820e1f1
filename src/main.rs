use axum::{routing::get, Json, Router};
use prospector_arb::{ArbitrageCalculator, ArbitrageFinder, OpportunityQueue};
use prospector_chain::ProviderManager;
use prospector_core::{AppConfig, ProtocolRegistry};
use prospector_db::DatabasePool;
use prospector_ingest::{BlockQueue, BlockSubscriber, PoolDiscoverer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("DEX prospector starting...");

    let config = match AppConfig::from_env() {
        Ok(config) => {
            info!(
                ws_url = %config.ws_url,
                sqlite_path = %config.sqlite_path,
                block_queue_size = config.block_queue_size,
                reload_interval_secs = config.arb_reload_interval.as_secs(),
                max_hops = config.arb_max_hops,
                "Configuration loaded"
            );
            config
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let db = match DatabasePool::new(&config.sqlite_path).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to open pool catalogue");
            std::process::exit(1);
        }
    };
    if let Err(e) = db.migrate().await {
        error!(error = %e, "Failed to prepare pool catalogue schema");
        std::process::exit(1);
    }

    let provider = match ProviderManager::new(&config.rpc_url, &config.ws_url) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!(error = %e, "Failed to create chain provider");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(ProtocolRegistry::new(&config));
    info!(protocols = registry.len(), "Protocol registry built");

    let block_queue = Arc::new(BlockQueue::new(config.block_queue_size));
    let opportunity_queue = Arc::new(OpportunityQueue::new(config.arb_queue_size));

    // Single cancellation signal shared by every long-lived task.
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received (Ctrl+C)");
            shutdown_tx.send(()).ok();
        });
    }

    // 1. Header subscription feeding the block queue.
    let subscriber_handle = {
        let subscriber = BlockSubscriber::new(provider.ws_url(), block_queue.clone());
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = subscriber.run(shutdown).await {
                error!(error = %e, "Block subscriber failed");
            }
        })
    };

    // 2. Pool discovery draining the block queue.
    let discoverer_handle = {
        let discoverer = PoolDiscoverer::new(
            block_queue.clone(),
            provider.clone(),
            db.clone(),
            registry,
            config.discovery_concurrency,
        );
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = discoverer.run(shutdown).await {
                error!(error = %e, "Pool discoverer failed");
            }
        })
    };

    // 3. Periodic cycle search over the catalogue.
    let finder_handle = {
        let finder = ArbitrageFinder::new(db.clone(), opportunity_queue.clone(), config.clone());
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = finder.run(shutdown).await {
                error!(error = %e, "Arbitrage finder failed");
            }
        })
    };

    // 4. Refinement of queued opportunities.
    let calculator_handle = {
        let calculator = ArbitrageCalculator::new(opportunity_queue.clone(), config.clone());
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = calculator.run(shutdown).await {
                error!(error = %e, "Arbitrage calculator failed");
            }
        })
    };

    // Periodic queue backlog report.
    {
        let block_queue = block_queue.clone();
        let opportunity_queue = opportunity_queue.clone();
        let mut shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                tokio::select! {
                    _ = shutdown.recv() => return,
                    _ = interval.tick() => {
                        let block_backlog = block_queue.len().await;
                        let opportunity_backlog = opportunity_queue.len().await;
                        info!(
                            block_backlog,
                            opportunity_backlog,
                            "Queue status"
                        );
                    }
                }
            }
        });
    }

    // Liveness endpoint; failures are logged, not fatal.
    {
        let addr = config.http_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_liveness(&addr).await {
                warn!(error = %e, "Liveness server failed");
            }
        });
    }

    let _ = tokio::join!(
        subscriber_handle,
        discoverer_handle,
        finder_handle,
        calculator_handle
    );

    info!("Shutting down...");
    db.close().await;
    info!("DEX prospector shutdown complete");
    Ok(())
}

async fn serve_liveness(addr: &str) -> anyhow::Result<()> {
    let app = Router::new().route("/ping", get(ping_handler));
    info!(address = %addr, "Starting liveness server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ping_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "pong" }))
}

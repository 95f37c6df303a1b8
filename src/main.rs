use commerce_search::{
    api::{build_router, AppState},
    config::Config,
    messaging::{
        init_messaging_metrics, IndexSynchronizer, InMemoryBroker, MessagingBackend, NatsConsumer,
        NatsProducer,
    },
    search::{ProductIndexer, SearchService},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "commerce_search=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;

    tracing::info!("Starting commerce-search v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(index_path = %config.search.index_path.display(), "Search index");

    if config.observability.prometheus_enabled {
        init_messaging_metrics();
        tracing::info!("Prometheus metrics initialized");
    }

    // Initialize the search index
    let search = Arc::new(SearchService::new(config.search.clone()).await?);
    tracing::info!("Search index initialized");

    // Start the event-driven index synchronizer
    if config.messaging.enabled {
        let indexer: Arc<dyn ProductIndexer> = search.clone();
        let messaging = config.messaging.clone();

        match messaging.backend {
            MessagingBackend::Nats => {
                let consumer = NatsConsumer::new(messaging.nats.clone()).await?;
                let producer = Arc::new(NatsProducer::new(messaging.nats.clone()).await?);
                let synchronizer = IndexSynchronizer::new(indexer, producer, messaging);

                tokio::spawn(async move {
                    if let Err(e) = synchronizer.run(&consumer).await {
                        tracing::error!(error = %e, "Index synchronizer stopped with error");
                    }
                });
                tracing::info!("Index synchronizer started (NATS)");
            }
            MessagingBackend::InMemory => {
                let broker =
                    InMemoryBroker::new(messaging.max_delivery_attempts, &messaging.dlq_topic);
                let consumer = broker.consumer();
                let producer = Arc::new(broker.producer());
                let synchronizer = IndexSynchronizer::new(indexer, producer, messaging);

                tokio::spawn(async move {
                    if let Err(e) = synchronizer.run(&consumer).await {
                        tracing::error!(error = %e, "Index synchronizer stopped with error");
                    }
                });
                tracing::info!("Index synchronizer started (in-memory broker)");
            }
        }
    } else {
        tracing::warn!("Messaging disabled, the index will not follow catalog events");
    }

    // Build HTTP router
    let state = AppState::new(search);
    let app = build_router(state, Duration::from_secs(config.server.request_timeout_secs));

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Search API: http://{}/api/v1/search", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

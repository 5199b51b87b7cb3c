use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::future::Future;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    extractor::MetricExtractor,
    fetcher::SourceFetcher,
    handlers,
    metrics,
    scheduler::Scheduler,
    signals::{self, ShutdownFlag},
};

/// Start the exporter
///
/// This function:
/// 1. Installs the Prometheus recorder
/// 2. Sets up signal handlers for graceful shutdown
/// 3. Compiles one extractor per configured metric
/// 4. Spawns the exposition server with graceful shutdown support
/// 5. Runs the polling scheduler until shutdown
pub async fn start(config: Config) -> Result<()> {
    let metrics_handle = Arc::new(metrics::init_metrics());

    let shutdown = ShutdownFlag::new();
    let signal_task = signals::spawn_signal_listener(shutdown.clone());

    let mut extractors = Vec::with_capacity(config.metrics.len());
    for metric in &config.metrics {
        let extractor = MetricExtractor::new(&config.namespace, metric)
            .with_context(|| format!("invalid configuration for metric '{}'", metric.name))?;
        info!(
            metric = extractor.name(),
            query = %metric.query,
            factor = metric.factor,
            "Registered gauge"
        );
        extractors.push(extractor);
    }

    let fetcher = SourceFetcher::new(&config.source)?;

    let addr = SocketAddr::from((
        config.server.address.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    warn!("Server started on {addr}");

    let app = create_router(metrics_handle);
    let drain = shutdown.clone();
    let serve_future = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                drain.wait().await;
                info!("Shutdown requested, draining exposition server");
            })
            .await
    };
    let server_task = tokio::spawn(supervise(serve_future, shutdown.clone()));

    warn!(
        "Fetching data from {} every {} seconds",
        config.source.url, config.source.scrape_interval
    );
    let scheduler = Scheduler::new(
        fetcher,
        extractors,
        Duration::from_secs(config.source.scrape_interval),
        shutdown.clone(),
    );
    scheduler.run().await;

    // The signal listener only completes when a signal arrives; shutdown may
    // have come from a server failure instead.
    signal_task.abort();
    server_task.await??;
    warn!("Shut down gracefully");

    Ok(())
}

/// Await the exposition server; if it fails before shutdown was requested,
/// request shutdown so the polling loop stops instead of feeding a dead
/// endpoint.
async fn supervise<F>(server: F, shutdown: ShutdownFlag) -> std::io::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    let result = server.await;
    if let Err(e) = &result {
        error!(error = %e, "Exposition server failed, stopping the scheduler");
        shutdown.request();
    }
    result
}

/// Build the exposition router: /metrics plus a health endpoint.
fn create_router(metrics_handle: Arc<PrometheusHandle>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .with_state(metrics_handle)
        .layer(TraceLayer::new_for_http())
}

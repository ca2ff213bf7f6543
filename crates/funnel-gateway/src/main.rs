use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;

use funnel_common::codec::CodecRegistry;
use funnel_gateway::config::Config;
use funnel_gateway::http_server::{router, AppState};
use funnel_gateway::shaper::RequestShaper;
use funnel_pool::{CommandFactory, Dispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // default to INFO, let RUST_LOG override
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env().context("invalid environment configuration")?;
    info!(
        workers = config.workers,
        command = %config.command,
        timeout_ms = config.timeout_ms,
        "starting funnel sidecar"
    );

    let factory = Arc::new(CommandFactory::new(&config.command)?);
    let dispatcher = Arc::new(Dispatcher::new(config.workers, factory)?);

    let codecs = Arc::new(CodecRegistry::with_defaults());
    let shaper = Arc::new(RequestShaper::standard(
        config.timeout_ms,
        config.secrets.clone(),
        Arc::clone(&codecs),
    ));

    let app = router(AppState {
        dispatcher: Arc::clone(&dispatcher),
        shaper,
        codecs,
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.listen_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.listen_port))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dispatcher.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for the shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

use anyhow::{anyhow, Context};
use protgraph::config::AppConfig;
use protgraph::http::HttpServer;
use protgraph::{ProteinService, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Usage: `protgraph [config.yaml]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.level()?)
        .init();

    info!("protgraph v{}", protgraph::version());

    let session = Session::open(&config.storage.data_dir)
        .with_context(|| format!("opening data directory {:?}", config.storage.data_dir))?;
    let graph = session.open_graph()?;
    let documents = session.documents();

    let service = ProteinService::new(graph, documents, config.graph.clone());
    let server = HttpServer::new(Arc::new(RwLock::new(service)), config.http.clone());

    server
        .start(shutdown_signal())
        .await
        .map_err(|e| anyhow!("HTTP server failed: {}", e))?;

    drop(server);
    session.close()?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

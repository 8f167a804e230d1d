//! HTTP server exposing the protein API

use super::handler::{
    add_protein_handler, get_protein_handler, neighborhood_handler, remove_protein_handler,
    search_handler, stats_handler, status_handler, suggestions_handler, SharedService,
};
use crate::config::HttpConfig;
use crate::docstore::DocumentStore;
use crate::graph::GraphBackend;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Build the API router over a shared service
pub fn router<G, D>(service: SharedService<G, D>) -> Router
where
    G: GraphBackend + Send + Sync + 'static,
    D: DocumentStore + Send + Sync + 'static,
{
    Router::new()
        .route("/api/status", get(status_handler::<G, D>))
        .route("/api/stats", get(stats_handler::<G, D>))
        .route("/api/search", post(search_handler::<G, D>))
        .route("/api/suggestions", get(suggestions_handler::<G, D>))
        .route("/api/proteins", post(add_protein_handler::<G, D>))
        .route(
            "/api/proteins/:id",
            get(get_protein_handler::<G, D>).delete(remove_protein_handler::<G, D>),
        )
        .route("/api/proteins/:id/neighborhood", get(neighborhood_handler::<G, D>))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// HTTP server managing the protein API
pub struct HttpServer<G, D> {
    service: SharedService<G, D>,
    config: HttpConfig,
}

impl<G, D> HttpServer<G, D>
where
    G: GraphBackend + Send + Sync + 'static,
    D: DocumentStore + Send + Sync + 'static,
{
    /// Create a new HTTP server
    pub fn new(service: SharedService<G, D>, config: HttpConfig) -> Self {
        Self { service, config }
    }

    /// Serve until `shutdown` resolves
    pub async fn start(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(Arc::clone(&self.service));

        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Protein API available at http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

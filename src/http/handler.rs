//! HTTP handlers for the protein API

use crate::docstore::{DocumentStore, SearchCriteria, SearchPage, Suggestion, DEFAULT_SUGGESTION_LIMIT};
use crate::engine::{EngineError, Subgraph};
use crate::graph::{GraphBackend, ProteinId};
use crate::model::{Protein, RawProteinRecord};
use crate::service::{AddReport, ProteinService, RemoveReport, ServiceError};
use crate::stats::CorpusStats;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Service shared between handlers: read lock for queries, write lock for mutations
pub type SharedService<G, D> = Arc<RwLock<ProteinService<G, D>>>;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Engine(EngineError::Validation(_)) | ServiceError::Filter(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Engine(EngineError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn not_found(id: &ProteinId) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Protein not found: {}", id) })),
    )
        .into_response()
}

/// Body of a search request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub filters: SearchCriteria,
    /// 1-based
    pub page: usize,
    /// 0 selects the default page size
    pub per_page: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SuggestionParams {
    pub prefix: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NeighborhoodParams {
    pub k: Option<usize>,
    pub m: Option<usize>,
}

/// Handler for system status
pub async fn status_handler<G, D>(State(service): State<SharedService<G, D>>) -> Response
where
    G: GraphBackend,
    D: DocumentStore,
{
    let service = service.read().await;
    let graph = service.graph();
    let counts = (graph.node_count(), graph.edge_count(), service.documents().count());
    match counts {
        (Ok(nodes), Ok(edges), Ok(documents)) => Json(json!({
            "status": "healthy",
            "version": crate::VERSION,
            "storage": {
                "nodes": nodes,
                "edges": edges,
                "documents": documents,
            }
        }))
        .into_response(),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "version": crate::VERSION })),
        )
            .into_response(),
    }
}

pub async fn add_protein_handler<G, D>(
    State(service): State<SharedService<G, D>>,
    Json(record): Json<RawProteinRecord>,
) -> Result<Json<AddReport>, ServiceError>
where
    G: GraphBackend,
    D: DocumentStore,
{
    let mut service = service.write().await;
    Ok(Json(service.add_protein(&record)?))
}

pub async fn remove_protein_handler<G, D>(
    State(service): State<SharedService<G, D>>,
    Path(id): Path<String>,
) -> Result<Json<RemoveReport>, ServiceError>
where
    G: GraphBackend,
    D: DocumentStore,
{
    let mut service = service.write().await;
    Ok(Json(service.remove_protein(&ProteinId::new(id))?))
}

pub async fn get_protein_handler<G, D>(
    State(service): State<SharedService<G, D>>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError>
where
    G: GraphBackend,
    D: DocumentStore,
{
    let id = ProteinId::new(id);
    let service = service.read().await;
    let protein: Option<Protein> = service.get_protein(&id)?;
    Ok(match protein {
        Some(protein) => Json(protein).into_response(),
        None => not_found(&id),
    })
}

pub async fn search_handler<G, D>(
    State(service): State<SharedService<G, D>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchPage>, ServiceError>
where
    G: GraphBackend,
    D: DocumentStore,
{
    let service = service.read().await;
    Ok(Json(service.search(&request.filters, request.page, request.per_page)?))
}

pub async fn suggestions_handler<G, D>(
    State(service): State<SharedService<G, D>>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<Vec<Suggestion>>, ServiceError>
where
    G: GraphBackend,
    D: DocumentStore,
{
    let service = service.read().await;
    let limit = params.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);
    Ok(Json(service.suggestions(&params.prefix, limit)?))
}

pub async fn neighborhood_handler<G, D>(
    State(service): State<SharedService<G, D>>,
    Path(id): Path<String>,
    Query(params): Query<NeighborhoodParams>,
) -> Result<Response, ServiceError>
where
    G: GraphBackend,
    D: DocumentStore,
{
    let id = ProteinId::new(id);
    let service = service.read().await;
    let subgraph: Option<Subgraph> = service.neighborhood(&id, params.k, params.m)?;
    Ok(match subgraph {
        Some(subgraph) => Json(subgraph).into_response(),
        None => not_found(&id),
    })
}

pub async fn stats_handler<G, D>(
    State(service): State<SharedService<G, D>>,
) -> Result<Json<CorpusStats>, ServiceError>
where
    G: GraphBackend,
    D: DocumentStore,
{
    let service = service.read().await;
    Ok(Json(service.stats()?))
}

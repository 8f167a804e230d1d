//! Protein service
//!
//! Coordinates the document store and the similarity graph. Writes go to
//! both stores in two phases with no transaction spanning them: each phase
//! is idempotent and reported on its own, so a caller can retry the phase
//! that failed.

use crate::annotation::normalize;
use crate::config::GraphConfig;
use crate::docstore::{
    DocStoreError, DocumentStore, FilterError, SearchCriteria, SearchPage, Suggestion, UpsertOutcome,
};
use crate::engine::{
    neighborhood, BatchReport, EngineError, GraphMaintainer, NeighborhoodQuery, Subgraph,
};
use crate::graph::{GraphBackend, GraphError, ProteinId};
use crate::model::{Protein, RawProteinRecord};
use crate::stats::{compute_stats, CorpusStats};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid search: {0}")]
    Filter(#[from] FilterError),

    #[error("Document store error: {0}")]
    Documents(#[from] DocStoreError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Similarity link created while adding a protein
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source: ProteinId,
    pub target: ProteinId,
    pub weight: f64,
    pub shared_domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPhase {
    pub success: bool,
    pub outcome: Option<UpsertOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPhase {
    pub success: bool,
    pub similar_count: usize,
    pub relations: Vec<Relation>,
    pub error: Option<String>,
}

/// Outcome of adding one protein
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddReport {
    pub id: ProteinId,
    /// Both phases succeeded
    pub success: bool,
    pub documents: DocumentPhase,
    pub graph: GraphPhase,
}

/// Outcome of removing one protein
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveReport {
    pub id: ProteinId,
    /// Something was removed from at least one store
    pub success: bool,
    pub document_deleted: bool,
    pub node_deleted: bool,
    pub relations_deleted: usize,
    pub errors: Vec<String>,
}

/// Outcome of loading a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub records: usize,
    /// Records rejected by normalization
    pub invalid: usize,
    pub documents: usize,
    pub graph: BatchReport,
}

/// Document store and similarity graph behind one interface
pub struct ProteinService<G, D> {
    maintainer: GraphMaintainer<G>,
    documents: D,
    settings: GraphConfig,
}

impl<G: GraphBackend, D: DocumentStore> ProteinService<G, D> {
    pub fn new(graph: G, documents: D, settings: GraphConfig) -> Self {
        Self {
            maintainer: GraphMaintainer::new(graph),
            documents,
            settings,
        }
    }

    pub fn graph(&self) -> &G {
        self.maintainer.graph()
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn settings(&self) -> &GraphConfig {
        &self.settings
    }

    /// Add or replace a protein in both stores and relink it.
    ///
    /// A record without id is rejected before either store is touched.
    /// Store failures are reported in the phase they occurred in.
    pub fn add_protein(&mut self, record: &RawProteinRecord) -> ServiceResult<AddReport> {
        let protein = normalize(record).map_err(EngineError::from)?;

        let documents = match self.documents.upsert(&protein) {
            Ok(outcome) => DocumentPhase {
                success: true,
                outcome: Some(outcome),
                error: None,
            },
            Err(e) => {
                error!("Document phase failed for {}: {}", protein.id, e);
                DocumentPhase {
                    success: false,
                    outcome: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let graph = match self.link(&protein) {
            Ok(relations) => GraphPhase {
                success: true,
                similar_count: relations.len(),
                relations,
                error: None,
            },
            Err(e) => {
                error!("Graph phase failed for {}: {}", protein.id, e);
                GraphPhase {
                    success: false,
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };

        info!(
            "Added protein {} ({} similar)",
            protein.id, graph.similar_count
        );
        Ok(AddReport {
            id: protein.id,
            success: documents.success && graph.success,
            documents,
            graph,
        })
    }

    fn link(&mut self, protein: &Protein) -> Result<Vec<Relation>, EngineError> {
        self.maintainer.upsert(protein)?;
        self.maintainer.recompute_edges(&protein.id)?;

        let mut relations: Vec<Relation> = self
            .maintainer
            .graph()
            .edges_of(&protein.id)?
            .into_iter()
            .map(|edge| Relation {
                target: edge.other(&protein.id).cloned().unwrap_or_else(|| edge.target.clone()),
                source: protein.id.clone(),
                weight: edge.weight,
                shared_domains: edge.shared_domains,
            })
            .collect();
        relations.sort_by(|a, b| a.target.cmp(&b.target));
        Ok(relations)
    }

    /// Remove a protein from both stores.
    ///
    /// Succeeds when either store removed something; an id unknown to both
    /// is reported as unsuccessful, not as an error.
    pub fn remove_protein(&mut self, id: &ProteinId) -> ServiceResult<RemoveReport> {
        if id.is_blank() {
            return Err(EngineError::Validation(crate::annotation::AnnotationError::MissingId).into());
        }

        let mut errors = Vec::new();

        let document_deleted = self.documents.delete(id).unwrap_or_else(|e| {
            error!("Document phase failed for {}: {}", id, e);
            errors.push(e.to_string());
            false
        });

        let (node_deleted, relations_deleted) = match self.maintainer.delete_protein(id) {
            Ok(report) => (report.nodes_removed > 0, report.edges_removed),
            Err(e) => {
                error!("Graph phase failed for {}: {}", id, e);
                errors.push(e.to_string());
                (false, 0)
            }
        };

        if !document_deleted && !node_deleted {
            warn!("Protein {} not found in either store", id);
        }

        Ok(RemoveReport {
            id: id.clone(),
            success: document_deleted || node_deleted,
            document_deleted,
            node_deleted,
            relations_deleted,
            errors,
        })
    }

    /// Load a batch of records: documents first, then a batch graph build.
    ///
    /// Records without id are counted and skipped.
    pub fn load(&mut self, records: &[RawProteinRecord]) -> ServiceResult<LoadReport> {
        let mut proteins = Vec::with_capacity(records.len());
        let mut invalid = 0;
        for record in records {
            match normalize(record) {
                Ok(protein) => proteins.push(protein),
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    invalid += 1;
                }
            }
        }

        let mut documents = 0;
        for chunk in proteins.chunks(self.settings.batch_size.max(1)) {
            documents += self.documents.upsert_many(chunk)?;
        }
        let graph = self.maintainer.batch_build(&proteins, self.settings.batch_size)?;

        info!(
            "Loaded {} records ({} invalid): {} documents, {} nodes, {} edges",
            records.len(),
            invalid,
            documents,
            graph.nodes,
            graph.edges
        );
        Ok(LoadReport {
            records: records.len(),
            invalid,
            documents,
            graph,
        })
    }

    pub fn get_protein(&self, id: &ProteinId) -> ServiceResult<Option<Protein>> {
        Ok(self.documents.get(id)?)
    }

    pub fn search(&self, criteria: &SearchCriteria, page: usize, per_page: usize) -> ServiceResult<SearchPage> {
        let query = criteria.to_query()?;
        Ok(self.documents.search(&query, page, per_page)?)
    }

    pub fn suggestions(&self, prefix: &str, limit: usize) -> ServiceResult<Vec<Suggestion>> {
        Ok(self.documents.suggestions(prefix, limit)?)
    }

    /// Neighborhood of a protein; `k` and `m` fall back to the configured defaults
    pub fn neighborhood(
        &self,
        id: &ProteinId,
        k: Option<usize>,
        m: Option<usize>,
    ) -> ServiceResult<Option<Subgraph>> {
        let query = NeighborhoodQuery::new(
            id.clone(),
            k.unwrap_or(self.settings.neighbors_k),
            m.unwrap_or(self.settings.neighbors_m),
        );
        Ok(neighborhood(self.maintainer.graph(), &query)?)
    }

    pub fn stats(&self) -> ServiceResult<CorpusStats> {
        Ok(compute_stats(self.maintainer.graph())?)
    }

    /// Drop every document, node and edge
    pub fn reset(&mut self) -> ServiceResult<()> {
        self.documents.clear()?;
        self.maintainer.graph_mut().clear()?;
        info!("Reset document store and graph");
        Ok(())
    }
}

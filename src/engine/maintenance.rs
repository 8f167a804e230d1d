//! Incremental graph maintenance
//!
//! Keeps the similarity graph consistent as proteins come and go: a node is
//! upserted by id, its edge set is recomputed and replaced wholesale, and
//! deleting it removes every touching edge in the same store operation.

use super::{EngineError, EngineResult};
use crate::annotation::{normalize, AnnotationError};
use crate::graph::{keys, GraphBackend, ProteinId};
use crate::model::{Protein, RawProteinRecord};
use crate::similarity::{compute_edges, DomainSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of recomputing the edges of one protein
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeReport {
    pub protein_id: ProteinId,
    /// Edges written
    pub created: usize,
    /// Stale edges removed before writing
    pub removed: usize,
    /// The protein has no domains, so no edge was computed
    pub skipped: bool,
}

/// Outcome of deleting one protein from the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub protein_id: ProteinId,
    pub nodes_removed: usize,
    pub edges_removed: usize,
}

impl DeleteReport {
    pub fn is_empty(&self) -> bool {
        self.nodes_removed == 0
    }
}

/// Maintains the similarity graph over any [`GraphBackend`]
pub struct GraphMaintainer<G> {
    graph: G,
}

impl<G: GraphBackend> GraphMaintainer<G> {
    pub fn new(graph: G) -> Self {
        GraphMaintainer { graph }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn into_inner(self) -> G {
        self.graph
    }

    /// Normalize a raw record and write its node.
    ///
    /// A record without id is rejected before the store is touched.
    /// Upserting the same record twice leaves the graph unchanged apart
    /// from the node's update timestamp.
    pub fn upsert_protein(&mut self, record: &RawProteinRecord) -> EngineResult<ProteinId> {
        let protein = normalize(record)?;
        self.upsert(&protein)?;
        Ok(protein.id)
    }

    /// Write the node of an already normalized protein.
    /// Returns true when the node was created.
    pub fn upsert(&mut self, protein: &Protein) -> EngineResult<bool> {
        let created = self.graph.upsert_node(&protein.id, protein.to_properties())?;
        debug!("Upserted protein {} (created: {})", protein.id, created);
        Ok(created)
    }

    /// Replace the edge set of a protein with freshly computed edges.
    ///
    /// Edges to every other protein sharing at least one domain are
    /// recomputed; every previous edge of the protein is removed in the same
    /// store operation. A protein without domains ends up with no edges and
    /// is reported as skipped.
    pub fn recompute_edges(&mut self, id: &ProteinId) -> EngineResult<EdgeReport> {
        let node = self
            .graph
            .get_node(id)?
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        let domains = node
            .get_property(keys::DOMAIN_IDS)
            .map(DomainSet::from_property)
            .unwrap_or_default();

        if domains.is_empty() {
            let replaced = self.graph.replace_edges(id, Vec::new())?;
            debug!("Protein {} has no domains, removed {} edges", id, replaced.removed);
            return Ok(EdgeReport {
                protein_id: id.clone(),
                created: 0,
                removed: replaced.removed,
                skipped: true,
            });
        }

        let candidates = self.graph.scan_nodes()?;
        let edges = compute_edges(
            id,
            &domains,
            candidates.iter().map(|candidate| {
                let other = candidate
                    .get_property(keys::DOMAIN_IDS)
                    .map(DomainSet::from_property)
                    .unwrap_or_default();
                (&candidate.id, other)
            }),
        );

        let replaced = self.graph.replace_edges(id, edges)?;
        info!(
            "Recomputed edges of {}: {} created, {} removed",
            id, replaced.created, replaced.removed
        );

        Ok(EdgeReport {
            protein_id: id.clone(),
            created: replaced.created,
            removed: replaced.removed,
            skipped: false,
        })
    }

    /// Upsert a record and recompute its edges
    pub fn add_protein(&mut self, record: &RawProteinRecord) -> EngineResult<EdgeReport> {
        let id = self.upsert_protein(record)?;
        self.recompute_edges(&id)
    }

    /// Remove a protein and every edge touching it.
    ///
    /// An unknown id removes nothing and is not an error.
    pub fn delete_protein(&mut self, id: &ProteinId) -> EngineResult<DeleteReport> {
        if id.is_blank() {
            return Err(AnnotationError::MissingId.into());
        }

        let report = match self.graph.detach_delete(id)? {
            Some(edges_removed) => DeleteReport {
                protein_id: id.clone(),
                nodes_removed: 1,
                edges_removed,
            },
            None => DeleteReport {
                protein_id: id.clone(),
                nodes_removed: 0,
                edges_removed: 0,
            },
        };

        info!(
            "Deleted protein {}: {} nodes, {} edges",
            id, report.nodes_removed, report.edges_removed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphError, GraphStore};

    fn record(id: &str, interpro: &str) -> RawProteinRecord {
        RawProteinRecord {
            id: Some(id.to_string()),
            interpro: Some(interpro.to_string()),
            ..Default::default()
        }
    }

    fn maintainer() -> GraphMaintainer<GraphStore> {
        GraphMaintainer::new(GraphStore::new())
    }

    #[test]
    fn test_upsert_rejects_missing_id() {
        let mut engine = maintainer();
        let result = engine.upsert_protein(&RawProteinRecord::default());
        assert_eq!(result, Err(EngineError::Validation(AnnotationError::MissingId)));
        assert_eq!(engine.graph().node_count(), 0);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut engine = maintainer();
        let r = record("P1", "IPR1;IPR2");
        engine.upsert_protein(&r).unwrap();
        engine.upsert_protein(&r).unwrap();
        assert_eq!(engine.graph().node_count(), 1);
    }

    #[test]
    fn test_recompute_creates_weighted_edges() {
        let mut engine = maintainer();
        engine.upsert_protein(&record("P1", "X;Y")).unwrap();
        engine.upsert_protein(&record("P2", "Y;Z")).unwrap();
        engine.upsert_protein(&record("P3", "W")).unwrap();

        let report = engine.recompute_edges(&ProteinId::new("P1")).unwrap();
        assert_eq!(report.created, 1);
        assert!(!report.skipped);

        let edges = engine.graph().all_edges();
        assert_eq!(edges.len(), 1);
        assert!((edges[0].weight - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(edges[0].shared_domains, vec!["Y".to_string()]);
    }

    #[test]
    fn test_recompute_removes_stale_edges() {
        let mut engine = maintainer();
        engine.upsert_protein(&record("P1", "X")).unwrap();
        engine.upsert_protein(&record("P2", "X")).unwrap();
        engine.recompute_edges(&ProteinId::new("P1")).unwrap();
        assert_eq!(engine.graph().edge_count(), 1);

        // Domains change to something nobody else has
        engine.upsert_protein(&record("P1", "Q")).unwrap();
        let report = engine.recompute_edges(&ProteinId::new("P1")).unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.created, 0);
        assert_eq!(engine.graph().edge_count(), 0);

        // Domains disappear entirely
        engine.upsert_protein(&record("P1", "X")).unwrap();
        engine.recompute_edges(&ProteinId::new("P1")).unwrap();
        engine.upsert_protein(&record("P1", "")).unwrap();
        let report = engine.recompute_edges(&ProteinId::new("P1")).unwrap();
        assert!(report.skipped);
        assert_eq!(report.removed, 1);
        assert_eq!(engine.graph().edge_count(), 0);
    }

    #[test]
    fn test_recompute_unknown_protein() {
        let mut engine = maintainer();
        let result = engine.recompute_edges(&ProteinId::new("nope"));
        assert_eq!(result, Err(EngineError::NotFound(ProteinId::new("nope"))));
    }

    #[test]
    fn test_delete_cascades() {
        let mut engine = maintainer();
        engine.add_protein(&record("P1", "X")).unwrap();
        engine.add_protein(&record("P2", "X")).unwrap();
        engine.add_protein(&record("P3", "X")).unwrap();
        assert_eq!(engine.graph().edge_count(), 3);

        let report = engine.delete_protein(&ProteinId::new("P1")).unwrap();
        assert_eq!(report.nodes_removed, 1);
        assert_eq!(report.edges_removed, 2);
        assert_eq!(engine.graph().edge_count(), 1);

        let report = engine.delete_protein(&ProteinId::new("P1")).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.edges_removed, 0);
    }

    #[test]
    fn test_delete_rejects_blank_id() {
        let mut engine = maintainer();
        let result = engine.delete_protein(&ProteinId::new(" "));
        assert_eq!(result, Err(EngineError::Validation(AnnotationError::MissingId)));
    }

    #[test]
    fn test_graph_errors_propagate() {
        let err: EngineError = GraphError::NodeNotFound(ProteinId::new("P9")).into();
        assert!(err.to_string().contains("P9"));
    }
}

//! Offline batch construction of the similarity graph
//!
//! Instead of comparing every protein with every other one, proteins are
//! grouped by domain and each group contributes one co-occurrence to every
//! pair it contains. The co-occurrence count of a pair is the size of the
//! intersection of their domain sets, which gives the same Jaccard weight
//! as the incremental path.
//!
//! Loading into a graph that already holds proteins keeps the similarity
//! invariant: resident proteins take part in the co-occurrence, and a
//! corpus protein that replaces a resident node gets its whole edge set
//! swapped instead of merged.

use super::maintenance::GraphMaintainer;
use super::EngineResult;
use crate::graph::{Edge, EdgeKey, GraphBackend, ProteinId};
use crate::model::Protein;
use crate::similarity::jaccard_from_counts;
use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default number of records per commit
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Outcome of a batch build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Nodes written
    pub nodes: usize,
    /// Edges written
    pub edges: usize,
    /// Store commits issued
    pub batches: usize,
}

/// Compute every similarity edge of a corpus through domain co-occurrence.
///
/// Proteins without domains take part in no edge. When an id appears more
/// than once, its last occurrence wins. Edges come back sorted by
/// (source, target).
pub fn co_occurrence_edges(corpus: &[Protein]) -> Vec<Edge> {
    let mut unique: IndexMap<&ProteinId, &Protein> = IndexMap::with_capacity(corpus.len());
    for protein in corpus {
        unique.insert(&protein.id, protein);
    }
    let proteins: Vec<&Protein> = unique
        .into_values()
        .filter(|p| !p.domain_ids.is_empty())
        .collect();

    // domain -> indices of the proteins carrying it
    let mut by_domain: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for (idx, protein) in proteins.iter().enumerate() {
        for domain in &protein.domain_ids {
            by_domain.entry(domain.as_str()).or_default().push(idx);
        }
    }

    // (i, j) with i < j -> domains shared by the pair
    let mut shared: FxHashMap<(usize, usize), Vec<&str>> = FxHashMap::default();
    for (domain, members) in &by_domain {
        for (pos, &i) in members.iter().enumerate() {
            for &j in &members[pos + 1..] {
                shared.entry((i, j)).or_default().push(*domain);
            }
        }
    }
    debug!(
        "Co-occurrence over {} domains produced {} pairs",
        by_domain.len(),
        shared.len()
    );

    let mut edges: Vec<Edge> = shared
        .into_par_iter()
        .filter_map(|((i, j), mut domains)| {
            let (a, b) = (proteins[i], proteins[j]);
            let key = EdgeKey::new(&a.id, &b.id)?;
            domains.sort_unstable();
            let weight = jaccard_from_counts(domains.len(), a.domain_ids.len(), b.domain_ids.len());
            Some(Edge::new(
                key,
                weight,
                domains.into_iter().map(str::to_string).collect(),
            ))
        })
        .collect();

    edges.sort_by(|x, y| (&x.source, &x.target).cmp(&(&y.source, &y.target)));
    edges
}

impl<G: GraphBackend> GraphMaintainer<G> {
    /// Build the graph of a whole corpus in fixed-size commits.
    ///
    /// Nodes are written first, then edges. Each commit is atomic on its own;
    /// an interrupted build leaves every committed chunk in place. Running
    /// the same build again rewrites the same nodes and edges.
    ///
    /// On a graph that already holds nodes, new proteins are linked to the
    /// resident ones and every corpus protein that overwrote a resident node
    /// has its edge set replaced in one commit per protein.
    pub fn batch_build(&mut self, corpus: &[Protein], batch_size: usize) -> EngineResult<BatchReport> {
        let batch_size = batch_size.max(1);
        let mut report = BatchReport::default();

        let resident = self.graph().scan_nodes()?;
        info!(
            "Batch build of {} proteins over {} resident nodes",
            corpus.len(),
            resident.len()
        );

        for chunk in corpus.chunks(batch_size) {
            let nodes = chunk
                .iter()
                .map(|p| (p.id.clone(), p.to_properties()))
                .collect();
            report.nodes += self.graph_mut().upsert_nodes(nodes)?;
            report.batches += 1;
        }
        debug!("Wrote {} nodes in {} batches", report.nodes, report.batches);

        let incoming: FxHashSet<&ProteinId> = corpus.iter().map(|p| &p.id).collect();
        let edges = if resident.is_empty() {
            co_occurrence_edges(corpus)
        } else {
            // Corpus records come last so they win over the resident version
            let mut universe: Vec<Protein> = resident.iter().map(Protein::from_node).collect();
            universe.extend_from_slice(corpus);
            co_occurrence_edges(&universe)
                .into_iter()
                .filter(|e| incoming.contains(&e.source) || incoming.contains(&e.target))
                .collect()
        };
        let total = edges.len();

        // Overwritten nodes may carry stale edges, so they are relinked as a whole
        let mut relinked: IndexMap<ProteinId, Vec<Edge>> = resident
            .iter()
            .filter(|node| incoming.contains(&node.id))
            .map(|node| (node.id.clone(), Vec::new()))
            .collect();
        let mut fresh = Vec::with_capacity(total);
        for edge in edges {
            let mut claimed = false;
            for end in [&edge.source, &edge.target] {
                if let Some(group) = relinked.get_mut(end) {
                    group.push(edge.clone());
                    claimed = true;
                }
            }
            if !claimed {
                fresh.push(edge);
            }
        }

        let mut fresh = fresh.into_iter().peekable();
        while fresh.peek().is_some() {
            let chunk: Vec<Edge> = fresh.by_ref().take(batch_size).collect();
            self.graph_mut().commit_edges(chunk)?;
            report.batches += 1;
        }
        for (id, group) in relinked {
            let replaced = self.graph_mut().replace_edges(&id, group)?;
            debug!(
                "Relinked {}: {} edges removed, {} created",
                id, replaced.removed, replaced.created
            );
            report.batches += 1;
        }
        report.edges = total;

        info!(
            "Batch build done: {} nodes, {} edges, {} batches",
            report.nodes, report.edges, report.batches
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;
    use crate::similarity::DomainSet;

    fn protein(id: &str, domains: &[&str]) -> Protein {
        let mut p = Protein::new(id);
        p.domain_ids = DomainSet::from_tokens(domains.iter().copied());
        p
    }

    #[test]
    fn test_co_occurrence_weights() {
        let corpus = vec![
            protein("A", &["X", "Y"]),
            protein("B", &["Y", "Z"]),
            protein("C", &["X", "Y", "Z"]),
            protein("D", &[]),
        ];
        let edges = co_occurrence_edges(&corpus);
        assert_eq!(edges.len(), 3);

        let ab = &edges[0];
        assert_eq!((ab.source.as_str(), ab.target.as_str()), ("A", "B"));
        assert!((ab.weight - 1.0 / 3.0).abs() < 1e-12);

        let ac = &edges[1];
        assert_eq!((ac.source.as_str(), ac.target.as_str()), ("A", "C"));
        assert!((ac.weight - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(ac.shared_domains, vec!["X".to_string(), "Y".to_string()]);

        assert!(edges.iter().all(|e| e.source.as_str() != "D" && e.target.as_str() != "D"));
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let corpus = vec![
            protein("A", &["X"]),
            protein("B", &["X"]),
            protein("A", &["Q"]),
        ];
        assert!(co_occurrence_edges(&corpus).is_empty());
    }

    #[test]
    fn test_batch_build_chunks_commits() {
        let corpus: Vec<Protein> = (0..5).map(|i| protein(&format!("P{}", i), &["X"])).collect();
        let mut engine = GraphMaintainer::new(GraphStore::new());

        let report = engine.batch_build(&corpus, 2).unwrap();
        // 5 nodes in 3 chunks, 10 edges in 5 chunks
        assert_eq!(report, BatchReport { nodes: 5, edges: 10, batches: 8 });
        assert_eq!(engine.graph().edge_count(), 10);

        // Re-running rewrites the same graph
        let again = engine.batch_build(&corpus, 2).unwrap();
        assert_eq!(again.edges, 10);
        assert_eq!(engine.graph().node_count(), 5);
        assert_eq!(engine.graph().edge_count(), 10);
    }

    #[test]
    fn test_rebuild_drops_stale_edges() {
        let mut engine = GraphMaintainer::new(GraphStore::new());
        engine
            .batch_build(&[protein("P1", &["X"]), protein("P2", &["X"])], 10)
            .unwrap();
        assert_eq!(engine.graph().edge_count(), 1);

        let report = engine
            .batch_build(&[protein("P1", &["Y"]), protein("P2", &["X"])], 10)
            .unwrap();
        assert_eq!(report.edges, 0);
        assert_eq!(engine.graph().node_count(), 2);
        assert_eq!(engine.graph().edge_count(), 0);
    }

    #[test]
    fn test_build_links_to_resident_proteins() {
        let mut engine = GraphMaintainer::new(GraphStore::new());
        engine.upsert(&protein("P1", &["X", "Y"])).unwrap();
        engine.upsert(&protein("P3", &["Y"])).unwrap();
        engine.recompute_edges(&ProteinId::new("P3")).unwrap();
        assert_eq!(engine.graph().edge_count(), 1);

        let report = engine.batch_build(&[protein("P2", &["X"])], 10).unwrap();
        assert_eq!(report.edges, 1);

        let edges = GraphBackend::scan_edges(engine.graph()).unwrap();
        let pairs: Vec<(&str, &str, f64)> = edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.weight))
            .collect();
        assert_eq!(pairs, vec![("P1", "P2", 0.5), ("P1", "P3", 0.5)]);
    }

    #[test]
    fn test_partial_reload_matches_incremental_graph() {
        let mut engine = GraphMaintainer::new(GraphStore::new());
        engine
            .batch_build(
                &[protein("A", &["X", "Y"]), protein("B", &["Y"]), protein("C", &["Z"])],
                2,
            )
            .unwrap();
        // B moves from Y to Z, D joins on X
        engine
            .batch_build(&[protein("B", &["Z"]), protein("D", &["X"])], 2)
            .unwrap();

        let edges = GraphBackend::scan_edges(engine.graph()).unwrap();
        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "D"), ("B", "C")]);
        assert!((edges[0].weight - 0.5).abs() < 1e-12);
        assert_eq!(edges[1].weight, 1.0);
    }

    #[test]
    fn test_batch_size_zero_is_clamped() {
        let corpus = vec![protein("A", &["X"]), protein("B", &["X"])];
        let mut engine = GraphMaintainer::new(GraphStore::new());
        let report = engine.batch_build(&corpus, 0).unwrap();
        assert_eq!(report.batches, 3);
    }
}

//! Corpus statistics
//!
//! A protein is labelled when it carries at least one EC code and isolated
//! when no edge touches it. Ratios are percentages of the total, 0 for an
//! empty corpus.

use crate::graph::{keys, GraphBackend, GraphResult, ProteinId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_proteins: usize,
    pub labelled_proteins: usize,
    pub unlabelled_proteins: usize,
    pub isolated_proteins: usize,
    pub total_edges: usize,
    pub labelled_ratio: f64,
    pub isolated_ratio: f64,
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Compute statistics over the graph
pub fn compute_stats<G: GraphBackend + ?Sized>(graph: &G) -> GraphResult<CorpusStats> {
    let nodes = graph.scan_nodes()?;
    let edges = graph.scan_edges()?;

    let connected: FxHashSet<&ProteinId> = edges
        .iter()
        .flat_map(|e| [&e.source, &e.target])
        .collect();

    let total = nodes.len();
    let labelled = nodes
        .iter()
        .filter(|n| !n.get_string_list(keys::ENZYME_CODES).is_empty())
        .count();
    let isolated = nodes.iter().filter(|n| !connected.contains(&n.id)).count();

    Ok(CorpusStats {
        total_proteins: total,
        labelled_proteins: labelled,
        unlabelled_proteins: total - labelled,
        isolated_proteins: isolated,
        total_edges: edges.len(),
        labelled_ratio: percent(labelled, total),
        isolated_ratio: percent(isolated, total),
    })
}

//! Bounded two-hop neighborhood of a protein
//!
//! The center's strongest `k` neighbors form level 1. For each of them, its
//! strongest `m` neighbors other than the center form level 2. Nodes are
//! emitted once, at the shallowest level they were reached, together with
//! every edge running between emitted nodes.

use crate::graph::{GraphBackend, GraphResult, Neighbor, ProteinId};
use crate::model::ProteinSummary;
use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Distance of a node from the query center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HopLevel {
    Center,
    Level1,
    Level2,
}

/// Parameters of a neighborhood query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodQuery {
    pub center: ProteinId,
    /// Direct neighbors kept
    pub k: usize,
    /// Second-hop neighbors kept per direct neighbor
    pub m: usize,
}

impl NeighborhoodQuery {
    pub fn new(center: impl Into<ProteinId>, k: usize, m: usize) -> Self {
        NeighborhoodQuery {
            center: center.into(),
            k,
            m,
        }
    }
}

/// A node of the returned subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphNode {
    #[serde(flatten)]
    pub protein: ProteinSummary,
    pub group: HopLevel,
    /// Weight of the edge through which the node was reached, 1.0 for the center
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphEdge {
    pub source: ProteinId,
    pub target: ProteinId,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<SubgraphNode>,
    pub edges: Vec<SubgraphEdge>,
}

impl Subgraph {
    pub fn node(&self, id: &ProteinId) -> Option<&SubgraphNode> {
        self.nodes.iter().find(|n| &n.protein.id == id)
    }
}

/// Strongest neighbors first, ties broken by id
fn rank(mut neighbors: Vec<Neighbor>, limit: usize) -> Vec<Neighbor> {
    neighbors.sort_by(|a, b| match b.weight.total_cmp(&a.weight) {
        Ordering::Equal => a.node.id.cmp(&b.node.id),
        other => other,
    });
    neighbors.truncate(limit);
    neighbors
}

/// Run a neighborhood query.
///
/// Returns `None` when the center does not exist. An isolated center gives a
/// single node and no edges.
pub fn neighborhood<G: GraphBackend + ?Sized>(
    graph: &G,
    query: &NeighborhoodQuery,
) -> GraphResult<Option<Subgraph>> {
    let Some(center) = graph.get_node(&query.center)? else {
        return Ok(None);
    };

    let mut nodes: IndexMap<ProteinId, SubgraphNode> = IndexMap::new();
    nodes.insert(
        center.id.clone(),
        SubgraphNode {
            protein: ProteinSummary::from_node(&center),
            group: HopLevel::Center,
            similarity: 1.0,
        },
    );

    let level1 = rank(graph.neighbors(&center.id)?, query.k);
    for neighbor in &level1 {
        if let Entry::Vacant(slot) = nodes.entry(neighbor.node.id.clone()) {
            slot.insert(SubgraphNode {
                protein: ProteinSummary::from_node(&neighbor.node),
                group: HopLevel::Level1,
                similarity: neighbor.weight,
            });
        }
    }

    for hop in &level1 {
        let candidates: Vec<Neighbor> = graph
            .neighbors(&hop.node.id)?
            .into_iter()
            .filter(|n| n.node.id != center.id)
            .collect();

        for neighbor in rank(candidates, query.m) {
            match nodes.entry(neighbor.node.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(SubgraphNode {
                        protein: ProteinSummary::from_node(&neighbor.node),
                        group: HopLevel::Level2,
                        similarity: neighbor.weight,
                    });
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    if existing.group == HopLevel::Level2 && neighbor.weight > existing.similarity {
                        existing.similarity = neighbor.weight;
                    }
                }
            }
        }
    }

    let ids: FxHashSet<ProteinId> = nodes.keys().cloned().collect();
    let edges = graph
        .edges_among(&ids)?
        .into_iter()
        .map(|edge| SubgraphEdge {
            source: edge.source,
            target: edge.target,
            weight: edge.weight,
        })
        .collect();

    Ok(Some(Subgraph {
        nodes: nodes.into_values().collect(),
        edges,
    }))
}

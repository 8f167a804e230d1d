//! Graph store interface consumed by the maintenance and query engines
//!
//! Both the in-memory [`GraphStore`] and the RocksDB-backed
//! `PersistentGraph` implement it. Every method is one unit of atomicity:
//! it either applies completely or reports an error without side effects.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::store::{GraphError, GraphResult, GraphStore};
use super::types::ProteinId;
use rustc_hash::FxHashSet;

/// A direct neighbor of a node and the weight of the connecting edge
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub node: Node,
    pub weight: f64,
}

/// Outcome of replacing the edge set of one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeReplacement {
    pub removed: usize,
    pub created: usize,
}

/// Storage operations the similarity graph needs
pub trait GraphBackend {
    /// Insert or overwrite a node keyed by id. Returns true when created.
    fn upsert_node(&mut self, id: &ProteinId, properties: PropertyMap) -> GraphResult<bool>;

    /// Upsert many nodes as one commit. Returns the number written.
    fn upsert_nodes(&mut self, nodes: Vec<(ProteinId, PropertyMap)>) -> GraphResult<usize>;

    fn get_node(&self, id: &ProteinId) -> GraphResult<Option<Node>>;

    /// Every node, sorted by id
    fn scan_nodes(&self) -> GraphResult<Vec<Node>>;

    /// Delete every edge touching `id`, then create `edges`, as one unit.
    ///
    /// Every new edge must touch `id` and both its endpoints must exist.
    fn replace_edges(&mut self, id: &ProteinId, edges: Vec<Edge>) -> GraphResult<EdgeReplacement>;

    /// Write many edges as one commit, overwriting edges of the same pair.
    fn commit_edges(&mut self, edges: Vec<Edge>) -> GraphResult<usize>;

    /// Remove a node and every edge touching it.
    /// Returns `None` when the node does not exist, otherwise the number of
    /// edges removed with it.
    fn detach_delete(&mut self, id: &ProteinId) -> GraphResult<Option<usize>>;

    /// Direct neighbors, in no particular order
    fn neighbors(&self, id: &ProteinId) -> GraphResult<Vec<Neighbor>>;

    /// Edges touching `id`
    fn edges_of(&self, id: &ProteinId) -> GraphResult<Vec<Edge>>;

    /// Edges with both endpoints in `ids`, each once, sorted by (source, target)
    fn edges_among(&self, ids: &FxHashSet<ProteinId>) -> GraphResult<Vec<Edge>>;

    /// Every edge, sorted by (source, target)
    fn scan_edges(&self) -> GraphResult<Vec<Edge>>;

    fn node_count(&self) -> GraphResult<usize>;

    fn edge_count(&self) -> GraphResult<usize>;

    /// Drop every node and edge
    fn clear(&mut self) -> GraphResult<()>;
}

impl GraphStore {
    /// Check that a replacement edge set is applicable to `id`
    pub(crate) fn validate_replacement(&self, id: &ProteinId, edges: &[Edge]) -> GraphResult<()> {
        if !self.has_node(id) {
            return Err(GraphError::NodeNotFound(id.clone()));
        }
        self.validate_edges(edges)?;
        for edge in edges {
            if !edge.touches(id) {
                return Err(GraphError::ForeignEdge {
                    node: id.clone(),
                    edge: edge.key(),
                });
            }
        }
        Ok(())
    }

    /// Check that every edge endpoint exists
    pub(crate) fn validate_edges(&self, edges: &[Edge]) -> GraphResult<()> {
        for edge in edges {
            if !self.has_node(&edge.source) {
                return Err(GraphError::InvalidEdgeSource(edge.source.clone()));
            }
            if !self.has_node(&edge.target) {
                return Err(GraphError::InvalidEdgeTarget(edge.target.clone()));
            }
        }
        Ok(())
    }
}

impl GraphBackend for GraphStore {
    fn upsert_node(&mut self, id: &ProteinId, properties: PropertyMap) -> GraphResult<bool> {
        Ok(GraphStore::upsert_node(self, id, properties))
    }

    fn upsert_nodes(&mut self, nodes: Vec<(ProteinId, PropertyMap)>) -> GraphResult<usize> {
        let count = nodes.len();
        for (id, properties) in nodes {
            GraphStore::upsert_node(self, &id, properties);
        }
        Ok(count)
    }

    fn get_node(&self, id: &ProteinId) -> GraphResult<Option<Node>> {
        Ok(GraphStore::get_node(self, id).cloned())
    }

    fn scan_nodes(&self) -> GraphResult<Vec<Node>> {
        Ok(self.all_nodes().into_iter().cloned().collect())
    }

    fn replace_edges(&mut self, id: &ProteinId, edges: Vec<Edge>) -> GraphResult<EdgeReplacement> {
        self.validate_replacement(id, &edges)?;

        let removed = self.remove_edges_of(id).len();
        let created = edges.len();
        for edge in edges {
            self.put_edge(edge)?;
        }

        Ok(EdgeReplacement { removed, created })
    }

    fn commit_edges(&mut self, edges: Vec<Edge>) -> GraphResult<usize> {
        self.validate_edges(&edges)?;
        let count = edges.len();
        for edge in edges {
            self.put_edge(edge)?;
        }
        Ok(count)
    }

    fn detach_delete(&mut self, id: &ProteinId) -> GraphResult<Option<usize>> {
        if !self.has_node(id) {
            return Ok(None);
        }
        let (_, removed) = self.delete_node(id)?;
        Ok(Some(removed.len()))
    }

    fn neighbors(&self, id: &ProteinId) -> GraphResult<Vec<Neighbor>> {
        Ok(GraphStore::neighbors(self, id)
            .into_iter()
            .map(|(node, edge)| Neighbor {
                node: node.clone(),
                weight: edge.weight,
            })
            .collect())
    }

    fn edges_of(&self, id: &ProteinId) -> GraphResult<Vec<Edge>> {
        Ok(GraphStore::edges_of(self, id).into_iter().cloned().collect())
    }

    fn edges_among(&self, ids: &FxHashSet<ProteinId>) -> GraphResult<Vec<Edge>> {
        Ok(GraphStore::edges_among(self, ids).into_iter().cloned().collect())
    }

    fn scan_edges(&self) -> GraphResult<Vec<Edge>> {
        Ok(self.all_edges().into_iter().cloned().collect())
    }

    fn node_count(&self) -> GraphResult<usize> {
        Ok(GraphStore::node_count(self))
    }

    fn edge_count(&self) -> GraphResult<usize> {
        Ok(GraphStore::edge_count(self))
    }

    fn clear(&mut self) -> GraphResult<()> {
        GraphStore::clear(self);
        Ok(())
    }
}

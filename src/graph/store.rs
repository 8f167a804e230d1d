//! In-memory similarity graph storage
//!
//! Nodes and edges live in slot arenas with free lists, as in a classic
//! adjacency-list property graph. Two hash indices sit on top:
//! - key_index: ProteinId -> NodeId (the node key index)
//! - pair_index: EdgeKey -> EdgeId (one edge per unordered pair)

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::types::{EdgeId, EdgeKey, NodeId, ProteinId};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(ProteinId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(ProteinId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(ProteinId),

    #[error("Invalid edge: {edge} does not touch {node}")]
    ForeignEdge { node: ProteinId, edge: EdgeKey },

    #[error("Graph storage error: {0}")]
    Storage(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
#[derive(Debug, Default)]
pub struct GraphStore {
    /// Node arena
    nodes: Vec<Option<Node>>,

    /// Edge arena
    edges: Vec<Option<Edge>>,

    /// Incident edges of each node slot (undirected adjacency list)
    adjacency: Vec<Vec<EdgeId>>,

    /// Free node slots for reuse
    free_node_ids: Vec<u64>,

    /// Free edge slots for reuse
    free_edge_ids: Vec<u64>,

    /// Node key index
    key_index: FxHashMap<ProteinId, NodeId>,

    /// Unordered pair index
    pair_index: FxHashMap<EdgeKey, EdgeId>,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        GraphStore {
            nodes: Vec::with_capacity(1024),
            edges: Vec::with_capacity(4096),
            adjacency: Vec::with_capacity(1024),
            ..Default::default()
        }
    }

    /// Insert or overwrite a node keyed by protein id.
    ///
    /// An existing node keeps its creation timestamp and its edges; only the
    /// property payload is replaced. Returns true when the node was created.
    pub fn upsert_node(&mut self, id: &ProteinId, properties: PropertyMap) -> bool {
        if let Some(node) = self.get_node_mut(id) {
            node.replace_properties(properties);
            return false;
        }
        self.insert_node(Node::new_with_properties(id.clone(), properties));
        true
    }

    /// Insert a fully built node, preserving its timestamps.
    /// Used when recovering from persistence; an existing node is overwritten.
    pub fn insert_node(&mut self, node: Node) {
        if let Some(&slot) = self.key_index.get(&node.id) {
            self.nodes[slot.as_u64() as usize] = Some(node);
            return;
        }

        let slot = match self.free_node_ids.pop() {
            Some(id) => id,
            None => {
                self.nodes.push(None);
                self.adjacency.push(Vec::new());
                (self.nodes.len() - 1) as u64
            }
        };
        let idx = slot as usize;
        self.key_index.insert(node.id.clone(), NodeId::new(slot));
        self.adjacency[idx].clear();
        self.nodes[idx] = Some(node);
    }

    /// Get a node by protein id
    pub fn get_node(&self, id: &ProteinId) -> Option<&Node> {
        let slot = self.key_index.get(id)?;
        self.nodes.get(slot.as_u64() as usize)?.as_ref()
    }

    /// Get a mutable node by protein id
    pub fn get_node_mut(&mut self, id: &ProteinId) -> Option<&mut Node> {
        let slot = *self.key_index.get(id)?;
        self.nodes.get_mut(slot.as_u64() as usize)?.as_mut()
    }

    /// Check if a node exists
    pub fn has_node(&self, id: &ProteinId) -> bool {
        self.key_index.contains_key(id)
    }

    /// Insert an edge, or overwrite the edge already linking the same pair.
    ///
    /// Both endpoints must exist.
    pub fn put_edge(&mut self, edge: Edge) -> GraphResult<EdgeId> {
        let source = *self
            .key_index
            .get(&edge.source)
            .ok_or_else(|| GraphError::InvalidEdgeSource(edge.source.clone()))?;
        let target = *self
            .key_index
            .get(&edge.target)
            .ok_or_else(|| GraphError::InvalidEdgeTarget(edge.target.clone()))?;

        let key = edge.key();
        if let Some(&existing) = self.pair_index.get(&key) {
            self.edges[existing.as_u64() as usize] = Some(edge);
            return Ok(existing);
        }

        let slot = match self.free_edge_ids.pop() {
            Some(id) => id,
            None => {
                self.edges.push(None);
                (self.edges.len() - 1) as u64
            }
        };
        let edge_id = EdgeId::new(slot);

        self.adjacency[source.as_u64() as usize].push(edge_id);
        self.adjacency[target.as_u64() as usize].push(edge_id);
        self.pair_index.insert(key, edge_id);
        self.edges[slot as usize] = Some(edge);

        Ok(edge_id)
    }

    /// Get the edge linking a pair
    pub fn get_edge(&self, key: &EdgeKey) -> Option<&Edge> {
        let id = self.pair_index.get(key)?;
        self.edges.get(id.as_u64() as usize)?.as_ref()
    }

    /// Delete the edge linking a pair
    pub fn delete_edge(&mut self, key: &EdgeKey) -> Option<Edge> {
        let id = self.pair_index.remove(key)?;
        let edge = self.edges.get_mut(id.as_u64() as usize)?.take()?;
        self.free_edge_ids.push(id.as_u64());

        for endpoint in [&edge.source, &edge.target] {
            if let Some(slot) = self.key_index.get(endpoint) {
                if let Some(adj) = self.adjacency.get_mut(slot.as_u64() as usize) {
                    adj.retain(|&eid| eid != id);
                }
            }
        }

        Some(edge)
    }

    /// All edges touching a node
    pub fn edges_of(&self, id: &ProteinId) -> Vec<&Edge> {
        self.key_index
            .get(id)
            .and_then(|slot| self.adjacency.get(slot.as_u64() as usize))
            .map(|edge_ids| {
                edge_ids
                    .iter()
                    .filter_map(|eid| self.edges.get(eid.as_u64() as usize)?.as_ref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove every edge touching a node, returning them
    pub fn remove_edges_of(&mut self, id: &ProteinId) -> Vec<Edge> {
        let keys: Vec<EdgeKey> = self.edges_of(id).iter().map(|e| e.key()).collect();
        keys.iter().filter_map(|key| self.delete_edge(key)).collect()
    }

    /// Delete a node and all its connected edges
    pub fn delete_node(&mut self, id: &ProteinId) -> GraphResult<(Node, Vec<Edge>)> {
        if !self.has_node(id) {
            return Err(GraphError::NodeNotFound(id.clone()));
        }

        let removed_edges = self.remove_edges_of(id);

        let slot = self
            .key_index
            .remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        let idx = slot.as_u64() as usize;
        let node = self.nodes[idx]
            .take()
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        self.adjacency[idx].clear();
        self.free_node_ids.push(slot.as_u64());

        Ok((node, removed_edges))
    }

    /// Direct neighbors of a node together with the connecting edge
    pub fn neighbors(&self, id: &ProteinId) -> Vec<(&Node, &Edge)> {
        self.edges_of(id)
            .into_iter()
            .filter_map(|edge| {
                let other = edge.other(id)?;
                Some((self.get_node(other)?, edge))
            })
            .collect()
    }

    /// Edges whose both endpoints lie in `ids`, sorted by (source, target)
    pub fn edges_among(&self, ids: &FxHashSet<ProteinId>) -> Vec<&Edge> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for id in ids {
            for edge in self.edges_of(id) {
                let other = if &edge.source == id { &edge.target } else { &edge.source };
                if ids.contains(other) && seen.insert(edge.key()) {
                    result.push(edge);
                }
            }
        }
        result.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        result
    }

    /// All nodes, sorted by protein id
    pub fn all_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.iter().flatten().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All edges, sorted by (source, target)
    pub fn all_edges(&self) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.edges.iter().flatten().collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        edges
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.key_index.len()
    }

    /// Get total number of edges
    pub fn edge_count(&self) -> usize {
        self.pair_index.len()
    }

    /// Clear all data from the graph
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.adjacency.clear();
        self.free_node_ids.clear();
        self.free_edge_ids.clear();
        self.key_index.clear();
        self.pair_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::keys;

    fn pid(s: &str) -> ProteinId {
        ProteinId::new(s)
    }

    fn edge(a: &str, b: &str, weight: f64) -> Edge {
        Edge::new(EdgeKey::new(&pid(a), &pid(b)).unwrap(), weight, vec![])
    }

    fn store_with(ids: &[&str]) -> GraphStore {
        let mut store = GraphStore::new();
        for id in ids {
            store.upsert_node(&pid(id), PropertyMap::new());
        }
        store
    }

    #[test]
    fn test_upsert_and_get_node() {
        let mut store = GraphStore::new();
        let mut props = PropertyMap::new();
        props.insert(keys::ORGANISM.to_string(), "Homo sapiens".into());

        assert!(store.upsert_node(&pid("P1"), props.clone()));
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.get_node(&pid("P1")).unwrap().get_str(keys::ORGANISM), "Homo sapiens");

        // Second upsert overwrites in place
        props.insert(keys::ORGANISM.to_string(), "Mus musculus".into());
        assert!(!store.upsert_node(&pid("P1"), props));
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.get_node(&pid("P1")).unwrap().get_str(keys::ORGANISM), "Mus musculus");
    }

    #[test]
    fn test_edge_validation() {
        let mut store = store_with(&["A"]);

        let result = store.put_edge(edge("A", "Z", 0.5));
        assert_eq!(result, Err(GraphError::InvalidEdgeTarget(pid("Z"))));

        let result = store.put_edge(edge("0", "A", 0.5));
        assert_eq!(result, Err(GraphError::InvalidEdgeSource(pid("0"))));
    }

    #[test]
    fn test_one_edge_per_pair() {
        let mut store = store_with(&["A", "B"]);

        let first = store.put_edge(edge("A", "B", 0.5)).unwrap();
        let second = store.put_edge(edge("B", "A", 0.25)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.edge_count(), 1);
        let key = EdgeKey::new(&pid("A"), &pid("B")).unwrap();
        assert_eq!(store.get_edge(&key).unwrap().weight, 0.25);
        assert_eq!(store.edges_of(&pid("A")).len(), 1);
        assert_eq!(store.edges_of(&pid("B")).len(), 1);
    }

    #[test]
    fn test_adjacency_lists() {
        let mut store = store_with(&["A", "B", "C"]);
        store.put_edge(edge("A", "B", 0.5)).unwrap();
        store.put_edge(edge("A", "C", 0.5)).unwrap();

        assert_eq!(store.edges_of(&pid("A")).len(), 2);
        assert_eq!(store.edges_of(&pid("B")).len(), 1);

        let mut neighbors: Vec<&str> = store
            .neighbors(&pid("A"))
            .iter()
            .map(|(n, _)| n.id.as_str())
            .collect();
        neighbors.sort();
        assert_eq!(neighbors, vec!["B", "C"]);
    }

    #[test]
    fn test_delete_node_cascades() {
        let mut store = store_with(&["A", "B", "C"]);
        store.put_edge(edge("A", "B", 0.5)).unwrap();
        store.put_edge(edge("B", "C", 0.5)).unwrap();

        let (node, removed) = store.delete_node(&pid("B")).unwrap();
        assert_eq!(node.id, pid("B"));
        assert_eq!(removed.len(), 2);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 0);
        assert!(store.edges_of(&pid("A")).is_empty());

        assert_eq!(
            store.delete_node(&pid("B")).unwrap_err(),
            GraphError::NodeNotFound(pid("B"))
        );
    }

    #[test]
    fn test_slot_reuse() {
        let mut store = store_with(&["A", "B"]);
        store.delete_node(&pid("A")).unwrap();
        store.upsert_node(&pid("C"), PropertyMap::new());

        assert_eq!(store.node_count(), 2);
        assert!(store.get_node(&pid("A")).is_none());
        assert!(store.edges_of(&pid("C")).is_empty());
    }

    #[test]
    fn test_edges_among() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        store.put_edge(edge("A", "B", 0.5)).unwrap();
        store.put_edge(edge("B", "C", 0.5)).unwrap();
        store.put_edge(edge("C", "D", 0.5)).unwrap();

        let ids: FxHashSet<ProteinId> = ["A", "B", "C"].iter().map(|s| pid(s)).collect();
        let edges = store.edges_among(&ids);
        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "B"), ("B", "C")]);
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(&["A", "B"]);
        store.put_edge(edge("A", "B", 1.0)).unwrap();
        store.clear();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);
    }
}

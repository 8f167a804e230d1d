//! Core type definitions for the similarity graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable protein identifier (the UniProt entry accession)
///
/// Ordered so that an undirected edge can always be stored with the
/// lower id as its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProteinId(String);

impl ProteinId {
    pub fn new(id: impl Into<String>) -> Self {
        ProteinId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProteinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProteinId {
    fn from(s: String) -> Self {
        ProteinId(s)
    }
}

impl From<&str> for ProteinId {
    fn from(s: &str) -> Self {
        ProteinId(s.to_string())
    }
}

impl AsRef<str> for ProteinId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Internal arena slot of a node in the in-memory store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Internal arena slot of an edge in the in-memory store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// Canonical key of an undirected edge: `low < high`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeKey {
    pub low: ProteinId,
    pub high: ProteinId,
}

impl EdgeKey {
    /// Build the canonical key for a pair, in either order.
    /// Returns `None` for a self pair.
    pub fn new(a: &ProteinId, b: &ProteinId) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(EdgeKey { low: a.clone(), high: b.clone() }),
            std::cmp::Ordering::Greater => Some(EdgeKey { low: b.clone(), high: a.clone() }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The endpoint opposite to `id`, if `id` is one of the endpoints
    pub fn other(&self, id: &ProteinId) -> Option<&ProteinId> {
        if &self.low == id {
            Some(&self.high)
        } else if &self.high == id {
            Some(&self.low)
        } else {
            None
        }
    }

    pub fn touches(&self, id: &ProteinId) -> bool {
        &self.low == id || &self.high == id
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protein_id() {
        let id = ProteinId::new("P12345");
        assert_eq!(id.as_str(), "P12345");
        assert_eq!(format!("{}", id), "P12345");
        assert!(!id.is_blank());
        assert!(ProteinId::new("  ").is_blank());

        let id2: ProteinId = "Q99999".into();
        assert!(id < id2);
    }

    #[test]
    fn test_node_and_edge_ids() {
        assert_eq!(NodeId::new(42).as_u64(), 42);
        assert_eq!(format!("{}", NodeId::new(42)), "NodeId(42)");
        assert_eq!(format!("{}", EdgeId::new(99)), "EdgeId(99)");
    }

    #[test]
    fn test_edge_key_is_canonical() {
        let a = ProteinId::new("A");
        let b = ProteinId::new("B");

        let k1 = EdgeKey::new(&a, &b).unwrap();
        let k2 = EdgeKey::new(&b, &a).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(k1.low, a);
        assert_eq!(k1.other(&a), Some(&b));
        assert_eq!(k1.other(&ProteinId::new("C")), None);
        assert!(k1.touches(&b));
    }

    #[test]
    fn test_edge_key_rejects_self_pair() {
        let a = ProteinId::new("A");
        assert!(EdgeKey::new(&a, &a).is_none());
    }
}

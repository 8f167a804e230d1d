//! Undirected similarity edge
//!
//! An edge links two proteins that share at least one domain. It is stored
//! once per unordered pair, with the lower protein id as `source`.

use super::types::{EdgeKey, ProteinId};
use serde::{Deserialize, Serialize};

/// A weighted, undirected edge between two proteins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Lower protein id of the pair
    pub source: ProteinId,

    /// Higher protein id of the pair
    pub target: ProteinId,

    /// Jaccard index of the two domain sets, in (0, 1]
    pub weight: f64,

    /// Domains shared by both endpoints, sorted
    pub shared_domains: Vec<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Edge {
    /// Create an edge from its canonical key
    pub fn new(key: EdgeKey, weight: f64, shared_domains: Vec<String>) -> Self {
        Edge {
            source: key.low,
            target: key.high,
            weight,
            shared_domains,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Canonical key of this edge
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            low: self.source.clone(),
            high: self.target.clone(),
        }
    }

    /// Endpoint opposite to `id`
    pub fn other(&self, id: &ProteinId) -> Option<&ProteinId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Check if the edge touches a protein
    pub fn touches(&self, id: &ProteinId) -> bool {
        &self.source == id || &self.target == id
    }
}

//! Similarity graph data model and storage
//!
//! - Protein nodes keyed by accession, with a property payload
//! - Undirected weighted edges, one per unordered pair
//! - In-memory storage with key and pair indices
//! - The [`GraphBackend`] trait the engines are written against

pub mod backend;
pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use backend::{EdgeReplacement, GraphBackend, Neighbor};
pub use edge::Edge;
pub use node::{keys, Node};
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeKey, NodeId, ProteinId};

//! protgraph: protein domain-similarity graph
//!
//! Proteins are nodes keyed by accession; an undirected edge joins two
//! proteins sharing at least one domain annotation, weighted by the Jaccard
//! similarity of their domain sets. The graph is kept current incrementally
//! as records are added, updated or deleted, and can be rebuilt offline in
//! batch.
//!
//! # Architecture
//!
//! - [`annotation`]: raw record fields to canonical token sets
//! - [`similarity`]: Jaccard weights, legacy domain-list parsing
//! - [`engine`]: graph maintenance, batch build, neighborhood queries
//! - [`graph`]: property-graph model and the [`GraphBackend`] trait
//! - [`docstore`]: protein documents, search filters, suggestions
//! - [`persistence`]: RocksDB-backed graph and document stores
//! - [`service`]: two-phase writes across both stores
//! - [`http`]: JSON API
//!
//! ## Example Usage
//!
//! ```rust
//! use protgraph::engine::{neighborhood, GraphMaintainer, NeighborhoodQuery};
//! use protgraph::graph::{GraphStore, ProteinId};
//! use protgraph::model::RawProteinRecord;
//!
//! let mut engine = GraphMaintainer::new(GraphStore::new());
//! for (id, domains) in [("P1", "IPR1;IPR2"), ("P2", "IPR2;IPR3")] {
//!     engine
//!         .add_protein(&RawProteinRecord {
//!             id: Some(id.to_string()),
//!             interpro: Some(domains.to_string()),
//!             ..Default::default()
//!         })
//!         .unwrap();
//! }
//!
//! let query = NeighborhoodQuery::new(ProteinId::new("P1"), 10, 5);
//! let subgraph = neighborhood(engine.graph(), &query).unwrap().unwrap();
//! assert_eq!(subgraph.nodes.len(), 2);
//! assert_eq!(subgraph.edges[0].weight, 1.0 / 3.0);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod annotation;
pub mod config;
pub mod docstore;
pub mod engine;
pub mod graph;
pub mod http;
pub mod ingest;
pub mod model;
pub mod persistence;
pub mod service;
pub mod similarity;
pub mod stats;

// Re-export main types for convenience
pub use graph::{
    Edge, GraphBackend, GraphError, GraphResult, GraphStore, Node, PropertyMap, PropertyValue,
    ProteinId,
};

pub use engine::{
    BatchReport, DeleteReport, EdgeReport, EngineError, EngineResult, GraphMaintainer,
    NeighborhoodQuery, Subgraph,
};

pub use docstore::{DocumentStore, InMemoryDocumentStore, SearchCriteria, SearchQuery};

pub use persistence::{
    PersistenceError, PersistenceResult, PersistentGraph, PersistentStorage, RocksDocumentStore,
    Session, StorageError, StorageResult,
};

pub use config::AppConfig;
pub use model::{Protein, RawProteinRecord};
pub use service::{ProteinService, ServiceError, ServiceResult};
pub use similarity::DomainSet;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

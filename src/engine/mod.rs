//! Graph maintenance and query engines
//!
//! - [`GraphMaintainer`]: upsert, edge recompute, cascade delete, batch build
//! - [`neighborhood`]: bounded two-hop subgraph around one protein
//!
//! Both are written against [`GraphBackend`](crate::graph::GraphBackend) and
//! work the same over the in-memory store and the persistent one.

pub mod batch;
pub mod maintenance;
pub mod neighborhood;

pub use batch::{BatchReport, DEFAULT_BATCH_SIZE};
pub use maintenance::{DeleteReport, EdgeReport, GraphMaintainer};
pub use neighborhood::{neighborhood, HopLevel, NeighborhoodQuery, Subgraph, SubgraphEdge, SubgraphNode};

use crate::annotation::AnnotationError;
use crate::graph::{GraphError, ProteinId};
use thiserror::Error;

/// Engine errors
#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("Invalid protein record: {0}")]
    Validation(#[from] AnnotationError),

    #[error("Protein not found: {0}")]
    NotFound(ProteinId),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type EngineResult<T> = Result<T, EngineError>;

//! Persistence layer
//!
//! - [`PersistentStorage`]: RocksDB column families for documents, nodes
//!   and edges
//! - [`Session`]: owns the database handle; opened explicitly, flushed on
//!   close
//! - [`PersistentGraph`]: graph backend that writes through to RocksDB and
//!   serves reads from an in-memory mirror recovered at open
//! - [`RocksDocumentStore`]: document store over the `documents` family

pub mod storage;

pub use storage::{GraphWrite, PersistentStorage, StorageError, StorageResult};

use crate::docstore::{DocStoreError, DocStoreResult, DocumentStore, UpsertOutcome};
use crate::graph::{
    Edge, EdgeReplacement, GraphBackend, GraphError, GraphResult, GraphStore, Neighbor, Node,
    PropertyMap, ProteinId,
};
use crate::model::Protein;
use crate::similarity::migrate_legacy_domains;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

impl From<StorageError> for GraphError {
    fn from(e: StorageError) -> Self {
        GraphError::Storage(e.to_string())
    }
}

impl From<StorageError> for DocStoreError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Serialization(e) => DocStoreError::Serialization(e.to_string()),
            other => DocStoreError::Storage(other.to_string()),
        }
    }
}

/// An open database
pub struct Session {
    storage: Arc<PersistentStorage>,
}

impl Session {
    /// Open or create the database under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        info!("Opening session at: {:?}", data_dir);
        let storage = PersistentStorage::open(data_dir)?;

        Ok(Self {
            storage: Arc::new(storage),
        })
    }

    /// Recover the graph from disk.
    ///
    /// Legacy string-encoded domain lists are migrated to the array form
    /// as part of recovery. Open one graph per session: each call builds its
    /// own mirror.
    pub fn open_graph(&self) -> PersistenceResult<PersistentGraph> {
        let mut graph = PersistentGraph::recover(Arc::clone(&self.storage))?;
        migrate_legacy_domains(&mut graph)?;
        Ok(graph)
    }

    pub fn documents(&self) -> RocksDocumentStore {
        RocksDocumentStore {
            storage: Arc::clone(&self.storage),
        }
    }

    /// Get storage reference
    pub fn storage(&self) -> &PersistentStorage {
        &self.storage
    }

    /// Flush pending writes and release the session's handle.
    /// The database closes once every store opened from it is dropped.
    pub fn close(self) -> PersistenceResult<()> {
        self.storage.flush()?;
        info!("Session closed");
        Ok(())
    }
}

/// Graph backend persisted in RocksDB
///
/// Every mutation is validated against the mirror, written to disk as one
/// batch, and only then applied to the mirror. A failed write leaves both
/// unchanged.
pub struct PersistentGraph {
    storage: Arc<PersistentStorage>,
    mirror: GraphStore,
}

impl PersistentGraph {
    /// Rebuild the in-memory mirror from storage
    pub fn recover(storage: Arc<PersistentStorage>) -> PersistenceResult<Self> {
        info!("Starting graph recovery");

        let mut mirror = GraphStore::new();
        let nodes = storage.scan_nodes()?;
        info!("Recovered {} nodes from storage", nodes.len());
        for node in nodes {
            mirror.insert_node(node);
        }

        let edges = storage.scan_edges()?;
        info!("Recovered {} edges from storage", edges.len());
        for edge in edges {
            mirror.put_edge(edge)?;
        }

        Ok(Self { storage, mirror })
    }

    /// Read-only view of the in-memory mirror
    pub fn mirror(&self) -> &GraphStore {
        &self.mirror
    }

    pub fn flush(&self) -> PersistenceResult<()> {
        Ok(self.storage.flush()?)
    }

    /// Node as it will look after an upsert: payload replaced, creation time kept
    fn upserted(&self, id: &ProteinId, properties: PropertyMap) -> (Node, bool) {
        match self.mirror.get_node(id) {
            Some(existing) => {
                let mut node = existing.clone();
                node.replace_properties(properties);
                (node, false)
            }
            None => (Node::new_with_properties(id.clone(), properties), true),
        }
    }
}

impl GraphBackend for PersistentGraph {
    fn upsert_node(&mut self, id: &ProteinId, properties: PropertyMap) -> GraphResult<bool> {
        let (node, created) = self.upserted(id, properties);
        self.storage.put_node(&node)?;
        self.mirror.insert_node(node);
        Ok(created)
    }

    fn upsert_nodes(&mut self, nodes: Vec<(ProteinId, PropertyMap)>) -> GraphResult<usize> {
        let write = GraphWrite {
            put_nodes: nodes
                .into_iter()
                .map(|(id, properties)| self.upserted(&id, properties).0)
                .collect(),
            ..Default::default()
        };
        self.storage.apply(&write)?;

        let count = write.put_nodes.len();
        for node in write.put_nodes {
            self.mirror.insert_node(node);
        }
        Ok(count)
    }

    fn get_node(&self, id: &ProteinId) -> GraphResult<Option<Node>> {
        GraphBackend::get_node(&self.mirror, id)
    }

    fn scan_nodes(&self) -> GraphResult<Vec<Node>> {
        GraphBackend::scan_nodes(&self.mirror)
    }

    fn replace_edges(&mut self, id: &ProteinId, edges: Vec<Edge>) -> GraphResult<EdgeReplacement> {
        self.mirror.validate_replacement(id, &edges)?;

        let write = GraphWrite {
            delete_edges: self.mirror.edges_of(id).into_iter().map(Edge::key).collect(),
            put_edges: edges,
            ..Default::default()
        };
        self.storage.apply(&write)?;

        let removed = self.mirror.remove_edges_of(id).len();
        let created = write.put_edges.len();
        for edge in write.put_edges {
            self.mirror.put_edge(edge)?;
        }
        Ok(EdgeReplacement { removed, created })
    }

    fn commit_edges(&mut self, edges: Vec<Edge>) -> GraphResult<usize> {
        self.mirror.validate_edges(&edges)?;

        let write = GraphWrite {
            put_edges: edges,
            ..Default::default()
        };
        self.storage.apply(&write)?;

        let count = write.put_edges.len();
        for edge in write.put_edges {
            self.mirror.put_edge(edge)?;
        }
        Ok(count)
    }

    fn detach_delete(&mut self, id: &ProteinId) -> GraphResult<Option<usize>> {
        if !self.mirror.has_node(id) {
            return Ok(None);
        }

        let write = GraphWrite {
            delete_nodes: vec![id.clone()],
            delete_edges: self.mirror.edges_of(id).into_iter().map(Edge::key).collect(),
            ..Default::default()
        };
        self.storage.apply(&write)?;

        let (_, removed) = self.mirror.delete_node(id)?;
        Ok(Some(removed.len()))
    }

    fn neighbors(&self, id: &ProteinId) -> GraphResult<Vec<Neighbor>> {
        GraphBackend::neighbors(&self.mirror, id)
    }

    fn edges_of(&self, id: &ProteinId) -> GraphResult<Vec<Edge>> {
        GraphBackend::edges_of(&self.mirror, id)
    }

    fn edges_among(&self, ids: &FxHashSet<ProteinId>) -> GraphResult<Vec<Edge>> {
        GraphBackend::edges_among(&self.mirror, ids)
    }

    fn scan_edges(&self) -> GraphResult<Vec<Edge>> {
        GraphBackend::scan_edges(&self.mirror)
    }

    fn node_count(&self) -> GraphResult<usize> {
        Ok(self.mirror.node_count())
    }

    fn edge_count(&self) -> GraphResult<usize> {
        Ok(self.mirror.edge_count())
    }

    fn clear(&mut self) -> GraphResult<()> {
        self.storage.clear_graph()?;
        self.mirror.clear();
        Ok(())
    }
}

/// Document store over the `documents` column family
pub struct RocksDocumentStore {
    storage: Arc<PersistentStorage>,
}

impl DocumentStore for RocksDocumentStore {
    fn upsert(&mut self, protein: &Protein) -> DocStoreResult<UpsertOutcome> {
        match self.storage.put_document(protein)? {
            true => Ok(UpsertOutcome::Updated),
            false => Ok(UpsertOutcome::Inserted),
        }
    }

    fn delete(&mut self, id: &ProteinId) -> DocStoreResult<bool> {
        Ok(self.storage.delete_document(id)?)
    }

    fn get(&self, id: &ProteinId) -> DocStoreResult<Option<Protein>> {
        Ok(self.storage.get_document(id)?)
    }

    fn scan(&self) -> DocStoreResult<Vec<Protein>> {
        Ok(self.storage.scan_documents()?)
    }

    fn count(&self) -> DocStoreResult<usize> {
        Ok(self.storage.count_documents()?)
    }

    fn clear(&mut self) -> DocStoreResult<()> {
        Ok(self.storage.clear_documents()?)
    }

    fn upsert_many(&mut self, proteins: &[Protein]) -> DocStoreResult<usize> {
        self.storage.put_documents(proteins)?;
        Ok(proteins.len())
    }
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

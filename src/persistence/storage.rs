//! RocksDB storage layer
//!
//! One database with a column family per record kind:
//! - `documents`: full protein records, keyed by protein id
//! - `nodes`: graph nodes, keyed by protein id
//! - `edges`: similarity edges, keyed by `low \0 high`
//!
//! Values are bincode-encoded. Multi-record writes go through a single
//! `WriteBatch` so that they land atomically.

use crate::graph::{Edge, EdgeKey, Node, PropertyMap, ProteinId};
use crate::model::Protein;
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const CF_DOCUMENTS: &str = "documents";
const CF_NODES: &str = "nodes";
const CF_EDGES: &str = "edges";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family error
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// Path is not valid UTF-8
    #[error("Invalid storage path: {0}")]
    InvalidPath(PathBuf),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Serialized node for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    id: String,
    properties: Vec<u8>, // Serialized PropertyMap
    created_at: i64,
    updated_at: i64,
}

/// Serialized edge for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEdge {
    source: String,
    target: String,
    weight: f64,
    shared_domains: Vec<String>,
    created_at: i64,
}

/// A set of graph mutations applied as one atomic write
#[derive(Debug, Default)]
pub struct GraphWrite {
    pub put_nodes: Vec<Node>,
    pub delete_nodes: Vec<ProteinId>,
    pub delete_edges: Vec<EdgeKey>,
    pub put_edges: Vec<Edge>,
}

impl GraphWrite {
    pub fn is_empty(&self) -> bool {
        self.put_nodes.is_empty()
            && self.delete_nodes.is_empty()
            && self.delete_edges.is_empty()
            && self.put_edges.is_empty()
    }
}

/// RocksDB-based persistent storage
pub struct PersistentStorage {
    /// RocksDB instance
    db: Arc<DB>,
    path: PathBuf,
}

impl PersistentStorage {
    /// Open or create a persistent storage
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let path_str = path
            .to_str()
            .ok_or_else(|| StorageError::InvalidPath(path.clone()))?;

        info!("Opening persistent storage at: {}", path_str);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        opts.set_write_buffer_size(64 * 1024 * 1024); // 64 MB
        opts.set_max_write_buffer_number(3);
        opts.set_min_write_buffer_number_to_merge(1);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(CF_DOCUMENTS, Self::document_cf_options()),
            ColumnFamilyDescriptor::new(CF_NODES, Self::graph_cf_options()),
            ColumnFamilyDescriptor::new(CF_EDGES, Self::graph_cf_options()),
        ];

        let db = DB::open_cf_descriptors(&opts, path_str, cf_descriptors)?;

        info!("Persistent storage opened successfully");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Documents carry the sequence payload and compress well
    fn document_cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn graph_cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cf(&self, name: &str) -> StorageResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }

    // ---- documents ----

    /// Store a document. Returns true when it replaced an existing one.
    pub fn put_document(&self, protein: &Protein) -> StorageResult<bool> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let key = protein.id.as_str().as_bytes();
        let existed = self.db.get_pinned_cf(cf, key)?.is_some();
        self.db.put_cf(cf, key, bincode::serialize(protein)?)?;
        debug!("Stored document {}", protein.id);
        Ok(existed)
    }

    /// Store many documents in one write
    pub fn put_documents(&self, proteins: &[Protein]) -> StorageResult<()> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let mut batch = WriteBatch::default();
        for protein in proteins {
            batch.put_cf(cf, protein.id.as_str().as_bytes(), bincode::serialize(protein)?);
        }
        self.db.write(batch)?;
        debug!("Stored {} documents", proteins.len());
        Ok(())
    }

    pub fn get_document(&self, id: &ProteinId) -> StorageResult<Option<Protein>> {
        let cf = self.cf(CF_DOCUMENTS)?;
        match self.db.get_cf(cf, id.as_str().as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Delete a document. Returns true when one was removed.
    pub fn delete_document(&self, id: &ProteinId) -> StorageResult<bool> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let key = id.as_str().as_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_none() {
            return Ok(false);
        }
        self.db.delete_cf(cf, key)?;
        debug!("Deleted document {}", id);
        Ok(true)
    }

    /// Every document, in key order
    pub fn scan_documents(&self) -> StorageResult<Vec<Protein>> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let mut documents = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            documents.push(bincode::deserialize(&value)?);
        }
        Ok(documents)
    }

    pub fn count_documents(&self) -> StorageResult<usize> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn clear_documents(&self) -> StorageResult<()> {
        self.clear_cf(CF_DOCUMENTS)
    }

    // ---- graph ----

    /// Apply a set of graph mutations atomically.
    ///
    /// Deletions are staged before puts, so an edge deleted and rewritten in
    /// the same write ends up written.
    pub fn apply(&self, write: &GraphWrite) -> StorageResult<()> {
        if write.is_empty() {
            return Ok(());
        }
        let nodes = self.cf(CF_NODES)?;
        let edges = self.cf(CF_EDGES)?;
        let mut batch = WriteBatch::default();

        for id in &write.delete_nodes {
            batch.delete_cf(nodes, id.as_str().as_bytes());
        }
        for key in &write.delete_edges {
            batch.delete_cf(edges, Self::edge_key(key));
        }
        for node in &write.put_nodes {
            batch.put_cf(nodes, node.id.as_str().as_bytes(), Self::encode_node(node)?);
        }
        for edge in &write.put_edges {
            batch.put_cf(edges, Self::edge_key(&edge.key()), Self::encode_edge(edge)?);
        }

        self.db.write(batch)?;
        debug!(
            "Applied graph write: +{} nodes, -{} nodes, +{} edges, -{} edges",
            write.put_nodes.len(),
            write.delete_nodes.len(),
            write.put_edges.len(),
            write.delete_edges.len()
        );
        Ok(())
    }

    pub fn put_node(&self, node: &Node) -> StorageResult<()> {
        self.apply(&GraphWrite {
            put_nodes: vec![node.clone()],
            ..Default::default()
        })
    }

    pub fn get_node(&self, id: &ProteinId) -> StorageResult<Option<Node>> {
        let cf = self.cf(CF_NODES)?;
        match self.db.get_cf(cf, id.as_str().as_bytes())? {
            Some(value) => Ok(Some(Self::decode_node(&value)?)),
            None => Ok(None),
        }
    }

    /// Get all nodes (for recovery)
    pub fn scan_nodes(&self) -> StorageResult<Vec<Node>> {
        let cf = self.cf(CF_NODES)?;
        let mut nodes = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            nodes.push(Self::decode_node(&value)?);
        }
        Ok(nodes)
    }

    /// Get all edges (for recovery)
    pub fn scan_edges(&self) -> StorageResult<Vec<Edge>> {
        let cf = self.cf(CF_EDGES)?;
        let mut edges = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let stored: StoredEdge = bincode::deserialize(&value)?;
            edges.push(Edge {
                source: ProteinId::new(stored.source),
                target: ProteinId::new(stored.target),
                weight: stored.weight,
                shared_domains: stored.shared_domains,
                created_at: stored.created_at,
            });
        }
        Ok(edges)
    }

    /// Drop every node and edge
    pub fn clear_graph(&self) -> StorageResult<()> {
        self.clear_cf(CF_EDGES)?;
        self.clear_cf(CF_NODES)
    }

    /// Flush all data to disk
    pub fn flush(&self) -> StorageResult<()> {
        for name in [CF_DOCUMENTS, CF_NODES, CF_EDGES] {
            self.db.flush_cf(self.cf(name)?)?;
        }
        debug!("Flushed storage to disk");
        Ok(())
    }

    fn clear_cf(&self, name: &str) -> StorageResult<()> {
        let cf = self.cf(name)?;
        let mut batch = WriteBatch::default();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            batch.delete_cf(cf, key);
        }
        self.db.write(batch)?;
        info!("Cleared column family {}", name);
        Ok(())
    }

    fn encode_node(node: &Node) -> StorageResult<Vec<u8>> {
        let stored = StoredNode {
            id: node.id.as_str().to_string(),
            properties: bincode::serialize(&node.properties)?,
            created_at: node.created_at,
            updated_at: node.updated_at,
        };
        Ok(bincode::serialize(&stored)?)
    }

    fn decode_node(value: &[u8]) -> StorageResult<Node> {
        let stored: StoredNode = bincode::deserialize(value)?;
        let properties: PropertyMap = bincode::deserialize(&stored.properties)?;
        Ok(Node {
            id: ProteinId::new(stored.id),
            properties,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    fn encode_edge(edge: &Edge) -> StorageResult<Vec<u8>> {
        let stored = StoredEdge {
            source: edge.source.as_str().to_string(),
            target: edge.target.as_str().to_string(),
            weight: edge.weight,
            shared_domains: edge.shared_domains.clone(),
            created_at: edge.created_at,
        };
        Ok(bincode::serialize(&stored)?)
    }

    /// Create edge key from the canonical pair
    fn edge_key(key: &EdgeKey) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(key.low.as_str().len() + key.high.as_str().len() + 1);
        bytes.extend_from_slice(key.low.as_str().as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(key.high.as_str().as_bytes());
        bytes
    }
}

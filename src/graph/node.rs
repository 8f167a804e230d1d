//! Protein node of the similarity graph

use super::property::{PropertyMap, PropertyValue};
use super::types::ProteinId;
use serde::{Deserialize, Serialize};

/// Property keys written on every protein node
pub mod keys {
    pub const DISPLAY_NAME: &str = "display_name";
    pub const NAMES: &str = "names";
    pub const ORGANISM: &str = "organism";
    pub const SEQUENCE: &str = "sequence";
    pub const SEQUENCE_LENGTH: &str = "sequence_length";
    pub const ENZYME_CODES: &str = "enzyme_codes";
    pub const DOMAIN_IDS: &str = "domain_ids";
}

/// A protein node in the similarity graph
///
/// Nodes are keyed by their protein id. The payload lives in a property
/// map so that records written by older loaders (with differently typed
/// fields) can still be read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Protein id, the node key
    pub id: ProteinId,

    /// Properties associated with this node
    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Node {
    /// Create a new node without properties
    pub fn new(id: impl Into<ProteinId>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Node {
            id: id.into(),
            properties: PropertyMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new node with properties
    pub fn new_with_properties(id: impl Into<ProteinId>, properties: PropertyMap) -> Self {
        let mut node = Node::new(id);
        node.properties = properties;
        node
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        let old = self.properties.insert(key.into(), value.into());
        self.update_timestamp();
        old
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Get a string property, empty when absent or not a string
    pub fn get_str(&self, key: &str) -> &str {
        self.get_property(key).and_then(|v| v.as_string()).unwrap_or("")
    }

    /// Get a string-list property, empty when absent or not a list
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get_property(key)
            .and_then(|v| v.as_string_list())
            .unwrap_or_default()
    }

    /// Overwrite the whole payload, keeping the creation timestamp
    pub fn replace_properties(&mut self, properties: PropertyMap) {
        self.properties = properties;
        self.update_timestamp();
    }

    fn update_timestamp(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

//! Protein records as they enter and leave the system
//!
//! [`RawProteinRecord`] is one row of the input table, fields still
//! delimited text. [`Protein`] is the canonical form produced by
//! [`crate::annotation::normalize`]. [`ProteinSummary`] is a protein without
//! its sequence payload, used wherever lists of proteins are returned.

use crate::graph::{keys, Node, PropertyMap, PropertyValue, ProteinId};
use crate::similarity::DomainSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One input row, as exported from UniProt
///
/// Accepts both the export's column headers and snake_case field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProteinRecord {
    #[serde(alias = "Entry", default)]
    pub id: Option<String>,

    #[serde(alias = "Entry Name", default)]
    pub display_name: Option<String>,

    /// `"Name A (Name B) (EC 1.1.1.1)"`
    #[serde(alias = "Protein names", default)]
    pub protein_names: Option<String>,

    #[serde(alias = "Organism", default)]
    pub organism: Option<String>,

    #[serde(alias = "Sequence", default)]
    pub sequence: Option<String>,

    /// `;`-delimited EC codes
    #[serde(alias = "EC number", default)]
    pub ec_numbers: Option<String>,

    /// `;`-delimited domain ids
    #[serde(alias = "InterPro", default)]
    pub interpro: Option<String>,
}

impl RawProteinRecord {
    /// Record carrying only an id
    pub fn with_id(id: impl Into<String>) -> Self {
        RawProteinRecord {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

/// Canonical protein
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protein {
    pub id: ProteinId,
    pub display_name: String,
    pub organism: String,
    pub sequence: String,
    pub names: Vec<String>,
    pub enzyme_codes: BTreeSet<String>,
    pub domain_ids: DomainSet,
}

impl Protein {
    /// Empty protein with the given id
    pub fn new(id: impl Into<ProteinId>) -> Self {
        Protein {
            id: id.into(),
            display_name: String::new(),
            organism: String::new(),
            sequence: String::new(),
            names: Vec::new(),
            enzyme_codes: BTreeSet::new(),
            domain_ids: DomainSet::new(),
        }
    }

    /// Length of the sequence in characters
    pub fn sequence_length(&self) -> usize {
        self.sequence.chars().count()
    }

    /// True when the protein carries at least one EC code
    pub fn is_labelled(&self) -> bool {
        !self.enzyme_codes.is_empty()
    }

    /// Node payload for the graph store
    pub fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(keys::DISPLAY_NAME.to_string(), self.display_name.clone().into());
        props.insert(keys::NAMES.to_string(), self.names.clone().into());
        props.insert(keys::ORGANISM.to_string(), self.organism.clone().into());
        props.insert(keys::SEQUENCE.to_string(), self.sequence.clone().into());
        props.insert(keys::SEQUENCE_LENGTH.to_string(), self.sequence_length().into());
        props.insert(
            keys::ENZYME_CODES.to_string(),
            self.enzyme_codes.iter().cloned().collect::<Vec<_>>().into(),
        );
        props.insert(keys::DOMAIN_IDS.to_string(), self.domain_ids.to_property());
        props
    }

    /// Read a protein back from a graph node, tolerating legacy encodings
    pub fn from_node(node: &Node) -> Self {
        Protein {
            id: node.id.clone(),
            display_name: node.get_str(keys::DISPLAY_NAME).to_string(),
            organism: node.get_str(keys::ORGANISM).to_string(),
            sequence: node.get_str(keys::SEQUENCE).to_string(),
            names: node.get_string_list(keys::NAMES),
            enzyme_codes: node.get_string_list(keys::ENZYME_CODES).into_iter().collect(),
            domain_ids: node
                .get_property(keys::DOMAIN_IDS)
                .map(DomainSet::from_property)
                .unwrap_or_default(),
        }
    }

    /// The protein without its sequence payload
    pub fn summary(&self) -> ProteinSummary {
        ProteinSummary::from(self)
    }
}

/// A protein without the sequence, as returned by search and subgraph queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinSummary {
    pub id: ProteinId,
    pub display_name: String,
    pub organism: String,
    pub sequence_length: usize,
    pub names: Vec<String>,
    pub enzyme_codes: Vec<String>,
    pub domain_ids: Vec<String>,
}

impl From<&Protein> for ProteinSummary {
    fn from(protein: &Protein) -> Self {
        ProteinSummary {
            id: protein.id.clone(),
            display_name: protein.display_name.clone(),
            organism: protein.organism.clone(),
            sequence_length: protein.sequence_length(),
            names: protein.names.clone(),
            enzyme_codes: protein.enzyme_codes.iter().cloned().collect(),
            domain_ids: protein.domain_ids.to_vec(),
        }
    }
}

impl ProteinSummary {
    /// Summary straight from a graph node
    pub fn from_node(node: &Node) -> Self {
        let mut summary = ProteinSummary::from(&Protein::from_node(node));
        // Prefer the stored length: the sequence may have been stripped
        if let Some(len) = node
            .get_property(keys::SEQUENCE_LENGTH)
            .and_then(PropertyValue::as_integer)
        {
            summary.sequence_length = len.max(0) as usize;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Protein {
        let mut protein = Protein::new("P12345");
        protein.display_name = "CYB_HUMAN".to_string();
        protein.organism = "Homo sapiens (Human)".to_string();
        protein.sequence = "MKTAYIAK".to_string();
        protein.names = vec!["Cytochrome b".to_string()];
        protein.enzyme_codes.insert("1.1.1.1".to_string());
        protein.domain_ids = DomainSet::from_tokens(["IPR000001", "IPR000002"]);
        protein
    }

    #[test]
    fn test_node_round_trip() {
        let protein = sample();
        let node = Node::new_with_properties(protein.id.clone(), protein.to_properties());
        assert_eq!(Protein::from_node(&node), protein);
        assert_eq!(
            node.get_property(keys::SEQUENCE_LENGTH).and_then(|v| v.as_integer()),
            Some(8)
        );
    }

    #[test]
    fn test_from_node_reads_legacy_domains() {
        let mut node = Node::new("P1");
        node.set_property(keys::DOMAIN_IDS, "['IPR000001', 'IPR000002']");
        let protein = Protein::from_node(&node);
        assert_eq!(protein.domain_ids.len(), 2);
        assert!(protein.display_name.is_empty());
        assert!(!protein.is_labelled());
    }

    #[test]
    fn test_summary_drops_sequence() {
        let summary = sample().summary();
        assert_eq!(summary.sequence_length, 8);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("sequence").is_none());
        assert_eq!(json["id"], "P12345");
    }

    #[test]
    fn test_raw_record_accepts_export_headers() {
        let raw: RawProteinRecord = serde_json::from_value(serde_json::json!({
            "Entry": "P1",
            "Entry Name": "A_HUMAN",
            "InterPro": "IPR1;IPR2;"
        }))
        .unwrap();
        assert_eq!(raw.id.as_deref(), Some("P1"));
        assert_eq!(raw.display_name.as_deref(), Some("A_HUMAN"));
        assert_eq!(raw.interpro.as_deref(), Some("IPR1;IPR2;"));
        assert!(raw.sequence.is_none());
    }
}

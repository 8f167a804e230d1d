//! Annotation normalization
//!
//! Turns the delimited text fields of a [`RawProteinRecord`] into the
//! canonical [`Protein`]. Everything here is pure.

use crate::model::{Protein, RawProteinRecord};
use crate::similarity::DomainSet;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Default delimiter of multi-valued fields
pub const DEFAULT_DELIMITER: char = ';';

/// Opening parenthesis of an alternative name, with the whitespace before it
static NAME_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(").expect("name split pattern is valid"));

/// Annotation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Protein record has no id")]
    MissingId,
}

pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Split a delimited field into trimmed, non-empty tokens
pub fn split_tokens(field: Option<&str>, delimiter: char) -> Vec<String> {
    field
        .unwrap_or("")
        .split(delimiter)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `"Name A (Name B) (EC 1.1.1.1)"` into `["Name A", "Name B"]`.
///
/// Segments starting with `EC ` are enzyme codes, not names, and are dropped.
pub fn parse_protein_names(field: Option<&str>) -> Vec<String> {
    let Some(field) = field else {
        return Vec::new();
    };

    NAME_SPLIT
        .split(field)
        .map(|segment| segment.replace(')', "").trim().to_string())
        .filter(|name| !name.is_empty() && !name.starts_with("EC "))
        .collect()
}

/// Build a canonical protein from a raw record
pub fn normalize(record: &RawProteinRecord) -> AnnotationResult<Protein> {
    let id = record
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(AnnotationError::MissingId)?;

    let text = |field: &Option<String>| field.as_deref().unwrap_or("").trim().to_string();

    let mut protein = Protein::new(id);
    protein.display_name = text(&record.display_name);
    protein.organism = text(&record.organism);
    protein.sequence = text(&record.sequence);
    protein.names = parse_protein_names(record.protein_names.as_deref());
    protein.enzyme_codes = split_tokens(record.ec_numbers.as_deref(), DEFAULT_DELIMITER)
        .into_iter()
        .collect();
    protein.domain_ids =
        DomainSet::from_tokens(split_tokens(record.interpro.as_deref(), DEFAULT_DELIMITER));

    Ok(protein)
}

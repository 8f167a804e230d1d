//! Protein document store
//!
//! Holds the full protein records next to the graph. Searching, paging and
//! name suggestions are answered here, not by the graph.
//!
//! The [`DocumentStore`] trait only requires primitive record access; search,
//! suggestions and bulk upsert have default implementations on top of it.

pub mod filter;

pub use filter::{
    parse_annotation_groups, AnnotationCriteria, AnnotationExpr, AnnotationField, AnnotationValues,
    FilterError, FilterResult, LengthCriteria, MatchMode, SearchCriteria, SearchFilter, SearchQuery,
};

use crate::graph::ProteinId;
use crate::model::{Protein, ProteinSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default page size of search results
pub const DEFAULT_PER_PAGE: usize = 20;

/// Default number of name suggestions
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Shortest prefix for which suggestions are computed
pub const MIN_SUGGESTION_PREFIX: usize = 2;

/// Document store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocStoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DocStoreResult<T> = Result<T, DocStoreError>;

/// Whether an upsert created or replaced the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub total_matches: usize,
    pub page: usize,
    pub per_page: usize,
    pub results: Vec<ProteinSummary>,
}

/// A name suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: ProteinId,
    pub display_name: String,
    pub names: Vec<String>,
}

/// Storage of protein documents keyed by id
pub trait DocumentStore {
    fn upsert(&mut self, protein: &Protein) -> DocStoreResult<UpsertOutcome>;

    /// Returns true when a document was removed
    fn delete(&mut self, id: &ProteinId) -> DocStoreResult<bool>;

    fn get(&self, id: &ProteinId) -> DocStoreResult<Option<Protein>>;

    /// Every document, sorted by id
    fn scan(&self) -> DocStoreResult<Vec<Protein>>;

    fn count(&self) -> DocStoreResult<usize>;

    /// Drop every document
    fn clear(&mut self) -> DocStoreResult<()>;

    /// Upsert many documents. Returns the number written.
    fn upsert_many(&mut self, proteins: &[Protein]) -> DocStoreResult<usize> {
        for protein in proteins {
            self.upsert(protein)?;
        }
        Ok(proteins.len())
    }

    /// Matching documents without their sequence, ordered by id.
    ///
    /// `page` is 1-based; page 0 is read as page 1, and `per_page` 0 as the
    /// default page size.
    fn search(&self, query: &SearchQuery, page: usize, per_page: usize) -> DocStoreResult<SearchPage> {
        let page = page.max(1);
        let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };

        let matching: Vec<Protein> = if query.is_empty() {
            self.scan()?
        } else {
            self.scan()?.into_iter().filter(|p| query.matches(p)).collect()
        };

        let results = matching
            .iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .map(ProteinSummary::from)
            .collect();

        Ok(SearchPage {
            total_matches: matching.len(),
            page,
            per_page,
            results,
        })
    }

    /// Proteins whose display name or any name contains `prefix`, ignoring
    /// case. Prefixes shorter than two characters yield nothing.
    fn suggestions(&self, prefix: &str, limit: usize) -> DocStoreResult<Vec<Suggestion>> {
        let prefix = prefix.trim();
        if prefix.chars().count() < MIN_SUGGESTION_PREFIX {
            return Ok(Vec::new());
        }
        let needle = prefix.to_lowercase();
        let hit = |text: &str| text.to_lowercase().contains(&needle);

        Ok(self
            .scan()?
            .into_iter()
            .filter(|p| hit(&p.display_name) || p.names.iter().any(|n| hit(n)))
            .take(limit)
            .map(|p| Suggestion {
                id: p.id,
                display_name: p.display_name,
                names: p.names,
            })
            .collect())
    }
}

/// Document store kept in memory
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: BTreeMap<ProteinId, Protein>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn upsert(&mut self, protein: &Protein) -> DocStoreResult<UpsertOutcome> {
        match self.documents.insert(protein.id.clone(), protein.clone()) {
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Inserted),
        }
    }

    fn delete(&mut self, id: &ProteinId) -> DocStoreResult<bool> {
        Ok(self.documents.remove(id).is_some())
    }

    fn get(&self, id: &ProteinId) -> DocStoreResult<Option<Protein>> {
        Ok(self.documents.get(id).cloned())
    }

    fn scan(&self) -> DocStoreResult<Vec<Protein>> {
        Ok(self.documents.values().cloned().collect())
    }

    fn count(&self) -> DocStoreResult<usize> {
        Ok(self.documents.len())
    }

    fn clear(&mut self) -> DocStoreResult<()> {
        self.documents.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protein(id: &str, name: &str, seq: &str) -> Protein {
        let mut p = Protein::new(id);
        p.display_name = name.to_string();
        p.names = vec![format!("{} protein", name.to_lowercase())];
        p.sequence = seq.to_string();
        p
    }

    fn store() -> InMemoryDocumentStore {
        let mut store = InMemoryDocumentStore::new();
        store
            .upsert_many(&[
                protein("P3", "KIN_HUMAN", "MKKK"),
                protein("P1", "CYB_HUMAN", "MTPM"),
                protein("P2", "CYB_MOUSE", "MTPMRK"),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_upsert_reports_outcome() {
        let mut store = InMemoryDocumentStore::new();
        let p = protein("P1", "A", "");
        assert_eq!(store.upsert(&p).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert(&p).unwrap(), UpsertOutcome::Updated);
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.delete(&p.id).unwrap());
        assert!(!store.delete(&p.id).unwrap());
    }

    #[test]
    fn test_search_pages_in_id_order() {
        let store = store();
        let page = store.search(&SearchQuery::new(), 1, 2).unwrap();
        assert_eq!(page.total_matches, 3);
        assert_eq!(page.per_page, 2);
        let ids: Vec<&str> = page.results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);

        let page = store.search(&SearchQuery::new(), 2, 2).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id.as_str(), "P3");

        let page = store.search(&SearchQuery::new(), 9, 2).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.total_matches, 3);
    }

    #[test]
    fn test_search_filters() {
        let store = store();
        let query = SearchQuery::new().with(SearchFilter::keyword("cyb").unwrap());
        let page = store.search(&query, 0, 0).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, DEFAULT_PER_PAGE);
        assert_eq!(page.total_matches, 2);
        assert_eq!(page.results[1].sequence_length, 6);
    }

    #[test]
    fn test_suggestions() {
        let store = store();
        assert!(store.suggestions("c", 10).unwrap().is_empty());

        let hits = store.suggestions("Cy", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].display_name, "CYB_HUMAN");

        assert_eq!(store.suggestions("_human", 1).unwrap().len(), 1);
        // Regex metacharacters are matched literally
        assert!(store.suggestions(".*", 10).unwrap().is_empty());
    }
}

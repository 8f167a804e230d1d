//! Search filters over protein documents
//!
//! A [`SearchQuery`] is a conjunction of [`SearchFilter`]s. Filters are
//! validated when they are built: patterns are compiled, annotation
//! expressions parsed and ranges checked, so matching itself cannot fail.
//!
//! Annotation expressions come in two shapes:
//! - a comma-separated list, `"1.1.1.1, 2.2.2.2"`, combined by a
//!   [`MatchMode`] (all of them, or any of them)
//! - OR-ed AND-groups, `"(1.1.1.1 AND 2.2.2.2) OR (3.3.3.3)"`

use crate::model::Protein;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

/// Content of one parenthesized group
static GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("group pattern is valid"));

/// `AND` separator inside a group, any case
static AND_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+AND\s+").expect("separator pattern is valid"));

/// Filter construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Empty annotation expression")]
    EmptyExpression,

    #[error("Invalid length range: min {min} > max {max}")]
    InvertedRange { min: usize, max: usize },

    #[error("Unknown match mode: {0}")]
    UnknownMode(String),
}

pub type FilterResult<T> = Result<T, FilterError>;

/// Annotation field an expression applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationField {
    #[serde(rename = "ec")]
    EnzymeCode,
    #[serde(rename = "interpro")]
    Domain,
}

impl AnnotationField {
    fn values<'a>(&self, protein: &'a Protein) -> Box<dyn Iterator<Item = &'a String> + 'a> {
        match self {
            AnnotationField::EnzymeCode => Box::new(protein.enzyme_codes.iter()),
            AnnotationField::Domain => Box::new(protein.domain_ids.iter()),
        }
    }
}

/// How the values of a plain list combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// Every value must be present
    #[serde(rename = "AND")]
    All,
    /// At least one value must be present
    #[default]
    #[serde(rename = "OR")]
    Any,
}

impl std::str::FromStr for MatchMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AND" | "ALL" => Ok(MatchMode::All),
            "OR" | "ANY" | "" => Ok(MatchMode::Any),
            other => Err(FilterError::UnknownMode(other.to_string())),
        }
    }
}

/// A parsed annotation expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationExpr {
    List { values: Vec<String>, mode: MatchMode },
    /// Any group matches when all of its values are present
    Groups(Vec<Vec<String>>),
}

impl AnnotationExpr {
    /// Parse an expression in either syntax.
    ///
    /// Text containing parentheses is read as AND-groups; when no group can
    /// be extracted it is read as a plain list instead.
    pub fn parse(text: &str, mode: MatchMode) -> FilterResult<Self> {
        if text.contains('(') && text.contains(')') {
            if let Some(groups) = parse_annotation_groups(text) {
                return Ok(AnnotationExpr::Groups(groups));
            }
        }

        let values: Vec<String> = text
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        Self::list(values, mode)
    }

    /// Plain list of values
    pub fn list(values: Vec<String>, mode: MatchMode) -> FilterResult<Self> {
        let values: Vec<String> = values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            return Err(FilterError::EmptyExpression);
        }
        Ok(AnnotationExpr::List { values, mode })
    }

    pub fn matches<'a>(&self, present: impl Iterator<Item = &'a String>) -> bool {
        let present: BTreeSet<&str> = present.map(String::as_str).collect();
        match self {
            AnnotationExpr::List { values, mode: MatchMode::All } => {
                values.iter().all(|v| present.contains(v.as_str()))
            }
            AnnotationExpr::List { values, mode: MatchMode::Any } => {
                values.iter().any(|v| present.contains(v.as_str()))
            }
            AnnotationExpr::Groups(groups) => groups
                .iter()
                .any(|group| group.iter().all(|v| present.contains(v.as_str()))),
        }
    }
}

/// Extract the AND-groups of `"(A AND B) OR (C AND D)"`.
///
/// Returns `None` when no non-empty group is found.
pub fn parse_annotation_groups(expression: &str) -> Option<Vec<Vec<String>>> {
    let groups: Vec<Vec<String>> = GROUP
        .captures_iter(expression)
        .filter_map(|caps| {
            let group: Vec<String> = AND_SEPARATOR
                .split(&caps[1])
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            (!group.is_empty()).then_some(group)
        })
        .collect();

    (!groups.is_empty()).then_some(groups)
}

/// One validated search criterion
#[derive(Debug, Clone)]
pub enum SearchFilter {
    /// Display name or any alternative name
    Keyword(Regex),
    Organism(Regex),
    /// Sequence fragment
    Sequence(Regex),
    Annotation {
        field: AnnotationField,
        expr: AnnotationExpr,
    },
    /// Inclusive bounds on the sequence length
    LengthRange {
        min: Option<usize>,
        max: Option<usize>,
    },
}

fn case_insensitive(pattern: &str) -> FilterResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

impl SearchFilter {
    pub fn keyword(pattern: &str) -> FilterResult<Self> {
        Ok(SearchFilter::Keyword(case_insensitive(pattern)?))
    }

    pub fn organism(pattern: &str) -> FilterResult<Self> {
        Ok(SearchFilter::Organism(case_insensitive(pattern)?))
    }

    /// Sequence fragment; spaces are dropped and case is ignored
    pub fn sequence(fragment: &str) -> FilterResult<Self> {
        let pattern: String = fragment
            .to_uppercase()
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        Ok(SearchFilter::Sequence(case_insensitive(&pattern)?))
    }

    pub fn annotation(field: AnnotationField, text: &str, mode: MatchMode) -> FilterResult<Self> {
        Ok(SearchFilter::Annotation {
            field,
            expr: AnnotationExpr::parse(text, mode)?,
        })
    }

    pub fn length_range(min: Option<usize>, max: Option<usize>) -> FilterResult<Self> {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(FilterError::InvertedRange { min, max });
            }
        }
        Ok(SearchFilter::LengthRange { min, max })
    }

    pub fn matches(&self, protein: &Protein) -> bool {
        match self {
            SearchFilter::Keyword(re) => {
                re.is_match(&protein.display_name) || protein.names.iter().any(|n| re.is_match(n))
            }
            SearchFilter::Organism(re) => re.is_match(&protein.organism),
            SearchFilter::Sequence(re) => re.is_match(&protein.sequence),
            SearchFilter::Annotation { field, expr } => expr.matches(field.values(protein)),
            SearchFilter::LengthRange { min, max } => {
                let len = protein.sequence_length();
                min.map_or(true, |min| len >= min) && max.map_or(true, |max| len <= max)
            }
        }
    }
}

/// Conjunction of filters; an empty query matches everything
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    filters: Vec<SearchFilter>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: SearchFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: SearchFilter) {
        self.filters.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> &[SearchFilter] {
        &self.filters
    }

    pub fn matches(&self, protein: &Protein) -> bool {
        self.filters.iter().all(|f| f.matches(protein))
    }
}

/// Annotation values as sent by clients: expression text or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValues {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationCriteria {
    pub values: AnnotationValues,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthCriteria {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

/// Unvalidated search criteria, as received over the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub keyword: Option<String>,
    pub organism: Option<String>,
    pub sequence: Option<String>,
    pub ec: Option<AnnotationCriteria>,
    pub interpro: Option<AnnotationCriteria>,
    pub length: Option<LengthCriteria>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SearchCriteria {
    /// Validate the criteria into a query. Blank criteria are ignored.
    pub fn to_query(&self) -> FilterResult<SearchQuery> {
        let mut query = SearchQuery::new();

        if let Some(keyword) = non_blank(&self.keyword) {
            query.push(SearchFilter::keyword(keyword)?);
        }
        if let Some(organism) = non_blank(&self.organism) {
            query.push(SearchFilter::organism(organism)?);
        }

        for (field, criteria) in [
            (AnnotationField::EnzymeCode, &self.ec),
            (AnnotationField::Domain, &self.interpro),
        ] {
            let Some(criteria) = criteria else { continue };
            let mode = match criteria.mode.as_deref() {
                Some(mode) => mode.parse()?,
                None => MatchMode::default(),
            };
            let expr = match &criteria.values {
                AnnotationValues::Text(text) if text.trim().is_empty() => continue,
                AnnotationValues::Text(text) => AnnotationExpr::parse(text, mode)?,
                AnnotationValues::List(values) if values.is_empty() => continue,
                AnnotationValues::List(values) => AnnotationExpr::list(values.clone(), mode)?,
            };
            query.push(SearchFilter::Annotation { field, expr });
        }

        if let Some(length) = &self.length {
            if length.min.is_some() || length.max.is_some() {
                query.push(SearchFilter::length_range(length.min, length.max)?);
            }
        }
        if let Some(sequence) = non_blank(&self.sequence) {
            query.push(SearchFilter::sequence(sequence)?);
        }

        Ok(query)
    }
}

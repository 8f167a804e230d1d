//! Domain-overlap similarity
//!
//! Two proteins are similar when their domain annotation sets intersect.
//! The weight of the link is the Jaccard index `|A ∩ B| / |A ∪ B|`.
//!
//! Stored domain lists normally come back as arrays. Records written by
//! older loaders hold the list as the text of a list literal, e.g.
//! `"['IPR000001', 'IPR000002']"`; [`DomainSet::from_property`] accepts
//! both and never fails.

use crate::graph::{keys, Edge, EdgeKey, GraphBackend, GraphResult, PropertyValue, ProteinId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Shape of an InterPro domain accession
static DOMAIN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"IPR\d+").expect("domain id pattern is valid"));

/// Canonical set of domain identifiers: trimmed, non-empty, sorted, unique
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSet(BTreeSet<String>);

impl DomainSet {
    pub fn new() -> Self {
        DomainSet(BTreeSet::new())
    }

    /// Build a set from raw tokens, dropping blank ones
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        DomainSet(
            tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Read a stored domain list, whatever its encoding
    pub fn from_property(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Array(_) => Self::from_tokens(value.as_string_list().unwrap_or_default()),
            PropertyValue::String(text) => Self::from_legacy(text),
            _ => Self::new(),
        }
    }

    /// Parse the string form of a list written by older loaders.
    ///
    /// Tries a list-literal parse first, then falls back to pulling every
    /// domain-shaped token out of the text.
    pub fn from_legacy(text: &str) -> Self {
        match parse_list_literal(text) {
            Some(items) => Self::from_tokens(items),
            None => Self::from_tokens(extract_domain_ids(text)),
        }
    }

    /// True when a stored value needs migrating to the array form
    pub fn is_legacy(value: &PropertyValue) -> bool {
        matches!(value, PropertyValue::String(_))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.0.contains(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Domains present in both sets
    pub fn intersection(&self, other: &DomainSet) -> DomainSet {
        DomainSet(self.0.intersection(&other.0).cloned().collect())
    }

    /// Number of domains present in both sets
    pub fn overlap(&self, other: &DomainSet) -> usize {
        self.0.intersection(&other.0).count()
    }

    /// Jaccard index of the two sets, 0 when both are empty
    pub fn jaccard(&self, other: &DomainSet) -> f64 {
        jaccard_from_counts(self.overlap(other), self.len(), other.len())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Canonical stored form
    pub fn to_property(&self) -> PropertyValue {
        PropertyValue::from(self.to_vec())
    }
}

impl FromIterator<String> for DomainSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        DomainSet::from_tokens(iter)
    }
}

impl<'a> IntoIterator for &'a DomainSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Jaccard index from an intersection size and both set sizes.
///
/// `|A ∪ B| = |A| + |B| - |A ∩ B|`; an empty union gives 0. `shared` is
/// clamped to the smaller set, since an intersection cannot exceed it.
pub fn jaccard_from_counts(shared: usize, len_a: usize, len_b: usize) -> f64 {
    let shared = shared.min(len_a).min(len_b);
    let union = (len_a + len_b).saturating_sub(shared);
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Compute the similarity edges of `subject` against every candidate.
///
/// Candidates equal to the subject, candidates with no domains and
/// candidates with no shared domain produce no edge. A subject without
/// domains produces no edges at all. Edges come back ordered by the id of
/// the other endpoint.
pub fn compute_edges<'a, I>(subject: &ProteinId, domains: &DomainSet, candidates: I) -> Vec<Edge>
where
    I: IntoIterator<Item = (&'a ProteinId, DomainSet)>,
{
    if domains.is_empty() {
        return Vec::new();
    }

    let mut edges: Vec<(ProteinId, Edge)> = candidates
        .into_iter()
        .filter(|(id, other)| *id != subject && !other.is_empty())
        .filter_map(|(id, other)| {
            let shared = domains.intersection(&other);
            if shared.is_empty() {
                return None;
            }
            let weight = jaccard_from_counts(shared.len(), domains.len(), other.len());
            let key = EdgeKey::new(subject, id)?;
            Some((id.clone(), Edge::new(key, weight, shared.to_vec())))
        })
        .collect();

    edges.sort_by(|a, b| a.0.cmp(&b.0));
    edges.into_iter().map(|(_, edge)| edge).collect()
}

/// Parse the text of a list or tuple literal of quoted strings,
/// e.g. `['IPR000001', "IPR000002"]`.
///
/// Returns `None` when the text is not such a literal.
pub fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .or_else(|| trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let quote = match chars.next() {
            None => break,
            Some(q @ ('\'' | '"')) => q,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }

    Some(items)
}

/// Rewrite every string-encoded `domain_ids` property into the array form.
///
/// Node payloads are otherwise untouched and edges are kept. Returns the
/// number of nodes rewritten; a second run rewrites nothing.
pub fn migrate_legacy_domains<G: GraphBackend + ?Sized>(graph: &mut G) -> GraphResult<usize> {
    let mut rewritten = Vec::new();
    for node in graph.scan_nodes()? {
        let Some(value) = node.get_property(keys::DOMAIN_IDS) else {
            continue;
        };
        if !DomainSet::is_legacy(value) {
            continue;
        }
        let domains = DomainSet::from_property(value);
        let mut properties = node.properties.clone();
        properties.insert(keys::DOMAIN_IDS.to_string(), domains.to_property());
        rewritten.push((node.id, properties));
    }

    if rewritten.is_empty() {
        return Ok(0);
    }
    let count = graph.upsert_nodes(rewritten)?;
    tracing::info!("Migrated {} legacy domain lists", count);
    Ok(count)
}

/// Every domain-shaped token in a piece of text
pub fn extract_domain_ids(text: &str) -> Vec<String> {
    DOMAIN_ID
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

//! RDF namespace and prefix management
//!
//! This module handles namespace prefixes for compact IRI notation. A
//! [`Prefixes`] map is scoped to one parse or write session.

use crate::lexer::is_local_name;
use crate::model::NamedNode;
use indexmap::IndexMap;
use thiserror::Error;

/// Prefix errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Not a compact IRI
    #[error("Invalid prefixed name: {0}")]
    InvalidPrefixedName(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// Ordered prefix → IRI mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefixes {
    map: IndexMap<String, String>,
}

impl Prefixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Common RDF/RDFS/OWL/XSD prefixes
    pub fn well_known() -> Self {
        let mut prefixes = Self::new();
        prefixes.insert("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        prefixes.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        prefixes.insert("xsd", "http://www.w3.org/2001/XMLSchema#");
        prefixes.insert("owl", "http://www.w3.org/2002/07/owl#");
        prefixes.insert("foaf", "http://xmlns.com/foaf/0.1/");
        prefixes.insert("dc", "http://purl.org/dc/elements/1.1/");
        prefixes.insert("dcterms", "http://purl.org/dc/terms/");
        prefixes.insert("log", "http://www.w3.org/2000/10/swap/log#");
        prefixes
    }

    /// Add or replace a prefix; returns the previous IRI
    pub fn insert(&mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Option<String> {
        self.map.insert(prefix.into(), iri.into())
    }

    /// Get IRI for a prefix
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.map.get(prefix).map(String::as_str)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.map.contains_key(prefix)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(p, i)| (p.as_str(), i.as_str()))
    }

    /// Expand a compact IRI (prefix:local) to a full IRI
    pub fn expand(&self, compact_iri: &str) -> PrefixResult<String> {
        let (prefix, local) = compact_iri
            .split_once(':')
            .ok_or_else(|| PrefixError::InvalidPrefixedName(compact_iri.to_string()))?;
        let iri = self
            .get(prefix)
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))?;
        Ok(format!("{}{}", iri, local))
    }

    /// Compact an IRI using the longest matching namespace whose remainder
    /// is a valid local name
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.map
            .iter()
            .filter(|(_, base)| !base.is_empty() && iri.starts_with(base.as_str()))
            .filter(|(_, base)| is_local_name(&iri[base.len()..]))
            .max_by_key(|(_, base)| base.len())
            .map(|(prefix, base)| format!("{}:{}", prefix, &iri[base.len()..]))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Prefixes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut prefixes = Prefixes::new();
        for (prefix, iri) in iter {
            prefixes.insert(prefix, iri);
        }
        prefixes
    }
}

/// Returns a function that creates named nodes in the given namespace
pub fn prefix(iri: impl Into<String>) -> impl Fn(&str) -> NamedNode {
    let base = iri.into();
    move |local| NamedNode::new(format!("{}{}", base, local))
}

/// Returns a lookup from prefix to namespace function; unknown prefixes
/// resolve to an empty namespace
pub fn prefixes(defaults: Prefixes) -> impl Fn(&str) -> Box<dyn Fn(&str) -> NamedNode> {
    move |name| {
        let base = defaults.get(name).unwrap_or_default().to_string();
        Box::new(prefix(base))
    }
}

//! In-memory quad store
//!
//! This module provides an indexed RDF quad store:
//! - Idempotent `add`/`remove` with structural quad equality
//! - Wildcard matching served from the most selective per-graph index
//! - Live [`QuadMatch`] views plus eager/lazy query shorthands
//! - Set algebra over any [`Dataset`]
//! - Blank-node minting and RDF list extraction
//!
//! # Example
//!
//! ```rust
//! use quadstore::model::{NamedNode, Quad, Subject};
//! use quadstore::store::Store;
//!
//! let mut store = Store::new();
//! let alice = NamedNode::new("http://example.org/alice");
//! let knows = NamedNode::new("http://xmlns.com/foaf/0.1/knows");
//! let bob = NamedNode::new("http://example.org/bob");
//!
//! assert!(store.add(Quad::triple(alice.clone(), knows.clone(), bob.clone())));
//! assert!(!store.add(Quad::triple(alice.clone(), knows, bob)));
//!
//! let subject = Subject::from(alice);
//! assert_eq!(store.count_quads(Some(&subject), None, None, None), 1);
//! ```

mod dataset;
mod index;
mod lists;

pub use dataset::{Dataset, QuadMatch};
pub use lists::{ExtractListOptions, ListExtractionError, ListExtractionResult};

use std::borrow::Borrow;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;
use tracing::debug;

use crate::model::{BlankNode, GraphName, Object, Predicate, Quad, Subject, Term};
use crate::parser::Format;
use crate::writer::{Writer, WriterOptions};
use index::{EntityId, GraphIndex, Interner, Key};

/// Resolved lookup keys for `[subject, predicate, object, graph]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pattern([Key; 4]);

impl Pattern {
    fn is_satisfiable(&self) -> bool {
        !self.0.contains(&Key::Unknown)
    }
}

/// Indexed in-memory quad store
#[derive(Debug, Clone, Default)]
pub struct Store {
    entities: Interner,
    graphs: IndexMap<EntityId, GraphIndex, FxBuildHasher>,
    len: usize,
    blank_node_index: usize,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given quads
    pub fn from_quads<I>(quads: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Quad>,
    {
        let mut store = Self::new();
        store.add_quads(quads);
        store
    }

    /// Number of quads
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every quad. Interned terms are kept, so names handed out by
    /// [`Store::create_blank_node`] stay reserved.
    pub fn clear(&mut self) {
        self.graphs.clear();
        self.len = 0;
    }

    /// Add a quad; returns false when it was already present
    pub fn add(&mut self, quad: Quad) -> bool {
        let (subject, predicate, object, graph) = quad.into_parts();
        self.add_quad(subject, predicate, object, graph)
    }

    /// Add a quad from its components; returns false when it was already present
    pub fn add_quad(
        &mut self,
        subject: impl Into<Subject>,
        predicate: impl Into<Predicate>,
        object: impl Into<Object>,
        graph: impl Into<GraphName>,
    ) -> bool {
        let g = self.entities.intern(Term::from(graph.into()));
        let s = self.entities.intern(Term::from(subject.into()));
        let p = self.entities.intern(Term::from(predicate.into()));
        let o = self.entities.intern(Term::from(object.into()));
        let added = self.graphs.entry(g).or_default().insert(s, p, o);
        if added {
            self.len += 1;
        }
        added
    }

    /// Add many quads; returns how many were new
    pub fn add_quads<I>(&mut self, quads: I) -> usize
    where
        I: IntoIterator,
        I::Item: Borrow<Quad>,
    {
        quads
            .into_iter()
            .filter(|quad| self.add(quad.borrow().clone()))
            .count()
    }

    /// Add every quad of another dataset; returns how many were new
    pub fn add_all<D: Dataset + ?Sized>(&mut self, other: &D) -> usize {
        let quads: Vec<Quad> = other.quads().collect();
        self.add_quads(quads)
    }

    /// True when the store holds the quad
    pub fn has(&self, quad: &Quad) -> bool {
        match self.quad_ids(quad) {
            Some([s, p, o, g]) => self.graphs.get(&g).is_some_and(|graph| graph.contains(s, p, o)),
            None => false,
        }
    }

    /// Remove a quad; returns false when it was not present
    pub fn remove_quad(&mut self, quad: &Quad) -> bool {
        match self.quad_ids(quad) {
            Some(ids) => self.remove_ids(ids),
            None => false,
        }
    }

    /// Remove many quads; returns how many were present
    pub fn remove_quads<I>(&mut self, quads: I) -> usize
    where
        I: IntoIterator,
        I::Item: Borrow<Quad>,
    {
        quads
            .into_iter()
            .filter(|quad| self.remove_quad(quad.borrow()))
            .count()
    }

    /// Remove every quad matching the pattern; returns the number removed
    pub fn remove_matches(
        &mut self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> usize {
        let pattern = self.pattern(subject, predicate, object, graph);
        let matched: Vec<[EntityId; 4]> = self.scan(pattern).collect();
        let removed = matched.into_iter().filter(|ids| self.remove_ids(*ids)).count();
        debug!("Removed {} matching quads", removed);
        removed
    }

    /// Remove every quad matching the pattern
    pub fn delete_matches(
        &mut self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> &mut Self {
        self.remove_matches(subject, predicate, object, graph);
        self
    }

    /// Drop a whole graph; returns the number of quads it held
    pub fn delete_graph(&mut self, graph: &GraphName) -> usize {
        let Some(g) = self.entities.get(&graph.id()) else {
            return 0;
        };
        match self.graphs.swap_remove(&g) {
            Some(index) => {
                self.len -= index.len();
                index.len()
            }
            None => 0,
        }
    }

    /// Live view of the quads matching the pattern; `None` is a wildcard
    pub fn match_quads(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> QuadMatch<'_> {
        QuadMatch::new(self, self.pattern(subject, predicate, object, graph))
    }

    /// Matching quads, collected
    pub fn get_quads(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> Vec<Quad> {
        self.read_quads(subject, predicate, object, graph).collect()
    }

    /// Matching quads, produced lazily
    pub fn read_quads(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> impl Iterator<Item = Quad> + '_ {
        let pattern = self.pattern(subject, predicate, object, graph);
        self.quads_for(pattern)
    }

    /// Number of matching quads
    pub fn count_quads(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> usize {
        let pattern = self.pattern(subject, predicate, object, graph);
        self.scan(pattern).count()
    }

    /// Distinct subjects of the matching quads
    pub fn get_subjects(
        &self,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> Vec<Subject> {
        let pattern = self.pattern(None, predicate, object, graph);
        self.distinct(pattern, 0)
            .filter_map(|term| Subject::try_from(term.clone()).ok())
            .collect()
    }

    /// Distinct predicates of the matching quads
    pub fn get_predicates(
        &self,
        subject: Option<&Subject>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> Vec<Predicate> {
        let pattern = self.pattern(subject, None, object, graph);
        self.distinct(pattern, 1)
            .filter_map(|term| Predicate::try_from(term.clone()).ok())
            .collect()
    }

    /// Distinct objects of the matching quads
    pub fn get_objects(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        graph: Option<&GraphName>,
    ) -> Vec<Object> {
        let pattern = self.pattern(subject, predicate, None, graph);
        self.distinct(pattern, 2)
            .filter_map(|term| Object::try_from(term.clone()).ok())
            .collect()
    }

    /// Distinct graphs of the matching quads
    pub fn get_graphs(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
    ) -> Vec<GraphName> {
        let pattern = self.pattern(subject, predicate, object, None);
        self.distinct(pattern, 3)
            .filter_map(|term| GraphName::try_from(term.clone()).ok())
            .collect()
    }

    pub fn for_subjects<F: FnMut(Subject)>(
        &self,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
        callback: F,
    ) {
        self.get_subjects(predicate, object, graph).into_iter().for_each(callback);
    }

    pub fn for_predicates<F: FnMut(Predicate)>(
        &self,
        subject: Option<&Subject>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
        callback: F,
    ) {
        self.get_predicates(subject, object, graph).into_iter().for_each(callback);
    }

    pub fn for_objects<F: FnMut(Object)>(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        graph: Option<&GraphName>,
        callback: F,
    ) {
        self.get_objects(subject, predicate, graph).into_iter().for_each(callback);
    }

    pub fn for_graphs<F: FnMut(GraphName)>(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        callback: F,
    ) {
        self.get_graphs(subject, predicate, object).into_iter().for_each(callback);
    }

    /// All quads in store order
    pub fn iter(&self) -> impl Iterator<Item = Quad> + '_ {
        self.quads_for(Pattern([Key::Any; 4]))
    }

    pub fn to_vec(&self) -> Vec<Quad> {
        self.iter().collect()
    }

    pub fn for_each<F: FnMut(Quad)>(&self, callback: F) {
        self.iter().for_each(callback);
    }

    /// True when the store is non-empty and every quad satisfies the predicate
    pub fn every<F: FnMut(&Quad) -> bool>(&self, mut predicate: F) -> bool {
        let mut seen = false;
        let all = self.iter().all(|quad| {
            seen = true;
            predicate(&quad)
        });
        seen && all
    }

    pub fn some<F: FnMut(&Quad) -> bool>(&self, mut predicate: F) -> bool {
        self.iter().any(|quad| predicate(&quad))
    }

    /// New store holding the quads that satisfy the predicate
    pub fn filter<F: FnMut(&Quad) -> bool>(&self, mut predicate: F) -> Store {
        self.iter().filter(|quad| predicate(quad)).collect()
    }

    pub fn map<T, F: FnMut(Quad) -> T>(&self, callback: F) -> Vec<T> {
        self.iter().map(callback).collect()
    }

    pub fn reduce<T, F: FnMut(T, Quad) -> T>(&self, initial: T, callback: F) -> T {
        self.iter().fold(initial, callback)
    }

    /// Store holding the quads of both datasets
    pub fn union<D: Dataset + ?Sized>(&self, other: &D) -> Store {
        let mut union = self.clone();
        union.add_all(other);
        union
    }

    /// Store holding the quads present in both datasets
    pub fn intersection<D: Dataset + ?Sized>(&self, other: &D) -> Store {
        self.filter(|quad| other.has(quad))
    }

    /// Store holding the quads of this store missing from `other`
    pub fn difference<D: Dataset + ?Sized>(&self, other: &D) -> Store {
        self.filter(|quad| !other.has(quad))
    }

    /// True when every quad of `other` is in this store
    pub fn contains<D: Dataset + ?Sized>(&self, other: &D) -> bool {
        other.quads().all(|quad| self.has(&quad))
    }

    /// True when both hold exactly the same quads
    pub fn equals<D: Dataset + ?Sized>(&self, other: &D) -> bool {
        self.len == other.size() && self.contains(other)
    }

    /// Mint a blank node whose label the store has never used
    ///
    /// A suggested name is used verbatim when free, otherwise a numeric
    /// suffix is appended; without a suggestion labels run `b0`, `b1`, ...
    pub fn create_blank_node(&mut self, suggested: Option<&str>) -> BlankNode {
        let label = match suggested.filter(|name| !name.is_empty()) {
            Some(name) => {
                let mut label = name.to_string();
                let mut index = 1;
                while self.entities.contains(&format!("_:{}", label)) {
                    label = format!("{}{}", name, index);
                    index += 1;
                }
                label
            }
            None => loop {
                let label = format!("b{}", self.blank_node_index);
                self.blank_node_index += 1;
                if !self.entities.contains(&format!("_:{}", label)) {
                    break label;
                }
            },
        };
        let node = BlankNode::new(label);
        self.entities.intern(node.clone().into());
        node
    }

    /// Canonical N-Quads text: one statement per line, lines sorted
    pub fn to_canonical(&self) -> String {
        let writer = Writer::new(WriterOptions::new(Format::N_QUADS));
        let mut lines: Vec<String> = self.iter().map(|quad| writer.quad_to_string(&quad)).collect();
        lines.sort();
        lines.concat()
    }

    fn pattern(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&Predicate>,
        object: Option<&Object>,
        graph: Option<&GraphName>,
    ) -> Pattern {
        Pattern([
            self.key(subject.map(Subject::id)),
            self.key(predicate.map(Predicate::id)),
            self.key(object.map(Object::id)),
            self.key(graph.map(GraphName::id)),
        ])
    }

    fn key(&self, id: Option<String>) -> Key {
        match id {
            None => Key::Any,
            Some(id) => self.entities.get(&id).map_or(Key::Unknown, Key::Bound),
        }
    }

    fn quad_ids(&self, quad: &Quad) -> Option<[EntityId; 4]> {
        Some([
            self.entities.get(&quad.subject().id())?,
            self.entities.get(&quad.predicate().id())?,
            self.entities.get(&quad.object().id())?,
            self.entities.get(&quad.graph().id())?,
        ])
    }

    fn remove_ids(&mut self, [s, p, o, g]: [EntityId; 4]) -> bool {
        let Some(graph) = self.graphs.get_mut(&g) else {
            return false;
        };
        if !graph.remove(s, p, o) {
            return false;
        }
        if graph.is_empty() {
            self.graphs.swap_remove(&g);
        }
        self.len -= 1;
        true
    }

    /// Entity ids `[s, p, o, g]` of the quads matching the pattern
    pub(crate) fn scan(&self, pattern: Pattern) -> Box<dyn Iterator<Item = [EntityId; 4]> + '_> {
        if !pattern.is_satisfiable() {
            return Box::new(std::iter::empty());
        }
        let [s, p, o, g] = pattern.0.map(Key::bound);
        let graphs: Box<dyn Iterator<Item = (EntityId, &GraphIndex)>> = match g {
            Some(g) => Box::new(self.graphs.get_key_value(&g).map(|(g, index)| (*g, index)).into_iter()),
            None => Box::new(self.graphs.iter().map(|(g, index)| (*g, index))),
        };
        Box::new(graphs.flat_map(move |(g, index)| {
            index.scan(s, p, o).map(move |[s, p, o]| [s, p, o, g])
        }))
    }

    pub(crate) fn quads_for(&self, pattern: Pattern) -> impl Iterator<Item = Quad> + '_ {
        self.scan(pattern).filter_map(|ids| self.quad_at(ids))
    }

    pub(crate) fn pattern_admits(&self, pattern: Pattern, quad: &Quad) -> bool {
        let Some(ids) = self.quad_ids(quad) else {
            return false;
        };
        pattern
            .0
            .iter()
            .zip(ids)
            .all(|(key, id)| match key {
                Key::Any => true,
                Key::Bound(bound) => *bound == id,
                Key::Unknown => false,
            })
    }

    fn quad_at(&self, [s, p, o, g]: [EntityId; 4]) -> Option<Quad> {
        let term = |id| self.entities.term(id).cloned();
        Quad::from_terms(term(s)?, term(p)?, term(o)?, term(g)?).ok()
    }

    fn distinct(&self, pattern: Pattern, position: usize) -> impl Iterator<Item = &Term> + '_ {
        let ids: IndexSet<EntityId, FxBuildHasher> =
            self.scan(pattern).map(|ids| ids[position]).collect();
        ids.into_iter().filter_map(|id| self.entities.term(id))
    }
}

impl fmt::Display for Store {
    /// N-Quads serialization in store order
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let writer = Writer::new(WriterOptions::new(Format::N_QUADS));
        for quad in self.iter() {
            f.write_str(&writer.quad_to_string(&quad))?;
        }
        Ok(())
    }
}

impl FromIterator<Quad> for Store {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut store = Store::new();
        store.extend(iter);
        store
    }
}

impl Extend<Quad> for Store {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        for quad in iter {
            self.add(quad);
        }
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = Quad;
    type IntoIter = Box<dyn Iterator<Item = Quad> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

//! Dataset abstraction and live match views

use super::{Pattern, Store};
use crate::model::Quad;

/// A set of quads that can be enumerated and queried
///
/// Implemented by [`Store`], by [`QuadMatch`] views and by plain quad
/// slices, so set algebra works across all of them.
pub trait Dataset {
    /// Every quad, in the dataset's own order
    fn quads(&self) -> Box<dyn Iterator<Item = Quad> + '_>;

    fn has(&self, quad: &Quad) -> bool {
        self.quads().any(|candidate| &candidate == quad)
    }

    fn size(&self) -> usize {
        self.quads().count()
    }
}

impl Dataset for Store {
    fn quads(&self) -> Box<dyn Iterator<Item = Quad> + '_> {
        Box::new(self.iter())
    }

    fn has(&self, quad: &Quad) -> bool {
        Store::has(self, quad)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

impl Dataset for [Quad] {
    fn quads(&self) -> Box<dyn Iterator<Item = Quad> + '_> {
        Box::new(self.iter().cloned())
    }

    fn has(&self, quad: &Quad) -> bool {
        self.contains(quad)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

impl Dataset for Vec<Quad> {
    fn quads(&self) -> Box<dyn Iterator<Item = Quad> + '_> {
        self.as_slice().quads()
    }

    fn has(&self, quad: &Quad) -> bool {
        self.contains(quad)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

/// Live view over the quads of a store that match a pattern
///
/// Every traversal re-evaluates the pattern against the store. The view
/// borrows the store, so the store cannot change while a view is alive;
/// use [`QuadMatch::to_vec`] or [`QuadMatch::to_store`] to keep results
/// across mutations.
#[derive(Debug, Clone, Copy)]
pub struct QuadMatch<'a> {
    store: &'a Store,
    pattern: Pattern,
}

impl<'a> QuadMatch<'a> {
    pub(crate) fn new(store: &'a Store, pattern: Pattern) -> Self {
        Self { store, pattern }
    }

    pub fn iter(&self) -> impl Iterator<Item = Quad> + 'a {
        self.store.quads_for(self.pattern)
    }

    pub fn len(&self) -> usize {
        self.store.scan(self.pattern).count()
    }

    pub fn is_empty(&self) -> bool {
        self.store.scan(self.pattern).next().is_none()
    }

    /// True when the quad is in the store and matches the pattern
    pub fn has(&self, quad: &Quad) -> bool {
        self.store.pattern_admits(self.pattern, quad) && self.store.has(quad)
    }

    pub fn to_vec(&self) -> Vec<Quad> {
        self.iter().collect()
    }

    /// Snapshot the matching quads into a new store
    pub fn to_store(&self) -> Store {
        self.iter().collect()
    }
}

impl Dataset for QuadMatch<'_> {
    fn quads(&self) -> Box<dyn Iterator<Item = Quad> + '_> {
        Box::new(self.iter())
    }

    fn has(&self, quad: &Quad) -> bool {
        QuadMatch::has(self, quad)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

impl<'a> IntoIterator for QuadMatch<'a> {
    type Item = Quad;
    type IntoIter = Box<dyn Iterator<Item = Quad> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<'a> IntoIterator for &QuadMatch<'a> {
    type Item = Quad;
    type IntoIter = Box<dyn Iterator<Item = Quad> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphName, NamedNode, Object, Predicate, Subject};

    fn iri(local: &str) -> NamedNode {
        NamedNode::new(format!("http://example.org/{}", local))
    }

    #[test]
    fn test_match_is_restartable() {
        let mut store = Store::new();
        store.add(Quad::triple(iri("a"), iri("p"), iri("b")));
        store.add(Quad::triple(iri("a"), iri("q"), iri("c")));
        store.add(Quad::triple(iri("x"), iri("p"), iri("b")));

        let a = Subject::from(iri("a"));
        let view = store.match_quads(Some(&a), None, None, None);
        assert_eq!(view.len(), 2);
        assert_eq!(view.iter().count(), 2);
        assert_eq!(view.iter().count(), 2);
        assert!(view.has(&Quad::triple(iri("a"), iri("p"), iri("b"))));
        assert!(!view.has(&Quad::triple(iri("x"), iri("p"), iri("b"))));
        assert_eq!((&view).into_iter().count(), 2);
    }

    #[test]
    fn test_match_sees_later_mutations() {
        let mut store = Store::new();
        store.add(Quad::triple(iri("a"), iri("p"), iri("b")));
        let p = Predicate::from(iri("p"));
        assert_eq!(store.match_quads(None, Some(&p), None, None).len(), 1);
        store.add(Quad::triple(iri("c"), iri("p"), iri("d")));
        assert_eq!(store.match_quads(None, Some(&p), None, None).len(), 2);
    }

    #[test]
    fn test_snapshot_outlives_mutation() {
        let mut store = Store::new();
        store.add(Quad::new(iri("a"), iri("p"), iri("b"), iri("g")));
        let g = GraphName::from(iri("g"));
        let snapshot = store.match_quads(None, None, None, Some(&g)).to_store();
        store.delete_graph(&g);
        assert!(store.is_empty());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_views_as_datasets() {
        let mut store = Store::new();
        store.add(Quad::triple(iri("a"), iri("p"), iri("b")));
        store.add(Quad::triple(iri("a"), iri("p"), iri("c")));
        let b = Object::from(iri("b"));
        let view = store.match_quads(None, None, Some(&b), None);
        assert_eq!(Dataset::size(&view), 1);
        assert!(store.contains(&view));

        let p = Predicate::from(iri("p"));
        let by_predicate = store.match_quads(None, Some(&p), None, None).to_store();
        assert_eq!(by_predicate.intersection(&view).len(), 1);
        assert!(!view.is_empty());
    }
}

//! Entity interning and per-graph triple indexes
//!
//! Every term is interned to a `u32` entity id keyed by its canonical id
//! string. Each graph keeps three nested indexes over entity ids:
//!
//! - `subjects`: subject → predicate → objects
//! - `predicates`: predicate → object → subjects
//! - `objects`: object → subject → predicates
//!
//! so any combination of bound components is served by walking a single
//! index from its most selective end.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::model::Term;

pub(crate) type EntityId = u32;

type Leaf = IndexSet<EntityId, FxBuildHasher>;
type Level = IndexMap<EntityId, Leaf, FxBuildHasher>;
pub(crate) type Index = IndexMap<EntityId, Level, FxBuildHasher>;

/// Bidirectional term ↔ entity id table. Entries are never removed, so ids
/// stay stable for the lifetime of the store.
#[derive(Debug, Clone, Default)]
pub(crate) struct Interner {
    ids: FxHashMap<String, EntityId>,
    terms: Vec<Term>,
}

impl Interner {
    pub(crate) fn get(&self, id: &str) -> Option<EntityId> {
        self.ids.get(id).copied()
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub(crate) fn intern(&mut self, term: Term) -> EntityId {
        let key = term.id();
        if let Some(&entity) = self.ids.get(&key) {
            return entity;
        }
        let entity = self.terms.len() as EntityId;
        self.terms.push(term);
        self.ids.insert(key, entity);
        entity
    }

    pub(crate) fn term(&self, entity: EntityId) -> Option<&Term> {
        self.terms.get(entity as usize)
    }

    pub(crate) fn len(&self) -> usize {
        self.terms.len()
    }
}

/// Lookup key for one quad component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Key {
    /// Wildcard
    Any,
    Bound(EntityId),
    /// A term the store has never seen; matches nothing
    Unknown,
}

impl Key {
    pub(crate) fn bound(self) -> Option<EntityId> {
        match self {
            Key::Bound(entity) => Some(entity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GraphIndex {
    subjects: Index,
    predicates: Index,
    objects: Index,
    len: usize,
}

impl GraphIndex {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn insert(&mut self, s: EntityId, p: EntityId, o: EntityId) -> bool {
        if !insert_into(&mut self.subjects, s, p, o) {
            return false;
        }
        insert_into(&mut self.predicates, p, o, s);
        insert_into(&mut self.objects, o, s, p);
        self.len += 1;
        true
    }

    pub(crate) fn remove(&mut self, s: EntityId, p: EntityId, o: EntityId) -> bool {
        if !remove_from(&mut self.subjects, s, p, o) {
            return false;
        }
        remove_from(&mut self.predicates, p, o, s);
        remove_from(&mut self.objects, o, s, p);
        self.len -= 1;
        true
    }

    pub(crate) fn contains(&self, s: EntityId, p: EntityId, o: EntityId) -> bool {
        self.subjects
            .get(&s)
            .and_then(|level| level.get(&p))
            .is_some_and(|leaf| leaf.contains(&o))
    }

    /// Triples `[s, p, o]` matching the bound components
    pub(crate) fn scan(
        &self,
        s: Option<EntityId>,
        p: Option<EntityId>,
        o: Option<EntityId>,
    ) -> Box<dyn Iterator<Item = [EntityId; 3]> + '_> {
        match (s, p, o) {
            (Some(_), _, Some(_)) => {
                Box::new(walk(&self.objects, o, s, p).map(|[o, s, p]| [s, p, o]))
            }
            (Some(_), _, None) => Box::new(walk(&self.subjects, s, p, None)),
            (None, Some(_), _) => {
                Box::new(walk(&self.predicates, p, o, None).map(|[p, o, s]| [s, p, o]))
            }
            (None, None, Some(_)) => {
                Box::new(walk(&self.objects, o, None, None).map(|[o, s, p]| [s, p, o]))
            }
            (None, None, None) => Box::new(walk(&self.subjects, None, None, None)),
        }
    }
}

fn insert_into(index: &mut Index, a: EntityId, b: EntityId, c: EntityId) -> bool {
    index.entry(a).or_default().entry(b).or_default().insert(c)
}

fn remove_from(index: &mut Index, a: EntityId, b: EntityId, c: EntityId) -> bool {
    let Some(level) = index.get_mut(&a) else {
        return false;
    };
    let Some(leaf) = level.get_mut(&b) else {
        return false;
    };
    if !leaf.swap_remove(&c) {
        return false;
    }
    if leaf.is_empty() {
        level.swap_remove(&b);
        if level.is_empty() {
            index.swap_remove(&a);
        }
    }
    true
}

fn entries<V>(
    map: &IndexMap<EntityId, V, FxBuildHasher>,
    key: Option<EntityId>,
) -> Box<dyn Iterator<Item = (EntityId, &V)> + '_> {
    match key {
        Some(key) => Box::new(map.get_key_value(&key).map(|(k, v)| (*k, v)).into_iter()),
        None => Box::new(map.iter().map(|(k, v)| (*k, v))),
    }
}

fn members(leaf: &Leaf, key: Option<EntityId>) -> Box<dyn Iterator<Item = EntityId> + '_> {
    match key {
        Some(key) => Box::new(leaf.get(&key).copied().into_iter()),
        None => Box::new(leaf.iter().copied()),
    }
}

fn walk(
    index: &Index,
    k0: Option<EntityId>,
    k1: Option<EntityId>,
    k2: Option<EntityId>,
) -> impl Iterator<Item = [EntityId; 3]> + '_ {
    entries(index, k0).flat_map(move |(a, level)| {
        entries(level, k1)
            .flat_map(move |(b, leaf)| members(leaf, k2).map(move |c| [a, b, c]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_is_stable() {
        let mut interner = Interner::default();
        let a = interner.intern(Term::DefaultGraph);
        let b = interner.intern(crate::model::NamedNode::new("http://ex.org/a").into());
        assert_eq!(interner.intern(Term::DefaultGraph), a);
        assert_ne!(a, b);
        assert_eq!(interner.get("http://ex.org/a"), Some(b));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_scan_every_pattern() {
        let mut graph = GraphIndex::default();
        assert!(graph.insert(1, 2, 3));
        assert!(graph.insert(1, 2, 4));
        assert!(graph.insert(5, 2, 3));
        assert!(!graph.insert(1, 2, 3));
        assert_eq!(graph.len(), 3);

        let count = |s, p, o| graph.scan(s, p, o).count();
        assert_eq!(count(None, None, None), 3);
        assert_eq!(count(Some(1), None, None), 2);
        assert_eq!(count(Some(1), Some(2), None), 2);
        assert_eq!(count(Some(1), None, Some(3)), 1);
        assert_eq!(count(Some(1), Some(2), Some(4)), 1);
        assert_eq!(count(None, Some(2), Some(3)), 2);
        assert_eq!(count(None, None, Some(3)), 2);
        assert_eq!(count(None, Some(9), None), 0);

        let mut found: Vec<[u32; 3]> = graph.scan(None, None, Some(3)).collect();
        found.sort();
        assert_eq!(found, vec![[1, 2, 3], [5, 2, 3]]);
    }

    #[test]
    fn test_remove_prunes_empty_levels() {
        let mut graph = GraphIndex::default();
        graph.insert(1, 2, 3);
        assert!(graph.remove(1, 2, 3));
        assert!(!graph.remove(1, 2, 3));
        assert!(graph.is_empty());
        assert!(graph.subjects.is_empty());
        assert!(graph.predicates.is_empty());
        assert!(graph.objects.is_empty());
    }
}

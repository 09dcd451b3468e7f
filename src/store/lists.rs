//! RDF collection extraction
//!
//! Walks every `rdf:first`/`rdf:rest` chain backwards from its `rdf:nil`
//! terminator and reports well-formed lists keyed by the value of their
//! head cell.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use super::Store;
use crate::model::vocab::rdf;
use crate::model::{NamedNode, Object, Predicate, Quad, Subject, Term};

/// Malformed list chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{node} {message}")]
pub struct ListExtractionError {
    /// Value of the list cell where the chain breaks
    pub node: String,
    pub message: String,
}

pub type ListExtractionResult<T> = Result<T, ListExtractionError>;

/// Options for [`Store::extract_lists`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractListOptions {
    /// Delete the `rdf:first`/`rdf:rest` quads of the extracted lists
    pub remove: bool,
    /// Skip malformed lists instead of failing
    pub ignore_errors: bool,
}

impl ExtractListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remove(mut self, remove: bool) -> Self {
        self.remove = remove;
        self
    }

    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }
}

/// Where the quad pointing at a list's first cell holds that cell
enum HeadPosition {
    Subject,
    Object,
}

impl Store {
    /// Extract every well-formed RDF list
    ///
    /// A list is reported only when something refers to it: a quad using the
    /// first cell as subject or object. Cells must live in one graph, carry
    /// exactly one `rdf:first` and one `rdf:rest`, and have no other arcs.
    /// Any malformed list disables removal for the whole call.
    pub fn extract_lists(
        &mut self,
        options: ExtractListOptions,
    ) -> ListExtractionResult<IndexMap<String, Vec<Term>>> {
        let rest = Predicate::from(NamedNode::new(rdf::REST));
        let nil = Object::from(NamedNode::new(rdf::NIL));
        let tails = self.get_quads(None, Some(&rest), Some(&nil), None);

        let mut lists = IndexMap::new();
        let mut remove = options.remove;
        let mut to_remove: Vec<Quad> = Vec::new();

        for tail in &tails {
            let mut items: Vec<Term> = Vec::new();
            let mut malformed = false;
            let mut head: Option<(Quad, HeadPosition)> = None;
            let graph = tail.graph();

            let mut current: Option<Subject> = Some(tail.subject().clone());
            while let Some(node) = current.take() {
                if malformed {
                    break;
                }
                let fail = |message: &str| -> ListExtractionResult<bool> {
                    let error = ListExtractionError {
                        node: Term::from(node.clone()).value().to_string(),
                        message: message.to_string(),
                    };
                    if options.ignore_errors {
                        warn!("Skipping malformed list: {}", error);
                        Ok(true)
                    } else {
                        Err(error)
                    }
                };

                let as_object = Object::from(node.clone());
                let object_quads = self.get_quads(None, None, Some(&as_object), None);
                let subject_quads = self.get_quads(Some(&node), None, None, None);
                let mut first: Option<Quad> = None;
                let mut has_rest = false;
                let mut parent: Option<Quad> = None;

                for quad in subject_quads {
                    if malformed {
                        break;
                    }
                    if quad.graph() != graph {
                        malformed = fail("not confined to single graph")?;
                    } else if head.is_some() {
                        malformed = fail("has non-list arcs out")?;
                    } else if quad.predicate().is_iri(rdf::FIRST) {
                        if first.is_some() {
                            malformed = fail("has multiple rdf:first arcs")?;
                        } else {
                            to_remove.push(quad.clone());
                            first = Some(quad);
                        }
                    } else if quad.predicate().is_iri(rdf::REST) {
                        if has_rest {
                            malformed = fail("has multiple rdf:rest arcs")?;
                        } else {
                            has_rest = true;
                            to_remove.push(quad);
                        }
                    } else if !object_quads.is_empty() {
                        malformed = fail("can't be subject and object")?;
                    } else {
                        head = Some((quad, HeadPosition::Subject));
                    }
                }

                for quad in &object_quads {
                    if malformed {
                        break;
                    }
                    if head.is_some() {
                        malformed = fail("can't have coreferences")?;
                    } else if quad.predicate().is_iri(rdf::REST) {
                        if parent.is_some() {
                            malformed = fail("has incoming rdf:rest arcs")?;
                        } else {
                            parent = Some(quad.clone());
                        }
                    } else {
                        head = Some((quad.clone(), HeadPosition::Object));
                    }
                }

                match first {
                    Some(first) => items.insert(0, Term::from(first.object().clone())),
                    None => malformed = fail("has no list head")?,
                }
                current = parent.map(|parent| parent.subject().clone());
            }

            if malformed {
                remove = false;
            } else if let Some((quad, position)) = head {
                let key = match position {
                    HeadPosition::Subject => Term::from(quad.subject().clone()),
                    HeadPosition::Object => Term::from(quad.object().clone()),
                };
                lists.insert(key.value().to_string(), items);
            }
        }

        if remove {
            self.remove_quads(&to_remove);
        }
        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlankNode, Literal};

    fn iri(local: &str) -> NamedNode {
        NamedNode::new(format!("http://example.org/{}", local))
    }

    fn first() -> NamedNode {
        NamedNode::new(rdf::FIRST)
    }

    fn rest() -> NamedNode {
        NamedNode::new(rdf::REST)
    }

    fn nil() -> NamedNode {
        NamedNode::new(rdf::NIL)
    }

    /// `ex:s ex:p (1 2)` spelled out cell by cell
    fn two_item_list(store: &mut Store) {
        let (l0, l1) = (BlankNode::new("l0"), BlankNode::new("l1"));
        store.add(Quad::triple(iri("s"), iri("p"), l0.clone()));
        store.add(Quad::triple(l0.clone(), first(), Literal::from(1i64)));
        store.add(Quad::triple(l0, rest(), l1.clone()));
        store.add(Quad::triple(l1.clone(), first(), Literal::from(2i64)));
        store.add(Quad::triple(l1, rest(), nil()));
    }

    #[test]
    fn test_extracts_in_order() {
        let mut store = Store::new();
        two_item_list(&mut store);
        let lists = store.extract_lists(ExtractListOptions::new()).unwrap();
        assert_eq!(
            lists.get("l0"),
            Some(&vec![Term::from(Literal::from(1i64)), Term::from(Literal::from(2i64))])
        );
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_remove_deletes_list_cells() {
        let mut store = Store::new();
        two_item_list(&mut store);
        store
            .extract_lists(ExtractListOptions::new().with_remove(true))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.has(&Quad::triple(iri("s"), iri("p"), BlankNode::new("l0"))));
    }

    #[test]
    fn test_list_as_subject() {
        let mut store = Store::new();
        let cell = BlankNode::new("c");
        store.add(Quad::triple(cell.clone(), first(), iri("x")));
        store.add(Quad::triple(cell.clone(), rest(), nil()));
        store.add(Quad::triple(cell, iri("p"), iri("o")));
        let lists = store.extract_lists(ExtractListOptions::new()).unwrap();
        assert_eq!(lists.get("c"), Some(&vec![Term::from(iri("x"))]));
    }

    #[test]
    fn test_missing_first_is_an_error() {
        let mut store = Store::new();
        let cell = BlankNode::new("c");
        store.add(Quad::triple(iri("s"), iri("p"), cell.clone()));
        store.add(Quad::triple(cell, rest(), nil()));
        let err = store.extract_lists(ExtractListOptions::new()).unwrap_err();
        assert_eq!(err.to_string(), "c has no list head");
    }

    #[test]
    fn test_ignore_errors_skips_and_keeps_quads() {
        let mut store = Store::new();
        two_item_list(&mut store);
        let bad = BlankNode::new("bad");
        store.add(Quad::triple(iri("t"), iri("p"), bad.clone()));
        store.add(Quad::triple(bad.clone(), first(), iri("x")));
        store.add(Quad::triple(bad.clone(), first(), iri("y")));
        store.add(Quad::triple(bad, rest(), nil()));

        let options = ExtractListOptions::new()
            .with_remove(true)
            .with_ignore_errors(true);
        let lists = store.extract_lists(options).unwrap();
        assert_eq!(lists.len(), 1);
        assert!(lists.contains_key("l0"));
        assert_eq!(store.len(), 9);
    }

    #[test]
    fn test_cells_confined_to_one_graph() {
        let mut store = Store::new();
        let cell = BlankNode::new("c");
        store.add(Quad::triple(iri("s"), iri("p"), cell.clone()));
        store.add(Quad::new(cell.clone(), first(), iri("x"), iri("g")));
        store.add(Quad::triple(cell, rest(), nil()));
        let err = store.extract_lists(ExtractListOptions::new()).unwrap_err();
        assert_eq!(err.message, "not confined to single graph");
    }

    #[test]
    fn test_unreferenced_list_is_not_reported() {
        let mut store = Store::new();
        let cell = BlankNode::new("c");
        store.add(Quad::triple(cell.clone(), first(), iri("x")));
        store.add(Quad::triple(cell, rest(), nil()));
        let lists = store.extract_lists(ExtractListOptions::new()).unwrap();
        assert!(lists.is_empty());
    }

    #[test]
    fn test_graph_of_tail_is_used() {
        let mut store = Store::new();
        let cell = BlankNode::new("c");
        let g = iri("g");
        store.add(Quad::new(iri("s"), iri("p"), cell.clone(), g.clone()));
        store.add(Quad::new(cell.clone(), first(), iri("x"), g.clone()));
        store.add(Quad::new(cell, rest(), nil(), g));
        let lists = store.extract_lists(ExtractListOptions::new()).unwrap();
        assert_eq!(lists.get("c"), Some(&vec![Term::from(iri("x"))]));
    }
}

//! Term factory and blank-node label generation

use super::quad::Quad;
use super::term::{BlankNode, GraphName, Literal, NamedNode, Object, Predicate, Subject, Variable};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

static GLOBAL_COUNTER: LazyLock<Arc<BlankNodeCounter>> =
    LazyLock::new(|| Arc::new(BlankNodeCounter::new()));

/// Source of fresh blank-node labels (`n3-0`, `n3-1`, ...)
#[derive(Debug, Default)]
pub struct BlankNodeCounter {
    next: AtomicU64,
}

impl BlankNodeCounter {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide counter behind [`BlankNode::fresh`]
    pub fn global() -> Arc<BlankNodeCounter> {
        Arc::clone(&GLOBAL_COUNTER)
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_blank_node(&self) -> BlankNode {
        BlankNode::new(format!("n3-{}", self.next_id()))
    }

    /// Restart numbering at zero
    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

/// Creates terms and quads.
///
/// The default factory draws blank-node labels from the process-wide
/// counter; [`DataFactory::isolated`] owns its own counter so tests can
/// reset numbering without affecting anything else.
#[derive(Debug, Clone)]
pub struct DataFactory {
    counter: Arc<BlankNodeCounter>,
}

impl DataFactory {
    pub fn new() -> Self {
        Self {
            counter: BlankNodeCounter::global(),
        }
    }

    pub fn isolated() -> Self {
        Self {
            counter: Arc::new(BlankNodeCounter::new()),
        }
    }

    pub fn with_counter(counter: Arc<BlankNodeCounter>) -> Self {
        Self { counter }
    }

    pub fn counter(&self) -> &Arc<BlankNodeCounter> {
        &self.counter
    }

    pub fn named_node(&self, iri: impl Into<String>) -> NamedNode {
        NamedNode::new(iri)
    }

    /// Blank node with the given label, or a fresh one when `None`
    pub fn blank_node(&self, label: Option<&str>) -> BlankNode {
        match label {
            Some(label) => BlankNode::new(label),
            None => self.counter.next_blank_node(),
        }
    }

    pub fn literal(&self, value: impl Into<String>) -> Literal {
        Literal::new_simple_literal(value)
    }

    pub fn lang_literal(&self, value: impl Into<String>, language: impl Into<String>) -> Literal {
        Literal::new_language_tagged_literal(value, language)
    }

    pub fn typed_literal(&self, value: impl Into<String>, datatype: NamedNode) -> Literal {
        Literal::new_typed_literal(value, datatype)
    }

    pub fn variable(&self, name: impl Into<String>) -> Variable {
        Variable::new(name)
    }

    pub fn default_graph(&self) -> GraphName {
        GraphName::DefaultGraph
    }

    pub fn quad(
        &self,
        subject: impl Into<Subject>,
        predicate: impl Into<Predicate>,
        object: impl Into<Object>,
        graph: impl Into<GraphName>,
    ) -> Quad {
        Quad::new(subject, predicate, object, graph)
    }

    pub fn triple(
        &self,
        subject: impl Into<Subject>,
        predicate: impl Into<Predicate>,
        object: impl Into<Object>,
    ) -> Quad {
        Quad::triple(subject, predicate, object)
    }
}

impl Default for DataFactory {
    fn default() -> Self {
        Self::new()
    }
}

//! RDF term model
//!
//! Immutable value types for RDF terms and quads:
//! - Named nodes, blank nodes, literals, variables and the default graph
//! - Quads with typed subject/predicate/object/graph positions
//! - Canonical textual identifiers (`term_to_id` / `term_from_id`)
//! - A data factory with an injectable blank-node counter
//!
//! # Example
//!
//! ```rust
//! use quadstore::model::{NamedNode, Literal, Quad, Term};
//!
//! let quad = Quad::triple(
//!     NamedNode::new("http://example.org/alice"),
//!     NamedNode::new("http://xmlns.com/foaf/0.1/name"),
//!     Literal::new_simple_literal("Alice"),
//! );
//! assert!(quad.in_default_graph());
//!
//! let term = Term::from(NamedNode::new("http://example.org/alice"));
//! assert_eq!(term.id(), "http://example.org/alice");
//! ```

mod factory;
mod id;
mod interop;
mod quad;
mod term;
pub mod vocab;

pub use factory::{BlankNodeCounter, DataFactory};
pub use id::{term_from_id, term_to_id};
pub(crate) use term::escape_string;
pub use quad::Quad;
pub use term::{
    BlankNode, GraphName, Literal, ModelError, ModelResult, NamedNode, Object, Predicate, Subject,
    Term, TermType, Variable,
};

/// True when the term is a named node
pub fn is_named_node(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::NamedNode(_)))
}

pub fn is_blank_node(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::BlankNode(_)))
}

pub fn is_literal(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::Literal(_)))
}

pub fn is_variable(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::Variable(_)))
}

pub fn is_default_graph(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::DefaultGraph))
}

pub fn is_quad(term: Option<&Term>) -> bool {
    matches!(term, Some(Term::Triple(_)))
}

pub fn in_default_graph(quad: &Quad) -> bool {
    quad.in_default_graph()
}

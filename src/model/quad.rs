//! RDF quad (triple + graph)

use super::term::{GraphName, Object, Predicate, Subject, Term};
use serde::{Serialize, Serializer};
use std::fmt;

/// RDF quad
///
/// Position constraints are enforced by the [`Subject`], [`Predicate`],
/// [`Object`] and [`GraphName`] enums. Quads are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    subject: Subject,
    predicate: Predicate,
    object: Object,
    graph: GraphName,
}

impl Quad {
    /// Create a new quad
    pub fn new(
        subject: impl Into<Subject>,
        predicate: impl Into<Predicate>,
        object: impl Into<Object>,
        graph: impl Into<GraphName>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: graph.into(),
        }
    }

    /// Create a quad in the default graph
    pub fn triple(
        subject: impl Into<Subject>,
        predicate: impl Into<Predicate>,
        object: impl Into<Object>,
    ) -> Self {
        Self::new(subject, predicate, object, GraphName::DefaultGraph)
    }

    /// Build a quad from untyped terms, checking each position
    pub fn from_terms(subject: Term, predicate: Term, object: Term, graph: Term) -> super::ModelResult<Self> {
        Ok(Self {
            subject: Subject::try_from(subject)?,
            predicate: Predicate::try_from(predicate)?,
            object: Object::try_from(object)?,
            graph: GraphName::try_from(graph)?,
        })
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn graph(&self) -> &GraphName {
        &self.graph
    }

    pub fn in_default_graph(&self) -> bool {
        self.graph.is_default_graph()
    }

    /// The same triple placed in another graph
    pub fn with_graph(&self, graph: impl Into<GraphName>) -> Self {
        Self {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            object: self.object.clone(),
            graph: graph.into(),
        }
    }

    pub fn into_parts(self) -> (Subject, Predicate, Object, GraphName) {
        (self.subject, self.predicate, self.object, self.graph)
    }

    /// Identifier of this quad used as a quoted-triple term
    pub fn id(&self) -> String {
        super::id::quad_to_id(self)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.graph.is_default_graph() {
            write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
        } else {
            write!(
                f,
                "{} {} {} {} .",
                self.subject, self.predicate, self.object, self.graph
            )
        }
    }
}

impl Serialize for Quad {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Literal, NamedNode};

    #[test]
    fn test_quad_defaults_to_default_graph() {
        let quad = Quad::triple(
            NamedNode::new("http://example.org/a"),
            NamedNode::new("http://example.org/b"),
            NamedNode::new("http://example.org/c"),
        );
        assert!(quad.in_default_graph());
        assert_eq!(
            quad.to_string(),
            "<http://example.org/a> <http://example.org/b> <http://example.org/c> ."
        );
    }

    #[test]
    fn test_quad_serializes_to_string() {
        let quad = Quad::new(
            NamedNode::new("http://example.org/a"),
            NamedNode::new("http://example.org/b"),
            Literal::new_simple_literal("c"),
            NamedNode::new("http://example.org/g"),
        );
        assert_eq!(
            serde_json::to_string(&quad).unwrap(),
            "\"<http://example.org/a> <http://example.org/b> \\\"c\\\" <http://example.org/g> .\""
        );
    }

    #[test]
    fn test_from_terms_rejects_bad_positions() {
        let a = Term::NamedNode(NamedNode::new("http://example.org/a"));
        let lit = Term::Literal(Literal::new_simple_literal("x"));
        assert!(Quad::from_terms(lit.clone(), a.clone(), a.clone(), Term::DefaultGraph).is_err());
        assert!(Quad::from_terms(a.clone(), a.clone(), lit, Term::DefaultGraph).is_ok());
        assert!(Quad::from_terms(a.clone(), a.clone(), a, Term::DefaultGraph).is_ok());
    }
}

//! RDF term definitions
//!
//! Terms are closed tagged variants. Each leaf type (`NamedNode`, `BlankNode`,
//! `Literal`, `Variable`) can be lifted into [`Term`] or into the position
//! enums ([`Subject`], [`Predicate`], [`Object`], [`GraphName`]) that a
//! [`Quad`] is built from.

use super::factory::BlankNodeCounter;
use super::quad::Quad;
use super::vocab::{rdf, xsd};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use thiserror::Error;

/// Term model errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A term was used in a quad position it cannot occupy
    #[error("{term} cannot be used as {position}")]
    InvalidPosition {
        term: String,
        position: &'static str,
    },

    /// A term identifier could not be decoded
    #[error("Invalid term identifier: {0}")]
    InvalidId(String),

    /// A term has no counterpart in the other RDF model
    #[error("Unsupported term for conversion: {0}")]
    Unsupported(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Named node (IRI)
///
/// Construction never validates the IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode {
    iri: String,
}

impl NamedNode {
    /// Create a new named node from an IRI string
    pub fn new(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        &self.iri
    }

    pub fn into_string(self) -> String {
        self.iri
    }

    /// Identifier used for indexing; the IRI itself unless it would read back as another kind of term
    pub fn id(&self) -> String {
        super::id::named_node_id(&self.iri)
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

/// Blank node (anonymous node)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode {
    id: String,
}

impl BlankNode {
    /// Create a blank node with the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self { id: label.into() }
    }

    /// Create a blank node with a fresh label from the process-wide counter
    pub fn fresh() -> Self {
        BlankNodeCounter::global().next_blank_node()
    }

    /// Get the blank node label
    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn id(&self) -> String {
        format!("_:{}", self.id)
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::fresh()
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

/// RDF literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    value: String,
    language: Option<String>,
    datatype: NamedNode,
}

impl Literal {
    /// Create a simple literal (`xsd:string`)
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: NamedNode::new(xsd::STRING),
        }
    }

    /// Create a literal with a language tag; the tag is lowercased
    pub fn new_language_tagged_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into().to_lowercase()),
            datatype: NamedNode::new(rdf::LANG_STRING),
        }
    }

    /// Create a typed literal
    pub fn new_typed_literal(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype,
        }
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Get the datatype
    pub fn datatype(&self) -> &NamedNode {
        &self.datatype
    }

    pub fn is_plain(&self) -> bool {
        self.language.is_none() && self.datatype.as_str() == xsd::STRING
    }

    /// Identifier used for indexing: `"value"`, `"value"@lang` or `"value"^^iri`
    pub fn id(&self) -> String {
        self.encode_id(false)
    }

    /// Quoted-triple identifiers escape the lexical value so nested
    /// identifiers stay unambiguous.
    pub(crate) fn encode_id(&self, escaped: bool) -> String {
        let mut id = String::with_capacity(self.value.len() + 2);
        id.push('"');
        if escaped {
            for c in self.value.chars() {
                if c == '"' || c == '\\' {
                    id.push('\\');
                }
                id.push(c);
            }
        } else {
            id.push_str(&self.value);
        }
        id.push('"');
        if let Some(language) = &self.language {
            id.push('@');
            id.push_str(language);
        } else if self.datatype.as_str() != xsd::STRING {
            id.push_str("^^");
            id.push_str(self.datatype.as_str());
        }
        id
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_string(&self.value))?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)
        } else if self.datatype.as_str() != xsd::STRING {
            write!(f, "^^{}", self.datatype)
        } else {
            Ok(())
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::new_simple_literal(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::new_simple_literal(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::new_typed_literal(value.to_string(), NamedNode::new(xsd::INTEGER))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        let lexical = if value.is_finite() {
            format!("{:e}", value)
        } else if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "INF".to_string()
        } else {
            "-INF".to_string()
        };
        Literal::new_typed_literal(lexical, NamedNode::new(xsd::DOUBLE))
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::new_typed_literal(value.to_string(), NamedNode::new(xsd::BOOLEAN))
    }
}

/// Query or rule variable (`?name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> String {
        format!("?{}", self.name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

/// Discriminant of a [`Term`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermType {
    NamedNode,
    BlankNode,
    Literal,
    Variable,
    DefaultGraph,
    Quad,
}

/// RDF term (any RDF value)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
    /// Variable
    Variable(Variable),
    /// The default graph; its value is the empty string
    DefaultGraph,
    /// Quoted triple (RDF-star)
    Triple(Box<Quad>),
}

impl Term {
    pub fn term_type(&self) -> TermType {
        match self {
            Term::NamedNode(_) => TermType::NamedNode,
            Term::BlankNode(_) => TermType::BlankNode,
            Term::Literal(_) => TermType::Literal,
            Term::Variable(_) => TermType::Variable,
            Term::DefaultGraph => TermType::DefaultGraph,
            Term::Triple(_) => TermType::Quad,
        }
    }

    /// The term's value: IRI, label, lexical form or variable name.
    /// Empty for the default graph and for quoted triples.
    pub fn value(&self) -> &str {
        match self {
            Term::NamedNode(n) => n.as_str(),
            Term::BlankNode(b) => b.as_str(),
            Term::Literal(l) => l.value(),
            Term::Variable(v) => v.as_str(),
            Term::DefaultGraph | Term::Triple(_) => "",
        }
    }

    /// Canonical identifier; two terms are equal iff their ids are equal
    pub fn id(&self) -> String {
        super::id::term_to_id(self)
    }

    pub fn is_named_node(&self) -> bool {
        matches!(self, Term::NamedNode(_))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_default_graph(&self) -> bool {
        matches!(self, Term::DefaultGraph)
    }

    pub fn is_triple(&self) -> bool {
        matches!(self, Term::Triple(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(n) => write!(f, "{}", n),
            Term::BlankNode(b) => write!(f, "{}", b),
            Term::Literal(l) => write!(f, "{}", l),
            Term::Variable(v) => write!(f, "{}", v),
            Term::DefaultGraph => Ok(()),
            Term::Triple(q) => write!(f, "<<{} {} {}>>", q.subject(), q.predicate(), q.object()),
        }
    }
}

/// Terms serialize to an empty JSON object; quads serialize to a string.
impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::NamedNode(node)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Variable(var)
    }
}

impl From<Quad> for Term {
    fn from(quad: Quad) -> Self {
        Term::Triple(Box::new(quad))
    }
}

/// Quad subject: named node, blank node, variable or quoted triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Variable(Variable),
    Triple(Box<Quad>),
}

impl Subject {
    pub fn id(&self) -> String {
        match self {
            Subject::NamedNode(n) => n.id(),
            Subject::BlankNode(b) => b.id(),
            Subject::Variable(v) => v.id(),
            Subject::Triple(q) => q.id(),
        }
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Subject::BlankNode(_))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::NamedNode(n) => write!(f, "{}", n),
            Subject::BlankNode(b) => write!(f, "{}", b),
            Subject::Variable(v) => write!(f, "{}", v),
            Subject::Triple(q) => write!(f, "{}", Term::Triple(q.clone())),
        }
    }
}

impl From<NamedNode> for Subject {
    fn from(node: NamedNode) -> Self {
        Subject::NamedNode(node)
    }
}

impl From<BlankNode> for Subject {
    fn from(node: BlankNode) -> Self {
        Subject::BlankNode(node)
    }
}

impl From<Variable> for Subject {
    fn from(var: Variable) -> Self {
        Subject::Variable(var)
    }
}

impl From<Quad> for Subject {
    fn from(quad: Quad) -> Self {
        Subject::Triple(Box::new(quad))
    }
}

impl From<Subject> for Term {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::NamedNode(n) => Term::NamedNode(n),
            Subject::BlankNode(b) => Term::BlankNode(b),
            Subject::Variable(v) => Term::Variable(v),
            Subject::Triple(q) => Term::Triple(q),
        }
    }
}

impl TryFrom<Term> for Subject {
    type Error = ModelError;

    fn try_from(term: Term) -> ModelResult<Self> {
        match term {
            Term::NamedNode(n) => Ok(Subject::NamedNode(n)),
            Term::BlankNode(b) => Ok(Subject::BlankNode(b)),
            Term::Variable(v) => Ok(Subject::Variable(v)),
            Term::Triple(q) => Ok(Subject::Triple(q)),
            other => Err(invalid_position(&other, "subject")),
        }
    }
}

/// Quad predicate: named node or variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    NamedNode(NamedNode),
    Variable(Variable),
}

impl Predicate {
    pub fn id(&self) -> String {
        match self {
            Predicate::NamedNode(n) => n.id(),
            Predicate::Variable(v) => v.id(),
        }
    }

    /// True when this is the named node with the given IRI
    pub fn is_iri(&self, iri: &str) -> bool {
        matches!(self, Predicate::NamedNode(n) if n.as_str() == iri)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NamedNode(n) => write!(f, "{}", n),
            Predicate::Variable(v) => write!(f, "{}", v),
        }
    }
}

impl From<NamedNode> for Predicate {
    fn from(node: NamedNode) -> Self {
        Predicate::NamedNode(node)
    }
}

impl From<Variable> for Predicate {
    fn from(var: Variable) -> Self {
        Predicate::Variable(var)
    }
}

impl From<Predicate> for Term {
    fn from(predicate: Predicate) -> Self {
        match predicate {
            Predicate::NamedNode(n) => Term::NamedNode(n),
            Predicate::Variable(v) => Term::Variable(v),
        }
    }
}

impl TryFrom<Term> for Predicate {
    type Error = ModelError;

    fn try_from(term: Term) -> ModelResult<Self> {
        match term {
            Term::NamedNode(n) => Ok(Predicate::NamedNode(n)),
            Term::Variable(v) => Ok(Predicate::Variable(v)),
            other => Err(invalid_position(&other, "predicate")),
        }
    }
}

/// Quad object: anything but the default graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
    Triple(Box<Quad>),
}

impl Object {
    pub fn id(&self) -> String {
        match self {
            Object::NamedNode(n) => n.id(),
            Object::BlankNode(b) => b.id(),
            Object::Literal(l) => l.id(),
            Object::Variable(v) => v.id(),
            Object::Triple(q) => q.id(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Object::Literal(_))
    }

    pub fn is_iri(&self, iri: &str) -> bool {
        matches!(self, Object::NamedNode(n) if n.as_str() == iri)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::NamedNode(n) => write!(f, "{}", n),
            Object::BlankNode(b) => write!(f, "{}", b),
            Object::Literal(l) => write!(f, "{}", l),
            Object::Variable(v) => write!(f, "{}", v),
            Object::Triple(q) => write!(f, "{}", Term::Triple(q.clone())),
        }
    }
}

impl From<NamedNode> for Object {
    fn from(node: NamedNode) -> Self {
        Object::NamedNode(node)
    }
}

impl From<BlankNode> for Object {
    fn from(node: BlankNode) -> Self {
        Object::BlankNode(node)
    }
}

impl From<Literal> for Object {
    fn from(lit: Literal) -> Self {
        Object::Literal(lit)
    }
}

impl From<Variable> for Object {
    fn from(var: Variable) -> Self {
        Object::Variable(var)
    }
}

impl From<Quad> for Object {
    fn from(quad: Quad) -> Self {
        Object::Triple(Box::new(quad))
    }
}

impl From<Subject> for Object {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::NamedNode(n) => Object::NamedNode(n),
            Subject::BlankNode(b) => Object::BlankNode(b),
            Subject::Variable(v) => Object::Variable(v),
            Subject::Triple(q) => Object::Triple(q),
        }
    }
}

impl From<Object> for Term {
    fn from(object: Object) -> Self {
        match object {
            Object::NamedNode(n) => Term::NamedNode(n),
            Object::BlankNode(b) => Term::BlankNode(b),
            Object::Literal(l) => Term::Literal(l),
            Object::Variable(v) => Term::Variable(v),
            Object::Triple(q) => Term::Triple(q),
        }
    }
}

impl TryFrom<Term> for Object {
    type Error = ModelError;

    fn try_from(term: Term) -> ModelResult<Self> {
        match term {
            Term::NamedNode(n) => Ok(Object::NamedNode(n)),
            Term::BlankNode(b) => Ok(Object::BlankNode(b)),
            Term::Literal(l) => Ok(Object::Literal(l)),
            Term::Variable(v) => Ok(Object::Variable(v)),
            Term::Triple(q) => Ok(Object::Triple(q)),
            Term::DefaultGraph => Err(invalid_position(&Term::DefaultGraph, "object")),
        }
    }
}

/// Quad graph: default graph, named node, blank node or variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum GraphName {
    #[default]
    DefaultGraph,
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Variable(Variable),
}

impl GraphName {
    pub fn id(&self) -> String {
        match self {
            GraphName::DefaultGraph => String::new(),
            GraphName::NamedNode(n) => n.id(),
            GraphName::BlankNode(b) => b.id(),
            GraphName::Variable(v) => v.id(),
        }
    }

    pub fn is_default_graph(&self) -> bool {
        matches!(self, GraphName::DefaultGraph)
    }
}

impl fmt::Display for GraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphName::DefaultGraph => Ok(()),
            GraphName::NamedNode(n) => write!(f, "{}", n),
            GraphName::BlankNode(b) => write!(f, "{}", b),
            GraphName::Variable(v) => write!(f, "{}", v),
        }
    }
}

impl From<NamedNode> for GraphName {
    fn from(node: NamedNode) -> Self {
        GraphName::NamedNode(node)
    }
}

impl From<BlankNode> for GraphName {
    fn from(node: BlankNode) -> Self {
        GraphName::BlankNode(node)
    }
}

impl From<Variable> for GraphName {
    fn from(var: Variable) -> Self {
        GraphName::Variable(var)
    }
}

impl From<GraphName> for Term {
    fn from(graph: GraphName) -> Self {
        match graph {
            GraphName::DefaultGraph => Term::DefaultGraph,
            GraphName::NamedNode(n) => Term::NamedNode(n),
            GraphName::BlankNode(b) => Term::BlankNode(b),
            GraphName::Variable(v) => Term::Variable(v),
        }
    }
}

impl TryFrom<Term> for GraphName {
    type Error = ModelError;

    fn try_from(term: Term) -> ModelResult<Self> {
        match term {
            Term::DefaultGraph => Ok(GraphName::DefaultGraph),
            Term::NamedNode(n) => Ok(GraphName::NamedNode(n)),
            Term::BlankNode(b) => Ok(GraphName::BlankNode(b)),
            Term::Variable(v) => Ok(GraphName::Variable(v)),
            other => Err(invalid_position(&other, "graph")),
        }
    }
}

fn invalid_position(term: &Term, position: &'static str) -> ModelError {
    ModelError::InvalidPosition {
        term: term.id(),
        position,
    }
}

/// Escape a lexical value for a double-quoted N-Triples/Turtle string
pub(crate) fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{08}' => escaped.push_str("\\b"),
            '\u{0C}' => escaped.push_str("\\f"),
            c if (c as u32) < 0x20 => escaped.push_str(&format!("\\u{:04X}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node() {
        let node = NamedNode::new("http://example.org/alice");
        assert_eq!(node.as_str(), "http://example.org/alice");
        assert_eq!(node.to_string(), "<http://example.org/alice>");
    }

    #[test]
    fn test_blank_node() {
        let node1 = BlankNode::default();
        let node2 = BlankNode::default();
        assert_ne!(node1, node2); // Should have unique identifiers
        assert!(node1.as_str().starts_with("n3-"));
    }

    #[test]
    fn test_literal() {
        let lit = Literal::new_simple_literal("Alice");
        assert_eq!(lit.value(), "Alice");
        assert_eq!(lit.datatype().as_str(), xsd::STRING);
        assert!(lit.is_plain());

        let lit = Literal::new_language_tagged_literal("Alice", "EN");
        assert_eq!(lit.language(), Some("en"));
        assert_eq!(lit.datatype().as_str(), rdf::LANG_STRING);
        assert_eq!(lit.to_string(), "\"Alice\"@en");

        let lit = Literal::from(42i64);
        assert_eq!(lit.to_string(), "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>");
    }

    #[test]
    fn test_literal_display_escapes() {
        let lit = Literal::new_simple_literal("say \"hi\"\n");
        assert_eq!(lit.to_string(), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn test_position_conversions() {
        let lit: Term = Literal::new_simple_literal("x").into();
        assert!(Subject::try_from(lit.clone()).is_err());
        assert!(Predicate::try_from(lit.clone()).is_err());
        assert!(Object::try_from(lit).is_ok());
        assert!(Object::try_from(Term::DefaultGraph).is_err());
        assert_eq!(GraphName::try_from(Term::DefaultGraph), Ok(GraphName::DefaultGraph));

        let err = Predicate::try_from(Term::BlankNode(BlankNode::new("b"))).unwrap_err();
        assert_eq!(err.to_string(), "_:b cannot be used as predicate");
    }

    #[test]
    fn test_term_serializes_to_empty_object() {
        let term = Term::NamedNode(NamedNode::new("http://example.org/a"));
        assert_eq!(serde_json::to_string(&term).unwrap(), "{}");
    }

    #[test]
    fn test_default_graph_value() {
        assert_eq!(Term::DefaultGraph.value(), "");
        assert_eq!(Term::DefaultGraph.id(), "");
        assert_eq!(GraphName::default().id(), "");
    }
}

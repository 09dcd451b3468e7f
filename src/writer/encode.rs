//! Term encoding for the Turtle family

use std::sync::LazyLock;

use regex::Regex;

use super::WriterTerm;
use crate::model::vocab::{log, rdf, xsd};
use crate::model::{escape_string, GraphName, Literal, Object, Predicate, Quad, Subject, Term};
use crate::namespace::Prefixes;
use crate::parser::Format;

static INTEGER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[+-]?\d+$").ok());
static DECIMAL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[+-]?\d*\.\d+$").ok());
static DOUBLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+\.\d*|\.?\d+)[eE][+-]?\d+$").ok());

fn is_match(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

/// Encodes terms for one writer session: prefixes, base IRI and the
/// literal shorthands available in the output syntax
#[derive(Debug, Clone)]
pub(crate) struct Encoder {
    line_mode: bool,
    n3: bool,
    prefixes: Prefixes,
    base: Option<String>,
}

impl Encoder {
    pub(crate) fn new(format: Format, base: Option<String>) -> Self {
        Self {
            line_mode: format.is_line_based(),
            n3: format.is_n3(),
            prefixes: Prefixes::new(),
            base: if format.is_line_based() { None } else { base },
        }
    }

    pub(crate) fn line_mode(&self) -> bool {
        self.line_mode
    }

    pub(crate) fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    /// Register a prefix; returns false when it was already bound to `iri`
    pub(crate) fn add_prefix(&mut self, prefix: &str, iri: &str) -> bool {
        if self.prefixes.get(prefix) == Some(iri) {
            return false;
        }
        self.prefixes.insert(prefix, iri);
        true
    }

    pub(crate) fn iri(&self, iri: &str) -> String {
        if !self.line_mode {
            if let Some(compact) = self.prefixes.compact(iri) {
                return compact;
            }
        }
        format!("<{}>", escape_iri(self.relative(iri)))
    }

    /// `iri` relative to the base when it resolves back to the same IRI
    fn relative<'a>(&self, iri: &'a str) -> &'a str {
        let Some(base) = &self.base else {
            return iri;
        };
        let document = base.split('#').next().unwrap_or(base);
        let Some(rest) = iri.strip_prefix(document) else {
            return iri;
        };
        let reversible = if rest.starts_with('#') {
            true
        } else if rest.starts_with('?') {
            !document.contains('?')
        } else {
            document.ends_with('/') && !document.contains('?') && is_path_below(rest)
        };
        if reversible {
            rest
        } else {
            iri
        }
    }

    pub(crate) fn literal(&self, literal: &Literal) -> String {
        let value = escape_string(literal.value());
        if let Some(language) = literal.language() {
            return format!("\"{}\"@{}", value, language);
        }
        let datatype = literal.datatype().as_str();
        if datatype == xsd::STRING {
            return format!("\"{}\"", value);
        }
        if !self.line_mode {
            let bare = match datatype {
                xsd::BOOLEAN => value == "true" || value == "false",
                xsd::INTEGER => is_match(&INTEGER, &value),
                xsd::DECIMAL => is_match(&DECIMAL, &value),
                xsd::DOUBLE => is_match(&DOUBLE, &value),
                _ => false,
            };
            if bare {
                return value;
            }
        }
        format!("\"{}\"^^{}", value, self.iri(datatype))
    }

    pub(crate) fn term(&self, term: &Term) -> String {
        match term {
            Term::NamedNode(n) => self.iri(n.as_str()),
            Term::BlankNode(b) => format!("_:{}", b.as_str()),
            Term::Literal(l) => self.literal(l),
            Term::Variable(v) => format!("?{}", v.as_str()),
            Term::DefaultGraph => String::new(),
            Term::Triple(q) => self.quoted(q),
        }
    }

    pub(crate) fn writer_term(&self, term: &WriterTerm) -> String {
        match term {
            WriterTerm::Term(term) => self.term(term),
            WriterTerm::Serialized(text) => text.clone(),
        }
    }

    pub(crate) fn subject(&self, subject: &Subject) -> String {
        self.term(&Term::from(subject.clone()))
    }

    pub(crate) fn predicate(&self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::NamedNode(n) if n.as_str() == rdf::TYPE && !self.line_mode => "a".to_string(),
            Predicate::NamedNode(n) if n.as_str() == log::IMPLIES && self.n3 => "=>".to_string(),
            other => self.term(&Term::from(other.clone())),
        }
    }

    pub(crate) fn object(&self, object: &Object) -> String {
        self.term(&Term::from(object.clone()))
    }

    pub(crate) fn graph(&self, graph: &GraphName) -> String {
        self.term(&Term::from(graph.clone()))
    }

    fn quoted(&self, quad: &Quad) -> String {
        let mut text = format!(
            "<<{} {} {}",
            self.subject(quad.subject()),
            self.predicate(quad.predicate()),
            self.object(quad.object())
        );
        if !quad.in_default_graph() {
            text.push(' ');
            text.push_str(&self.graph(quad.graph()));
        }
        text.push_str(">>");
        text
    }

    /// One complete statement, ending with ` .\n`
    pub(crate) fn statement(&self, quad: &Quad) -> String {
        let mut text = format!(
            "{} {} {}",
            self.subject(quad.subject()),
            self.predicate(quad.predicate()),
            self.object(quad.object())
        );
        if !quad.in_default_graph() {
            text.push(' ');
            text.push_str(&self.graph(quad.graph()));
        }
        text.push_str(" .\n");
        text
    }
}

/// Relative path that cannot be mistaken for a scheme, an absolute path or
/// a dot segment
fn is_path_below(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let first = path.split('/').next().unwrap_or(path);
    !path.starts_with('/') && !first.contains(':') && !path.split('/').any(|s| s == "." || s == "..")
}

/// Escape characters that cannot appear inside `<...>`
fn escape_iri(iri: &str) -> String {
    let mut escaped = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            c if (c as u32) <= 0x20 || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') => {
                escaped.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NamedNode;

    #[test]
    fn test_prefix_abbreviation() {
        let mut encoder = Encoder::new(Format::TURTLE, None);
        encoder.add_prefix("ex", "http://ex.org/");
        encoder.add_prefix("deep", "http://ex.org/deep/");
        assert_eq!(encoder.iri("http://ex.org/a"), "ex:a");
        assert_eq!(encoder.iri("http://ex.org/deep/b"), "deep:b");
        assert_eq!(encoder.iri("http://ex.org/"), "ex:");
        assert_eq!(encoder.iri("http://ex.org/a/b"), "<http://ex.org/a/b>");
        assert!(!encoder.add_prefix("ex", "http://ex.org/"));
    }

    #[test]
    fn test_line_mode_never_abbreviates() {
        let mut encoder = Encoder::new(Format::N_TRIPLES, Some("http://ex.org/".into()));
        encoder.add_prefix("ex", "http://ex.org/");
        assert_eq!(encoder.iri("http://ex.org/a"), "<http://ex.org/a>");
        let one = Literal::new_typed_literal("1", NamedNode::new(xsd::INTEGER));
        assert_eq!(
            encoder.literal(&one),
            "\"1\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn test_literal_shorthands() {
        let encoder = Encoder::new(Format::TURTLE, None);
        let typed = |v: &str, dt: &str| Literal::new_typed_literal(v, NamedNode::new(dt));
        assert_eq!(encoder.literal(&typed("42", xsd::INTEGER)), "42");
        assert_eq!(encoder.literal(&typed("4.2", xsd::DECIMAL)), "4.2");
        assert_eq!(encoder.literal(&typed("4.2E1", xsd::DOUBLE)), "4.2E1");
        assert_eq!(encoder.literal(&typed("true", xsd::BOOLEAN)), "true");
        assert_eq!(
            encoder.literal(&typed("forty", xsd::INTEGER)),
            "\"forty\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
        assert_eq!(
            encoder.literal(&Literal::new_simple_literal("say \"hi\"\n")),
            "\"say \\\"hi\\\"\\n\""
        );
    }

    #[test]
    fn test_relative_iris() {
        let encoder = Encoder::new(Format::TURTLE, Some("http://ex.org/doc".into()));
        assert_eq!(encoder.iri("http://ex.org/doc#frag"), "<#frag>");
        assert_eq!(encoder.iri("http://ex.org/document"), "<http://ex.org/document>");
        let encoder = Encoder::new(Format::TURTLE, Some("http://ex.org/".into()));
        assert_eq!(encoder.iri("http://ex.org/a"), "<a>");
        assert_eq!(encoder.iri("http://ex.org/a/b?q#f"), "<a/b?q#f>");
        assert_eq!(encoder.iri("http://ex.org/"), "<>");
        // these would resolve to a different IRI
        assert_eq!(encoder.iri("http://ex.org/x:y"), "<http://ex.org/x:y>");
        assert_eq!(encoder.iri("http://ex.org//host/a"), "<http://ex.org//host/a>");
        assert_eq!(encoder.iri("http://ex.org/a/../b"), "<http://ex.org/a/../b>");
        assert_eq!(encoder.iri("http://ex.org/a/x:y"), "<a/x:y>");

        let encoder = Encoder::new(Format::TURTLE, Some("http://ex.org/doc#".into()));
        assert_eq!(encoder.iri("http://ex.org/doc#a"), "<#a>");
        let encoder = Encoder::new(Format::TURTLE, Some("http://ex.org/doc?x".into()));
        assert_eq!(encoder.iri("http://ex.org/doc?x?y"), "<http://ex.org/doc?x?y>");
    }

    #[test]
    fn test_n3_implication_shorthand() {
        let implies = Predicate::NamedNode(NamedNode::new(log::IMPLIES));
        assert_eq!(Encoder::new(Format::N3, None).predicate(&implies), "=>");
        assert_eq!(
            Encoder::new(Format::TURTLE, None).predicate(&implies),
            "<http://www.w3.org/2000/10/swap/log#implies>"
        );
    }

    #[test]
    fn test_iri_escaping() {
        let encoder = Encoder::new(Format::N_TRIPLES, None);
        assert_eq!(encoder.iri("http://ex.org/a b"), "<http://ex.org/a\\u0020b>");
    }
}

//! Serializer for Turtle, TriG, N-Triples, N-Quads and N3
//!
//! Turtle-family output groups consecutive quads that share a subject
//! (`;`) or a subject and predicate (`,`), and wraps named graphs in TriG
//! blocks. The line-based formats write one complete statement per line.
//! N3 output is held until [`Writer::end`] so that blank nodes naming a
//! formula can be written as `{ ... }` wherever they occur.
//!
//! # Example
//!
//! ```rust
//! use quadstore::model::{NamedNode, Quad};
//! use quadstore::writer::{Writer, WriterOptions};
//!
//! let mut writer = Writer::new(WriterOptions::for_format("Turtle").unwrap()
//!     .with_prefix("ex", "http://example.org/"));
//! writer.add_quad(&Quad::triple(
//!     NamedNode::new("http://example.org/a"),
//!     NamedNode::new("http://example.org/b"),
//!     NamedNode::new("http://example.org/c"),
//! )).unwrap();
//! let text = writer.end_to_string().unwrap();
//! assert!(text.contains("ex:a ex:b ex:c."));
//! ```

mod encode;

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    BlankNode, GraphName, Literal, NamedNode, Object, Predicate, Quad, Subject, Term,
};
use crate::namespace::Prefixes;
use crate::parser::{Format, ParseError};
use encode::Encoder;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// Writing to the sink failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A named graph was written in a format without graphs
    #[error("Cannot write quad in graph {graph} as {format}")]
    NamedGraph { graph: String, format: Format },

    /// Output was not valid UTF-8
    #[error("Invalid UTF-8 output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// Writer configuration
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    pub format: Format,
    /// Prefixes written at the start of the document
    pub prefixes: Prefixes,
    /// IRIs under this base are written relative to it
    pub base_iri: Option<String>,
}

impl WriterOptions {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn for_format(name: &str) -> Result<Self, ParseError> {
        Ok(Self::new(name.parse()?))
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix, iri);
        self
    }

    pub fn with_prefixes(mut self, prefixes: Prefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }
}

/// A term as the writer sees it: an RDF term, or text already produced by
/// [`Writer::blank`] or [`Writer::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterTerm {
    Term(Term),
    Serialized(String),
}

impl fmt::Display for WriterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterTerm::Term(term) => write!(f, "{}", term),
            WriterTerm::Serialized(text) => f.write_str(text),
        }
    }
}

impl From<Term> for WriterTerm {
    fn from(term: Term) -> Self {
        WriterTerm::Term(term)
    }
}

macro_rules! writer_term_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for WriterTerm {
            fn from(value: $ty) -> Self {
                WriterTerm::Term(Term::from(value))
            }
        })*
    };
}

writer_term_from!(NamedNode, BlankNode, Literal, Subject, Object);

/// Statement currently left open for `;` and `,` continuation
struct Open {
    graph: GraphName,
    subject: String,
    predicate: String,
}

type Statement = (WriterTerm, Predicate, WriterTerm);

/// N3 statements held back until the document ends
#[derive(Default)]
struct Formulas {
    statements: Vec<Statement>,
    graphs: IndexMap<BlankNode, Vec<Statement>>,
}

/// Writes blank nodes that name a formula as `{ ... }`
struct FormulaEncoder<'a> {
    encoder: &'a Encoder,
    graphs: &'a IndexMap<BlankNode, Vec<Statement>>,
    written: HashSet<BlankNode>,
    /// Formulas being written; a formula inside itself stays a blank node
    open: Vec<BlankNode>,
}

impl<'a> FormulaEncoder<'a> {
    fn term(&mut self, term: &WriterTerm) -> String {
        let graphs = self.graphs;
        let (formula, statements) = match term {
            WriterTerm::Term(Term::BlankNode(b)) if !self.open.contains(b) => {
                match graphs.get_key_value(b) {
                    Some(entry) => entry,
                    None => return self.encoder.writer_term(term),
                }
            }
            other => return self.encoder.writer_term(other),
        };
        self.written.insert(formula.clone());
        self.open.push(formula.clone());
        let mut body = Vec::with_capacity(statements.len());
        for (subject, predicate, object) in statements {
            let subject = self.term(subject);
            let predicate = self.encoder.predicate(predicate);
            let object = self.term(object);
            body.push(format!("{} {} {}", subject, predicate, object));
        }
        self.open.pop();
        format!("{{ {} }}", body.join(". "))
    }
}

/// Incremental RDF writer.
///
/// [`Writer::end`] consumes the writer, so nothing can be written after the
/// document has been closed.
pub struct Writer<W: Write> {
    out: W,
    format: Format,
    encoder: Encoder,
    /// Prefixes from the options not yet written
    pending_prefixes: Option<Prefixes>,
    open: Option<Open>,
    formulas: Option<Formulas>,
    statements: usize,
}

impl Writer<Vec<u8>> {
    /// Writer into an in-memory buffer
    pub fn new(options: WriterOptions) -> Self {
        Self::with_output(Vec::new(), options)
    }

    /// Close the document and return it as a string
    pub fn end_to_string(self) -> SerializeResult<String> {
        let bytes = self.end()?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl<W: Write> Writer<W> {
    pub fn with_output(out: W, options: WriterOptions) -> Self {
        let mut encoder = Encoder::new(options.format, options.base_iri);
        for (prefix, iri) in options.prefixes.iter() {
            encoder.add_prefix(prefix, iri);
        }
        let pending = (!options.prefixes.is_empty() && !encoder.line_mode())
            .then_some(options.prefixes);
        Self {
            out,
            format: options.format,
            encoder,
            pending_prefixes: pending,
            open: None,
            formulas: options.format.is_n3().then(Formulas::default),
            statements: 0,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn prefixes(&self) -> &Prefixes {
        self.encoder.prefixes()
    }

    fn flush_pending_prefixes(&mut self) -> SerializeResult<()> {
        if let Some(prefixes) = self.pending_prefixes.take() {
            for (prefix, iri) in prefixes.iter() {
                writeln!(self.out, "@prefix {}: <{}>.", prefix, iri)?;
            }
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Register a prefix and write its declaration
    pub fn add_prefix(&mut self, prefix: &str, iri: &str) -> SerializeResult<()> {
        let mut prefixes = Prefixes::new();
        prefixes.insert(prefix, iri);
        self.add_prefixes(&prefixes)
    }

    /// Register several prefixes as one block. An open statement is closed
    /// first; prefixes already bound to the same IRI are skipped.
    pub fn add_prefixes(&mut self, prefixes: &Prefixes) -> SerializeResult<()> {
        self.flush_pending_prefixes()?;
        if self.encoder.line_mode() {
            return Ok(());
        }
        let mut written = false;
        for (prefix, iri) in prefixes.iter() {
            if !self.encoder.add_prefix(prefix, iri) {
                continue;
            }
            if !written {
                self.close_statement()?;
                written = true;
            }
            debug!(prefix, iri, "prefix registered");
            writeln!(self.out, "@prefix {}: <{}>.", prefix, iri)?;
        }
        if written {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    fn close_statement(&mut self) -> SerializeResult<()> {
        if let Some(open) = self.open.take() {
            if open.graph.is_default_graph() {
                self.out.write_all(b".\n")?;
            } else {
                self.out.write_all(b"\n}\n")?;
            }
        }
        Ok(())
    }

    fn check_graph(&self, graph: &GraphName) -> SerializeResult<()> {
        let formula = self.format.is_n3() && matches!(graph, GraphName::BlankNode(_));
        if !graph.is_default_graph() && !self.format.supports_graphs() && !formula {
            return Err(SerializeError::NamedGraph {
                graph: graph.to_string(),
                format: self.format,
            });
        }
        Ok(())
    }

    pub fn add_quad(&mut self, quad: &Quad) -> SerializeResult<()> {
        self.add_terms(
            WriterTerm::from(quad.subject().clone()),
            quad.predicate(),
            WriterTerm::from(quad.object().clone()),
            quad.graph(),
        )
    }

    pub fn add_quads<I>(&mut self, quads: I) -> SerializeResult<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Quad>,
    {
        for quad in quads {
            self.add_quad(quad.borrow())?;
        }
        Ok(())
    }

    /// Write a statement whose subject or object may be a serialized
    /// [`blank`](Writer::blank) or [`list`](Writer::list)
    pub fn add_terms(
        &mut self,
        subject: WriterTerm,
        predicate: &Predicate,
        object: WriterTerm,
        graph: &GraphName,
    ) -> SerializeResult<()> {
        self.check_graph(graph)?;
        self.statements += 1;
        if let Some(formulas) = &mut self.formulas {
            let statement = (subject, predicate.clone(), object);
            match graph {
                GraphName::BlankNode(b) => formulas.graphs.entry(b.clone()).or_default().push(statement),
                _ => formulas.statements.push(statement),
            }
            return Ok(());
        }
        self.flush_pending_prefixes()?;
        let subject = self.encoder.writer_term(&subject);
        let predicate = self.encoder.predicate(predicate);
        let object = self.encoder.writer_term(&object);
        self.write_statement(graph, subject, predicate, object)
    }

    /// Write the held N3 statements with their formulas in place
    fn write_formulas(&mut self, formulas: Formulas) -> SerializeResult<()> {
        let mut encoder = FormulaEncoder {
            encoder: &self.encoder,
            graphs: &formulas.graphs,
            written: HashSet::new(),
            open: Vec::new(),
        };
        let mut lines = Vec::with_capacity(formulas.statements.len());
        for (subject, predicate, object) in &formulas.statements {
            let subject = encoder.term(subject);
            let predicate = encoder.encoder.predicate(predicate);
            let object = encoder.term(object);
            lines.push((subject, predicate, object));
        }
        if let Some(orphan) = formulas.graphs.keys().find(|g| !encoder.written.contains(*g)) {
            return Err(SerializeError::NamedGraph {
                graph: GraphName::BlankNode(orphan.clone()).to_string(),
                format: self.format,
            });
        }
        debug!(formulas = formulas.graphs.len(), "writing N3 formulas");
        for (subject, predicate, object) in lines {
            self.write_statement(&GraphName::DefaultGraph, subject, predicate, object)?;
        }
        Ok(())
    }

    fn write_statement(
        &mut self,
        graph: &GraphName,
        subject: String,
        predicate: String,
        object: String,
    ) -> SerializeResult<()> {
        if self.encoder.line_mode() {
            let graph = match graph {
                GraphName::DefaultGraph => String::new(),
                other => format!(" {}", self.encoder.graph(other)),
            };
            writeln!(self.out, "{} {} {}{} .", subject, predicate, object, graph)?;
            return Ok(());
        }

        match &mut self.open {
            Some(open) if open.graph == *graph && open.subject == subject => {
                if open.predicate == predicate {
                    write!(self.out, ", {}", object)?;
                } else {
                    write!(self.out, ";\n    {} {}", predicate, object)?;
                    open.predicate = predicate;
                }
                return Ok(());
            }
            Some(open) if open.graph == *graph => {
                self.out.write_all(b".\n")?;
                write!(self.out, "{} {} {}", subject, predicate, object)?;
                open.subject = subject;
                open.predicate = predicate;
                return Ok(());
            }
            _ => {}
        }

        self.close_statement()?;
        if !graph.is_default_graph() {
            writeln!(self.out, "{} {{", self.encoder.graph(graph))?;
        }
        write!(self.out, "{} {} {}", subject, predicate, object)?;
        self.open = Some(Open {
            graph: graph.clone(),
            subject,
            predicate,
        });
        Ok(())
    }

    /// One complete statement, without touching the writer's state
    pub fn quad_to_string(&self, quad: &Quad) -> String {
        self.encoder.statement(quad)
    }

    pub fn quads_to_string<I>(&self, quads: I) -> String
    where
        I: IntoIterator,
        I::Item: Borrow<Quad>,
    {
        quads
            .into_iter()
            .map(|quad| self.encoder.statement(quad.borrow()))
            .collect()
    }

    /// `[ predicate object ]`, ready to be used as a subject or object
    pub fn blank(&self, predicate: &Predicate, object: impl Into<WriterTerm>) -> WriterTerm {
        self.blank_with([(predicate.clone(), object.into())])
    }

    /// Anonymous blank node with any number of predicate-object pairs; with
    /// none it is `[]`
    pub fn blank_with<I>(&self, entries: I) -> WriterTerm
    where
        I: IntoIterator<Item = (Predicate, WriterTerm)>,
    {
        let entries: Vec<String> = entries
            .into_iter()
            .map(|(predicate, object)| {
                format!(
                    "{} {}",
                    self.encoder.predicate(&predicate),
                    self.encoder.writer_term(&object)
                )
            })
            .collect();
        let text = match entries.len() {
            0 => "[]".to_string(),
            1 => format!("[ {} ]", entries[0]),
            _ => format!("[\n  {}\n]", entries.join(";\n  ")),
        };
        WriterTerm::Serialized(text)
    }

    /// `( a b c )` collection syntax
    pub fn list<I>(&self, items: I) -> WriterTerm
    where
        I: IntoIterator,
        I::Item: Into<WriterTerm>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|item| self.encoder.writer_term(&item.into()))
            .collect();
        WriterTerm::Serialized(format!("({})", items.join(" ")))
    }

    /// Close the open statement or graph, flush and return the sink
    pub fn end(mut self) -> SerializeResult<W> {
        self.flush_pending_prefixes()?;
        if let Some(formulas) = self.formulas.take() {
            self.write_formulas(formulas)?;
        }
        self.close_statement()?;
        self.out.flush()?;
        debug!(format = %self.format, statements = self.statements, "write finished");
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vocab::rdf;

    fn iri(value: &str) -> NamedNode {
        NamedNode::new(format!("http://ex.org/{}", value))
    }

    fn turtle() -> Writer<Vec<u8>> {
        Writer::new(WriterOptions::new(Format::TURTLE).with_prefix("ex", "http://ex.org/"))
    }

    #[test]
    fn test_groups_subjects_and_predicates() {
        let mut writer = turtle();
        writer
            .add_quads(&[
                Quad::triple(iri("a"), iri("b"), iri("c")),
                Quad::triple(iri("a"), iri("b"), iri("d")),
                Quad::triple(iri("a"), NamedNode::new(rdf::TYPE), iri("T")),
                Quad::triple(iri("e"), iri("f"), Literal::new_simple_literal("g")),
            ])
            .unwrap();
        let text = writer.end_to_string().unwrap();
        assert_eq!(
            text,
            "@prefix ex: <http://ex.org/>.\n\nex:a ex:b ex:c, ex:d;\n    a ex:T.\nex:e ex:f \"g\".\n"
        );
    }

    #[test]
    fn test_trig_graph_blocks() {
        let mut writer = Writer::new(WriterOptions::new(Format::TRIG));
        let g = GraphName::NamedNode(iri("g"));
        writer.add_quad(&Quad::new(iri("a"), iri("b"), iri("c"), g.clone())).unwrap();
        writer.add_quad(&Quad::new(iri("a"), iri("b"), iri("d"), g)).unwrap();
        writer.add_quad(&Quad::triple(iri("x"), iri("y"), iri("z"))).unwrap();
        let text = writer.end_to_string().unwrap();
        assert_eq!(
            text,
            "<http://ex.org/g> {\n<http://ex.org/a> <http://ex.org/b> <http://ex.org/c>, <http://ex.org/d>\n}\n\
             <http://ex.org/x> <http://ex.org/y> <http://ex.org/z>.\n"
        );
    }

    #[test]
    fn test_named_graph_rejected_in_turtle() {
        let mut writer = turtle();
        let quad = Quad::new(iri("a"), iri("b"), iri("c"), iri("g"));
        assert!(matches!(
            writer.add_quad(&quad),
            Err(SerializeError::NamedGraph { .. })
        ));
        let mut writer = Writer::new(WriterOptions::new(Format::N_TRIPLES));
        assert!(writer.add_quad(&quad).is_err());
    }

    #[test]
    fn test_line_mode() {
        let mut writer = Writer::new(
            WriterOptions::new(Format::N_QUADS).with_prefix("ex", "http://ex.org/"),
        );
        writer
            .add_quad(&Quad::new(iri("a"), NamedNode::new(rdf::TYPE), iri("c"), iri("g")))
            .unwrap();
        writer.add_quad(&Quad::triple(iri("a"), iri("b"), Literal::from(5i64))).unwrap();
        let text = writer.end_to_string().unwrap();
        assert_eq!(
            text,
            "<http://ex.org/a> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://ex.org/c> <http://ex.org/g> .\n\
             <http://ex.org/a> <http://ex.org/b> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n"
        );
    }

    #[test]
    fn test_prefix_added_mid_document_closes_statement() {
        let mut writer = Writer::new(WriterOptions::new(Format::TURTLE));
        writer.add_quad(&Quad::triple(iri("a"), iri("b"), iri("c"))).unwrap();
        writer.add_prefix("ex", "http://ex.org/").unwrap();
        writer.add_quad(&Quad::triple(iri("a"), iri("b"), iri("d"))).unwrap();
        let text = writer.end_to_string().unwrap();
        assert_eq!(
            text,
            "<http://ex.org/a> <http://ex.org/b> <http://ex.org/c>.\n@prefix ex: <http://ex.org/>.\n\nex:a ex:b ex:d.\n"
        );
    }

    #[test]
    fn test_quad_to_string_leaves_state_alone() {
        let writer = turtle();
        let quad = Quad::new(iri("a"), iri("b"), iri("c"), iri("g"));
        assert_eq!(writer.quad_to_string(&quad), "ex:a ex:b ex:c ex:g .\n");
        assert_eq!(writer.quads_to_string([&quad, &quad]).lines().count(), 2);
        assert_eq!(writer.end_to_string().unwrap(), "@prefix ex: <http://ex.org/>.\n\n");
    }

    #[test]
    fn test_blank_and_list_helpers() {
        let mut writer = turtle();
        let p = Predicate::NamedNode(iri("p"));
        assert_eq!(writer.blank_with(Vec::new()).to_string(), "[]");
        let blank = writer.blank(&p, iri("o"));
        assert_eq!(blank.to_string(), "[ ex:p ex:o ]");
        let many = writer.blank_with([
            (p.clone(), WriterTerm::from(iri("o"))),
            (p.clone(), writer.list([iri("x"), iri("y")])),
        ]);
        assert_eq!(many.to_string(), "[\n  ex:p ex:o;\n  ex:p (ex:x ex:y)\n]");

        writer
            .add_terms(iri("s").into(), &p, blank, &GraphName::DefaultGraph)
            .unwrap();
        let text = writer.end_to_string().unwrap();
        assert!(text.ends_with("ex:s ex:p [ ex:p ex:o ].\n"));
    }

    #[test]
    fn test_n3_formulas_written_in_place() {
        let mut writer = Writer::new(WriterOptions::new(Format::N3).with_prefix("ex", "http://ex.org/"));
        let (premise, conclusion) = (BlankNode::new("f0"), BlankNode::new("f1"));
        let implies = NamedNode::new(crate::model::vocab::log::IMPLIES);
        let (x, y) = (crate::model::Variable::new("x"), crate::model::Variable::new("y"));
        // the rule is added before the formulas it names
        writer.add_quad(&Quad::triple(premise.clone(), implies, conclusion.clone())).unwrap();
        writer.add_quad(&Quad::new(x.clone(), iri("p"), y.clone(), premise)).unwrap();
        writer.add_quad(&Quad::new(y.clone(), iri("p"), iri("z"), conclusion.clone())).unwrap();
        writer.add_quad(&Quad::new(x, iri("q"), y, conclusion)).unwrap();
        writer.add_quad(&Quad::triple(iri("a"), iri("b"), BlankNode::new("plain"))).unwrap();
        let text = writer.end_to_string().unwrap();
        assert_eq!(
            text,
            "@prefix ex: <http://ex.org/>.\n\n{ ?x ex:p ?y } => { ?y ex:p ex:z. ?x ex:q ?y }.\nex:a ex:b _:plain.\n"
        );
    }

    #[test]
    fn test_n3_rejects_unreferenced_formula_and_iri_graphs() {
        let mut writer = Writer::new(WriterOptions::new(Format::N3));
        writer
            .add_quad(&Quad::new(iri("a"), iri("b"), iri("c"), BlankNode::new("lonely")))
            .unwrap();
        assert!(matches!(writer.end_to_string(), Err(SerializeError::NamedGraph { .. })));

        let mut writer = Writer::new(WriterOptions::new(Format::N3));
        let quad = Quad::new(iri("a"), iri("b"), iri("c"), iri("g"));
        assert!(matches!(writer.add_quad(&quad), Err(SerializeError::NamedGraph { .. })));
    }
}

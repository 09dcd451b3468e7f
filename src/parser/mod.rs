//! Parser for Turtle, TriG, N-Triples, N-Quads and N3
//!
//! Two consumption modes share one grammar reader:
//! - **Batch**: [`Parser::parse`] returns every quad in document order.
//! - **Streaming**: [`Parser::parse_reader`] pulls input from any
//!   [`Read`] and hands each quad to a [`ParseSink`] as soon as it is
//!   complete, finishing with [`ParseSink::on_end`].
//!
//! # Example
//!
//! ```rust
//! use quadstore::parser::Parser;
//!
//! let parser = Parser::for_format("text/turtle").unwrap();
//! let quads = parser
//!     .parse("@prefix ex: <http://example.org/> . ex:alice ex:knows ex:bob .")
//!     .unwrap();
//! assert_eq!(quads.len(), 1);
//! ```

mod format;
mod reader;

pub use format::{Format, Syntax};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use oxiri::Iri;
use thiserror::Error;
use tracing::debug;

use crate::lexer::{LexError, Lexer, LexerOptions, LexResult, Token};
use crate::model::{DataFactory, NamedNode, Quad};
use reader::Reader;

/// Parse runs so far; numbers the default blank-node prefix of each run
static PARSE_RUNS: AtomicUsize = AtomicUsize::new(0);

/// Parser errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed token
    #[error(transparent)]
    Lexical(#[from] LexError),

    /// A production could not be completed
    #[error("{message} on line {line}.")]
    Syntax { message: String, line: usize },

    /// Opening or reading the input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Format name not recognised
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl ParseError {
    /// Line the error occurred on, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Lexical(e) => Some(e.line),
            ParseError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Receiver of parse events.
///
/// Quads already delivered through [`on_quad`](ParseSink::on_quad) stay
/// delivered when a later error aborts the parse.
pub trait ParseSink {
    fn on_quad(&mut self, quad: Quad);

    fn on_prefix(&mut self, _prefix: &str, _iri: &NamedNode) {}

    fn on_comment(&mut self, _comment: &str) {}

    /// Checked after every statement; `true` ends the parse early as if
    /// the input had ended
    fn is_closed(&self) -> bool {
        false
    }

    /// Called exactly once, with `Ok(())` at end of input or the error that
    /// stopped the parse
    fn on_end(&mut self, _result: ParseResult<()>) {}
}

impl<F: FnMut(Quad)> ParseSink for F {
    fn on_quad(&mut self, quad: Quad) {
        self(quad)
    }
}

struct Collector<P> {
    quads: Vec<Quad>,
    on_prefix: P,
}

impl<P: FnMut(&str, &NamedNode)> ParseSink for Collector<P> {
    fn on_quad(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    fn on_prefix(&mut self, prefix: &str, iri: &NamedNode) {
        (self.on_prefix)(prefix, iri)
    }
}

/// Parser configuration
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub format: Format,
    /// Base against which relative IRIs resolve
    pub base_iri: Option<String>,
    /// Prefix for labelled blank nodes; a fresh `b<n>_` per run when unset
    pub blank_node_prefix: Option<String>,
    /// Read N3 `<=` as `log:isImpliedBy` instead of a reversed `log:implies`
    pub is_implied_by: bool,
    pub factory: DataFactory,
}

impl ParserOptions {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    pub fn with_blank_node_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blank_node_prefix = Some(prefix.into());
        self
    }

    pub fn with_is_implied_by(mut self, is_implied_by: bool) -> Self {
        self.is_implied_by = is_implied_by;
        self
    }

    pub fn with_factory(mut self, factory: DataFactory) -> Self {
        self.factory = factory;
        self
    }
}

/// RDF parser
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parser for a MIME-like format name such as `"text/turtle"` or `"trigstar"`
    pub fn for_format(name: &str) -> ParseResult<Self> {
        Ok(Self::new(ParserOptions::new(name.parse()?)))
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    fn lexer(&self) -> Lexer {
        let format = self.options.format;
        Lexer::new(LexerOptions {
            line_mode: format.is_line_based(),
            n3: format.is_n3(),
            comments: true,
            is_implied_by: self.options.is_implied_by,
        })
    }

    fn blank_prefix(&self) -> String {
        match &self.options.blank_node_prefix {
            Some(prefix) => prefix.trim_start_matches("_:").to_string(),
            None => format!("b{}_", PARSE_RUNS.fetch_add(1, Ordering::Relaxed)),
        }
    }

    fn base(&self) -> ParseResult<Option<Iri<String>>> {
        self.options
            .base_iri
            .as_ref()
            .map(|base| {
                Iri::parse(base.clone()).map_err(|e| ParseError::Syntax {
                    message: format!("Invalid base IRI <{}>: {}", base, e),
                    line: 0,
                })
            })
            .transpose()
    }

    fn run<I, S>(&self, tokens: I, sink: &mut S) -> ParseResult<usize>
    where
        I: Iterator<Item = LexResult<Token>>,
        S: ParseSink + ?Sized,
    {
        let format = self.options.format;
        debug!(format = %format, "parse started");
        let reader = Reader::new(
            tokens,
            format,
            self.base()?,
            self.blank_prefix(),
            self.options.factory.clone(),
            sink,
        );
        let count = reader.run()?;
        debug!(format = %format, quads = count, "parse finished");
        Ok(count)
    }

    /// Parse a complete document
    pub fn parse(&self, input: &str) -> ParseResult<Vec<Quad>> {
        self.parse_with_prefixes(input, |_, _| {})
    }

    /// Parse a complete document, reporting each prefix declaration
    pub fn parse_with_prefixes<P>(&self, input: &str, on_prefix: P) -> ParseResult<Vec<Quad>>
    where
        P: FnMut(&str, &NamedNode),
    {
        let mut collector = Collector {
            quads: Vec::new(),
            on_prefix,
        };
        self.run(self.lexer().tokenize_str(input), &mut collector)?;
        Ok(collector.quads)
    }

    /// Stream quads from a reader into `sink`; errors go to
    /// [`ParseSink::on_end`]
    pub fn parse_reader<R, S>(&self, reader: R, sink: &mut S)
    where
        R: Read,
        S: ParseSink + ?Sized,
    {
        let result = self.run(self.lexer().tokens(reader), sink).map(drop);
        sink.on_end(result);
    }

    /// Parse a file, reading it incrementally
    pub fn parse_file(&self, path: impl AsRef<Path>) -> ParseResult<Vec<Quad>> {
        let file = File::open(path)?;
        let mut collector = Collector {
            quads: Vec::new(),
            on_prefix: |_: &str, _: &NamedNode| {},
        };
        self.run(self.lexer().tokens(BufReader::new(file)), &mut collector)?;
        Ok(collector.quads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vocab::{log, owl, rdf, xsd};
    use crate::model::{BlankNode, GraphName, Literal, Object, Predicate, Subject, Term, Variable};

    fn parser(format: &str) -> Parser {
        Parser::new(
            ParserOptions::new(format.parse().unwrap()).with_blank_node_prefix(""),
        )
    }

    fn iri(value: &str) -> NamedNode {
        NamedNode::new(value)
    }

    #[test]
    fn test_ntriples_single_triple() {
        let quads = parser("N-Triples").parse("<a> <b> <c> .").unwrap();
        assert_eq!(quads, vec![Quad::triple(iri("a"), iri("b"), iri("c"))]);
        assert!(quads[0].in_default_graph());
    }

    #[test]
    fn test_nquads_graph_and_literals() {
        let input = "<http://ex.org/s> <http://ex.org/p> \"v\"@en <http://ex.org/g> .\n\
                     _:x <http://ex.org/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n";
        let quads = parser("application/n-quads").parse(input).unwrap();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].graph(), &GraphName::NamedNode(iri("http://ex.org/g")));
        assert_eq!(
            quads[0].object(),
            &Object::Literal(Literal::new_language_tagged_literal("v", "en"))
        );
        assert_eq!(quads[1].subject(), &Subject::BlankNode(BlankNode::new("x")));
        assert_eq!(
            quads[1].object(),
            &Object::Literal(Literal::new_typed_literal("1", iri(xsd::INTEGER)))
        );
    }

    #[test]
    fn test_ntriples_rejects_graph_and_abbreviations() {
        assert!(parser("N-Triples").parse("<a> <b> <c> <g> .").is_err());
        assert!(parser("N-Triples").parse("<a> <b> <c> ; <d> <e> .").is_err());
        assert!(parser("N-Triples").parse("<a> <b> <c>").is_err());
    }

    #[test]
    fn test_turtle_abbreviations() {
        let input = r#"
            @prefix ex: <http://ex.org/> .
            ex:s a ex:Class ;
                 ex:p "x", 42, 1.5, 1e0, true ;
                 ex:q [ ex:r ex:o ] .
        "#;
        let quads = parser("text/turtle").parse(input).unwrap();
        assert_eq!(quads.len(), 8);
        assert_eq!(quads[0].predicate(), &Predicate::NamedNode(iri(rdf::TYPE)));
        let datatypes: Vec<String> = quads[1..6]
            .iter()
            .map(|q| match q.object() {
                Object::Literal(l) => l.datatype().as_str().to_string(),
                other => panic!("{}", other),
            })
            .collect();
        assert_eq!(
            datatypes,
            vec![xsd::STRING, xsd::INTEGER, xsd::DECIMAL, xsd::DOUBLE, xsd::BOOLEAN]
        );
        // The nested property list is emitted before the triple pointing at it
        assert_eq!(quads[6].predicate(), &Predicate::NamedNode(iri("http://ex.org/r")));
        assert_eq!(Object::from(quads[6].subject().clone()), *quads[7].object());
    }

    #[test]
    fn test_sparql_style_directives_and_base() {
        let input = "BASE <http://ex.org/dir/>\nPREFIX p: <ns#>\n<a> p:b <../c> .";
        let mut declared = Vec::new();
        let quads = parser("turtle")
            .parse_with_prefixes(input, |prefix, iri| {
                declared.push((prefix.to_string(), iri.as_str().to_string()))
            })
            .unwrap();
        assert_eq!(declared, vec![("p".to_string(), "http://ex.org/dir/ns#".to_string())]);
        assert_eq!(
            quads[0],
            Quad::triple(
                iri("http://ex.org/dir/a"),
                iri("http://ex.org/dir/ns#b"),
                iri("http://ex.org/c"),
            )
        );
    }

    #[test]
    fn test_base_iri_option() {
        let parser = Parser::new(ParserOptions::new(Format::TURTLE).with_base_iri("http://ex.org/"));
        let quads = parser.parse("<s> <p> <#o> .").unwrap();
        assert_eq!(quads[0].object(), &Object::NamedNode(iri("http://ex.org/#o")));
    }

    #[test]
    fn test_collections() {
        let quads = parser("turtle").parse("<s> <p> (1 <x>) . <s> <q> () .").unwrap();
        assert_eq!(quads.len(), 6);
        let firsts = quads.iter().filter(|q| q.predicate().is_iri(rdf::FIRST)).count();
        assert_eq!(firsts, 2);
        assert_eq!(quads[5].object(), &Object::NamedNode(iri(rdf::NIL)));
        assert!(quads[3].object().is_iri(rdf::NIL));
    }

    #[test]
    fn test_blank_node_labels_are_scoped_per_run() {
        let parser = Parser::default();
        let first = parser.parse("_:a <p> _:a .").unwrap();
        let second = parser.parse("_:a <p> _:a .").unwrap();
        assert_eq!(Object::from(first[0].subject().clone()), *first[0].object());
        assert_ne!(first[0].subject(), second[0].subject());
    }

    #[test]
    fn test_anonymous_blank_nodes_are_distinct() {
        let quads = parser("turtle").parse("[] <p> <o> . [] <p> <o> .").unwrap();
        assert_ne!(quads[0].subject(), quads[1].subject());
    }

    #[test]
    fn test_trig_graphs() {
        let input = r#"
            @prefix ex: <http://ex.org/> .
            ex:g1 { ex:a ex:b ex:c . ex:d ex:e ex:f }
            GRAPH ex:g2 { ex:a ex:b ex:c }
            { ex:x ex:y ex:z }
        "#;
        let quads = parser("application/trig").parse(input).unwrap();
        assert_eq!(quads.len(), 4);
        assert_eq!(quads[0].graph(), &GraphName::NamedNode(iri("http://ex.org/g1")));
        assert_eq!(quads[1].graph(), quads[0].graph());
        assert_eq!(quads[2].graph(), &GraphName::NamedNode(iri("http://ex.org/g2")));
        assert!(quads[3].in_default_graph());
    }

    #[test]
    fn test_turtle_rejects_graphs() {
        assert!(parser("turtle").parse("<g> { <a> <b> <c> }").is_err());
    }

    #[test]
    fn test_rdf_star_quoted_triples_and_annotations() {
        let quads = parser("turtlestar")
            .parse("<< <a> <b> <c> >> <says> \"x\" . <a> <b> <c> {| <certainty> 0.9 |} .")
            .unwrap();
        assert_eq!(quads.len(), 3);
        let quoted = Quad::triple(iri("a"), iri("b"), iri("c"));
        assert_eq!(quads[0].subject(), &Subject::Triple(Box::new(quoted.clone())));
        assert_eq!(quads[1], quoted);
        assert_eq!(quads[2].subject(), &Subject::Triple(Box::new(quoted)));
        assert!(parser("turtle").parse("<< <a> <b> <c> >> <p> <o> .").is_err());
    }

    #[test]
    fn test_n3_formulas_and_implication() {
        let input = "@prefix : <http://ex.org/> .\n{ ?x a :Man } => { ?x a :Mortal } .";
        let quads = parser("text/n3").parse(input).unwrap();
        assert_eq!(quads.len(), 3);
        let rule = &quads[2];
        assert!(rule.predicate().is_iri(log::IMPLIES));
        let premise = match rule.subject() {
            Subject::BlankNode(b) => GraphName::BlankNode(b.clone()),
            other => panic!("{}", other),
        };
        assert_eq!(quads[0].graph(), &premise);
        assert_eq!(quads[0].subject(), &Subject::Variable(Variable::new("x")));
    }

    #[test]
    fn test_n3_reverse_implication() {
        let input = "{ <a> <b> <c> } <= { <d> <e> <f> } .";
        let quads = parser("n3").parse(input).unwrap();
        let rule = &quads[2];
        assert!(rule.predicate().is_iri(log::IMPLIES));
        assert_eq!(Term::from(rule.subject().clone()), Term::from(quads[1].graph().clone()));

        let implied_by = Parser::new(ParserOptions::new(Format::N3).with_is_implied_by(true));
        let quads = implied_by.parse(input).unwrap();
        assert!(quads[2].predicate().is_iri(log::IS_IMPLIED_BY));
    }

    #[test]
    fn test_n3_directives_end_with_their_formula() {
        let inner = "{ @prefix ex: <http://a/> . ex:x ex:y ex:z } => { } .";
        let quads = parser("n3").parse(inner).unwrap();
        assert_eq!(quads[0].subject(), &Subject::NamedNode(iri("http://a/x")));

        let leaked = format!("{} ex:q ex:r ex:s .", inner);
        let err = parser("n3").parse(&leaked).unwrap_err();
        assert!(err.to_string().contains("Undefined prefix"), "{}", err);

        // outer declarations stay visible inside and are restored after
        let shadowed = "@prefix ex: <http://outer/> .\n\
                        { @prefix ex: <http://inner/> . ex:a ex:b ex:c } => { ex:d ex:e ex:f } .\n\
                        ex:g ex:h ex:i .";
        let quads = parser("n3").parse(shadowed).unwrap();
        assert_eq!(quads[0].subject(), &Subject::NamedNode(iri("http://inner/a")));
        assert_eq!(quads[1].subject(), &Subject::NamedNode(iri("http://outer/d")));
        assert_eq!(quads[3].subject(), &Subject::NamedNode(iri("http://outer/g")));

        let based = parser("n3")
            .parse("@base <http://outer/> . { @base <http://inner/> . <a> <b> <c> } => { } . <d> <e> <f> .")
            .unwrap();
        assert_eq!(based[0].subject(), &Subject::NamedNode(iri("http://inner/a")));
        assert_eq!(based[2].subject(), &Subject::NamedNode(iri("http://outer/d")));
    }

    #[test]
    fn test_n3_equals_paths_and_quantifiers() {
        let quads = parser("n3").parse("<a> = <b> .").unwrap();
        assert!(quads[0].predicate().is_iri(owl::SAME_AS));

        let quads = parser("n3").parse("<alice>!<mother> <name> \"Eve\" .").unwrap();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].subject(), &Subject::NamedNode(iri("alice")));
        assert_eq!(Object::from(quads[1].subject().clone()), *quads[0].object());

        let quads = parser("n3").parse("<bob>^<child> <p> <o> .").unwrap();
        assert_eq!(quads[0].object(), &Object::NamedNode(iri("bob")));

        let quads = parser("n3")
            .parse("@forAll <x> . @forSome <y> . <x> <p> <y> .")
            .unwrap();
        assert!(matches!(quads[0].subject(), Subject::Variable(_)));
        assert!(matches!(quads[0].object(), Object::BlankNode(_)));
    }

    #[test]
    fn test_syntax_errors_carry_lines() {
        let err = parser("turtle").parse("<a> <b> <c> .\n<a> <b> .").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().starts_with("Unexpected"));

        let err = parser("turtle").parse("ex:a <b> <c> .").unwrap_err();
        assert_eq!(err.to_string(), "Undefined prefix \"ex:\" on line 1.");

        let err = parser("turtle").parse("\"lit\" <b> <c> .").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_streaming_keeps_quads_before_error() {
        struct Sink {
            quads: Vec<Quad>,
            comments: Vec<String>,
            ended: Option<bool>,
        }
        impl ParseSink for Sink {
            fn on_quad(&mut self, quad: Quad) {
                self.quads.push(quad);
            }
            fn on_comment(&mut self, comment: &str) {
                self.comments.push(comment.to_string());
            }
            fn on_end(&mut self, result: ParseResult<()>) {
                self.ended = Some(result.is_ok());
            }
        }

        let mut sink = Sink {
            quads: Vec::new(),
            comments: Vec::new(),
            ended: None,
        };
        let input = "# header\n<a> <b> <c> .\n<d> <e> .\n";
        parser("turtle").parse_reader(input.as_bytes(), &mut sink);
        assert_eq!(sink.quads.len(), 1);
        assert_eq!(sink.comments, vec![" header".to_string()]);
        assert_eq!(sink.ended, Some(false));
    }

    #[test]
    fn test_closed_sink_stops_the_parse() {
        struct FirstOnly {
            quads: Vec<Quad>,
            ended: Option<bool>,
        }
        impl ParseSink for FirstOnly {
            fn on_quad(&mut self, quad: Quad) {
                self.quads.push(quad);
            }
            fn is_closed(&self) -> bool {
                !self.quads.is_empty()
            }
            fn on_end(&mut self, result: ParseResult<()>) {
                self.ended = Some(result.is_ok());
            }
        }

        let mut sink = FirstOnly {
            quads: Vec::new(),
            ended: None,
        };
        // the malformed third statement is never reached
        let input = "<a> <b> <c> .
<d> <e> <f> .
<g> .
";
        parser("turtle").parse_reader(input.as_bytes(), &mut sink);
        assert_eq!(sink.quads.len(), 1);
        assert_eq!(sink.ended, Some(true));
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        parser("turtle").parse_reader("<a> <b> <c>, <d> .".as_bytes(), &mut |quad: Quad| {
            seen.push(quad)
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(Term::from(seen[1].object().clone()), Term::from(iri("d")));
    }
}

//! Quadstore
//!
//! An in-memory RDF quad store with streaming Turtle, TriG, N-Triples,
//! N-Quads and Notation3 support, and a forward-chaining rule reasoner.
//!
//! # Architecture
//!
//! Text flows through the crate in one direction:
//!
//! ```text
//! text → lexer → tokens → parser → quads → store → writer → text
//!                                            ↑ ↓
//!                                          reasoner
//! ```
//!
//! - [`model`]: terms, quads, canonical term ids, data factory
//! - [`namespace`]: prefix maps and namespace helpers
//! - [`lexer`]: tokens with line numbers, batch or pulled from a reader
//! - [`parser`]: quads from tokens, with RDF-star and N3 formulas
//! - [`writer`]: quads to text, with prefix abbreviation and grouping
//! - [`store`]: indexed quad set, live matches, set algebra, list extraction
//! - [`reasoner`]: fixpoint rule application, RDFS preset
//! - [`stream`]: tokio adapters for parsing, writing and import
//!
//! ## Example Usage
//!
//! ```rust
//! use quadstore::{Parser, Store, Writer, WriterOptions};
//!
//! let parser = Parser::for_format("text/turtle").unwrap();
//! let quads = parser
//!     .parse("@prefix ex: <http://example.org/>.\nex:alice ex:knows ex:bob, ex:carol.")
//!     .unwrap();
//!
//! let store: Store = quads.into_iter().collect();
//! assert_eq!(store.len(), 2);
//!
//! let mut writer = Writer::new(
//!     WriterOptions::for_format("Turtle")
//!         .unwrap()
//!         .with_prefix("ex", "http://example.org/"),
//! );
//! writer.add_quads(&store.to_vec()).unwrap();
//! let text = writer.end_to_string().unwrap();
//! assert!(text.contains("ex:alice ex:knows "));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod lexer;
pub mod model;
pub mod namespace;
pub mod parser;
pub mod reasoner;
pub mod store;
pub mod stream;
pub mod writer;

// Re-export main types for convenience
pub use model::{
    BlankNode, DataFactory, GraphName, Literal, ModelError, ModelResult, NamedNode, Object,
    Predicate, Quad, Subject, Term, Variable,
};

pub use lexer::{LexError, Lexer, LexerOptions, Token, TokenType};

pub use parser::{Format, ParseError, ParseResult, ParseSink, Parser, ParserOptions};

pub use writer::{SerializeError, SerializeResult, Writer, WriterOptions, WriterTerm};

pub use store::{Dataset, ExtractListOptions, ListExtractionError, QuadMatch, Store};

pub use reasoner::{rdfs_rules, Reasoner, ReasonerError, ReasonerResult, Rule};

pub use stream::{StreamParser, StreamWriter};

pub use namespace::{prefix, prefixes, Prefixes};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

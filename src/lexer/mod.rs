//! Tokenizer for the Turtle family of syntaxes
//!
//! Covers Turtle, TriG, N-Triples, N-Quads and N3, with the RDF-star
//! additions. Input is pulled from any [`Read`] in fixed-size chunks; the
//! buffer is refilled only when the token under the cursor cannot be decided
//! from what has been read so far, so no token is ever split across chunks.

mod scan;
mod token;

pub use token::{Token, TokenType};

pub(crate) use scan::is_local_name;
use scan::Step;
use std::io::{ErrorKind, Read};
use thiserror::Error;

const CHUNK_SIZE: usize = 8 * 1024;

/// Lexer error with the line it occurred on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} on line {line}.")]
pub struct LexError {
    pub message: String,
    pub line: usize,
}

impl LexError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;

/// Lexer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexerOptions {
    /// N-Triples / N-Quads: only IRIs, blank nodes, literals and dots
    pub line_mode: bool,
    /// Enable N3 tokens (variables, `=>`, `=`, paths, quantifiers)
    pub n3: bool,
    /// Emit comments as tokens instead of skipping them
    pub comments: bool,
    /// Emit `<=` as `log:isImpliedBy` instead of a reversed implication
    pub is_implied_by: bool,
}

/// Tokenizer entry point
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    options: LexerOptions,
}

impl Lexer {
    pub fn new(options: LexerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LexerOptions {
        &self.options
    }

    /// Tokenize a complete string; the last token is always `Eof`
    pub fn tokenize(&self, input: &str) -> LexResult<Vec<Token>> {
        self.tokenize_str(input).collect()
    }

    /// Tokenize an in-memory string lazily
    pub fn tokenize_str(&self, input: &str) -> Tokens<std::io::Empty> {
        Tokens {
            reader: None,
            buffer: input.to_string(),
            pos: 0,
            pending: Vec::new(),
            line: 1,
            options: self.options,
            previous: None,
            done: false,
        }
    }

    /// Pull tokens from a reader
    pub fn tokens<R: Read>(&self, reader: R) -> Tokens<R> {
        Tokens {
            reader: Some(reader),
            buffer: String::new(),
            pos: 0,
            pending: Vec::new(),
            line: 1,
            options: self.options,
            previous: None,
            done: false,
        }
    }

    /// Callback form: each token is delivered as `Ok(Some(token))`; the end
    /// of input as `Ok(None)`. After an error nothing further is delivered.
    pub fn tokenize_with<R, F>(&self, reader: R, mut callback: F)
    where
        R: Read,
        F: FnMut(LexResult<Option<Token>>),
    {
        for item in self.tokens(reader) {
            match item {
                Ok(token) if token.kind == TokenType::Eof => {
                    callback(Ok(None));
                    return;
                }
                Ok(token) => callback(Ok(Some(token))),
                Err(e) => {
                    callback(Err(e));
                    return;
                }
            }
        }
    }
}

enum Scan {
    Token(Token),
    NeedMore,
    Fail(String),
}

/// Streaming token iterator; ends after `Eof` or the first error
pub struct Tokens<R> {
    reader: Option<R>,
    buffer: String,
    pos: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
    line: usize,
    options: LexerOptions,
    previous: Option<TokenType>,
    done: bool,
}

impl<R: Read> Tokens<R> {
    /// Current line number (1-based)
    pub fn line(&self) -> usize {
        self.line
    }

    fn fill(&mut self) -> LexResult<()> {
        if self.pos > 0 {
            self.buffer.drain(..self.pos);
            self.pos = 0;
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(());
        };
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let read = loop {
            match reader.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LexError::new(format!("Read failed: {}", e), self.line)),
            }
        };
        if read == 0 {
            self.reader = None;
            if !self.pending.is_empty() {
                return Err(LexError::new("Invalid UTF-8 at end of input", self.line));
            }
            return Ok(());
        }
        self.pending.extend_from_slice(&chunk[..read]);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => return Err(LexError::new("Invalid UTF-8", self.line)),
        };
        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|_| LexError::new("Invalid UTF-8", self.line))?;
        self.buffer.push_str(text);
        self.pending.drain(..valid);
        Ok(())
    }

    fn scan(&mut self) -> Scan {
        let finished = self.reader.is_none();
        loop {
            let rest = &self.buffer[self.pos..];
            let Some(c) = rest.chars().next() else {
                return if finished {
                    Scan::Token(Token::new(TokenType::Eof, "", self.line))
                } else {
                    Scan::NeedMore
                };
            };
            match c {
                ' ' | '\t' | '\r' => self.pos += 1,
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                }
                '#' => {
                    let end = match rest.find('\n') {
                        Some(end) => end,
                        None if finished => rest.len(),
                        None => return Scan::NeedMore,
                    };
                    let text = rest[1..end].trim_end_matches('\r').to_string();
                    self.pos += end;
                    if self.options.comments {
                        return Scan::Token(Token::new(TokenType::Comment, text, self.line));
                    }
                }
                _ => break,
            }
        }

        let rest = &self.buffer[self.pos..];
        match scan::recognize(&self.options, self.previous, rest, finished) {
            Step::Token {
                kind,
                value,
                prefix,
                len,
                newlines,
            } => {
                let token = Token {
                    kind,
                    value,
                    line: self.line,
                    prefix,
                };
                self.pos += len;
                self.line += newlines;
                Scan::Token(token)
            }
            Step::NeedMore if finished => Scan::Fail(scan::unexpected(rest)),
            Step::NeedMore => Scan::NeedMore,
            Step::Fail(message) => Scan::Fail(message),
        }
    }
}

impl<R: Read> Iterator for Tokens<R> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.scan() {
                Scan::Token(token) => {
                    match token.kind {
                        TokenType::Eof => self.done = true,
                        TokenType::Comment => {}
                        kind => self.previous = Some(kind),
                    }
                    return Some(Ok(token));
                }
                Scan::NeedMore => {
                    if let Err(e) = self.fill() {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                Scan::Fail(message) => {
                    self.done = true;
                    return Some(Err(LexError::new(message, self.line)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(options: LexerOptions, input: &str) -> Vec<TokenType> {
        Lexer::new(options)
            .tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    /// Reader that hands out one byte per call
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.split_first() {
                Some((b, rest)) if !buf.is_empty() => {
                    buf[0] = *b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_simple_triple() {
        let tokens = Lexer::default()
            .tokenize("<http://ex.org/s> <http://ex.org/p> \"o\" .")
            .unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].kind, TokenType::Iri);
        assert_eq!(tokens[0].value, "http://ex.org/s");
        assert_eq!(tokens[2].kind, TokenType::Literal);
        assert_eq!(tokens[2].value, "o");
        assert_eq!(tokens[3].kind, TokenType::Dot);
        assert_eq!(tokens[4].kind, TokenType::Eof);
    }

    #[test]
    fn test_prefixed_names() {
        let tokens = Lexer::default().tokenize("ex:a :b ex: ex:c.d. rdf:type").unwrap();
        assert_eq!(tokens[0].prefix.as_deref(), Some("ex"));
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[1].prefix.as_deref(), Some(""));
        assert_eq!(tokens[1].value, "b");
        assert_eq!(tokens[2].value, "");
        assert_eq!(tokens[3].value, "c.d");
        assert_eq!(tokens[4].kind, TokenType::Dot);
        assert_eq!(tokens[5].to_string(), "rdf:type");
    }

    #[test]
    fn test_local_name_escapes() {
        let tokens = Lexer::default().tokenize("ex:a\\,b ex:%41").unwrap();
        assert_eq!(tokens[0].value, "a,b");
        assert_eq!(tokens[1].value, "%41");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds(LexerOptions::default(), "1 -2 3.5 .5 1e3 1.0E-2 4."),
            vec![
                TokenType::Integer,
                TokenType::Integer,
                TokenType::Decimal,
                TokenType::Decimal,
                TokenType::Double,
                TokenType::Double,
                TokenType::Integer,
                TokenType::Dot,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        let tokens = Lexer::default()
            .tokenize(r##""a\tbé" 'single' """long "quoted"
text""" """"4""""##)
            .unwrap();
        assert_eq!(tokens[0].value, "a\tbé");
        assert_eq!(tokens[1].value, "single");
        assert_eq!(tokens[2].value, "long \"quoted\"\ntext");
        assert_eq!(tokens[3].value, "\"4\"");
        assert_eq!(tokens[3].line, 2);
    }

    #[test]
    fn test_langcode_only_after_literal() {
        let tokens = Lexer::default().tokenize("\"chat\"@fr-BE @prefix").unwrap();
        assert_eq!(tokens[1].kind, TokenType::Langcode);
        assert_eq!(tokens[1].value, "fr-BE");
        assert_eq!(tokens[2].kind, TokenType::PrefixDirective);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds(LexerOptions::default(), "PREFIX base GRAPH a true false"),
            vec![
                TokenType::SparqlPrefix,
                TokenType::SparqlBase,
                TokenType::Graph,
                TokenType::A,
                TokenType::Boolean,
                TokenType::Boolean,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_rdf_star_tokens() {
        assert_eq!(
            kinds(LexerOptions::default(), "<< _:a <p> <o> >> {| |}"),
            vec![
                TokenType::OpenQuoted,
                TokenType::BlankNode,
                TokenType::Iri,
                TokenType::Iri,
                TokenType::CloseQuoted,
                TokenType::OpenAnnotation,
                TokenType::CloseAnnotation,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_n3_tokens() {
        let n3 = LexerOptions {
            n3: true,
            ..Default::default()
        };
        assert_eq!(
            kinds(n3, "?x => = <= ! ^ @forAll @forSome"),
            vec![
                TokenType::Variable,
                TokenType::Implies,
                TokenType::Equals,
                TokenType::InverseImplies,
                TokenType::PathForward,
                TokenType::PathBackward,
                TokenType::ForAll,
                TokenType::ForSome,
                TokenType::Eof,
            ]
        );
        let implied_by = LexerOptions {
            is_implied_by: true,
            ..n3
        };
        assert_eq!(kinds(implied_by, "<=")[0], TokenType::IsImpliedBy);
        assert!(Lexer::default().tokenize("?x").is_err());
    }

    #[test]
    fn test_comments() {
        let options = LexerOptions {
            comments: true,
            ..Default::default()
        };
        let tokens = Lexer::new(options).tokenize("# first\n<a> # second").unwrap();
        assert_eq!(tokens[0].kind, TokenType::Comment);
        assert_eq!(tokens[0].value, " first");
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].value, " second");

        assert_eq!(
            kinds(LexerOptions::default(), "# only a comment"),
            vec![TokenType::Eof]
        );
    }

    #[test]
    fn test_line_mode_rejects_turtle_syntax() {
        let options = LexerOptions {
            line_mode: true,
            ..Default::default()
        };
        let lexer = Lexer::new(options);
        assert!(lexer.tokenize("<a> <b> \"c\"@en .").is_ok());
        assert!(lexer.tokenize("<a> <b> ex:c .").is_err());
        assert!(lexer.tokenize("<a> <b> 'c' .").is_err());
        assert!(lexer.tokenize("<a> <b> [ ] .").is_err());
    }

    #[test]
    fn test_error_reports_line() {
        let err = Lexer::default().tokenize("<a> <b> <c> .\n<d> <e> \"f").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "Unterminated string on line 2.");

        let err = Lexer::default().tokenize("<a b>").unwrap_err();
        assert!(err.message.contains("Invalid IRI"));
    }

    #[test]
    fn test_chunked_input_matches_whole_input() {
        let input = "@prefix ex: <http://ex.org/> .\nex:s ex:p \"\"\"multi\nline\"\"\", 12.5e1 ; ex:q \"é\"@en .\n";
        let whole = Lexer::default().tokenize(input).unwrap();
        let trickled: Vec<Token> = Lexer::default()
            .tokens(Trickle(input.as_bytes()))
            .collect::<LexResult<_>>()
            .unwrap();
        assert_eq!(whole, trickled);
    }

    #[test]
    fn test_callback_form() {
        let mut seen = Vec::new();
        let mut ended = false;
        Lexer::default().tokenize_with("<a> <b> <c> .".as_bytes(), |item| match item {
            Ok(Some(token)) => seen.push(token.kind),
            Ok(None) => ended = true,
            Err(e) => panic!("{}", e),
        });
        assert_eq!(seen.len(), 4);
        assert!(ended);
    }
}

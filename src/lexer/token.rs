//! Lexical tokens

use std::fmt;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// `<...>`, value is the unescaped, unresolved IRI
    Iri,
    /// `prefix:local`, value is the local part, `prefix` holds the prefix
    Prefixed,
    /// `_:label`
    BlankNode,
    /// `?name` (N3)
    Variable,
    /// Quoted string, value is the unescaped lexical form
    Literal,
    /// `@en-GB` directly after a literal
    Langcode,
    /// `^^`
    Datatype,
    Integer,
    Decimal,
    Double,
    Boolean,
    Dot,
    Comma,
    Semicolon,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    /// `<<`
    OpenQuoted,
    /// `>>`
    CloseQuoted,
    /// `{|`
    OpenAnnotation,
    /// `|}`
    CloseAnnotation,
    /// `a`
    A,
    /// `=` (N3)
    Equals,
    /// `=>` (N3)
    Implies,
    /// `<=` read as `log:isImpliedBy`
    IsImpliedBy,
    /// `<=` read as a reversed `log:implies`
    InverseImplies,
    /// `!` (N3 path)
    PathForward,
    /// `^` (N3 path)
    PathBackward,
    /// `@prefix`
    PrefixDirective,
    /// `@base`
    BaseDirective,
    /// `PREFIX`
    SparqlPrefix,
    /// `BASE`
    SparqlBase,
    /// `GRAPH`
    Graph,
    /// `@forSome`
    ForSome,
    /// `@forAll`
    ForAll,
    Comment,
    Eof,
}

impl TokenType {
    /// Tokens that carry their content in `value`
    pub fn has_value(self) -> bool {
        matches!(
            self,
            TokenType::Iri
                | TokenType::Prefixed
                | TokenType::BlankNode
                | TokenType::Variable
                | TokenType::Literal
                | TokenType::Langcode
                | TokenType::Integer
                | TokenType::Decimal
                | TokenType::Double
                | TokenType::Boolean
                | TokenType::Comment
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            TokenType::Iri => "IRI",
            TokenType::Prefixed => "prefixed name",
            TokenType::BlankNode => "blank node",
            TokenType::Variable => "variable",
            TokenType::Literal => "literal",
            TokenType::Langcode => "language tag",
            TokenType::Datatype => "^^",
            TokenType::Integer | TokenType::Decimal | TokenType::Double => "number",
            TokenType::Boolean => "boolean",
            TokenType::Dot => ".",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::OpenBracket => "[",
            TokenType::CloseBracket => "]",
            TokenType::OpenParen => "(",
            TokenType::CloseParen => ")",
            TokenType::OpenBrace => "{",
            TokenType::CloseBrace => "}",
            TokenType::OpenQuoted => "<<",
            TokenType::CloseQuoted => ">>",
            TokenType::OpenAnnotation => "{|",
            TokenType::CloseAnnotation => "|}",
            TokenType::A => "a",
            TokenType::Equals => "=",
            TokenType::Implies => "=>",
            TokenType::IsImpliedBy | TokenType::InverseImplies => "<=",
            TokenType::PathForward => "!",
            TokenType::PathBackward => "^",
            TokenType::PrefixDirective => "@prefix",
            TokenType::BaseDirective => "@base",
            TokenType::SparqlPrefix => "PREFIX",
            TokenType::SparqlBase => "BASE",
            TokenType::Graph => "GRAPH",
            TokenType::ForSome => "@forSome",
            TokenType::ForAll => "@forAll",
            TokenType::Comment => "comment",
            TokenType::Eof => "end of input",
        }
    }
}

/// A token; transient, produced and consumed within one parse pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenType,
    pub value: String,
    pub line: usize,
    pub prefix: Option<String>,
}

impl Token {
    pub fn new(kind: TokenType, value: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            prefix: None,
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>, line: usize) -> Self {
        Self {
            kind: TokenType::Prefixed,
            value: local.into(),
            line,
            prefix: Some(prefix.into()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.prefix) {
            (TokenType::Prefixed, Some(prefix)) => write!(f, "{}:{}", prefix, self.value),
            (TokenType::Iri, _) => write!(f, "<{}>", self.value),
            (TokenType::Literal, _) => write!(f, "\"{}\"", self.value),
            (kind, _) if kind.has_value() => write!(f, "{}", self.value),
            (kind, _) => write!(f, "{}", kind.describe()),
        }
    }
}

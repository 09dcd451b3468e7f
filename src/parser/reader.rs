//! Recursive-descent reader over a token stream
//!
//! One `Reader` lives for exactly one parse run. It pulls tokens lazily, so
//! when the token source is a streaming lexer the reader only advances as
//! far as the input that has arrived.

use std::collections::HashMap;

use oxiri::Iri;

use super::{Format, ParseError, ParseResult, ParseSink};
use crate::lexer::{LexResult, Token, TokenType};
use crate::model::vocab::{log, owl, rdf, xsd};
use crate::model::{
    BlankNode, DataFactory, GraphName, Literal, NamedNode, Object, Predicate, Quad, Subject, Term,
    Variable,
};
use crate::namespace::Prefixes;

pub(crate) struct Reader<'s, I, S: ?Sized> {
    tokens: I,
    peeked: Option<Token>,
    line: usize,
    format: Format,
    base: Option<Iri<String>>,
    prefixes: Prefixes,
    blank_prefix: String,
    factory: DataFactory,
    graph: GraphName,
    /// Names bound by `@forAll` / `@forSome`, innermost formula last
    quantified: Vec<HashMap<String, Term>>,
    sink: &'s mut S,
    emitted: usize,
}

impl<'s, I, S> Reader<'s, I, S>
where
    I: Iterator<Item = LexResult<Token>>,
    S: ParseSink + ?Sized,
{
    pub(crate) fn new(
        tokens: I,
        format: Format,
        base: Option<Iri<String>>,
        blank_prefix: String,
        factory: DataFactory,
        sink: &'s mut S,
    ) -> Self {
        Self {
            tokens,
            peeked: None,
            line: 1,
            format,
            base,
            prefixes: Prefixes::new(),
            blank_prefix,
            factory,
            graph: GraphName::DefaultGraph,
            quantified: vec![HashMap::new()],
            sink,
            emitted: 0,
        }
    }

    /// Read the whole document; returns the number of quads emitted
    pub(crate) fn run(mut self) -> ParseResult<usize> {
        loop {
            let token = self.next_token()?;
            if token.kind == TokenType::Eof {
                return Ok(self.emitted);
            }
            if self.format.is_line_based() {
                self.line_statement(token)?;
            } else {
                self.statement(token)?;
            }
            if self.sink.is_closed() {
                tracing::debug!(emitted = self.emitted, "sink closed, parse stopped");
                return Ok(self.emitted);
            }
        }
    }

    // Token plumbing

    fn next_token(&mut self) -> ParseResult<Token> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        loop {
            match self.tokens.next() {
                Some(Ok(token)) if token.kind == TokenType::Comment => {
                    self.sink.on_comment(&token.value);
                }
                Some(Ok(token)) => {
                    self.line = token.line;
                    return Ok(token);
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(Token::new(TokenType::Eof, "", self.line)),
            }
        }
    }

    fn peek_kind(&mut self) -> ParseResult<TokenType> {
        if let Some(token) = &self.peeked {
            return Ok(token.kind);
        }
        let token = self.next_token()?;
        let kind = token.kind;
        self.peeked = Some(token);
        Ok(kind)
    }

    fn expect(&mut self, kind: TokenType) -> ParseResult<Token> {
        let token = self.next_token()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Self::unexpected(&token))
        }
    }

    fn syntax(message: impl Into<String>, line: usize) -> ParseError {
        ParseError::Syntax {
            message: message.into(),
            line,
        }
    }

    fn unexpected(token: &Token) -> ParseError {
        let message = match token.kind {
            TokenType::Eof => "Unexpected end of input".to_string(),
            _ => format!("Unexpected \"{}\"", token),
        };
        Self::syntax(message, token.line)
    }

    fn emit(&mut self, subject: Subject, predicate: Predicate, object: Object) {
        let quad = Quad::new(subject, predicate, object, self.graph.clone());
        self.emitted += 1;
        self.sink.on_quad(quad);
    }

    fn fresh_blank(&self) -> BlankNode {
        self.factory.blank_node(None)
    }

    // Statements

    fn statement(&mut self, token: Token) -> ParseResult<()> {
        let n3 = self.format.is_n3();
        match token.kind {
            TokenType::PrefixDirective => {
                self.prefix_declaration()?;
                self.expect(TokenType::Dot).map(drop)
            }
            TokenType::BaseDirective => {
                self.base_declaration()?;
                self.expect(TokenType::Dot).map(drop)
            }
            TokenType::SparqlPrefix => self.prefix_declaration(),
            TokenType::SparqlBase => self.base_declaration(),
            TokenType::ForAll | TokenType::ForSome if n3 => {
                self.quantifiers(token.kind)?;
                self.expect(TokenType::Dot).map(drop)
            }
            TokenType::Graph if self.format.supports_graphs() => {
                let label = self.next_token()?;
                let line = label.line;
                let term = self.node(label)?;
                let graph = GraphName::try_from(term)
                    .map_err(|e| Self::syntax(e.to_string(), line))?;
                self.expect(TokenType::OpenBrace)?;
                self.graph_block(graph)
            }
            TokenType::OpenBrace if self.format.supports_graphs() => {
                self.graph_block(GraphName::DefaultGraph)
            }
            _ => {
                let anonymous = token.kind == TokenType::OpenBracket;
                let line = token.line;
                let subject = self.item(token)?;
                if self.format.supports_graphs() && self.peek_kind()? == TokenType::OpenBrace {
                    self.next_token()?;
                    let graph = GraphName::try_from(subject)
                        .map_err(|e| Self::syntax(e.to_string(), line))?;
                    return self.graph_block(graph);
                }
                let subject = Self::to_subject(subject, line)?;
                self.triples(&subject, anonymous)?;
                self.expect(TokenType::Dot).map(drop)
            }
        }
    }

    /// Body of `{ ... }` after the opening brace, up to and including `}`.
    /// Serves TriG graph blocks and N3 formulas alike.
    fn graph_block(&mut self, graph: GraphName) -> ParseResult<()> {
        let outer = std::mem::replace(&mut self.graph, graph);
        let n3 = self.format.is_n3();
        // N3 directives inside a formula end with it
        let scope = n3.then(|| (self.prefixes.clone(), self.base.clone()));
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenType::CloseBrace => break,
                TokenType::Eof => return Err(Self::syntax("Unclosed graph block", token.line)),
                TokenType::PrefixDirective | TokenType::BaseDirective | TokenType::ForAll
                | TokenType::ForSome
                    if n3 =>
                {
                    self.statement(token)?;
                }
                _ => {
                    let anonymous = token.kind == TokenType::OpenBracket;
                    let line = token.line;
                    let subject = self.item(token)?;
                    let subject = Self::to_subject(subject, line)?;
                    self.triples(&subject, anonymous)?;
                    let end = self.next_token()?;
                    match end.kind {
                        TokenType::Dot => {}
                        TokenType::CloseBrace => break,
                        _ => return Err(Self::unexpected(&end)),
                    }
                }
            }
        }
        self.graph = outer;
        if let Some((prefixes, base)) = scope {
            self.prefixes = prefixes;
            self.base = base;
        }
        // TriG tolerates a stray dot after a graph block
        if !n3 && self.peek_kind()? == TokenType::Dot {
            self.next_token()?;
        }
        Ok(())
    }

    fn prefix_declaration(&mut self) -> ParseResult<()> {
        let token = self.next_token()?;
        if token.kind != TokenType::Prefixed || !token.value.is_empty() {
            return Err(Self::syntax(
                format!("Expected prefix to follow @prefix, found \"{}\"", token),
                token.line,
            ));
        }
        let prefix = token.prefix.unwrap_or_default();
        let iri_token = self.expect(TokenType::Iri)?;
        let iri = self.resolve(&iri_token)?;
        tracing::debug!(prefix = %prefix, iri = %iri.as_str(), "prefix declared");
        self.prefixes.insert(prefix.clone(), iri.as_str());
        self.sink.on_prefix(&prefix, &iri);
        Ok(())
    }

    fn base_declaration(&mut self) -> ParseResult<()> {
        let token = self.expect(TokenType::Iri)?;
        let resolved = self.resolve(&token)?;
        let base = Iri::parse(resolved.into_string())
            .map_err(|e| Self::syntax(format!("Invalid base IRI <{}>: {}", token.value, e), token.line))?;
        tracing::debug!(base = %base.as_str(), "base changed");
        self.base = Some(base);
        Ok(())
    }

    fn quantifiers(&mut self, kind: TokenType) -> ParseResult<()> {
        loop {
            let token = self.next_token()?;
            let name = match token.kind {
                TokenType::Iri => self.resolve(&token)?,
                TokenType::Prefixed => self.expand(&token)?,
                _ => return Err(Self::unexpected(&token)),
            };
            let fresh = self.fresh_blank();
            let replacement: Term = if kind == TokenType::ForAll {
                Variable::new(fresh.as_str()).into()
            } else {
                fresh.into()
            };
            if let Some(scope) = self.quantified.last_mut() {
                scope.insert(name.into_string(), replacement);
            }
            if self.peek_kind()? != TokenType::Comma {
                return Ok(());
            }
            self.next_token()?;
        }
    }

    /// Subject already read; reads the predicate-object list. Subjects written
    /// as `[ ... ]` may stand alone.
    fn triples(&mut self, subject: &Subject, anonymous: bool) -> ParseResult<()> {
        if anonymous && matches!(self.peek_kind()?, TokenType::Dot | TokenType::CloseBrace) {
            return Ok(());
        }
        self.predicate_object_list(subject)
    }

    fn predicate_object_list(&mut self, subject: &Subject) -> ParseResult<()> {
        loop {
            let token = self.next_token()?;
            let (predicate, inverse) = self.verb(token)?;
            self.object_list(subject, &predicate, inverse)?;
            if self.peek_kind()? != TokenType::Semicolon {
                return Ok(());
            }
            while self.peek_kind()? == TokenType::Semicolon {
                self.next_token()?;
            }
            if matches!(
                self.peek_kind()?,
                TokenType::Dot
                    | TokenType::CloseBracket
                    | TokenType::CloseBrace
                    | TokenType::CloseAnnotation
                    | TokenType::Eof
            ) {
                return Ok(());
            }
        }
    }

    fn object_list(
        &mut self,
        subject: &Subject,
        predicate: &Predicate,
        inverse: bool,
    ) -> ParseResult<()> {
        loop {
            let token = self.next_token()?;
            let line = token.line;
            let object = self.item(token)?;
            let object = Self::to_object(object, line)?;
            let (s, o) = if inverse {
                let swapped = Subject::try_from(Term::from(object))
                    .map_err(|e| Self::syntax(e.to_string(), line))?;
                (swapped, Object::from(subject.clone()))
            } else {
                (subject.clone(), object)
            };
            self.emit(s.clone(), predicate.clone(), o.clone());

            if self.format.supports_star() && self.peek_kind()? == TokenType::OpenAnnotation {
                self.next_token()?;
                let quoted = Subject::from(Quad::triple(s, predicate.clone(), o));
                self.predicate_object_list(&quoted)?;
                self.expect(TokenType::CloseAnnotation)?;
            }

            if self.peek_kind()? != TokenType::Comma {
                return Ok(());
            }
            self.next_token()?;
        }
    }

    fn verb(&mut self, token: Token) -> ParseResult<(Predicate, bool)> {
        let n3 = self.format.is_n3();
        let predicate: Predicate = match token.kind {
            TokenType::A => NamedNode::new(rdf::TYPE).into(),
            TokenType::Iri | TokenType::Prefixed | TokenType::Variable => {
                let line = token.line;
                let term = self.node(token)?;
                Predicate::try_from(term).map_err(|e| Self::syntax(e.to_string(), line))?
            }
            TokenType::Equals if n3 => NamedNode::new(owl::SAME_AS).into(),
            TokenType::Implies if n3 => NamedNode::new(log::IMPLIES).into(),
            TokenType::IsImpliedBy if n3 => NamedNode::new(log::IS_IMPLIED_BY).into(),
            TokenType::InverseImplies if n3 => {
                return Ok((NamedNode::new(log::IMPLIES).into(), true));
            }
            _ => return Err(Self::unexpected(&token)),
        };
        Ok((predicate, false))
    }

    // Terms

    /// A node followed by any N3 path steps
    fn item(&mut self, token: Token) -> ParseResult<Term> {
        let term = self.node(token)?;
        self.path(term)
    }

    fn node(&mut self, token: Token) -> ParseResult<Term> {
        let n3 = self.format.is_n3();
        let term = match token.kind {
            TokenType::Iri => {
                let iri = self.resolve(&token)?;
                self.quantified_or(iri)
            }
            TokenType::Prefixed => {
                let iri = self.expand(&token)?;
                self.quantified_or(iri)
            }
            TokenType::BlankNode => {
                BlankNode::new(format!("{}{}", self.blank_prefix, token.value)).into()
            }
            TokenType::Literal => self.literal(token.value)?.into(),
            TokenType::Integer => Literal::new_typed_literal(token.value, NamedNode::new(xsd::INTEGER)).into(),
            TokenType::Decimal => Literal::new_typed_literal(token.value, NamedNode::new(xsd::DECIMAL)).into(),
            TokenType::Double => Literal::new_typed_literal(token.value, NamedNode::new(xsd::DOUBLE)).into(),
            TokenType::Boolean => Literal::new_typed_literal(token.value, NamedNode::new(xsd::BOOLEAN)).into(),
            TokenType::OpenBracket => self.blank_property_list()?.into(),
            TokenType::OpenParen => self.collection()?,
            TokenType::OpenQuoted if self.format.supports_star() => self.quoted_triple()?.into(),
            TokenType::OpenBrace if n3 => {
                let formula = self.fresh_blank();
                self.quantified.push(HashMap::new());
                let result = self.graph_block(GraphName::BlankNode(formula.clone()));
                self.quantified.pop();
                result?;
                formula.into()
            }
            TokenType::Variable if n3 => Variable::new(token.value).into(),
            _ => return Err(Self::unexpected(&token)),
        };
        Ok(term)
    }

    fn quantified_or(&self, iri: NamedNode) -> Term {
        self.quantified
            .iter()
            .rev()
            .find_map(|scope| scope.get(iri.as_str()).cloned())
            .unwrap_or_else(|| iri.into())
    }

    fn path(&mut self, mut term: Term) -> ParseResult<Term> {
        if !self.format.is_n3() {
            return Ok(term);
        }
        loop {
            let forward = match self.peek_kind()? {
                TokenType::PathForward => true,
                TokenType::PathBackward => false,
                _ => return Ok(term),
            };
            self.next_token()?;
            let token = self.next_token()?;
            let line = token.line;
            let step = self.node(token)?;
            let predicate =
                Predicate::try_from(step).map_err(|e| Self::syntax(e.to_string(), line))?;
            let node = self.fresh_blank();
            if forward {
                let subject = Self::to_subject(term, line)?;
                self.emit(subject, predicate, node.clone().into());
            } else {
                let object = Self::to_object(term, line)?;
                self.emit(node.clone().into(), predicate, object);
            }
            term = node.into();
        }
    }

    fn literal(&mut self, value: String) -> ParseResult<Literal> {
        match self.peek_kind()? {
            TokenType::Langcode => {
                let tag = self.next_token()?;
                Ok(Literal::new_language_tagged_literal(value, tag.value))
            }
            TokenType::Datatype => {
                self.next_token()?;
                let token = self.next_token()?;
                let datatype = match token.kind {
                    TokenType::Iri => self.resolve(&token)?,
                    TokenType::Prefixed => self.expand(&token)?,
                    _ => return Err(Self::unexpected(&token)),
                };
                Ok(Literal::new_typed_literal(value, datatype))
            }
            _ => Ok(Literal::new_simple_literal(value)),
        }
    }

    fn blank_property_list(&mut self) -> ParseResult<BlankNode> {
        let node = self.fresh_blank();
        if self.peek_kind()? == TokenType::CloseBracket {
            self.next_token()?;
            return Ok(node);
        }
        self.predicate_object_list(&Subject::BlankNode(node.clone()))?;
        self.expect(TokenType::CloseBracket)?;
        Ok(node)
    }

    /// `( ... )` after the opening parenthesis; returns the head cell or
    /// `rdf:nil`
    fn collection(&mut self) -> ParseResult<Term> {
        let mut items = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.kind == TokenType::CloseParen {
                break;
            }
            let line = token.line;
            let item = self.item(token)?;
            items.push(Self::to_object(item, line)?);
        }
        if items.is_empty() {
            return Ok(NamedNode::new(rdf::NIL).into());
        }
        let cells: Vec<BlankNode> = items.iter().map(|_| self.fresh_blank()).collect();
        let first = NamedNode::new(rdf::FIRST);
        let rest = NamedNode::new(rdf::REST);
        for (i, item) in items.into_iter().enumerate() {
            let cell = Subject::BlankNode(cells[i].clone());
            self.emit(cell.clone(), first.clone().into(), item);
            let next: Object = match cells.get(i + 1) {
                Some(next) => next.clone().into(),
                None => NamedNode::new(rdf::NIL).into(),
            };
            self.emit(cell, rest.clone().into(), next);
        }
        Ok(cells[0].clone().into())
    }

    /// `<< s p o >>` after the opening `<<`
    fn quoted_triple(&mut self) -> ParseResult<Quad> {
        let token = self.next_token()?;
        let line = token.line;
        let subject = self.quoted_component(token)?;
        let subject = Self::to_subject(subject, line)?;
        let token = self.next_token()?;
        let (predicate, inverse) = self.verb(token)?;
        if inverse {
            return Err(Self::syntax("Unexpected \"<=\" in quoted triple", line));
        }
        let token = self.next_token()?;
        let line = token.line;
        let object = self.quoted_component(token)?;
        let object = Self::to_object(object, line)?;
        self.expect(TokenType::CloseQuoted)?;
        Ok(Quad::triple(subject, predicate, object))
    }

    fn quoted_component(&mut self, token: Token) -> ParseResult<Term> {
        match token.kind {
            TokenType::OpenBracket => {
                self.expect(TokenType::CloseBracket)?;
                Ok(self.fresh_blank().into())
            }
            TokenType::OpenParen | TokenType::OpenBrace => Err(Self::unexpected(&token)),
            _ => self.node(token),
        }
    }

    fn resolve(&self, token: &Token) -> ParseResult<NamedNode> {
        match &self.base {
            Some(base) if !self.format.is_line_based() => base
                .resolve(&token.value)
                .map(|iri| NamedNode::new(iri.into_inner()))
                .map_err(|e| Self::syntax(format!("Invalid IRI <{}>: {}", token.value, e), token.line)),
            _ => Ok(NamedNode::new(token.value.clone())),
        }
    }

    fn expand(&self, token: &Token) -> ParseResult<NamedNode> {
        let prefix = token.prefix.as_deref().unwrap_or_default();
        match self.prefixes.get(prefix) {
            Some(base) => Ok(NamedNode::new(format!("{}{}", base, token.value))),
            None => Err(Self::syntax(format!("Undefined prefix \"{}:\"", prefix), token.line)),
        }
    }

    fn to_subject(term: Term, line: usize) -> ParseResult<Subject> {
        Subject::try_from(term).map_err(|e| Self::syntax(e.to_string(), line))
    }

    fn to_object(term: Term, line: usize) -> ParseResult<Object> {
        Object::try_from(term).map_err(|e| Self::syntax(e.to_string(), line))
    }

    // N-Triples / N-Quads

    fn line_statement(&mut self, token: Token) -> ParseResult<()> {
        let line = token.line;
        let subject = self.line_term(token)?;
        let subject = Self::to_subject(subject, line)?;
        let predicate = self.expect(TokenType::Iri)?;
        let predicate = NamedNode::new(predicate.value);
        let token = self.next_token()?;
        let line = token.line;
        let object = self.line_term(token)?;
        let object = Self::to_object(object, line)?;

        let mut end = self.next_token()?;
        let graph = match end.kind {
            TokenType::Iri | TokenType::BlankNode if self.format.supports_graphs() => {
                let graph = match end.kind {
                    TokenType::Iri => GraphName::NamedNode(NamedNode::new(end.value.clone())),
                    _ => GraphName::BlankNode(BlankNode::new(format!(
                        "{}{}",
                        self.blank_prefix, end.value
                    ))),
                };
                end = self.next_token()?;
                graph
            }
            _ => GraphName::DefaultGraph,
        };
        if end.kind != TokenType::Dot {
            return Err(Self::unexpected(&end));
        }
        let outer = std::mem::replace(&mut self.graph, graph);
        self.emit(subject, predicate.into(), object);
        self.graph = outer;
        Ok(())
    }

    fn line_term(&mut self, token: Token) -> ParseResult<Term> {
        match token.kind {
            TokenType::Iri | TokenType::BlankNode | TokenType::Literal | TokenType::OpenQuoted => {
                self.node(token)
            }
            _ => Err(Self::unexpected(&token)),
        }
    }
}

//! Textual term identifiers
//!
//! One string encodes both the kind and the value of a term:
//!
//! | term          | id                                  |
//! |---------------|-------------------------------------|
//! | named node    | `http://example.org/a`              |
//! | other IRIs    | `<?not-a-variable>`                 |
//! | blank node    | `_:b0`                              |
//! | literal       | `"v"`, `"v"@en`, `"v"^^http://...`  |
//! | variable      | `?x`                                |
//! | default graph | empty string                        |
//! | quoted triple | `<<s p o>>` or `<<s p o g>>`        |
//!
//! An IRI that is empty or starts like another kind of id (`_:`, `?`, `"`
//! or `<`) is wrapped in `<...>` with `<`, `>` and `\` backslash-escaped.
//! Named nodes inside quoted triples are always wrapped.
//!
//! The store indexes on these ids and they round-trip through
//! [`term_from_id`].

use super::quad::Quad;
use super::term::{BlankNode, Literal, ModelError, ModelResult, NamedNode, Term, Variable};
use super::vocab::xsd;

/// Encode a term as its identifier
pub fn term_to_id(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => n.id(),
        Term::BlankNode(b) => b.id(),
        Term::Literal(l) => l.id(),
        Term::Variable(v) => v.id(),
        Term::DefaultGraph => String::new(),
        Term::Triple(q) => quad_to_id(q),
    }
}

pub(crate) fn quad_to_id(quad: &Quad) -> String {
    let mut id = String::from("<<");
    push_nested(&mut id, &quad.subject().clone().into());
    id.push(' ');
    push_nested(&mut id, &quad.predicate().clone().into());
    id.push(' ');
    push_nested(&mut id, &quad.object().clone().into());
    if !quad.in_default_graph() {
        id.push(' ');
        push_nested(&mut id, &quad.graph().clone().into());
    }
    id.push_str(">>");
    id
}

/// Identifier of a named node
pub(crate) fn named_node_id(iri: &str) -> String {
    let ambiguous = iri.is_empty() || iri.starts_with("_:") || iri.starts_with(['?', '"', '<']);
    if ambiguous {
        wrap_iri(iri)
    } else {
        iri.to_string()
    }
}

fn wrap_iri(iri: &str) -> String {
    let mut id = String::with_capacity(iri.len() + 2);
    id.push('<');
    for c in iri.chars() {
        if matches!(c, '<' | '>' | '\\') {
            id.push('\\');
        }
        id.push(c);
    }
    id.push('>');
    id
}

fn push_nested(id: &mut String, term: &Term) {
    match term {
        Term::NamedNode(n) => id.push_str(&wrap_iri(n.as_str())),
        Term::Literal(l) => id.push_str(&l.encode_id(true)),
        other => id.push_str(&term_to_id(other)),
    }
}

/// Decode an identifier produced by [`term_to_id`]
pub fn term_from_id(id: &str) -> ModelResult<Term> {
    let first = match id.chars().next() {
        None => return Ok(Term::DefaultGraph),
        Some(c) => c,
    };
    match first {
        '_' if id.starts_with("_:") => Ok(Term::BlankNode(BlankNode::new(&id[2..]))),
        '?' => Ok(Term::Variable(Variable::new(&id[1..]))),
        '"' => {
            let end = id.rfind('"').filter(|&end| end > 0).ok_or_else(|| invalid(id))?;
            literal_with_suffix(id[1..end].to_string(), &id[end + 1..], id)
        }
        '<' => {
            let mut reader = IdReader { id, pos: 0 };
            let term = reader.read_term()?;
            if reader.pos != id.len() {
                return Err(invalid(id));
            }
            Ok(term)
        }
        _ => Ok(Term::NamedNode(NamedNode::new(id))),
    }
}

fn literal_with_suffix(value: String, suffix: &str, id: &str) -> ModelResult<Term> {
    if suffix.is_empty() {
        Ok(Term::Literal(Literal::new_simple_literal(value)))
    } else if let Some(language) = suffix.strip_prefix('@') {
        Ok(Term::Literal(Literal::new_language_tagged_literal(value, language)))
    } else if let Some(datatype) = suffix.strip_prefix("^^") {
        if datatype == xsd::STRING {
            Ok(Term::Literal(Literal::new_simple_literal(value)))
        } else {
            Ok(Term::Literal(Literal::new_typed_literal(value, NamedNode::new(datatype))))
        }
    } else {
        Err(invalid(id))
    }
}

fn invalid(id: &str) -> ModelError {
    ModelError::InvalidId(id.to_string())
}

/// Cursor over a quoted-triple identifier
struct IdReader<'a> {
    id: &'a str,
    pos: usize,
}

impl IdReader<'_> {
    fn rest(&self) -> &str {
        &self.id[self.pos..]
    }

    fn expect(&mut self, token: &str) -> ModelResult<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(invalid(self.id))
        }
    }

    fn read_term(&mut self) -> ModelResult<Term> {
        if self.rest().starts_with("<<") {
            self.pos += 2;
            let subject = self.read_term()?;
            self.expect(" ")?;
            let predicate = self.read_term()?;
            self.expect(" ")?;
            let object = self.read_term()?;
            let graph = if self.rest().starts_with(' ') {
                self.pos += 1;
                self.read_term()?
            } else {
                Term::DefaultGraph
            };
            self.expect(">>")?;
            let quad = Quad::from_terms(subject, predicate, object, graph)?;
            return Ok(Term::Triple(Box::new(quad)));
        }
        if self.rest().starts_with('<') {
            return self.read_iri();
        }
        if self.rest().starts_with('"') {
            return self.read_literal();
        }
        let token = self.read_plain();
        if token.is_empty() {
            return Err(invalid(self.id));
        }
        term_from_id(token)
    }

    /// Reads up to the next space or `>`
    fn read_plain(&mut self) -> &str {
        let rest = &self.id[self.pos..];
        let len = rest.find([' ', '>']).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Reads a `<...>` IRI up to its unescaped closing `>`
    fn read_iri(&mut self) -> ModelResult<Term> {
        self.pos += 1;
        let mut iri = String::new();
        let mut chars = self.id[self.pos..].char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => iri.push(escaped),
                    None => break,
                },
                '>' => {
                    self.pos += offset + 1;
                    return Ok(Term::NamedNode(NamedNode::new(iri)));
                }
                c => iri.push(c),
            }
        }
        Err(invalid(self.id))
    }

    fn read_literal(&mut self) -> ModelResult<Term> {
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.id[self.pos..].char_indices();
        let mut closed = None;
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                '"' => {
                    closed = Some(offset);
                    break;
                }
                c => value.push(c),
            }
        }
        let offset = closed.ok_or_else(|| invalid(self.id))?;
        self.pos += offset + 1;
        let suffix = self.read_plain().to_string();
        literal_with_suffix(value, &suffix, self.id)
    }
}

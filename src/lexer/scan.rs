//! Single-token recognition over a text buffer
//!
//! `recognize` looks at the start of the unread input and either produces a
//! token, reports that the buffer ends before the token can be decided, or
//! fails. When `finished` is set the input will not grow and the recognizer
//! never asks for more.

use super::token::TokenType;
use super::LexerOptions;

pub(crate) enum Step {
    Token {
        kind: TokenType,
        value: String,
        prefix: Option<String>,
        len: usize,
        newlines: usize,
    },
    NeedMore,
    Fail(String),
}

impl Step {
    fn token(kind: TokenType, value: impl Into<String>, len: usize) -> Self {
        Step::Token {
            kind,
            value: value.into(),
            prefix: None,
            len,
            newlines: 0,
        }
    }

    fn more_or_fail(finished: bool, message: &str) -> Self {
        if finished {
            Step::Fail(message.to_string())
        } else {
            Step::NeedMore
        }
    }
}

enum Escape {
    Char(char, usize),
    NeedMore,
}

pub(crate) fn unexpected(input: &str) -> String {
    let snippet: String = input
        .chars()
        .take_while(|c| !c.is_whitespace())
        .take(10)
        .collect();
    format!("Unexpected \"{}\"", snippet)
}

fn is_pn_chars_base(c: char) -> bool {
    c.is_ascii_alphabetic() || (c as u32 >= 0xC0 && c != '\u{D7}' && c != '\u{F7}' && !c.is_whitespace())
}

fn is_pn_chars_u(c: char) -> bool {
    is_pn_chars_base(c) || c == '_'
}

fn is_pn_chars(c: char) -> bool {
    is_pn_chars_u(c)
        || c == '-'
        || c.is_ascii_digit()
        || c == '\u{B7}'
        || ('\u{300}'..='\u{36F}').contains(&c)
        || ('\u{203F}'..='\u{2040}').contains(&c)
}

/// Local names that read back as a prefixed name without escapes
pub(crate) fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        None => true,
        Some(c) if is_pn_chars_u(c) || c.is_ascii_digit() => {
            chars.all(|c| is_pn_chars(c) || c == '.') && !local.ends_with('.')
        }
        Some(_) => false,
    }
}

fn is_local_escape(c: char) -> bool {
    "_~.-!$&'()*+,;=/?#@%".contains(c)
}

/// Recognize the token at the start of `input`
pub(crate) fn recognize(
    options: &LexerOptions,
    previous: Option<TokenType>,
    input: &str,
    finished: bool,
) -> Step {
    let mut chars = input.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Step::more_or_fail(finished, "Unexpected end of input"),
    };
    let second = chars.next();
    if second.is_none() && !finished && needs_lookahead(first) {
        return Step::NeedMore;
    }
    let line_mode = options.line_mode;
    let n3 = options.n3 && !line_mode;

    match (first, second) {
        ('<', Some('<')) => Step::token(TokenType::OpenQuoted, "", 2),
        ('<', Some('=')) if n3 => {
            if options.is_implied_by {
                Step::token(TokenType::IsImpliedBy, "", 2)
            } else {
                Step::token(TokenType::InverseImplies, "", 2)
            }
        }
        ('<', _) => read_iri(input, finished),
        ('>', Some('>')) => Step::token(TokenType::CloseQuoted, "", 2),
        ('_', Some(':')) => read_blank_node(input, finished),
        ('"', _) => read_string(input, '"', finished),
        ('\'', _) if !line_mode => read_string(input, '\'', finished),
        ('@', _) => read_at_keyword(options, previous, input, finished),
        ('^', Some('^')) => Step::token(TokenType::Datatype, "", 2),
        ('^', _) if n3 => Step::token(TokenType::PathBackward, "", 1),
        ('.', Some(c)) if c.is_ascii_digit() && !line_mode => read_number(input, finished),
        ('.', _) => Step::token(TokenType::Dot, "", 1),
        _ if line_mode => Step::Fail(unexpected(input)),
        ('?', _) if n3 => read_variable(input, finished),
        ('!', _) if n3 => Step::token(TokenType::PathForward, "", 1),
        ('=', Some('>')) if n3 => Step::token(TokenType::Implies, "", 2),
        ('=', _) if n3 => Step::token(TokenType::Equals, "", 1),
        (',', _) => Step::token(TokenType::Comma, "", 1),
        (';', _) => Step::token(TokenType::Semicolon, "", 1),
        ('[', _) => Step::token(TokenType::OpenBracket, "", 1),
        (']', _) => Step::token(TokenType::CloseBracket, "", 1),
        ('(', _) => Step::token(TokenType::OpenParen, "", 1),
        (')', _) => Step::token(TokenType::CloseParen, "", 1),
        ('{', Some('|')) => Step::token(TokenType::OpenAnnotation, "", 2),
        ('{', _) => Step::token(TokenType::OpenBrace, "", 1),
        ('|', Some('}')) => Step::token(TokenType::CloseAnnotation, "", 2),
        ('}', _) => Step::token(TokenType::CloseBrace, "", 1),
        (c, _) if c.is_ascii_digit() || c == '+' || c == '-' => read_number(input, finished),
        (c, _) if is_pn_chars_base(c) || c == ':' => read_name(input, finished),
        _ => Step::Fail(unexpected(input)),
    }
}

/// Characters whose meaning depends on the character after them
fn needs_lookahead(c: char) -> bool {
    matches!(c, '<' | '>' | '_' | '^' | '.' | '=' | '{' | '|')
}

fn read_escape(input: &str, string_escapes: bool, finished: bool) -> Result<Escape, String> {
    let c = match input.chars().nth(1) {
        Some(c) => c,
        None if finished => return Err("Unterminated escape sequence".to_string()),
        None => return Ok(Escape::NeedMore),
    };
    if string_escapes {
        let simple = match c {
            't' => Some('\t'),
            'b' => Some('\u{08}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            'f' => Some('\u{0C}'),
            '"' => Some('"'),
            '\'' => Some('\''),
            '\\' => Some('\\'),
            _ => None,
        };
        if let Some(escaped) = simple {
            return Ok(Escape::Char(escaped, 2));
        }
    }
    let digits = match c {
        'u' => 4,
        'U' => 8,
        other => return Err(format!("Invalid escape sequence \\{}", other)),
    };
    let hex = match input.get(2..2 + digits) {
        Some(hex) => hex,
        None if input.len() < 2 + digits && !finished => return Ok(Escape::NeedMore),
        None => return Err("Invalid unicode escape sequence".to_string()),
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Invalid unicode escape sequence \\{}{}", c, hex));
    }
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map(|decoded| Escape::Char(decoded, 2 + digits))
        .ok_or_else(|| format!("Invalid unicode code point \\{}{}", c, hex))
}

fn read_iri(input: &str, finished: bool) -> Step {
    let mut iri = String::new();
    let mut i = 1;
    while let Some(c) = input[i..].chars().next() {
        match c {
            '>' => return Step::token(TokenType::Iri, iri, i + 1),
            '\\' => match read_escape(&input[i..], false, finished) {
                Ok(Escape::Char(decoded, len)) => {
                    iri.push(decoded);
                    i += len;
                }
                Ok(Escape::NeedMore) => return Step::NeedMore,
                Err(message) => return Step::Fail(message),
            },
            c if c <= ' ' || matches!(c, '<' | '"' | '{' | '}' | '|' | '^' | '`') => {
                return Step::Fail(format!("Invalid IRI <{}", iri));
            }
            c => {
                iri.push(c);
                i += c.len_utf8();
            }
        }
    }
    Step::more_or_fail(finished, "Unterminated IRI")
}

fn read_blank_node(input: &str, finished: bool) -> Step {
    let mut end = 2;
    let mut label_end = 2;
    for c in input[2..].chars() {
        let allowed = if end == 2 {
            is_pn_chars_u(c) || c.is_ascii_digit()
        } else {
            is_pn_chars(c) || c == '.'
        };
        if !allowed {
            break;
        }
        end += c.len_utf8();
        if c != '.' {
            label_end = end;
        }
    }
    if end == input.len() && !finished {
        return Step::NeedMore;
    }
    if label_end == 2 {
        return Step::Fail(unexpected(input));
    }
    Step::token(TokenType::BlankNode, &input[2..label_end], label_end)
}

fn read_variable(input: &str, finished: bool) -> Step {
    let len = input[1..]
        .find(|c: char| !is_pn_chars(c))
        .map(|n| n + 1)
        .unwrap_or(input.len());
    if len == input.len() && !finished {
        return Step::NeedMore;
    }
    if len == 1 {
        return Step::Fail(unexpected(input));
    }
    Step::token(TokenType::Variable, &input[1..len], len)
}

fn read_string(input: &str, quote: char, finished: bool) -> Step {
    let triple: String = std::iter::repeat(quote).take(3).collect();
    let long = input.starts_with(&triple);
    if !long && !finished && input.len() < 3 && input.chars().all(|c| c == quote) {
        return Step::NeedMore;
    }
    let mut value = String::new();
    let mut newlines = 0;
    let mut i = if long { 3 } else { 1 };
    loop {
        let c = match input[i..].chars().next() {
            Some(c) => c,
            None => return Step::more_or_fail(finished, "Unterminated string"),
        };
        match c {
            '\\' => match read_escape(&input[i..], true, finished) {
                Ok(Escape::Char(decoded, len)) => {
                    value.push(decoded);
                    i += len;
                    continue;
                }
                Ok(Escape::NeedMore) => return Step::NeedMore,
                Err(message) => return Step::Fail(message),
            },
            c if c == quote && !long => {
                return Step::Token {
                    kind: TokenType::Literal,
                    value,
                    prefix: None,
                    len: i + 1,
                    newlines,
                };
            }
            '\n' | '\r' if !long => return Step::Fail("Unterminated string".to_string()),
            c if c == quote && input[i..].starts_with(&triple) => {
                match input[i + 3..].chars().next() {
                    // A fourth quote belongs to the content
                    Some(next) if next == quote => {}
                    None if !finished => return Step::NeedMore,
                    _ => {
                        return Step::Token {
                            kind: TokenType::Literal,
                            value,
                            prefix: None,
                            len: i + 3,
                            newlines,
                        };
                    }
                }
            }
            '\n' => newlines += 1,
            _ => {}
        }
        value.push(c);
        i += c.len_utf8();
    }
}

fn read_at_keyword(
    options: &LexerOptions,
    previous: Option<TokenType>,
    input: &str,
    finished: bool,
) -> Step {
    let len = input[1..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .map(|n| n + 1)
        .unwrap_or(input.len());
    if len == input.len() && !finished {
        return Step::NeedMore;
    }
    let word = &input[1..len];
    if previous == Some(TokenType::Literal) {
        if !word.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Step::Fail(unexpected(input));
        }
        return Step::token(TokenType::Langcode, word, len);
    }
    if options.line_mode {
        return Step::Fail(unexpected(input));
    }
    let kind = match word {
        "prefix" => TokenType::PrefixDirective,
        "base" => TokenType::BaseDirective,
        "forSome" if options.n3 => TokenType::ForSome,
        "forAll" if options.n3 => TokenType::ForAll,
        _ => return Step::Fail(unexpected(input)),
    };
    Step::token(kind, "", len)
}

fn read_number(input: &str, finished: bool) -> Step {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    if matches!(bytes[0], b'+' | b'-') {
        i = 1;
    }
    let int_start = i;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut kind = TokenType::Integer;
    if i < len && bytes[i] == b'.' {
        if i + 1 >= len {
            if !finished {
                return Step::NeedMore;
            }
        } else if bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < len && bytes[i].is_ascii_digit() {
                i += 1;
            }
            kind = TokenType::Decimal;
        }
    }
    if i < len && matches!(bytes[i], b'e' | b'E') && (int_digits > 0 || kind == TokenType::Decimal) {
        let mut j = i + 1;
        if j < len && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
            kind = TokenType::Double;
        } else if j >= len && !finished {
            return Step::NeedMore;
        }
    }
    if i >= len && !finished {
        return Step::NeedMore;
    }
    if kind == TokenType::Integer && int_digits == 0 {
        return Step::Fail(unexpected(input));
    }
    Step::token(kind, &input[..i], i)
}

fn read_name(input: &str, finished: bool) -> Step {
    let prefix_len = input
        .find(|c: char| !(is_pn_chars(c) || c == '.'))
        .unwrap_or(input.len());
    if prefix_len == input.len() && !finished {
        return Step::NeedMore;
    }
    if !input[prefix_len..].starts_with(':') {
        return read_bare_word(input, prefix_len);
    }
    let prefix = &input[..prefix_len];
    if prefix.ends_with('.') || prefix.starts_with(|c: char| !is_pn_chars_base(c)) {
        return Step::Fail(unexpected(input));
    }

    let mut local = String::new();
    let mut i = prefix_len + 1;
    // End of the local name excluding trailing dots
    let mut end = (i, 0);
    loop {
        let c = match input[i..].chars().next() {
            Some(c) => c,
            None if finished => break,
            None => return Step::NeedMore,
        };
        match c {
            '\\' => match input[i + 1..].chars().next() {
                Some(escaped) if is_local_escape(escaped) => {
                    local.push(escaped);
                    i += 1 + escaped.len_utf8();
                }
                Some(escaped) => return Step::Fail(format!("Invalid escape sequence \\{}", escaped)),
                None if finished => return Step::Fail("Unterminated escape sequence".to_string()),
                None => return Step::NeedMore,
            },
            '%' => match input.get(i + 1..i + 3) {
                Some(hex) if hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                    local.push('%');
                    local.push_str(hex);
                    i += 3;
                }
                None if input.len() < i + 3 && !finished => return Step::NeedMore,
                _ => return Step::Fail(format!("Invalid percent escape in {}", unexpected(input))),
            },
            c if is_pn_chars(c) || c == ':' || c == '.' => {
                local.push(c);
                i += c.len_utf8();
                if c == '.' {
                    continue;
                }
            }
            _ => break,
        }
        end = (i, local.len());
    }
    let (len, local_len) = end;
    local.truncate(local_len);
    Step::Token {
        kind: TokenType::Prefixed,
        value: local,
        prefix: Some(prefix.to_string()),
        len,
        newlines: 0,
    }
}

fn read_bare_word(input: &str, len: usize) -> Step {
    let word = input[..len].trim_end_matches('.');
    let kind = match word {
        "a" => TokenType::A,
        "true" | "false" => return Step::token(TokenType::Boolean, word, word.len()),
        w if w.eq_ignore_ascii_case("PREFIX") => TokenType::SparqlPrefix,
        w if w.eq_ignore_ascii_case("BASE") => TokenType::SparqlBase,
        w if w.eq_ignore_ascii_case("GRAPH") => TokenType::Graph,
        _ => return Step::Fail(unexpected(input)),
    };
    Step::token(kind, "", word.len())
}

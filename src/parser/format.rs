//! Concrete syntax selection from MIME-like names

use std::fmt;
use std::str::FromStr;

use super::ParseError;

/// Grammar family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Syntax {
    /// Permissive superset of Turtle and TriG
    #[default]
    Any,
    Turtle,
    TriG,
    NTriples,
    NQuads,
    N3,
}

/// A grammar family plus the RDF-star toggle
///
/// Names are matched case-insensitively by substring: `turtle`, `trig`,
/// `triple`, `quad` and `n3`. A name containing `star` or ending in `*`
/// enables quoted triples. The empty name selects the permissive superset,
/// which always accepts quoted triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Format {
    pub syntax: Syntax,
    pub star: bool,
}

impl Format {
    pub const TURTLE: Format = Format::new(Syntax::Turtle);
    pub const TRIG: Format = Format::new(Syntax::TriG);
    pub const N_TRIPLES: Format = Format::new(Syntax::NTriples);
    pub const N_QUADS: Format = Format::new(Syntax::NQuads);
    pub const N3: Format = Format::new(Syntax::N3);

    pub const fn new(syntax: Syntax) -> Self {
        Self {
            syntax,
            star: false,
        }
    }

    pub const fn with_star(mut self) -> Self {
        self.star = true;
        self
    }

    /// N-Triples and N-Quads: one statement per line, no abbreviations
    pub fn is_line_based(&self) -> bool {
        matches!(self.syntax, Syntax::NTriples | Syntax::NQuads)
    }

    pub fn is_n3(&self) -> bool {
        self.syntax == Syntax::N3
    }

    /// Whether named graphs can be expressed
    pub fn supports_graphs(&self) -> bool {
        matches!(self.syntax, Syntax::Any | Syntax::TriG | Syntax::NQuads)
    }

    pub fn supports_star(&self) -> bool {
        self.star || self.syntax == Syntax::Any
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lower = name.trim().to_ascii_lowercase();
        let syntax = if lower.is_empty() {
            Syntax::Any
        } else if lower.contains("turtle") {
            Syntax::Turtle
        } else if lower.contains("trig") {
            Syntax::TriG
        } else if lower.contains("triple") {
            Syntax::NTriples
        } else if lower.contains("quad") {
            Syntax::NQuads
        } else if lower.contains("n3") || lower.contains("notation3") {
            Syntax::N3
        } else {
            return Err(ParseError::UnsupportedFormat(name.to_string()));
        };
        Ok(Format {
            syntax,
            star: lower.contains("star") || lower.ends_with('*'),
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.syntax {
            Syntax::Any => "",
            Syntax::Turtle => "Turtle",
            Syntax::TriG => "TriG",
            Syntax::NTriples => "N-Triples",
            Syntax::NQuads => "N-Quads",
            Syntax::N3 => "N3",
        };
        write!(f, "{}{}", name, if self.star { "*" } else { "" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_names() {
        let cases = [
            ("text/turtle", Syntax::Turtle, false),
            ("application/trig", Syntax::TriG, false),
            ("application/n-triples", Syntax::NTriples, false),
            ("application/n-quads", Syntax::NQuads, false),
            ("text/n3", Syntax::N3, false),
            ("TriGStar", Syntax::TriG, true),
            ("turtle*", Syntax::Turtle, true),
            ("N-Quads*", Syntax::NQuads, true),
            ("", Syntax::Any, false),
        ];
        for (name, syntax, star) in cases {
            let format: Format = name.parse().unwrap();
            assert_eq!(format.syntax, syntax, "{}", name);
            assert_eq!(format.star, star, "{}", name);
        }
    }

    #[test]
    fn test_capabilities() {
        assert!(Format::N_QUADS.is_line_based());
        assert!(Format::N_QUADS.supports_graphs());
        assert!(!Format::TURTLE.supports_graphs());
        assert!(!Format::N3.supports_graphs());
        assert!(Format::default().supports_star());
        assert!(!Format::TURTLE.supports_star());
        assert!(Format::TURTLE.with_star().supports_star());
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            "application/rdf+xml".parse::<Format>(),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }
}

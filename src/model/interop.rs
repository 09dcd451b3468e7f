//! Conversions to and from `oxrdf` terms
//!
//! `oxrdf` validates IRIs, blank-node ids and language tags, and has no
//! variables, so conversions towards it are fallible.

use super::quad::Quad;
use super::term::{
    BlankNode, GraphName, Literal, ModelError, ModelResult, NamedNode, Object, Predicate, Subject,
};
use oxrdf::{
    BlankNode as OxBlankNode, GraphName as OxGraphName, Literal as OxLiteral,
    NamedNode as OxNamedNode, Quad as OxQuad, Subject as OxSubject, Term as OxTerm,
};

fn unsupported(what: impl std::fmt::Display) -> ModelError {
    ModelError::Unsupported(what.to_string())
}

impl From<OxNamedNode> for NamedNode {
    fn from(node: OxNamedNode) -> Self {
        NamedNode::new(node.into_string())
    }
}

impl TryFrom<&NamedNode> for OxNamedNode {
    type Error = ModelError;

    fn try_from(node: &NamedNode) -> ModelResult<Self> {
        OxNamedNode::new(node.as_str()).map_err(|e| unsupported(format!("{}: {}", node, e)))
    }
}

impl From<OxBlankNode> for BlankNode {
    fn from(node: OxBlankNode) -> Self {
        BlankNode::new(node.into_string())
    }
}

impl TryFrom<&BlankNode> for OxBlankNode {
    type Error = ModelError;

    fn try_from(node: &BlankNode) -> ModelResult<Self> {
        OxBlankNode::new(node.as_str()).map_err(|e| unsupported(format!("{}: {}", node, e)))
    }
}

impl From<OxLiteral> for Literal {
    fn from(lit: OxLiteral) -> Self {
        let (value, datatype, language) = lit.destruct();
        match (language, datatype) {
            (Some(language), _) => Literal::new_language_tagged_literal(value, language),
            (None, Some(datatype)) => Literal::new_typed_literal(value, datatype.into()),
            (None, None) => Literal::new_simple_literal(value),
        }
    }
}

impl TryFrom<&Literal> for OxLiteral {
    type Error = ModelError;

    fn try_from(lit: &Literal) -> ModelResult<Self> {
        if let Some(language) = lit.language() {
            OxLiteral::new_language_tagged_literal(lit.value(), language)
                .map_err(|e| unsupported(format!("{}: {}", lit, e)))
        } else {
            let datatype = OxNamedNode::try_from(lit.datatype())?;
            Ok(OxLiteral::new_typed_literal(lit.value(), datatype))
        }
    }
}

impl TryFrom<OxSubject> for Subject {
    type Error = ModelError;

    fn try_from(subject: OxSubject) -> ModelResult<Self> {
        match subject {
            OxSubject::NamedNode(n) => Ok(Subject::NamedNode(n.into())),
            OxSubject::BlankNode(b) => Ok(Subject::BlankNode(b.into())),
            #[allow(unreachable_patterns)]
            other => Err(unsupported(other)),
        }
    }
}

impl TryFrom<OxTerm> for Object {
    type Error = ModelError;

    fn try_from(term: OxTerm) -> ModelResult<Self> {
        match term {
            OxTerm::NamedNode(n) => Ok(Object::NamedNode(n.into())),
            OxTerm::BlankNode(b) => Ok(Object::BlankNode(b.into())),
            OxTerm::Literal(l) => Ok(Object::Literal(l.into())),
            #[allow(unreachable_patterns)]
            other => Err(unsupported(other)),
        }
    }
}

impl TryFrom<OxQuad> for Quad {
    type Error = ModelError;

    fn try_from(quad: OxQuad) -> ModelResult<Self> {
        let graph = match quad.graph_name {
            OxGraphName::NamedNode(n) => GraphName::NamedNode(n.into()),
            OxGraphName::BlankNode(b) => GraphName::BlankNode(b.into()),
            OxGraphName::DefaultGraph => GraphName::DefaultGraph,
        };
        Ok(Quad::new(
            Subject::try_from(quad.subject)?,
            NamedNode::from(quad.predicate),
            Object::try_from(quad.object)?,
            graph,
        ))
    }
}

impl TryFrom<&Quad> for OxQuad {
    type Error = ModelError;

    fn try_from(quad: &Quad) -> ModelResult<Self> {
        let subject: OxSubject = match quad.subject() {
            Subject::NamedNode(n) => OxNamedNode::try_from(n)?.into(),
            Subject::BlankNode(b) => OxBlankNode::try_from(b)?.into(),
            other => return Err(unsupported(other)),
        };
        let predicate = match quad.predicate() {
            Predicate::NamedNode(n) => OxNamedNode::try_from(n)?,
            other => return Err(unsupported(other)),
        };
        let object: OxTerm = match quad.object() {
            Object::NamedNode(n) => OxNamedNode::try_from(n)?.into(),
            Object::BlankNode(b) => OxBlankNode::try_from(b)?.into(),
            Object::Literal(l) => OxLiteral::try_from(l)?.into(),
            other => return Err(unsupported(other)),
        };
        let graph_name = match quad.graph() {
            GraphName::DefaultGraph => OxGraphName::DefaultGraph,
            GraphName::NamedNode(n) => OxNamedNode::try_from(n)?.into(),
            GraphName::BlankNode(b) => OxBlankNode::try_from(b)?.into(),
            other => return Err(unsupported(other)),
        };
        Ok(OxQuad::new(subject, predicate, object, graph_name))
    }
}

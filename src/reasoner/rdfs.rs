//! RDFS (RDF Schema) entailment rules
//!
//! Basic RDFS entailment expressed as [`Rule`] values for the forward
//! chaining [`Reasoner`](super::Reasoner).

use super::Rule;
use crate::model::vocab::{rdf, rdfs};
use crate::model::{NamedNode, Quad, Variable};

/// RDFS inference rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferenceRule {
    /// rdfs:subClassOf transitivity
    SubClassOfTransitive,

    /// rdfs:subPropertyOf transitivity
    SubPropertyOfTransitive,

    /// rdfs:domain inference
    DomainInference,

    /// rdfs:range inference
    RangeInference,

    /// rdf:type inheritance via rdfs:subClassOf
    TypeInheritance,

    /// Statements inherited via rdfs:subPropertyOf
    PropertyInheritance,
}

impl InferenceRule {
    pub const ALL: [InferenceRule; 6] = [
        InferenceRule::SubClassOfTransitive,
        InferenceRule::SubPropertyOfTransitive,
        InferenceRule::DomainInference,
        InferenceRule::RangeInference,
        InferenceRule::TypeInheritance,
        InferenceRule::PropertyInheritance,
    ];

    /// The rule as premise and conclusion patterns
    ///
    /// - subClassOf: (A subClassOf B) ∧ (B subClassOf C) → (A subClassOf C)
    /// - subPropertyOf: (P subPropertyOf Q) ∧ (Q subPropertyOf R) → (P subPropertyOf R)
    /// - domain: (P domain C) ∧ (X P Y) → (X type C)
    /// - range: (P range C) ∧ (X P Y) → (Y type C)
    /// - type inheritance: (A subClassOf B) ∧ (X type A) → (X type B)
    /// - property inheritance: (P subPropertyOf Q) ∧ (X P Y) → (X Q Y)
    pub fn to_rule(self) -> Rule {
        let (x, y, a, b, c) = (var("x"), var("y"), var("a"), var("b"), var("c"));
        let sub_class = iri(rdfs::SUB_CLASS_OF);
        let sub_property = iri(rdfs::SUB_PROPERTY_OF);
        let rdf_type = iri(rdf::TYPE);
        match self {
            InferenceRule::SubClassOfTransitive => Rule::new(
                vec![
                    Quad::triple(a.clone(), sub_class.clone(), b.clone()),
                    Quad::triple(b, sub_class.clone(), c.clone()),
                ],
                vec![Quad::triple(a, sub_class, c)],
            ),
            InferenceRule::SubPropertyOfTransitive => Rule::new(
                vec![
                    Quad::triple(a.clone(), sub_property.clone(), b.clone()),
                    Quad::triple(b, sub_property.clone(), c.clone()),
                ],
                vec![Quad::triple(a, sub_property, c)],
            ),
            InferenceRule::DomainInference => Rule::new(
                vec![
                    Quad::triple(a.clone(), iri(rdfs::DOMAIN), c.clone()),
                    Quad::triple(x.clone(), a, y),
                ],
                vec![Quad::triple(x, rdf_type, c)],
            ),
            InferenceRule::RangeInference => Rule::new(
                vec![
                    Quad::triple(a.clone(), iri(rdfs::RANGE), c.clone()),
                    Quad::triple(x, a, y.clone()),
                ],
                vec![Quad::triple(y, rdf_type, c)],
            ),
            InferenceRule::TypeInheritance => Rule::new(
                vec![
                    Quad::triple(a.clone(), sub_class, b.clone()),
                    Quad::triple(x.clone(), rdf_type.clone(), a),
                ],
                vec![Quad::triple(x, rdf_type, b)],
            ),
            InferenceRule::PropertyInheritance => Rule::new(
                vec![
                    Quad::triple(a.clone(), sub_property, b.clone()),
                    Quad::triple(x.clone(), a, y.clone()),
                ],
                vec![Quad::triple(x, b, y)],
            ),
        }
    }
}

fn var(name: &str) -> Variable {
    Variable::new(name)
}

fn iri(iri: &str) -> NamedNode {
    NamedNode::new(iri)
}

/// All RDFS rules
pub fn rdfs_rules() -> Vec<Rule> {
    InferenceRule::ALL.iter().map(|rule| rule.to_rule()).collect()
}

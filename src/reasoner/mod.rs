//! Forward-chaining rule reasoner
//!
//! Rules are conjunctive quad patterns: a premise whose variables are bound
//! by matching against the store, and a conclusion instantiated with those
//! bindings. [`Reasoner::reason`] applies every rule until an iteration adds
//! no new quad.
//!
//! # Example
//!
//! ```rust
//! use quadstore::model::{NamedNode, Quad, Variable};
//! use quadstore::reasoner::{Reasoner, Rule};
//! use quadstore::store::Store;
//!
//! let knows = NamedNode::new("http://example.org/knows");
//! let mut store = Store::new();
//! store.add(Quad::triple(
//!     NamedNode::new("http://example.org/alice"),
//!     knows.clone(),
//!     NamedNode::new("http://example.org/bob"),
//! ));
//!
//! let symmetric = Rule::new(
//!     vec![Quad::triple(Variable::new("x"), knows.clone(), Variable::new("y"))],
//!     vec![Quad::triple(Variable::new("y"), knows, Variable::new("x"))],
//! );
//! let added = Reasoner::new(&mut store).reason(&[symmetric]).unwrap();
//! assert_eq!(added, 1);
//! ```

mod rdfs;

pub use rdfs::{rdfs_rules, InferenceRule};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::vocab::log;
use crate::model::{GraphName, NamedNode, Object, Predicate, Quad, Subject, Term};
use crate::store::{Dataset, Store};

/// Reasoning errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReasonerError {
    /// Rule that cannot be applied
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

pub type ReasonerResult<T> = Result<T, ReasonerError>;

/// Premise patterns and the conclusion they entail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub premise: Vec<Quad>,
    pub conclusion: Vec<Quad>,
}

impl Rule {
    pub fn new(premise: Vec<Quad>, conclusion: Vec<Quad>) -> Self {
        Self { premise, conclusion }
    }

    /// Rules stated as N3 formulas: every `{ premise } log:implies
    /// { conclusion }` quad in the default graph of `dataset`
    ///
    /// The formula graphs' quads become the patterns, moved to the default
    /// graph.
    pub fn from_dataset<D: Dataset + ?Sized>(dataset: &D) -> ReasonerResult<Vec<Rule>> {
        let implies = Predicate::from(NamedNode::new(log::IMPLIES));
        let mut rules = Vec::new();
        for quad in dataset.quads() {
            if quad.predicate() != &implies || !quad.in_default_graph() {
                continue;
            }
            let premise = formula(dataset, Term::from(quad.subject().clone()))?;
            let conclusion = formula(dataset, Term::from(quad.object().clone()))?;
            rules.push(Rule::new(premise, conclusion));
        }
        debug!("Extracted {} rules", rules.len());
        Ok(rules)
    }

    /// Conclusions may only use variables bound by the premise
    pub fn validate(&self) -> ReasonerResult<()> {
        let bound: Vec<&str> = self.premise.iter().flat_map(variables).collect();
        for quad in &self.conclusion {
            if let Some(unbound) = variables(quad).find(|name| !bound.contains(name)) {
                return Err(ReasonerError::InvalidRule(format!(
                    "variable ?{} in conclusion is not bound by the premise",
                    unbound
                )));
            }
        }
        Ok(())
    }
}

/// Quads of the formula graph named by `term`, moved to the default graph
fn formula<D: Dataset + ?Sized>(dataset: &D, term: Term) -> ReasonerResult<Vec<Quad>> {
    let graph = GraphName::try_from(term.clone())
        .map_err(|_| ReasonerError::InvalidRule(format!("{} is not a formula", term)))?;
    if graph.is_default_graph() {
        return Err(ReasonerError::InvalidRule("default graph is not a formula".to_string()));
    }
    Ok(dataset
        .quads()
        .filter(|quad| quad.graph() == &graph)
        .map(|quad| quad.with_graph(GraphName::DefaultGraph))
        .collect())
}

fn variables(quad: &Quad) -> impl Iterator<Item = &str> {
    let subject = match quad.subject() {
        Subject::Variable(v) => Some(v.as_str()),
        _ => None,
    };
    let predicate = match quad.predicate() {
        Predicate::Variable(v) => Some(v.as_str()),
        _ => None,
    };
    let object = match quad.object() {
        Object::Variable(v) => Some(v.as_str()),
        _ => None,
    };
    let graph = match quad.graph() {
        GraphName::Variable(v) => Some(v.as_str()),
        _ => None,
    };
    [subject, predicate, object, graph].into_iter().flatten()
}

/// Variable name → bound term
type Bindings = FxHashMap<String, Term>;

/// Pattern component: a constant, or a variable that may already be bound
fn component<T>(pattern: Term, bindings: &Bindings) -> Option<Option<T>>
where
    T: TryFrom<Term>,
{
    match pattern {
        Term::Variable(v) => match bindings.get(v.as_str()) {
            // A bound value that cannot sit in this position matches nothing
            Some(bound) => T::try_from(bound.clone()).ok().map(Some),
            None => Some(None),
        },
        constant => T::try_from(constant).ok().map(Some),
    }
}

/// Bind the pattern's variables against a matched quad
fn unify(pattern: &Quad, quad: &Quad, bindings: &Bindings) -> Option<Bindings> {
    let mut extended = bindings.clone();
    let pairs = [
        (Term::from(pattern.subject().clone()), Term::from(quad.subject().clone())),
        (Term::from(pattern.predicate().clone()), Term::from(quad.predicate().clone())),
        (Term::from(pattern.object().clone()), Term::from(quad.object().clone())),
        (Term::from(pattern.graph().clone()), Term::from(quad.graph().clone())),
    ];
    for (pattern, value) in pairs {
        if let Term::Variable(v) = pattern {
            match extended.get(v.as_str()) {
                Some(bound) if bound != &value => return None,
                Some(_) => {}
                None => {
                    extended.insert(v.as_str().to_string(), value);
                }
            }
        }
    }
    Some(extended)
}

fn substitute(term: Term, bindings: &Bindings) -> Term {
    match term {
        Term::Variable(v) => bindings.get(v.as_str()).cloned().unwrap_or(Term::Variable(v)),
        other => other,
    }
}

/// Ground instance of a conclusion pattern, if the bindings give a valid quad
fn instantiate(pattern: &Quad, bindings: &Bindings) -> Option<Quad> {
    Quad::from_terms(
        substitute(pattern.subject().clone().into(), bindings),
        substitute(pattern.predicate().clone().into(), bindings),
        substitute(pattern.object().clone().into(), bindings),
        substitute(pattern.graph().clone().into(), bindings),
    )
    .ok()
}

/// Naive forward-chaining reasoner over a store
///
/// Termination is only guaranteed for rule sets whose conclusions draw on a
/// finite set of terms.
pub struct Reasoner<'a> {
    store: &'a mut Store,
}

impl<'a> Reasoner<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// Apply the rules until nothing new is derived; returns the number of
    /// quads added
    pub fn reason(&mut self, rules: &[Rule]) -> ReasonerResult<usize> {
        for rule in rules {
            rule.validate()?;
        }

        let mut total = 0;
        let mut iteration = 0;
        loop {
            iteration += 1;
            let mut derived = Vec::new();
            for rule in rules {
                for bindings in self.solutions(&rule.premise) {
                    derived.extend(
                        rule.conclusion
                            .iter()
                            .filter_map(|pattern| instantiate(pattern, &bindings))
                            .filter(|quad| !self.store.has(quad)),
                    );
                }
            }
            let added = self.store.add_quads(derived);
            debug!(iteration, added, "Reasoner iteration");
            total += added;
            if added == 0 {
                break;
            }
        }

        info!(
            "Reasoning reached a fixpoint after {} iterations, {} quads added",
            iteration, total
        );
        Ok(total)
    }

    /// Apply the N3 rules stated in a dataset
    pub fn reason_with_dataset<D: Dataset + ?Sized>(&mut self, rules: &D) -> ReasonerResult<usize> {
        let rules = Rule::from_dataset(rules)?;
        self.reason(&rules)
    }

    /// Every binding that satisfies all premise patterns, joined left to right
    fn solutions(&self, premise: &[Quad]) -> Vec<Bindings> {
        let mut solutions = vec![Bindings::default()];
        for pattern in premise {
            let mut next = Vec::new();
            for bindings in &solutions {
                let (Some(s), Some(p), Some(o), Some(g)) = (
                    component::<Subject>(pattern.subject().clone().into(), bindings),
                    component::<Predicate>(pattern.predicate().clone().into(), bindings),
                    component::<Object>(pattern.object().clone().into(), bindings),
                    component::<GraphName>(pattern.graph().clone().into(), bindings),
                ) else {
                    continue;
                };
                next.extend(
                    self.store
                        .read_quads(s.as_ref(), p.as_ref(), o.as_ref(), g.as_ref())
                        .filter_map(|quad| unify(pattern, &quad, bindings)),
                );
            }
            solutions = next;
            if solutions.is_empty() {
                break;
            }
        }
        solutions
    }
}

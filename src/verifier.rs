//! The rule verifier
//!
//! [`verify`] checks a single derived line. It looks the rule up in the logic's table,
//! checks the citations against the [`CitationShape`]s the table lists, resolves them in the
//! [`Context`], interprets the rule's [`SideCondition`] and finally matches the cited
//! formulas against the rule's pattern.

use tracing::{debug, trace};

use crate::{
    context::{Context, SubproofView},
    error::{ProofError, ProofResult},
    formula::{Formula, InstanceError, Term},
    logic::Logic,
    proof::{Citation, Justification},
    rules::{CitationShape, Rule, RuleSpec, SideCondition},
};

/// A cited line together with its world distance
#[derive(Clone, Copy, Debug)]
struct Cited<'a> {
    citation: &'a Citation,
    formula: &'a Formula,
    distance: usize,
}

/// Resolved citations of one rule application
struct Premises<'a> {
    spec: &'static RuleSpec,
    lines: Vec<Cited<'a>>,
    ranges: Vec<SubproofView<'a>>,
}

/// Checks that `formula` follows by `justification` from the lines visible in `context`
///
/// # Errors
/// * `UnknownRule` - if `logic` has no rule of that name
/// * `RuleMismatch` - if the citations do not fit the rule or the formulas do not match its
/// pattern
/// * `Scope` - if a citation cannot be resolved from the current position
/// * `FreshnessViolation` - if a constant required to be new is not
pub fn verify(
    logic: Logic,
    context: &Context,
    formula: &Formula,
    justification: &Justification,
) -> ProofResult<()> {
    let spec = logic
        .rule(&justification.rule)
        .ok_or_else(|| ProofError::UnknownRule {
            rule: justification.rule.clone(),
            logic,
        })?;
    check_shape(spec, &justification.citations)?;
    let premises = resolve(spec, context, &justification.citations)?;
    let result = premises.check(logic, context, formula);
    match &result {
        Ok(()) => trace!(rule = spec.name, %formula, "rule applies"),
        Err(e) => debug!(rule = spec.name, %formula, error = %e, "rule does not apply"),
    }
    result
}

fn describe_shape(shapes: &[CitationShape]) -> String {
    if shapes.is_empty() {
        return "no citations".to_owned();
    }
    shapes
        .iter()
        .map(|shape| shape.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_shape(spec: &'static RuleSpec, citations: &[Citation]) -> ProofResult<()> {
    let found: Vec<CitationShape> = citations
        .iter()
        .map(|c| match c {
            Citation::Line(_) => CitationShape::Line,
            Citation::Range(..) => CitationShape::Range,
        })
        .collect();
    if found != spec.citations {
        return Err(ProofError::mismatch(
            spec.name,
            describe_shape(spec.citations),
            describe_shape(&found),
        ));
    }
    Ok(())
}

fn resolve<'a>(
    spec: &'static RuleSpec,
    context: &'a Context,
    citations: &'a [Citation],
) -> ProofResult<Premises<'a>> {
    let mut lines = Vec::new();
    let mut ranges = Vec::new();
    for citation in citations {
        match *citation {
            Citation::Line(n) => {
                let (formula, distance) = context.resolve_line(n)?;
                if distance > 0 && spec.side_condition != SideCondition::ModalImport {
                    return Err(ProofError::scope(
                        citation.clone(),
                        "it lies in another world",
                    ));
                }
                lines.push(Cited {
                    citation,
                    formula,
                    distance,
                });
            }
            Citation::Range(n, m) => {
                let view = context.resolve_range(n, m)?;
                let (strict, hypothesis) = match spec.side_condition {
                    SideCondition::StrictSubproof => (true, false),
                    SideCondition::WorldHypothesis => (true, true),
                    _ => (false, true),
                };
                if view.strict != strict || view.hypothesis.is_some() != hypothesis {
                    let expected = match (strict, hypothesis) {
                        (true, false) => "a subproof opened with □",
                        (true, true) => "a subproof opened with □: φ",
                        _ => "a subproof opened with an ordinary assumption",
                    };
                    return Err(ProofError::mismatch(spec.name, expected, citation));
                }
                // →I, ¬I, IP and □I discharge the subproof just closed
                if spec.citations == [CitationShape::Range] && m + 1 != context.next_line() {
                    return Err(ProofError::scope(
                        citation.clone(),
                        "the subproof does not end on the previous line",
                    ));
                }
                ranges.push(view);
            }
        }
    }
    Ok(Premises {
        spec,
        lines,
        ranges,
    })
}

/// `(a, b)` and `(b, a)`, for rules that do not care about citation order
fn both_orders<T: Copy>(a: T, b: T) -> [(T, T); 2] {
    [(a, b), (b, a)]
}

impl<'a> Premises<'a> {
    fn mismatch(&self, expected: impl Into<String>, found: impl std::fmt::Display) -> ProofError {
        ProofError::mismatch(self.spec.name, expected, found)
    }

    fn expect(
        &self,
        ok: bool,
        expected: impl Into<String>,
        found: impl std::fmt::Display,
    ) -> ProofResult<()> {
        if ok {
            Ok(())
        } else {
            Err(self.mismatch(expected, found))
        }
    }

    fn line(&self, i: usize) -> &'a Formula {
        self.lines[i].formula
    }

    fn check(&self, logic: Logic, context: &Context, formula: &Formula) -> ProofResult<()> {
        use Formula::*;
        match self.spec.rule {
            Rule::Reiteration => self.expect(
                formula == self.line(0),
                format!("{}", self.line(0)),
                formula,
            ),
            Rule::Explosion => self.expect(
                *self.line(0) == Bottom,
                "⊥ to be cited",
                self.line(0),
            ),
            Rule::IndirectProof => {
                let sub = &self.ranges[0];
                self.expect(
                    *sub.conclusion == Bottom,
                    "subproof ending in ⊥",
                    sub.conclusion,
                )?;
                let expected = Formula::not(formula.clone());
                self.expect(
                    sub.hypothesis == Some(&expected),
                    format!("subproof assuming {}", expected),
                    &expected_or(sub.hypothesis),
                )
            }
            Rule::AndIntro => self.expect(
                both_orders(self.line(0), self.line(1))
                    .iter()
                    .any(|(a, b)| *formula == Formula::and((*a).clone(), (*b).clone())),
                format!("conjunction of {} and {}", self.line(0), self.line(1)),
                formula,
            ),
            Rule::AndElim => match self.line(0) {
                And(a, b) => self.expect(
                    formula == &**a || formula == &**b,
                    format!("{} or {}", a, b),
                    formula,
                ),
                found => Err(self.mismatch("a conjunction to be cited", found)),
            },
            Rule::OrIntro => match formula {
                Or(a, b) => self.expect(
                    &**a == self.line(0) || &**b == self.line(0),
                    format!("disjunction with {} as a disjunct", self.line(0)),
                    formula,
                ),
                _ => Err(self.mismatch("a disjunction", formula)),
            },
            Rule::OrElim => {
                let (a, b) = match self.line(0) {
                    Or(a, b) => (a, b),
                    found => return Err(self.mismatch("a disjunction to be cited", found)),
                };
                let (s, t) = (&self.ranges[0], &self.ranges[1]);
                let cases_match = both_orders(s, t).iter().any(|(s, t)| {
                    s.hypothesis == Some(&**a) && t.hypothesis == Some(&**b)
                });
                if !cases_match {
                    return Err(self.mismatch(
                        format!("subproofs assuming {} and {}", a, b),
                        format!(
                            "subproofs assuming {} and {}",
                            expected_or(s.hypothesis),
                            expected_or(t.hypothesis)
                        ),
                    ));
                }
                self.same_conclusions(formula)
            }
            Rule::ImpliesIntro => {
                let sub = &self.ranges[0];
                match (formula, sub.hypothesis) {
                    (Implies(a, b), Some(h)) => self.expect(
                        &**a == h && &**b == sub.conclusion,
                        format!("{} → {}", h, sub.conclusion),
                        formula,
                    ),
                    _ => Err(self.mismatch("a conditional", formula)),
                }
            }
            Rule::ImpliesElim => self.expect(
                both_orders(self.line(0), self.line(1))
                    .iter()
                    .any(|(c, a)| **c == Formula::implies((*a).clone(), formula.clone())),
                format!("a conditional with {} as consequent and its antecedent", formula),
                format!("{} and {}", self.line(0), self.line(1)),
            ),
            Rule::IffIntro => {
                let (a, b) = match formula {
                    Iff(a, b) => (&**a, &**b),
                    _ => return Err(self.mismatch("a biconditional", formula)),
                };
                let (s, t) = (&self.ranges[0], &self.ranges[1]);
                let ok = both_orders(s, t).iter().any(|(s, t)| {
                    s.hypothesis == Some(a)
                        && s.conclusion == b
                        && t.hypothesis == Some(b)
                        && t.conclusion == a
                });
                self.expect(
                    ok,
                    format!("subproofs from {} to {} and from {} to {}", a, b, b, a),
                    formula,
                )
            }
            Rule::IffElim => {
                let ok = both_orders(self.line(0), self.line(1))
                    .iter()
                    .any(|(c, x)| match c {
                        Iff(a, b) => {
                            (&**a == *x && &**b == formula) || (&**b == *x && &**a == formula)
                        }
                        _ => false,
                    });
                self.expect(
                    ok,
                    format!("a biconditional between {} and a cited line", formula),
                    formula,
                )
            }
            Rule::NotIntro => {
                let sub = &self.ranges[0];
                self.expect(
                    *sub.conclusion == Bottom,
                    "subproof ending in ⊥",
                    sub.conclusion,
                )?;
                match (formula, sub.hypothesis) {
                    (Not(a), Some(h)) => {
                        self.expect(&**a == h, format!("¬{}", Parenthesized(h)), formula)
                    }
                    _ => Err(self.mismatch("a negation", formula)),
                }
            }
            Rule::NotElim => {
                self.expect(*formula == Bottom, "⊥", formula)?;
                let ok = both_orders(self.line(0), self.line(1))
                    .iter()
                    .any(|(a, n)| **n == Formula::not((*a).clone()));
                self.expect(
                    ok,
                    "a formula and its negation",
                    format!("{} and {}", self.line(0), self.line(1)),
                )
            }
            Rule::DisjunctiveSyllogism => {
                let ok = both_orders(self.line(0), self.line(1))
                    .iter()
                    .any(|(d, n)| match (d, n) {
                        (Or(a, b), Not(x)) => {
                            (**x == **a && **b == *formula) || (**x == **b && **a == *formula)
                        }
                        _ => false,
                    });
                self.expect(
                    ok,
                    format!("a disjunction with {} and the negation of the other disjunct", formula),
                    format!("{} and {}", self.line(0), self.line(1)),
                )
            }
            Rule::ModusTollens => {
                let ok = match formula {
                    Not(a) => both_orders(self.line(0), self.line(1))
                        .iter()
                        .any(|(c, n)| match (c, n) {
                            (Implies(x, b), Not(y)) => **x == **a && **y == **b,
                            _ => false,
                        }),
                    _ => false,
                };
                self.expect(
                    ok,
                    "a conditional and the negation of its consequent",
                    format!("{} and {}", self.line(0), self.line(1)),
                )
            }
            Rule::DoubleNegationElim => {
                let expected = Formula::not(Formula::not(formula.clone()));
                self.expect(
                    *self.line(0) == expected,
                    format!("{} to be cited", expected),
                    self.line(0),
                )
            }
            Rule::ExcludedMiddle => {
                let (s, t) = (&self.ranges[0], &self.ranges[1]);
                let ok = both_orders(s, t).iter().any(|(s, t)| match s.hypothesis {
                    Some(a) => t.hypothesis == Some(&Formula::not(a.clone())),
                    None => false,
                });
                self.expect(
                    ok,
                    "subproofs assuming a formula and its negation",
                    format!(
                        "subproofs assuming {} and {}",
                        expected_or(s.hypothesis),
                        expected_or(t.hypothesis)
                    ),
                )?;
                self.same_conclusions(formula)
            }
            Rule::DeMorgan => self.expect(
                de_morgan(self.line(0), formula) || de_morgan(formula, self.line(0)),
                format!("a De Morgan equivalent of {}", self.line(0)),
                formula,
            ),
            Rule::ForAllIntro => self.for_all_intro(context, formula),
            Rule::ForAllElim => match self.line(0) {
                ForAll(v, body) => self.instance(body, v, formula).map(|_| ()),
                found => Err(self.mismatch("a universal formula to be cited", found)),
            },
            Rule::ExistsIntro => match formula {
                Exists(v, body) => self.instance(body, v, self.line(0)).map(|_| ()),
                _ => Err(self.mismatch("an existential formula", formula)),
            },
            Rule::ExistsElim => self.exists_elim(context, formula),
            Rule::EqualityIntro => match formula.as_equality() {
                Some((a, b)) => self.expect(a == b, format!("{} = {}", a, a), formula),
                None => Err(self.mismatch("an identity", formula)),
            },
            Rule::EqualityElim => {
                let ok = both_orders(self.line(0), self.line(1))
                    .iter()
                    .any(|(e, f)| match e.as_equality() {
                        Some((a, b)) => {
                            f.replaces_some(formula, a, b) || f.replaces_some(formula, b, a)
                        }
                        None => false,
                    });
                self.expect(
                    ok,
                    "an identity and a formula to substitute in",
                    format!("{} and {}", self.line(0), self.line(1)),
                )
            }
            Rule::QuantifierConversion => self.expect(
                conversion(self.line(0), formula) || conversion(formula, self.line(0)),
                format!("a quantifier conversion of {}", self.line(0)),
                formula,
            ),
            Rule::BoxIntro => {
                let expected = Formula::necessarily(self.ranges[0].conclusion.clone());
                self.expect(*formula == expected, format!("{}", expected), formula)
            }
            Rule::BoxElim => {
                let cited = &self.lines[0];
                let expected = Formula::necessarily(formula.clone());
                self.expect(
                    *cited.formula == expected,
                    format!("{} to be cited", expected),
                    cited.formula,
                )?;
                if logic.world_discipline().permits_box_elim(cited.distance) {
                    Ok(())
                } else {
                    Err(ProofError::scope(
                        cited.citation.clone(),
                        format!(
                            "{} does not allow □E across {} world(s)",
                            logic, cited.distance
                        ),
                    ))
                }
            }
            Rule::PossiblyIntro => self.expect(
                *formula == Formula::possibly(self.line(0).clone()),
                format!("♢{}", Parenthesized(self.line(0))),
                formula,
            ),
            Rule::PossiblyElim => {
                let sub = &self.ranges[0];
                let expected = match self.line(0) {
                    Possibly(a) => a,
                    found => return Err(self.mismatch("a ♢ formula to be cited", found)),
                };
                self.expect(
                    sub.hypothesis == Some(&**expected),
                    format!("a world assuming {}", expected),
                    &expected_or(sub.hypothesis),
                )?;
                let conclusion = Formula::possibly(sub.conclusion.clone());
                self.expect(*formula == conclusion, format!("{}", conclusion), formula)
            }
            Rule::PossiblyDefinition => self.expect(
                possibility_definition(self.line(0), formula)
                    || possibility_definition(formula, self.line(0)),
                "♢φ and ¬□¬φ to be interchanged",
                formula,
            ),
            Rule::ModalConversion => self.expect(
                modal_conversion(self.line(0), formula) || modal_conversion(formula, self.line(0)),
                format!("a modal conversion of {}", self.line(0)),
                formula,
            ),
            Rule::ReflexiveReiteration => {
                let expected = Formula::necessarily(formula.clone());
                self.expect(
                    *self.line(0) == expected,
                    format!("{} to be cited", expected),
                    self.line(0),
                )
            }
            Rule::TransitiveReiteration => {
                self.expect(
                    matches!(self.line(0), Necessarily(_)),
                    "a □ formula to be cited",
                    self.line(0),
                )?;
                self.expect(formula == self.line(0), format!("{}", self.line(0)), formula)
            }
            Rule::EuclideanReiteration => {
                let ok = match self.line(0) {
                    Possibly(_) => true,
                    Not(a) => matches!(**a, Necessarily(_)),
                    _ => false,
                };
                self.expect(ok, "a ♢ or ¬□ formula to be cited", self.line(0))?;
                self.expect(formula == self.line(0), format!("{}", self.line(0)), formula)
            }
        }
    }

    /// All cited subproofs end in `formula`
    fn same_conclusions(&self, formula: &Formula) -> ProofResult<()> {
        match self.ranges.iter().find(|sub| sub.conclusion != formula) {
            Some(sub) => Err(self.mismatch(
                format!("every subproof to end in {}", formula),
                format!("lines {}-{} ending in {}", sub.first, sub.last, sub.conclusion),
            )),
            None => Ok(()),
        }
    }

    /// Finds the term `instance` substitutes for `var` in `body`
    fn instance(&self, body: &Formula, var: &str, instance: &Formula) -> ProofResult<Option<Term>> {
        match body.instance_term(var, instance) {
            Ok(term) => Ok(term),
            Err(InstanceError::Mismatch) => Err(self.mismatch(
                format!("an instance of {} for {}", body, var),
                instance,
            )),
            Err(InstanceError::Captures(term, captured)) => Err(self.mismatch(
                format!("a term substitutable for {} in {}", var, body),
                format!("{}, whose variable {} would be captured", term, captured),
            )),
        }
    }

    /// The constant replaced by the quantified variable, if it has to be new
    fn instance_constant(
        &self,
        body: &Formula,
        var: &str,
        instance: &Formula,
    ) -> ProofResult<Option<String>> {
        match self.instance(body, var, instance)? {
            None => Ok(None),
            Some(Term::Constant(c)) => Ok(Some(c)),
            Some(term) => Err(self.mismatch(
                format!("a constant in place of {}", var),
                term,
            )),
        }
    }

    fn fresh<'f>(
        &self,
        name: &str,
        mut formulas: impl Iterator<Item = &'f Formula>,
        occurs_in: &str,
    ) -> ProofResult<()> {
        if formulas.any(|f| f.contains_constant(name)) {
            Err(ProofError::not_fresh(self.spec.name, name, occurs_in))
        } else {
            Ok(())
        }
    }

    fn for_all_intro(&self, context: &Context, formula: &Formula) -> ProofResult<()> {
        let (var, body) = match formula {
            Formula::ForAll(v, body) => (v, body),
            _ => return Err(self.mismatch("a universal formula", formula)),
        };
        if let Some(c) = self.instance_constant(body, var, self.line(0))? {
            self.fresh(&c, std::iter::once(formula), "the universal formula")?;
            self.fresh(&c, context.open_assumptions(), "an open assumption")?;
        }
        Ok(())
    }

    fn exists_elim(&self, context: &Context, formula: &Formula) -> ProofResult<()> {
        let (var, body) = match self.line(0) {
            Formula::Exists(v, body) => (v, body),
            found => return Err(self.mismatch("an existential formula to be cited", found)),
        };
        let sub = &self.ranges[0];
        let hypothesis = sub.hypothesis.ok_or_else(|| {
            self.mismatch(format!("a subproof assuming an instance of {}", body), "□")
        })?;
        self.same_conclusions(formula)?;
        if let Some(c) = self.instance_constant(body, var, hypothesis)? {
            self.fresh(&c, std::iter::once(self.line(0)), "the existential formula")?;
            self.fresh(&c, std::iter::once(formula), "the conclusion")?;
            self.fresh(&c, context.visible_formulas(), "a line outside the subproof")?;
        }
        Ok(())
    }
}

/// Formats a hypothesis that may be missing
fn expected_or(hypothesis: Option<&Formula>) -> Formula {
    hypothesis.cloned().unwrap_or_else(|| Formula::letter("□"))
}

/// Displays a formula as the operand of a unary operator
struct Parenthesized<'a>(&'a Formula);

impl std::fmt::Display for Parenthesized<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_binary() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// `¬(a ∨ b)` / `¬a ∧ ¬b` and `¬(a ∧ b)` / `¬a ∨ ¬b`
fn de_morgan(from: &Formula, to: &Formula) -> bool {
    use Formula::*;
    match (from, to) {
        (Not(inner), And(x, y)) => match &**inner {
            Or(a, b) => **x == Formula::not((**a).clone()) && **y == Formula::not((**b).clone()),
            _ => false,
        },
        (Not(inner), Or(x, y)) => match &**inner {
            And(a, b) => **x == Formula::not((**a).clone()) && **y == Formula::not((**b).clone()),
            _ => false,
        },
        _ => false,
    }
}

/// `∀x¬φ` / `¬∃xφ` and `∃x¬φ` / `¬∀xφ`
fn conversion(from: &Formula, to: &Formula) -> bool {
    use Formula::*;
    match (from, to) {
        (ForAll(v, body), Not(inner)) => match (&**body, &**inner) {
            (Not(a), Exists(w, b)) => v == w && a == b,
            _ => false,
        },
        (Exists(v, body), Not(inner)) => match (&**body, &**inner) {
            (Not(a), ForAll(w, b)) => v == w && a == b,
            _ => false,
        },
        _ => false,
    }
}

/// `♢φ` / `¬□¬φ`
fn possibility_definition(from: &Formula, to: &Formula) -> bool {
    match from {
        Formula::Possibly(a) => {
            *to == Formula::not(Formula::necessarily(Formula::not((**a).clone())))
        }
        _ => false,
    }
}

/// `¬□φ` / `♢¬φ` and `¬♢φ` / `□¬φ`
fn modal_conversion(from: &Formula, to: &Formula) -> bool {
    use Formula::*;
    match (from, to) {
        (Not(inner), Possibly(x)) => match &**inner {
            Necessarily(a) => **x == Formula::not((**a).clone()),
            _ => false,
        },
        (Not(inner), Necessarily(x)) => match &**inner {
            Possibly(a) => **x == Formula::not((**a).clone()),
            _ => false,
        },
        _ => false,
    }
}

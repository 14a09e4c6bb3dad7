use std::fmt;

#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    context::{Context, ProofLine, Role},
    error::{ProofError, ProofResult},
    formula::{Formula, NodeKind},
    logic::Logic,
    serialization::check_sentence,
    types::*,
    verifier::verify,
};

/// Reference to an earlier line or to a whole closed subproof
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum Citation {
    Line(LineNumber),
    /// The subproof spanning lines `n` to `m`
    Range(LineNumber, LineNumber),
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Citation::Line(n) => write!(f, "line {}", n),
            Citation::Range(n, m) => write!(f, "subproof {}-{}", n, m),
        }
    }
}

/// Rule name and citations given for a derived line
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub struct Justification {
    pub rule: String,
    pub citations: Vec<Citation>,
}

impl Justification {
    pub fn new(rule: &str, citations: Vec<Citation>) -> Self {
        Justification {
            rule: rule.to_owned(),
            citations,
        }
    }
}

impl fmt::Display for Justification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rule)?;
        for (i, citation) in self.citations.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            match citation {
                Citation::Line(n) => write!(f, "{}", n)?,
                Citation::Range(n, m) => write!(f, "{}-{}", n, m)?,
            }
        }
        Ok(())
    }
}

/// What a subproof starts with
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum Hypothesis {
    /// An ordinary assumption
    Assume(Formula),
    /// A new accessible world, optionally with a formula assumed to hold there
    World(Option<Formula>),
}

impl Hypothesis {
    fn formula(&self) -> Option<&Formula> {
        match self {
            Hypothesis::Assume(f) | Hypothesis::World(Some(f)) => Some(f),
            Hypothesis::World(None) => None,
        }
    }

    fn is_world(&self) -> bool {
        matches!(self, Hypothesis::World(_))
    }
}

/// A single step of writing down a proof
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum ProofStep {
    Premise(Formula),
    /// Opens a subproof
    Assumption(Hypothesis),
    Line(Formula, Justification),
    /// Closes the innermost subproof and derives a line right after it
    CloseSubproof(Formula, Justification),
    /// Closes the innermost subproof and opens a sibling
    CloseAndReopen(Hypothesis),
}

impl ProofStep {
    pub fn kind(&self) -> StepKind {
        match self {
            ProofStep::Premise(_) => StepKind::Premise,
            ProofStep::Assumption(_) => StepKind::Assumption,
            ProofStep::Line(..) => StepKind::Line,
            ProofStep::CloseSubproof(..) => StepKind::CloseSubproof,
            ProofStep::CloseAndReopen(_) => StepKind::CloseAndReopen,
        }
    }
}

/// The structural effect of a [`ProofStep`], without its content
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use-serde", serde(rename_all = "snake_case"))]
pub enum StepKind {
    Premise,
    Assumption,
    Line,
    CloseSubproof,
    #[cfg_attr(feature = "use-serde", serde(alias = "end_and_begin"))]
    CloseAndReopen,
}

#[derive(Clone, Debug)]
enum Record {
    Applied(ProofStep),
    Rejected(StepKind),
}

/// A natural deduction proof under construction
///
/// Every operation either succeeds or leaves the proof unchanged.
///
/// # Example
/// ```
/// use fitch::{Formula, Justification, Logic, Proof, proof::Citation};
///
/// let p = Formula::letter("P");
/// let q = Formula::letter("Q");
/// let mut proof = Proof::with_premises(
///     Logic::Tfl,
///     vec![Formula::implies(p.clone(), q.clone()), p],
///     q.clone(),
/// )
/// .unwrap();
/// assert!(!proof.is_complete());
///
/// let mp = Justification::new("→E", vec![Citation::Line(1), Citation::Line(2)]);
/// assert_eq!(proof.add_line(q, mp), Ok(3));
/// assert!(proof.is_complete());
/// ```
#[derive(Clone, Debug)]
pub struct Proof {
    logic: Logic,
    conclusion: Formula,
    context: Context,
    history: Vec<Record>,
}

impl Proof {
    pub fn new(logic: Logic, conclusion: Formula) -> Self {
        Proof {
            logic,
            conclusion,
            context: Context::new(),
            history: Vec::new(),
        }
    }

    /// Creates a proof whose first lines are `premises`
    pub fn with_premises(
        logic: Logic,
        premises: Vec<Formula>,
        conclusion: Formula,
    ) -> ProofResult<Self> {
        check_sentence(&conclusion, logic)?;
        let mut proof = Proof::new(logic, conclusion);
        for premise in premises {
            proof.add_premise(premise)?;
        }
        Ok(proof)
    }

    pub fn logic(&self) -> Logic {
        self.logic
    }

    pub fn conclusion(&self) -> &Formula {
        &self.conclusion
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The lines that checked successfully
    pub fn lines(&self) -> impl Iterator<Item = &ProofLine> {
        self.context.lines()
    }

    pub fn line(&self, index: LineNumber) -> Option<&ProofLine> {
        self.context.line(index)
    }

    /// Number the next line will get
    pub fn next_line(&self) -> LineNumber {
        self.context.next_line()
    }

    /// Number of open subproofs
    pub fn depth(&self) -> Depth {
        self.context.depth()
    }

    /// Adds a premise; premises have to precede all other lines
    pub fn add_premise(&mut self, formula: Formula) -> ProofResult<LineNumber> {
        if !self.context.only_premises() {
            return Err(ProofError::misplaced(
                "premises have to come before all other lines",
            ));
        }
        check_sentence(&formula, self.logic)?;
        let index = self
            .context
            .push(Some(formula.clone()), Role::Premise, None);
        debug!(line = index, "premise");
        self.history.push(Record::Applied(ProofStep::Premise(formula)));
        Ok(index)
    }

    fn check_hypothesis(&self, hypothesis: &Hypothesis) -> ProofResult<()> {
        if hypothesis.is_world() && !self.logic.is_modal() {
            return Err(ProofError::OperatorNotSupported {
                operator: NodeKind::Necessarily,
                logic: self.logic,
            });
        }
        match hypothesis.formula() {
            Some(formula) => check_sentence(formula, self.logic),
            None => Ok(()),
        }
    }

    fn open(&mut self, hypothesis: Hypothesis) -> LineNumber {
        let role = if hypothesis.is_world() {
            Role::World
        } else {
            Role::Assumption
        };
        self.context.open_frame(hypothesis.is_world());
        let index = self
            .context
            .push(hypothesis.formula().cloned(), role, None);
        debug!(line = index, depth = self.context.depth(), "opened subproof");
        index
    }

    /// Opens a subproof with `hypothesis` as its first line
    pub fn begin_subproof(&mut self, hypothesis: Hypothesis) -> ProofResult<LineNumber> {
        self.check_hypothesis(&hypothesis)?;
        let index = self.open(hypothesis.clone());
        self.history
            .push(Record::Applied(ProofStep::Assumption(hypothesis)));
        Ok(index)
    }

    /// Derives `formula` in the current subproof
    pub fn add_line(
        &mut self,
        formula: Formula,
        justification: Justification,
    ) -> ProofResult<LineNumber> {
        check_sentence(&formula, self.logic)?;
        verify(self.logic, &self.context, &formula, &justification)?;
        let index = self.context.push(
            Some(formula.clone()),
            Role::Derived,
            Some(justification.clone()),
        );
        debug!(line = index, rule = %justification.rule, depth = self.context.depth(), "derived");
        self.history
            .push(Record::Applied(ProofStep::Line(formula, justification)));
        Ok(index)
    }

    /// Closes the innermost subproof and derives `formula` right after it
    pub fn end_subproof(
        &mut self,
        formula: Formula,
        justification: Justification,
    ) -> ProofResult<LineNumber> {
        check_sentence(&formula, self.logic)?;
        let frame = self
            .context
            .close_frame()
            .ok_or_else(|| ProofError::misplaced("there is no open subproof to close"))?;
        if let Err(e) = verify(self.logic, &self.context, &formula, &justification) {
            self.context.reopen_frame(frame);
            return Err(e);
        }
        let index = self.context.push(
            Some(formula.clone()),
            Role::Derived,
            Some(justification.clone()),
        );
        debug!(line = index, rule = %justification.rule, depth = self.context.depth(), "closed subproof");
        self.history.push(Record::Applied(ProofStep::CloseSubproof(
            formula,
            justification,
        )));
        Ok(index)
    }

    /// Closes the innermost subproof and opens another one at the same depth
    pub fn end_and_begin_subproof(&mut self, hypothesis: Hypothesis) -> ProofResult<LineNumber> {
        if self.context.depth() == 0 {
            return Err(ProofError::misplaced("there is no open subproof to close"));
        }
        self.check_hypothesis(&hypothesis)?;
        self.context.close_frame();
        let index = self.open(hypothesis.clone());
        self.history
            .push(Record::Applied(ProofStep::CloseAndReopen(hypothesis)));
        Ok(index)
    }

    /// Applies any kind of step
    pub fn apply(&mut self, step: ProofStep) -> ProofResult<LineNumber> {
        match step {
            ProofStep::Premise(formula) => self.add_premise(formula),
            ProofStep::Assumption(hypothesis) => self.begin_subproof(hypothesis),
            ProofStep::Line(formula, justification) => self.add_line(formula, justification),
            ProofStep::CloseSubproof(formula, justification) => {
                self.end_subproof(formula, justification)
            }
            ProofStep::CloseAndReopen(hypothesis) => self.end_and_begin_subproof(hypothesis),
        }
    }

    /// Records a step that failed, keeping its structural effect so that later lines keep
    /// their numbers and depths
    pub fn reject(&mut self, kind: StepKind) -> LineNumber {
        match kind {
            StepKind::Premise | StepKind::Line => {}
            StepKind::Assumption => {
                self.context.open_frame(false);
            }
            StepKind::CloseSubproof => {
                self.context.close_frame();
            }
            StepKind::CloseAndReopen => {
                if self.context.close_frame().is_some() {
                    self.context.open_frame(false);
                }
            }
        }
        let index = self.context.push_rejected();
        debug!(line = index, ?kind, "rejected");
        self.history.push(Record::Rejected(kind));
        index
    }

    /// Removes the last line, undoing its effect on the subproof structure
    ///
    /// Returns false if the proof has no lines.
    pub fn delete_line(&mut self) -> bool {
        let mut history = std::mem::take(&mut self.history);
        if history.pop().is_none() {
            return false;
        }
        let mut proof = Proof::new(self.logic, self.conclusion.clone());
        for record in history {
            match record {
                Record::Applied(step) => {
                    let kind = step.kind();
                    if proof.apply(step).is_err() {
                        proof.reject(kind);
                    }
                }
                Record::Rejected(kind) => {
                    proof.reject(kind);
                }
            }
        }
        *self = proof;
        true
    }

    /// Checks whether the proof derives its conclusion
    ///
    /// # Errors
    /// * `IncompleteProof` - if a line has errors, a subproof is still open or the last line
    /// is not the conclusion
    pub fn check_complete(&self) -> ProofResult<()> {
        if self.context.has_rejected() {
            return Err(ProofError::incomplete("some lines have errors"));
        }
        match self.context.depth() {
            0 => {}
            1 => return Err(ProofError::incomplete("a subproof is still open")),
            n => return Err(ProofError::incomplete(format!("{} subproofs are still open", n))),
        }
        match self.context.last_top_level() {
            Some(ProofLine {
                formula: Some(formula),
                ..
            }) if *formula == self.conclusion => Ok(()),
            _ => Err(ProofError::incomplete(format!(
                "the last line is not {}",
                self.conclusion
            ))),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.check_complete().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, serialization::parse_formula};

    fn f(text: &str) -> Formula {
        parse_formula(text, Logic::Fomls5).unwrap()
    }

    fn j(rule: &str, citations: &[Citation]) -> Justification {
        Justification::new(rule, citations.to_vec())
    }

    use Citation::{Line as L, Range as S};

    #[test]
    fn implication_intro() {
        let mut proof = Proof::with_premises(Logic::Tfl, vec![f("P → Q"), f("Q → R")], f("P → R"))
            .unwrap();
        assert_eq!(proof.begin_subproof(Hypothesis::Assume(f("P"))), Ok(3));
        assert_eq!(proof.add_line(f("Q"), j("→E", &[L(1), L(3)])), Ok(4));
        assert_eq!(proof.add_line(f("R"), j("→E", &[L(2), L(4)])), Ok(5));
        assert_eq!(proof.depth(), 1);
        assert_eq!(proof.end_subproof(f("P → R"), j("→I", &[S(3, 5)])), Ok(6));
        assert_eq!(proof.depth(), 0);
        assert!(proof.is_complete());
        assert_eq!(
            proof.lines().map(|l| l.depth).collect::<Vec<_>>(),
            vec![0, 0, 1, 1, 1, 0]
        );
    }

    #[test]
    fn failed_close_is_undone() {
        let mut proof = Proof::new(Logic::Tfl, f("P → P"));
        proof.begin_subproof(Hypothesis::Assume(f("P"))).unwrap();
        proof.add_line(f("P"), j("R", &[L(1)])).unwrap();
        let err = proof
            .end_subproof(f("P → Q"), j("→I", &[S(1, 2)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuleMismatchError);
        assert_eq!(proof.depth(), 1);
        assert_eq!(proof.next_line(), 3);
        assert_eq!(proof.end_subproof(f("P → P"), j("→I", &[S(1, 2)])), Ok(3));
        assert!(proof.is_complete());
    }

    #[test]
    fn premises_come_first() {
        let mut proof = Proof::new(Logic::Tfl, f("P"));
        proof.add_premise(f("P")).unwrap();
        proof.add_line(f("P"), j("R", &[L(1)])).unwrap();
        assert_eq!(
            proof.add_premise(f("Q")).unwrap_err().kind(),
            ErrorKind::ScopeError
        );
    }

    #[test]
    fn delete_replays() {
        let mut proof = Proof::with_premises(Logic::Tfl, vec![f("P")], f("P ∧ P")).unwrap();
        proof.begin_subproof(Hypothesis::Assume(f("Q"))).unwrap();
        assert!(proof.delete_line());
        assert_eq!(proof.depth(), 0);
        assert_eq!(proof.next_line(), 2);
        assert_eq!(proof.reject(StepKind::Line), 2);
        proof.add_line(f("P ∧ P"), j("∧I", &[L(1), L(1)])).unwrap();
        assert!(!proof.is_complete());
        assert!(proof.delete_line());
        assert!(proof.delete_line());
        proof.add_line(f("P ∧ P"), j("∧I", &[L(1), L(1)])).unwrap();
        assert!(proof.is_complete());
        assert!(proof.delete_line());
        assert!(proof.delete_line());
        assert!(!proof.delete_line());
    }

    #[test]
    fn reopen() {
        let mut proof = Proof::with_premises(Logic::Tfl, vec![f("P ∨ Q")], f("Q ∨ P")).unwrap();
        proof.begin_subproof(Hypothesis::Assume(f("P"))).unwrap();
        proof.add_line(f("Q ∨ P"), j("∨I", &[L(2)])).unwrap();
        assert_eq!(proof.end_and_begin_subproof(Hypothesis::Assume(f("Q"))), Ok(4));
        proof.add_line(f("Q ∨ P"), j("∨I", &[L(4)])).unwrap();
        assert_eq!(
            proof.add_line(f("Q ∨ P"), j("R", &[L(3)])).unwrap_err().kind(),
            ErrorKind::ScopeError
        );
        proof
            .end_subproof(f("Q ∨ P"), j("∨E", &[L(1), S(2, 3), S(4, 5)]))
            .unwrap();
        assert!(proof.is_complete());
    }

    #[test]
    fn incomplete_reasons() {
        let mut proof = Proof::new(Logic::Tfl, f("P → P"));
        assert_eq!(
            proof.check_complete().unwrap_err().kind(),
            ErrorKind::IncompleteProof
        );
        proof.begin_subproof(Hypothesis::Assume(f("P"))).unwrap();
        assert_eq!(
            proof.check_complete(),
            Err(ProofError::incomplete("a subproof is still open"))
        );
        assert_eq!(
            proof.end_and_begin_subproof(Hypothesis::World(None)).unwrap_err().kind(),
            ErrorKind::OperatorNotSupportedError
        );
        assert_eq!(proof.depth(), 1);
    }
}

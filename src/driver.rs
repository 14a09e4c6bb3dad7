//! Replays a whole proof written as text and reports on every line.
//!
//! This is the boundary to editors and transports: a [`CheckRequest`] carries the problem
//! and the proof lines exactly as a user typed them, [`CheckRequest::check`] turns it into a
//! [`CheckReport`]. A failing line does not stop the check. It is recorded as rejected so
//! that the following lines keep their numbers and can still be checked.

#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    error::{ErrorKind, ProofError, ProofResult, StepError},
    formula::Formula,
    logic::Logic,
    proof::{Proof, ProofStep, StepKind},
    serialization::{parse_formula, parse_hypothesis, parse_line, parse_premises},
    types::*,
};

/// Rule name reported when a premise line does not restate a premise of the problem
const PREMISE: &str = "PR";

/// The premises and conclusion a proof has to connect
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub struct Problem {
    pub premises: Vec<Formula>,
    pub conclusion: Formula,
}

/// Why a problem could not be set up
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProblemError {
    #[error("Unknown logic: \"{0}\".")]
    UnknownLogic(String),
    #[error("Invalid premise(s): {0}")]
    Premises(#[source] ProofError),
    #[error("Invalid conclusion: {0}")]
    Conclusion(#[source] ProofError),
}

impl ProblemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProblemError::UnknownLogic(_) => ErrorKind::SyntaxError,
            ProblemError::Premises(error) | ProblemError::Conclusion(error) => error.kind(),
        }
    }
}

/// Parses the premise list and the conclusion of a problem under `logic`
///
/// # Example
/// ```
/// use fitch::{driver::validate_problem, Logic};
///
/// let problem = validate_problem(Logic::Tfl, "P → Q, P", "Q").unwrap();
/// assert_eq!(problem.premises.len(), 2);
/// assert!(validate_problem(Logic::Tfl, "NA", "P ∨ ¬P").unwrap().premises.is_empty());
/// assert!(validate_problem(Logic::Tfl, "P", " ").is_err());
/// assert!(validate_problem(Logic::Tfl, "□P", "P").is_err());
/// ```
pub fn validate_problem(
    logic: Logic,
    premises_text: &str,
    conclusion_text: &str,
) -> Result<Problem, ProblemError> {
    let premises = parse_premises(premises_text, logic).map_err(ProblemError::Premises)?;
    if conclusion_text.trim().is_empty() {
        return Err(ProblemError::Conclusion(ProofError::syntax(
            "a conclusion must be provided",
            "",
        )));
    }
    let conclusion = parse_formula(conclusion_text, logic).map_err(ProblemError::Conclusion)?;
    Ok(Problem {
        premises,
        conclusion,
    })
}

/// One line of a proof as typed
///
/// `raw_text` is `<formula>` for premises, `<formula>`, `□` or `□: <formula>` for
/// assumptions and `<formula>; <rule> <citations>` for derived lines.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use-serde", serde(rename_all = "camelCase"))]
pub struct StepDescriptor {
    pub kind: StepKind,
    /// Depth the author put the line at; checked against the depth it actually has
    #[cfg_attr(
        feature = "use-serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub indent: Option<Depth>,
    #[cfg_attr(feature = "use-serde", serde(alias = "raw"))]
    pub raw_text: String,
}

impl StepDescriptor {
    pub fn new(kind: StepKind, indent: Depth, raw_text: impl Into<String>) -> Self {
        StepDescriptor {
            kind,
            indent: Some(indent),
            raw_text: raw_text.into(),
        }
    }

    /// Parses the text of this line into the step it describes
    pub fn parse(&self, logic: Logic) -> ProofResult<ProofStep> {
        let text = self.raw_text.as_str();
        Ok(match self.kind {
            StepKind::Premise => ProofStep::Premise(parse_formula(text, logic)?),
            StepKind::Assumption => ProofStep::Assumption(parse_hypothesis(text, logic)?),
            StepKind::CloseAndReopen => ProofStep::CloseAndReopen(parse_hypothesis(text, logic)?),
            StepKind::Line => {
                let (formula, justification) = parse_line(text, logic)?;
                ProofStep::Line(formula, justification)
            }
            StepKind::CloseSubproof => {
                let (formula, justification) = parse_line(text, logic)?;
                ProofStep::CloseSubproof(formula, justification)
            }
        })
    }

    fn check_indent(&self, depth: Depth) -> ProofResult<()> {
        let expected = match self.kind {
            StepKind::Premise => 0,
            StepKind::Assumption => depth + 1,
            StepKind::CloseSubproof => depth.saturating_sub(1),
            StepKind::Line | StepKind::CloseAndReopen => depth,
        };
        match self.indent {
            Some(indent) if indent != expected => Err(ProofError::misplaced(format!(
                "the line is indented {} levels but belongs at depth {}",
                indent, expected
            ))),
            _ => Ok(()),
        }
    }
}

/// Flag bit of an [`EditorLine`] marking an assumption
pub const ASSUMPTION_FLAG: u8 = 1;
/// Flag bit of an [`EditorLine`] marking a premise
pub const PREMISE_FLAG: u8 = 2;

/// A line as an editor stores it: `[indent, flags, text, justification]`
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub struct EditorLine(pub Depth, pub u8, pub String, pub String);

impl EditorLine {
    pub fn indent(&self) -> Depth {
        self.0
    }

    pub fn is_assumption(&self) -> bool {
        self.1 & ASSUMPTION_FLAG != 0
    }

    pub fn is_premise(&self) -> bool {
        self.1 & PREMISE_FLAG != 0
    }
}

/// Converts editor lines into step descriptors
///
/// Subproofs are not marked in the editor format, so they are recovered from the
/// indentation: an assumption deeper than the current subproof opens a new one, an
/// assumption at the same depth closes the current subproof and opens a sibling, and a
/// derived line less indented than the current subproof closes it.
///
/// # Example
/// ```
/// use fitch::{driver::{steps_from_editor, EditorLine}, proof::StepKind};
///
/// let line = |indent, flags, text: &str, justification: &str| {
///     EditorLine(indent, flags, text.to_owned(), justification.to_owned())
/// };
/// let steps = steps_from_editor(&[
///     line(1, 1, "P", ""),
///     line(1, 0, "P", "R 1"),
///     line(0, 0, "P → P", "→I 1-2"),
/// ]);
/// let kinds: Vec<_> = steps.iter().map(|s| s.kind).collect();
/// assert_eq!(kinds, vec![StepKind::Assumption, StepKind::Line, StepKind::CloseSubproof]);
/// assert_eq!(steps[2].raw_text, "P → P; →I 1-2");
/// ```
pub fn steps_from_editor(lines: &[EditorLine]) -> Vec<StepDescriptor> {
    let mut depth: Depth = 0;
    lines
        .iter()
        .map(|line| {
            let EditorLine(indent, _, text, justification) = line;
            let kind = if line.is_premise() {
                StepKind::Premise
            } else if line.is_assumption() {
                if *indent > depth {
                    StepKind::Assumption
                } else {
                    StepKind::CloseAndReopen
                }
            } else if *indent < depth {
                StepKind::CloseSubproof
            } else {
                StepKind::Line
            };
            match kind {
                StepKind::Assumption => depth += 1,
                StepKind::CloseSubproof => depth -= 1,
                _ => {}
            }
            let raw_text = match kind {
                StepKind::Line | StepKind::CloseSubproof => {
                    format!("{}; {}", text.trim(), justification.trim())
                }
                _ => text.trim().to_owned(),
            };
            StepDescriptor {
                kind,
                indent: Some(*indent),
                raw_text,
            }
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use-serde", serde(rename_all = "lowercase"))]
pub enum Status {
    /// Every line checks and the proof ends in its conclusion
    Complete,
    /// Every line checks but the conclusion is not reached yet
    Incomplete,
    /// Some line or the problem itself has errors
    Error,
}

/// Outcome of checking a single line
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub struct LineResult {
    /// Line number the step was given, absent for premise lines that restate nothing
    #[cfg_attr(
        feature = "use-serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub line: Option<LineNumber>,
    pub ok: bool,
    pub message: String,
    #[cfg_attr(
        feature = "use-serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub kind: Option<ErrorKind>,
}

impl LineResult {
    fn checked(line: LineNumber) -> Self {
        LineResult {
            line: Some(line),
            ok: true,
            message: String::new(),
            kind: None,
        }
    }

    fn failed(line: Option<LineNumber>, error: &ProofError) -> Self {
        LineResult {
            line,
            ok: false,
            message: error.to_string(),
            kind: Some(error.kind()),
        }
    }
}

/// Outcome of checking a whole proof
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub struct CheckReport {
    /// False if the problem or some line has errors
    pub ok: bool,
    pub status: Status,
    pub complete: bool,
    pub message: String,
    #[cfg_attr(feature = "use-serde", serde(default))]
    pub lines: Vec<LineResult>,
}

impl CheckReport {
    /// A report for a problem that could not be set up
    pub fn invalid(error: &ProblemError) -> Self {
        CheckReport {
            ok: false,
            status: Status::Error,
            complete: false,
            message: error.to_string(),
            lines: Vec::new(),
        }
    }

    /// Line errors, in order
    pub fn errors(&self) -> impl Iterator<Item = &LineResult> {
        self.lines.iter().filter(|line| !line.ok)
    }
}

/// A problem together with a proof of it, as sent by an editor
///
/// The proof lines are either step descriptors or editor tuples.
///
/// # Example
/// ```
/// use fitch::driver::{CheckRequest, Status};
///
/// let request: CheckRequest = serde_json::from_str(r#"{
///     "logic": "TFL",
///     "premisesText": "P → Q, P",
///     "conclusionText": "Q",
///     "lines": [
///         {"kind": "premise", "indent": 0, "rawText": "P → Q"},
///         {"kind": "premise", "indent": 0, "rawText": "P"},
///         {"kind": "line", "indent": 0, "rawText": "Q; →E, 1,2"}
///     ]
/// }"#).unwrap();
/// assert_eq!(request.check().status, Status::Complete);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use-serde", serde(rename_all = "camelCase"))]
pub struct CheckRequest {
    pub logic: String,
    #[cfg_attr(feature = "use-serde", serde(default))]
    pub premises_text: String,
    #[cfg_attr(feature = "use-serde", serde(default))]
    pub conclusion_text: String,
    #[cfg_attr(feature = "use-serde", serde(default, alias = "steps"))]
    pub lines: ProofLines,
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use-serde", serde(untagged))]
pub enum ProofLines {
    Steps(Vec<StepDescriptor>),
    Editor(Vec<EditorLine>),
}

impl Default for ProofLines {
    fn default() -> Self {
        ProofLines::Steps(Vec::new())
    }
}

impl ProofLines {
    pub fn to_steps(&self) -> Vec<StepDescriptor> {
        match self {
            ProofLines::Steps(steps) => steps.clone(),
            ProofLines::Editor(lines) => steps_from_editor(lines),
        }
    }
}

impl CheckRequest {
    /// Sets up the problem and checks the proof against it
    pub fn check(&self) -> CheckReport {
        match self.problem() {
            Ok((logic, problem)) => check_proof(logic, &problem, &self.lines.to_steps()),
            Err(error) => {
                info!(%error, "invalid problem");
                CheckReport::invalid(&error)
            }
        }
    }

    /// Resolves the logic and parses premises and conclusion
    pub fn problem(&self) -> Result<(Logic, Problem), ProblemError> {
        let logic: Logic = self
            .logic
            .parse()
            .map_err(|_| ProblemError::UnknownLogic(self.logic.clone()))?;
        let problem = validate_problem(logic, &self.premises_text, &self.conclusion_text)?;
        Ok((logic, problem))
    }
}

struct Replay<'a> {
    proof: Proof,
    premises: &'a [Formula],
    restated: usize,
    first_error: Option<String>,
}

impl<'a> Replay<'a> {
    fn step(&mut self, descriptor: &StepDescriptor) -> LineResult {
        let result = descriptor
            .parse(self.proof.logic())
            .and_then(|step| self.apply(descriptor, step));
        match result {
            Ok(line) => LineResult::checked(line),
            Err(error) => {
                let line = if descriptor.kind == StepKind::Premise {
                    debug!(%error, "premise rejected");
                    Some(self.restated + 1).filter(|line| *line <= self.premises.len())
                } else {
                    Some(self.proof.reject(descriptor.kind))
                };
                let result = LineResult::failed(line, &error);
                if self.first_error.is_none() {
                    self.first_error = Some(match line {
                        Some(line) => StepError::new(line, error).to_string(),
                        None => error.to_string(),
                    });
                }
                result
            }
        }
    }

    fn apply(&mut self, descriptor: &StepDescriptor, step: ProofStep) -> ProofResult<LineNumber> {
        descriptor.check_indent(self.proof.depth())?;
        match step {
            ProofStep::Premise(formula) => self.restate(formula),
            step => self.proof.apply(step),
        }
    }

    /// Premises are already lines of the proof, a premise step only has to repeat the next one
    fn restate(&mut self, formula: Formula) -> ProofResult<LineNumber> {
        if self.proof.next_line() != self.premises.len() + 1 {
            return Err(ProofError::misplaced(
                "premises have to come before every other line",
            ));
        }
        match self.premises.get(self.restated) {
            Some(premise) if *premise == formula => {
                self.restated += 1;
                Ok(self.restated)
            }
            Some(premise) => Err(ProofError::mismatch(PREMISE, premise.to_string(), formula)),
            None => Err(ProofError::mismatch(PREMISE, "no further premise", formula)),
        }
    }
}

/// Checks `steps` as a proof of `problem` under `logic`
///
/// Every step gets a [`LineResult`]. The proof is complete if no step failed, every subproof
/// is closed and the last top level line is the conclusion.
pub fn check_proof(logic: Logic, problem: &Problem, steps: &[StepDescriptor]) -> CheckReport {
    let proof = match Proof::with_premises(
        logic,
        problem.premises.clone(),
        problem.conclusion.clone(),
    ) {
        Ok(proof) => proof,
        Err(error) => return CheckReport::invalid(&ProblemError::Premises(error)),
    };
    let mut replay = Replay {
        proof,
        premises: &problem.premises,
        restated: 0,
        first_error: None,
    };
    let lines: Vec<_> = steps.iter().map(|step| replay.step(step)).collect();

    let (status, message) = match (replay.first_error, replay.proof.check_complete()) {
        (Some(message), _) => (Status::Error, message),
        (None, Ok(())) => (Status::Complete, "Proof complete!".to_owned()),
        (None, Err(_)) => (
            Status::Incomplete,
            "No errors yet, but the proof is incomplete!".to_owned(),
        ),
    };
    info!(%logic, steps = steps.len(), ?status, "checked proof");
    CheckReport {
        ok: status != Status::Error,
        status,
        complete: status == Status::Complete,
        message,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    fn step(kind: StepKind, indent: Depth, text: &str) -> StepDescriptor {
        StepDescriptor::new(kind, indent, text)
    }

    fn problem(logic: Logic, premises: &str, conclusion: &str) -> Problem {
        validate_problem(logic, premises, conclusion).unwrap()
    }

    #[test]
    fn problems() {
        assert_eq!(
            validate_problem(Logic::Tfl, "P, Q ∧", "P").unwrap_err().kind(),
            ErrorKind::SyntaxError
        );
        let error = validate_problem(Logic::Tfl, "", "").unwrap_err();
        assert!(error.to_string().starts_with("Invalid conclusion: "));
        assert_eq!(
            validate_problem(Logic::Fol, "Fa", "□Fa").unwrap_err().kind(),
            ErrorKind::OperatorNotSupportedError
        );
        assert_eq!(
            validate_problem(Logic::Fol, "", "Fx").unwrap_err().kind(),
            ErrorKind::SyntaxError
        );
    }

    #[test]
    fn modus_ponens() {
        use StepKind::*;
        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "P → Q, P", "Q"),
            &[
                step(Premise, 0, "P→Q"),
                step(Premise, 0, "P"),
                step(Line, 0, "Q; →E, 1,2"),
            ],
        );
        assert_eq!(report.status, Status::Complete);
        assert!(report.complete && report.ok);
        assert_eq!(report.message, "Proof complete!");
        let numbers: Vec<_> = report.lines.iter().map(|l| l.line).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn premises_are_implicit() {
        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "P → Q, P", "Q"),
            &[step(StepKind::Line, 0, "Q; →E, 1,2")],
        );
        assert_eq!(report.status, Status::Complete);
        assert_eq!(report.lines[0].line, Some(3));
    }

    #[test]
    fn wrong_premises() {
        use StepKind::*;
        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "P", "P"),
            &[
                step(Premise, 0, "Q"),
                step(Premise, 0, "P"),
                step(Premise, 0, "P"),
            ],
        );
        let kinds: Vec<_> = report.lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Some(ErrorKind::RuleMismatchError),
                None,
                Some(ErrorKind::RuleMismatchError)
            ]
        );
        assert_eq!(report.lines[2].line, None);
        assert_eq!(report.status, Status::Error);

        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "P", "P"),
            &[step(Line, 0, "P; R 1"), step(Premise, 0, "P")],
        );
        assert_eq!(report.lines[1].kind, Some(ErrorKind::ScopeError));
    }

    #[test]
    fn errors_do_not_shift_lines() {
        use StepKind::*;
        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "", "P → P"),
            &[
                step(Assumption, 1, "P"),
                step(Line, 1, "P; R"),
                step(Line, 1, "P; R 1"),
                step(CloseSubproof, 0, "P → P; →I 1-3"),
            ],
        );
        let oks: Vec<_> = report.lines.iter().map(|l| l.ok).collect();
        assert_eq!(oks, vec![true, false, true, true]);
        assert_eq!(report.lines[1].kind, Some(ErrorKind::RuleMismatchError));
        assert_eq!(report.lines[3].line, Some(4));
        assert_eq!(report.status, Status::Error);
        assert!(!report.complete);
        assert!(report.message.starts_with("line 2: "));
    }

    #[test]
    fn indentation_is_checked() {
        use StepKind::*;
        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "", "P → P"),
            &[step(Assumption, 1, "P"), step(Line, 0, "P; R 1")],
        );
        assert_eq!(report.lines[1].kind, Some(ErrorKind::ScopeError));

        let unindented = StepDescriptor {
            kind: Line,
            indent: None,
            raw_text: "P; R 1".to_owned(),
        };
        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "", "P → P"),
            &[step(Assumption, 1, "P"), unindented],
        );
        assert!(report.lines[1].ok);
    }

    #[test]
    fn incomplete() {
        use StepKind::*;
        let report = check_proof(
            Logic::Tfl,
            &problem(Logic::Tfl, "", "P → P"),
            &[step(Assumption, 1, "P")],
        );
        assert_eq!(report.status, Status::Incomplete);
        assert!(report.ok && !report.complete);
        assert_eq!(report.message, "No errors yet, but the proof is incomplete!");
        assert_eq!(
            check_proof(Logic::Tfl, &problem(Logic::Tfl, "", "P → P"), &[]).status,
            Status::Incomplete
        );
    }

    #[test]
    fn editor_lines() {
        let line = |indent, flags, text: &str, justification: &str| {
            EditorLine(indent, flags, text.to_owned(), justification.to_owned())
        };
        let steps = steps_from_editor(&[
            line(0, PREMISE_FLAG, "P ∨ Q", ""),
            line(1, ASSUMPTION_FLAG, "P", ""),
            line(1, 0, "Q ∨ P", "∨I 2"),
            line(1, ASSUMPTION_FLAG, "Q", ""),
            line(1, 0, "Q ∨ P", "∨I 4"),
            line(0, 0, "Q ∨ P", "∨E 1, 2-3, 4-5"),
        ]);
        let kinds: Vec<_> = steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Premise,
                StepKind::Assumption,
                StepKind::Line,
                StepKind::CloseAndReopen,
                StepKind::Line,
                StepKind::CloseSubproof
            ]
        );
        let report = check_proof(Logic::Tfl, &problem(Logic::Tfl, "P ∨ Q", "Q ∨ P"), &steps);
        assert_eq!(report.status, Status::Complete, "{:?}", report);
    }

    #[test]
    fn unknown_logic() {
        let request = CheckRequest {
            logic: "LP".to_owned(),
            premises_text: String::new(),
            conclusion_text: "P".to_owned(),
            lines: ProofLines::default(),
        };
        let report = request.check();
        assert_eq!(report.status, Status::Error);
        assert_eq!(report.message, "Unknown logic: \"LP\".");
        assert!(report.lines.is_empty());
    }

    #[derive(Clone, Debug)]
    struct Lines(Vec<StepDescriptor>);

    impl Arbitrary for Lines {
        fn arbitrary(g: &mut Gen) -> Self {
            const TEXTS: &[&str] = &[
                "P",
                "Q",
                "P ∧ Q",
                "P; R 1",
                "Q; →E 1, 2",
                "P ∧ Q; ∧I 1, 2",
                "P → Q; →I 2-3",
                "⊥; ¬E 1, 2",
                "¬P; ¬I 1-4",
                "Q; ∧E 3",
            ];
            const KINDS: &[StepKind] = &[
                StepKind::Premise,
                StepKind::Assumption,
                StepKind::Line,
                StepKind::CloseSubproof,
                StepKind::CloseAndReopen,
            ];
            let len = usize::arbitrary(g) % 8;
            Lines(
                (0..len)
                    .map(|_| {
                        let kind = *g.choose(KINDS).unwrap_or(&StepKind::Line);
                        let text = *g.choose(TEXTS).unwrap_or(&"P");
                        let indent = usize::arbitrary(g) % 3;
                        StepDescriptor::new(kind, indent, text)
                    })
                    .collect(),
            )
        }
    }

    quickcheck! {
        fn check_is_idempotent(lines: Lines) -> bool {
            let problem = problem(Logic::Tfl, "P, Q", "P ∧ Q");
            let first = check_proof(Logic::Tfl, &problem, &lines.0);
            let second = check_proof(Logic::Tfl, &problem, &lines.0);
            first == second && first.lines.len() == lines.0.len()
        }
    }
}

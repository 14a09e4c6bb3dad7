//! The proof context stack: the lines written so far and the nesting of subproofs around
//! them.
//!
//! Every line remembers the innermost subproof it was written in. A line is visible from the
//! current position iff that subproof is still open, so nothing inside a closed subproof can
//! be cited line by line anymore. Subproofs opened with `□` start a new world; the number of
//! such subproofs between a cited line and the current position is its *world distance*.

#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::{ProofError, ProofResult},
    formula::Formula,
    proof::{Citation, Justification},
    types::*,
};

/// Index of a [`SubproofFrame`] in the order the subproofs were opened
pub type FrameId = usize;

/// How a line entered the proof
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum Role {
    Premise,
    Assumption,
    /// First line of a subproof opening a new world, with or without a hypothesis
    World,
    Derived,
}

/// A line of a proof that has been checked successfully
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub struct ProofLine {
    /// 1-based line number
    pub index: LineNumber,
    /// Number of subproofs the line is nested in
    pub depth: Depth,
    /// `None` only for the `□` line opening a world without a hypothesis
    pub formula: Option<Formula>,
    pub role: Role,
    pub justification: Option<Justification>,
}

/// A subproof, open or closed
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SubproofFrame {
    /// Line of the assumption (or `□`) opening the subproof
    pub opened_at: LineNumber,
    /// Last line of the subproof once it is closed
    pub closed_at: Option<LineNumber>,
    pub depth: Depth,
    /// Opens a new world
    pub strict: bool,
    parent: Option<FrameId>,
}

/// A closed subproof as seen by a rule citing it
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SubproofView<'a> {
    pub first: LineNumber,
    pub last: LineNumber,
    pub strict: bool,
    /// The assumption; `None` for a world opened without hypothesis
    pub hypothesis: Option<&'a Formula>,
    /// The formula on the last line
    pub conclusion: &'a Formula,
}

#[derive(Clone, Debug)]
enum Slot {
    Line(ProofLine),
    /// Line that failed to check; it keeps its number but cannot be cited
    Rejected { depth: Depth },
}

#[derive(Clone, Debug)]
struct Entry {
    slot: Slot,
    frame: Option<FrameId>,
}

/// Lines and subproof frames of a proof under construction
///
/// Only the owner of the context mutates it; rules see it through shared references.
#[derive(Clone, Debug, Default)]
pub struct Context {
    entries: Vec<Entry>,
    frames: Vec<SubproofFrame>,
    open: Vec<FrameId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open subproofs
    pub fn depth(&self) -> Depth {
        self.open.len()
    }

    /// Number the next line will get
    pub fn next_line(&self) -> LineNumber {
        self.entries.len() + 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn current_frame(&self) -> Option<FrameId> {
        self.open.last().copied()
    }

    /// Opens a subproof whose first line will be the next line
    pub fn open_frame(&mut self, strict: bool) -> FrameId {
        let id = self.frames.len();
        self.frames.push(SubproofFrame {
            opened_at: self.next_line(),
            closed_at: None,
            depth: self.depth() + 1,
            strict,
            parent: self.current_frame(),
        });
        self.open.push(id);
        id
    }

    /// Closes the innermost open subproof after its last line
    pub fn close_frame(&mut self) -> Option<FrameId> {
        let id = self.open.pop()?;
        self.frames[id].closed_at = Some(self.entries.len());
        Some(id)
    }

    /// Reverts [`close_frame`](Self::close_frame), given the id it returned
    pub fn reopen_frame(&mut self, id: FrameId) {
        self.frames[id].closed_at = None;
        self.open.push(id);
    }

    /// Appends a checked line at the current depth
    pub fn push(
        &mut self,
        formula: Option<Formula>,
        role: Role,
        justification: Option<Justification>,
    ) -> LineNumber {
        let index = self.next_line();
        self.entries.push(Entry {
            slot: Slot::Line(ProofLine {
                index,
                depth: self.depth(),
                formula,
                role,
                justification,
            }),
            frame: self.current_frame(),
        });
        index
    }

    /// Appends a line that failed to check at the current depth
    pub fn push_rejected(&mut self) -> LineNumber {
        let index = self.next_line();
        self.entries.push(Entry {
            slot: Slot::Rejected {
                depth: self.depth(),
            },
            frame: self.current_frame(),
        });
        index
    }

    pub fn line(&self, index: LineNumber) -> Option<&ProofLine> {
        match &self.entries.get(index.checked_sub(1)?)?.slot {
            Slot::Line(line) => Some(line),
            Slot::Rejected { .. } => None,
        }
    }

    /// All lines that checked successfully, in order
    pub fn lines(&self) -> impl Iterator<Item = &ProofLine> {
        self.entries.iter().filter_map(|entry| match &entry.slot {
            Slot::Line(line) => Some(line),
            Slot::Rejected { .. } => None,
        })
    }

    /// Depth of every line, rejected or not
    pub fn depths(&self) -> impl Iterator<Item = Depth> + '_ {
        self.entries.iter().map(|entry| match &entry.slot {
            Slot::Line(line) => line.depth,
            Slot::Rejected { depth } => *depth,
        })
    }

    pub fn has_rejected(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry.slot, Slot::Rejected { .. }))
    }

    /// Returns true if only premises have been written so far
    pub fn only_premises(&self) -> bool {
        self.frames.is_empty()
            && self.entries.iter().all(|entry| match &entry.slot {
                Slot::Line(line) => line.role == Role::Premise,
                Slot::Rejected { .. } => true,
            })
    }

    fn is_open(&self, frame: Option<FrameId>) -> bool {
        match frame {
            None => true,
            Some(id) => self.open.contains(&id),
        }
    }

    /// Number of worlds opened between `frame` (which must be open) and the current position
    fn world_distance(&self, frame: Option<FrameId>) -> usize {
        let inner = match frame {
            None => &self.open[..],
            Some(id) => match self.open.iter().position(|f| *f == id) {
                Some(i) => &self.open[i + 1..],
                None => &[],
            },
        };
        inner.iter().filter(|id| self.frames[**id].strict).count()
    }

    /// Resolves `n` to the formula on line `n` and its world distance
    ///
    /// # Errors
    /// * `Scope` - if line `n` is not before the current line, failed to check, lies inside a
    /// closed subproof or only opens a world
    pub fn resolve_line(&self, n: LineNumber) -> ProofResult<(&Formula, usize)> {
        let citation = Citation::Line(n);
        let entry = n
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| ProofError::scope(citation.clone(), "it is not an earlier line"))?;
        let line = match &entry.slot {
            Slot::Line(line) => line,
            Slot::Rejected { .. } => {
                return Err(ProofError::scope(citation, "the line has errors"))
            }
        };
        if !self.is_open(entry.frame) {
            return Err(ProofError::scope(citation, "it lies in a closed subproof"));
        }
        let formula = line
            .formula
            .as_ref()
            .ok_or_else(|| ProofError::scope(citation, "the line only opens a new world"))?;
        let distance = self.world_distance(entry.frame);
        trace!(line = n, distance, "resolved line");
        Ok((formula, distance))
    }

    /// Resolves `n-m` to the closed subproof spanning exactly these lines
    ///
    /// # Errors
    /// * `Scope` - if no subproof spans `n-m`, it is still open, it lies inside another closed
    /// subproof or world, or its first or last line failed to check
    pub fn resolve_range(&self, n: LineNumber, m: LineNumber) -> ProofResult<SubproofView<'_>> {
        let citation = Citation::Range(n, m);
        let frame = self
            .frames
            .iter()
            .find(|frame| frame.opened_at == n)
            .ok_or_else(|| ProofError::scope(citation.clone(), "no subproof starts there"))?;
        match frame.closed_at {
            None => {
                return Err(ProofError::scope(citation, "the subproof is still open"));
            }
            Some(last) if last != m => {
                return Err(ProofError::scope(
                    citation,
                    format!("the subproof ends at line {}", last),
                ));
            }
            Some(_) => {}
        }
        if !self.is_open(frame.parent) {
            return Err(ProofError::scope(citation, "it lies in a closed subproof"));
        }
        if self.world_distance(frame.parent) > 0 {
            return Err(ProofError::scope(citation, "it lies in another world"));
        }
        let (first, last) = match (self.line(n), self.line(m)) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ProofError::scope(citation, "the subproof has errors")),
        };
        let conclusion = last
            .formula
            .as_ref()
            .ok_or_else(|| ProofError::scope(citation, "the subproof has no conclusion"))?;
        trace!(first = n, last = m, strict = frame.strict, "resolved subproof");
        Ok(SubproofView {
            first: n,
            last: m,
            strict: frame.strict,
            hypothesis: first.formula.as_ref(),
            conclusion,
        })
    }

    /// Premises and the hypotheses of all open subproofs
    pub fn open_assumptions(&self) -> impl Iterator<Item = &Formula> {
        let premises = self.lines().filter(|line| line.role == Role::Premise);
        let hypotheses = self
            .open
            .iter()
            .filter_map(move |id| self.line(self.frames[*id].opened_at));
        premises
            .chain(hypotheses)
            .filter_map(|line| line.formula.as_ref())
    }

    /// Every formula that can be cited from the current position, in any world
    pub fn visible_formulas(&self) -> impl Iterator<Item = &Formula> {
        self.entries
            .iter()
            .filter(move |entry| self.is_open(entry.frame))
            .filter_map(|entry| match &entry.slot {
                Slot::Line(line) => line.formula.as_ref(),
                Slot::Rejected { .. } => None,
            })
    }

    /// The last line, if it was written outside of all subproofs
    pub fn last_top_level(&self) -> Option<&ProofLine> {
        match self.entries.last() {
            Some(Entry {
                slot: Slot::Line(line),
                frame: None,
            }) => Some(line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn letter(name: &str) -> Option<Formula> {
        Some(Formula::letter(name))
    }

    /// ```text
    /// 1 | P          premise
    /// 2 | | Q        assumption
    /// 3 | | Q        derived
    /// 4 | R          derived
    /// 5 | | □
    /// 6 | | S        derived
    /// ```
    fn sample() -> Context {
        let mut ctx = Context::new();
        ctx.push(letter("P"), Role::Premise, None);
        ctx.open_frame(false);
        ctx.push(letter("Q"), Role::Assumption, None);
        ctx.push(letter("Q"), Role::Derived, None);
        ctx.close_frame();
        ctx.push(letter("R"), Role::Derived, None);
        ctx.open_frame(true);
        ctx.push(None, Role::World, None);
        ctx.push(letter("S"), Role::Derived, None);
        ctx
    }

    #[test]
    fn depths() {
        let ctx = sample();
        assert_eq!(ctx.depths().collect::<Vec<_>>(), vec![0, 1, 1, 0, 1, 1]);
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.next_line(), 7);
    }

    #[test]
    fn closed_lines_are_hidden() {
        let ctx = sample();
        for n in &[2, 3] {
            assert_eq!(
                ctx.resolve_line(*n).unwrap_err().kind(),
                ErrorKind::ScopeError
            );
        }
        assert_eq!(ctx.resolve_line(7).unwrap_err().kind(), ErrorKind::ScopeError);
        assert_eq!(ctx.resolve_line(0).unwrap_err().kind(), ErrorKind::ScopeError);
        assert_eq!(ctx.resolve_line(5).unwrap_err().kind(), ErrorKind::ScopeError);
    }

    #[test]
    fn world_distance() {
        let ctx = sample();
        assert_eq!(ctx.resolve_line(1).unwrap(), (&Formula::letter("P"), 1));
        assert_eq!(ctx.resolve_line(4).unwrap(), (&Formula::letter("R"), 1));
        assert_eq!(ctx.resolve_line(6).unwrap(), (&Formula::letter("S"), 0));
    }

    #[test]
    fn ranges() {
        let mut ctx = sample();
        // inside another world
        assert_eq!(
            ctx.resolve_range(2, 3).unwrap_err().kind(),
            ErrorKind::ScopeError
        );
        assert_eq!(
            ctx.resolve_range(5, 6).unwrap_err().kind(),
            ErrorKind::ScopeError
        );
        ctx.close_frame();
        let view = ctx.resolve_range(2, 3).unwrap();
        assert_eq!(view.hypothesis, Some(&Formula::letter("Q")));
        assert!(!view.strict);
        let view = ctx.resolve_range(5, 6).unwrap();
        assert_eq!(view.hypothesis, None);
        assert_eq!(view.conclusion, &Formula::letter("S"));
        assert!(view.strict);
        assert_eq!(
            ctx.resolve_range(2, 4).unwrap_err().kind(),
            ErrorKind::ScopeError
        );
    }

    #[test]
    fn rejected_lines_keep_numbers() {
        let mut ctx = sample();
        assert_eq!(ctx.push_rejected(), 7);
        assert_eq!(ctx.push(letter("T"), Role::Derived, None), 8);
        assert_eq!(ctx.resolve_line(7).unwrap_err().kind(), ErrorKind::ScopeError);
        assert!(ctx.has_rejected());
        assert_eq!(ctx.lines().count(), 7);
    }

    #[test]
    fn assumptions() {
        let ctx = sample();
        let open: Vec<_> = ctx.open_assumptions().cloned().collect();
        assert_eq!(open, vec![Formula::letter("P")]);
        let visible: Vec<_> = ctx.visible_formulas().cloned().collect();
        assert_eq!(
            visible,
            vec![Formula::letter("P"), Formula::letter("R"), Formula::letter("S")]
        );
    }
}

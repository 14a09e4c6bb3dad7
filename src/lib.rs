//! `fitch` checks natural deduction proofs written in Fitch notation, in the style of the
//! forallx textbooks. It covers truth-functional logic (TFL), first-order logic (FOL), the
//! modal logics K, T, S4 and S5 and their first-order counterparts.
//!
//! # Main data structures
//!
//! ## Formulas
//! A [`Formula`] is the AST of a sentence such as _∀x(Fx → □Gx)_. Its atoms are sentence
//! letters, predicates applied to [`Term`]s, equalities and ⊥. Which node kinds a formula may
//! contain depends on the [`Logic`] it is parsed under.
//!
//! ## Logics
//! A [`Logic`] names one of the supported systems. It decides which operators are allowed,
//! which rules exist (see [`rules`]) and, for modal logics, how far a □ formula may be carried
//! into a nested world ([`WorldDiscipline`]).
//!
//! ## Proofs
//! A [`Proof`] is built line by line. Every new line carries a [`Justification`], a rule name
//! and citations of earlier lines or closed subproofs, and is checked the moment it is
//! added. Invalid steps are refused and leave the proof unchanged. Subproofs are opened with
//! an assumption and closed by the line that discharges it; modal logics also have strict
//! subproofs standing for an arbitrary accessible world.
//!
//! Whole proofs given as text are checked with [`driver::check_proof`], which reports on
//! every line instead of stopping at the first error.

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod context;
pub mod driver;
pub mod error;
pub mod formula;
pub mod logic;
pub mod proof;
pub mod rules;
pub mod serialization;
pub mod substitution;
mod types;
mod verifier;

pub use context::{ProofLine, Role};
pub use error::{ErrorKind, ProofError, ProofResult, StepError};
pub use formula::{Formula, NodeKind, Term};
pub use logic::{Logic, WorldDiscipline};
pub use proof::{Justification, Proof};
pub use types::*;

use std::fmt;

#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{formula::NodeKind, logic::Logic, proof::Citation, types::*};

/// Result type for everything the kernel does
pub type ProofResult<T> = Result<T, ProofError>;

/// A error which is produced when parsing or checking a proof fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// Malformed formula, term, justification or line text
    #[error("could not parse \"{fragment}\": {message}")]
    Syntax { message: String, fragment: String },
    /// Operator that exists in general but not under the selected logic
    #[error("{operator} is not allowed in {logic}")]
    OperatorNotSupported { operator: NodeKind, logic: Logic },
    /// Citation of a line or subproof that is not visible from the current line, or a step
    /// placed where the subproof structure does not allow it
    #[error("{}{reason}", cited(.citation))]
    Scope {
        citation: Option<Citation>,
        reason: String,
    },
    /// Rule name not available in the selected logic
    #[error("\"{rule}\" is not a rule of {logic}")]
    UnknownRule { rule: String, logic: Logic },
    /// Cited formulas or the new formula do not have the shape the rule requires
    #[error("{rule}: expected {expected}, found {found}")]
    RuleMismatch {
        rule: &'static str,
        expected: String,
        found: String,
    },
    /// A name that has to be new occurs where it must not
    #[error("{rule}: {name} must not occur in {occurs_in}")]
    FreshnessViolation {
        rule: &'static str,
        name: String,
        occurs_in: String,
    },
    /// The proof is consistent so far but does not derive the conclusion yet
    #[error("proof incomplete: {reason}")]
    IncompleteProof { reason: String },
}

impl ProofError {
    pub fn syntax(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        ProofError::Syntax {
            message: message.into(),
            fragment: fragment.into(),
        }
    }

    pub fn scope(citation: Citation, reason: impl Into<String>) -> Self {
        ProofError::Scope {
            citation: Some(citation),
            reason: reason.into(),
        }
    }

    /// A scope error not caused by a citation
    pub fn misplaced(reason: impl Into<String>) -> Self {
        ProofError::Scope {
            citation: None,
            reason: reason.into(),
        }
    }

    pub fn mismatch(
        rule: &'static str,
        expected: impl Into<String>,
        found: impl fmt::Display,
    ) -> Self {
        ProofError::RuleMismatch {
            rule,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    pub fn not_fresh(
        rule: &'static str,
        name: impl Into<String>,
        occurs_in: impl Into<String>,
    ) -> Self {
        ProofError::FreshnessViolation {
            rule,
            name: name.into(),
            occurs_in: occurs_in.into(),
        }
    }

    pub fn incomplete(reason: impl Into<String>) -> Self {
        ProofError::IncompleteProof {
            reason: reason.into(),
        }
    }

    /// Returns the kind of this error without its details
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProofError::Syntax { .. } => ErrorKind::SyntaxError,
            ProofError::OperatorNotSupported { .. } => ErrorKind::OperatorNotSupportedError,
            ProofError::Scope { .. } => ErrorKind::ScopeError,
            ProofError::UnknownRule { .. } => ErrorKind::UnknownRuleError,
            ProofError::RuleMismatch { .. } => ErrorKind::RuleMismatchError,
            ProofError::FreshnessViolation { .. } => ErrorKind::FreshnessViolation,
            ProofError::IncompleteProof { .. } => ErrorKind::IncompleteProof,
        }
    }
}

fn cited(citation: &Option<Citation>) -> String {
    match citation {
        Some(citation) => format!("{} cannot be cited here: ", citation),
        None => String::new(),
    }
}

/// The kind of a [`ProofError`], as reported per line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum ErrorKind {
    SyntaxError,
    OperatorNotSupportedError,
    ScopeError,
    UnknownRuleError,
    RuleMismatchError,
    FreshnessViolation,
    IncompleteProof,
}

/// A [`ProofError`] localized to the line that produced it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {error}")]
pub struct StepError {
    pub line: LineNumber,
    #[source]
    pub error: ProofError,
}

impl StepError {
    pub fn new(line: LineNumber, error: ProofError) -> Self {
        StepError { line, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

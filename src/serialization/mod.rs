//! Text notation of formulas, justifications and proof lines
//!
//! Parsing is implemented with `nom`; every entry point returns a [`ProofError`] on malformed
//! input, pointing at the position the parser got furthest to.
//!
//! [`ProofError`]: crate::ProofError

mod command;
pub mod error;
mod formatter;

pub use command::*;
pub use formatter::*;

/// Type alias for a 1-based line number in a proof (see [`ProofLine`][crate::ProofLine])
pub type LineNumber = usize;

/// Type alias for the subproof nesting depth of a line, `0` being the top level
pub type Depth = usize;

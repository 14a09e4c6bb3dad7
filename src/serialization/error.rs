use std::fmt::Display;

use nom::{
    error::{ContextError, ErrorKind, ParseError},
    IResult, Parser,
};

use crate::error::ProofError;

/// A nom error that keeps the failure which got furthest into the input
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyError<I>(Vec<(I, GreedyErrorKind)>);

#[derive(Debug, Clone, PartialEq)]
enum GreedyErrorKind {
    Context(&'static str),
    Nom(ErrorKind),
    Char(char),
}

pub trait Length {
    fn length(&self) -> usize;
}

impl Length for &str {
    fn length(&self) -> usize {
        self.len()
    }
}

/// Longest prefix of the offending input shown in messages
const FRAGMENT_CHARS: usize = 20;

impl<'a> GreedyError<&'a str> {
    /// The remaining input at the deepest failure
    fn position(&self) -> &'a str {
        self.0.first().map(|(input, _)| *input).unwrap_or("")
    }

    /// The innermost context label, if any parser on the failing path set one
    fn context(&self) -> Option<&'static str> {
        self.0.iter().find_map(|(_, kind)| match kind {
            GreedyErrorKind::Context(ctx) => Some(*ctx),
            _ => None,
        })
    }

    fn fragment(&self) -> String {
        let position = self.position();
        if position.is_empty() {
            "end of input".to_owned()
        } else {
            position.chars().take(FRAGMENT_CHARS).collect()
        }
    }
}

impl Display for GreedyError<&str> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (input, error) in self.0.iter() {
            let shown: String = input.chars().take(FRAGMENT_CHARS).collect();
            writeln!(f, "{:?} {:?}", error, shown)?;
        }
        Ok(())
    }
}

impl<I> ParseError<I> for GreedyError<I>
where
    I: Length,
{
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        Self(vec![(input, GreedyErrorKind::Nom(kind))])
    }

    fn append(input: I, kind: ErrorKind, mut other: Self) -> Self {
        other.0.push((input, GreedyErrorKind::Nom(kind)));
        other
    }

    fn from_char(input: I, c: char) -> Self {
        Self(vec![(input, GreedyErrorKind::Char(c))])
    }

    fn or(self, other: Self) -> Self {
        match (self.0.first(), other.0.first()) {
            (Some((a, _)), Some((b, _))) if a.length() < b.length() => self,
            (Some(_), None) => self,
            _ => other,
        }
    }
}

impl<I> ContextError<I> for GreedyError<I> {
    fn add_context(input: I, ctx: &'static str, mut other: Self) -> Self {
        other.0.push((input, GreedyErrorKind::Context(ctx)));
        other
    }
}

impl From<nom::Err<GreedyError<&str>>> for ProofError {
    fn from(error: nom::Err<GreedyError<&str>>) -> Self {
        match error {
            nom::Err::Incomplete(_) => ProofError::syntax("unexpected end of input", "end of input"),
            nom::Err::Error(e) | nom::Err::Failure(e) => ProofError::syntax(
                format!("expected {}", e.context().unwrap_or("well-formed input")),
                e.fragment(),
            ),
        }
    }
}

/// Turns recoverable errors of `f` into failures, so that no alternative is tried anymore
pub fn or_fail<I, O, E: ParseError<I>, F>(mut f: F) -> impl FnMut(I) -> IResult<I, O, E>
where
    F: Parser<I, O, E>,
{
    move |input| {
        f.parse(input).map_err(|error| match error {
            nom::Err::Error(e) => nom::Err::Failure(e),
            e => e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::{
        branch::alt, bytes::complete::tag, combinator::recognize, error::context, sequence::pair,
    };

    fn parser(input: &str) -> IResult<&str, &str, GreedyError<&str>> {
        alt((
            context("ab", recognize(pair(tag("a"), tag("b")))),
            context("c", tag("c")),
        ))(input)
    }

    #[test]
    fn deepest_failure_wins() {
        let err = ProofError::from(parser("ax").unwrap_err());
        assert_eq!(err, ProofError::syntax("expected ab", "x"));
    }

    #[test]
    fn short_fragment_does_not_panic() {
        match ProofError::from(parser("").unwrap_err()) {
            ProofError::Syntax { fragment, .. } => assert_eq!(fragment, "end of input"),
            e => panic!("unexpected error {}", e),
        }
    }
}

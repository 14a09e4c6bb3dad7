use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, one_of},
    combinator::{all_consuming, map, map_opt, opt, recognize, rest, verify},
    error::context,
    multi::{many0_count, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::{
    error::{ProofError, ProofResult},
    formula::{Formula, NodeKind},
    logic::Logic,
    proof::{Citation, Hypothesis, Justification},
    types::*,
};

use super::{
    error::{or_fail, GreedyError},
    parse_formula,
};

type ParseResult<'a, T> = IResult<&'a str, T, GreedyError<&'a str>>;

/// Glyphs that may appear in rule names besides letters and digits
const RULE_GLYPHS: &str = "∧∨→↔¬⊥∀∃□♢◇=";

/// Written in premise lists to state that there are no premises
const NO_PREMISES: &str = "NA";

fn rule_name(input: &str) -> ParseResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || RULE_GLYPHS.contains(c))(input)
}

fn line_number(input: &str) -> ParseResult<LineNumber> {
    map_opt(digit1, |s: &str| s.parse::<LineNumber>().ok().filter(|n| *n > 0))(input)
}

fn citation(input: &str) -> ParseResult<Citation> {
    let (input, first) = line_number(input)?;
    let (input, last) = opt(preceded(
        one_of("-–"),
        context(
            "range n-m with n < m",
            or_fail(verify(line_number, |last: &LineNumber| *last > first)),
        ),
    ))(input)?;
    let citation = match last {
        Some(last) => Citation::Range(first, last),
        None => Citation::Line(first),
    };
    Ok((input, citation))
}

fn separator(input: &str) -> ParseResult<()> {
    alt((
        map(delimited(multispace0, char(','), multispace0), |_| ()),
        map(multispace1, |_| ()),
    ))(input)
}

/// Parses `<rule>[,] <citation>, ...`
pub fn justification(input: &str) -> ParseResult<Justification> {
    let (input, rule) = context("rule name", rule_name)(input)?;
    let (input, citations) = map(
        opt(preceded(
            separator,
            context("citation", separated_list1(separator, citation)),
        )),
        Option::unwrap_or_default,
    )(input)?;
    Ok((
        input,
        Justification {
            rule: rule.to_owned(),
            citations,
        },
    ))
}

/// Parses a justification such as `→E, 1,2` or `∨E 1, 2-4, 5-7`
///
/// # Example
/// ```
/// use fitch::{serialization::parse_justification, proof::Citation};
///
/// let j = parse_justification("∨E, 1, 2-4, 5–7").unwrap();
/// assert_eq!(j.rule, "∨E");
/// assert_eq!(
///     j.citations,
///     vec![Citation::Line(1), Citation::Range(2, 4), Citation::Range(5, 7)]
/// );
/// assert!(parse_justification("¬I, 4-2").is_err());
/// assert!(parse_justification("→E; 1").is_err());
/// ```
pub fn parse_justification(text: &str) -> ProofResult<Justification> {
    let (_, justification) =
        all_consuming(delimited(multispace0, justification, multispace0))(text)?;
    Ok(justification)
}

/// Splits `<formula>; <justification>` (or `|` instead of `;`) and parses both parts
pub fn parse_line(text: &str, logic: Logic) -> ProofResult<(Formula, Justification)> {
    let (formula, justification) = text
        .split_once(|c| c == ';' || c == '|')
        .ok_or_else(|| ProofError::syntax("expected \"; <rule> <citations>\"", text.trim()))?;
    Ok((
        parse_formula(formula, logic)?,
        parse_justification(justification)?,
    ))
}

/// Parses the text of an assumption
///
/// A bare `□` opens a new world, `□: φ` opens a new world assuming `φ` in it.
///
/// # Example
/// ```
/// use fitch::{serialization::parse_hypothesis, proof::Hypothesis, Formula, Logic};
///
/// let p = Formula::letter("P");
/// assert_eq!(parse_hypothesis("P", Logic::Tfl), Ok(Hypothesis::Assume(p.clone())));
/// assert_eq!(parse_hypothesis(" □ ", Logic::Mlk), Ok(Hypothesis::World(None)));
/// assert_eq!(parse_hypothesis("□: P", Logic::Mlk), Ok(Hypothesis::World(Some(p.clone()))));
/// assert_eq!(
///     parse_hypothesis("□P", Logic::Mlk),
///     Ok(Hypothesis::Assume(Formula::necessarily(p)))
/// );
/// assert!(parse_hypothesis("□", Logic::Tfl).is_err());
/// ```
pub fn parse_hypothesis(text: &str, logic: Logic) -> ProofResult<Hypothesis> {
    let world: ParseResult<Option<&str>> = all_consuming(preceded(
        pair(multispace0, char('□')),
        preceded(
            multispace0,
            alt((
                map(preceded(char(':'), rest), Some),
                map(multispace0, |_| None),
            )),
        ),
    ))(text);
    match world {
        Ok((_, hypothesis)) => {
            if !logic.is_modal() {
                return Err(ProofError::OperatorNotSupported {
                    operator: NodeKind::Necessarily,
                    logic,
                });
            }
            let hypothesis = hypothesis.map(|h| parse_formula(h, logic)).transpose()?;
            Ok(Hypothesis::World(hypothesis))
        }
        Err(_) => parse_formula(text, logic).map(Hypothesis::Assume),
    }
}

/// Splits a premise list on top level `,` and `;`
///
/// # Example
/// ```
/// use fitch::serialization::split_premises;
///
/// assert_eq!(split_premises("P → Q, P"), vec!["P → Q", "P"]);
/// assert_eq!(split_premises("F(a, b); ∀x(Fx ∧ Gx)"), vec!["F(a, b)", "∀x(Fx ∧ Gx)"]);
/// assert!(split_premises(" NA ").is_empty());
/// assert!(split_premises("").is_empty());
/// ```
pub fn split_premises(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() || text == NO_PREMISES {
        return Vec::new();
    }
    match all_consuming(separated_list0(one_of(",;"), premise))(text) {
        Ok((_, premises)) => premises.into_iter().map(str::trim).collect(),
        // unbalanced parentheses, left to the formula parser to report
        Err(_) => vec![text],
    }
}

/// Text with balanced parentheses
fn balanced(input: &str) -> ParseResult<&str> {
    recognize(many0_count(alt((
        is_not("()"),
        recognize(delimited(char('('), balanced, char(')'))),
    ))))(input)
}

/// One premise, up to the next `,` or `;` outside parentheses
fn premise(input: &str) -> ParseResult<&str> {
    recognize(many0_count(alt((
        is_not("(),;"),
        recognize(delimited(char('('), balanced, char(')'))),
    ))))(input)
}

/// Parses every premise of a premise list
pub fn parse_premises(text: &str, logic: Logic) -> ProofResult<Vec<Formula>> {
    split_premises(text)
        .into_iter()
        .map(|premise| parse_formula(premise, logic))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn justifications() {
        let j = parse_justification("→E, 1,2").unwrap();
        assert_eq!(j.rule, "→E");
        assert_eq!(j.citations, vec![Citation::Line(1), Citation::Line(2)]);

        let j = parse_justification(" =I ").unwrap();
        assert_eq!(j.rule, "=I");
        assert!(j.citations.is_empty());

        let j = parse_justification("Def♢ 3").unwrap();
        assert_eq!(j.rule, "Def♢");
        assert_eq!(j.citations, vec![Citation::Line(3)]);

        let j = parse_justification("IP,1-7").unwrap();
        assert_eq!(j.citations, vec![Citation::Range(1, 7)]);
    }

    #[test]
    fn bad_justifications() {
        for text in &["", "→E, 1,,2", "R 0", "R 3-3", "R, a", "(R) 1", "R 1 -"] {
            assert_eq!(
                parse_justification(text).unwrap_err().kind(),
                ErrorKind::SyntaxError,
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn lines() {
        let (f, j) = parse_line("Q; →E, 1,2", Logic::Tfl).unwrap();
        assert_eq!(f, Formula::letter("Q"));
        assert_eq!(j.rule, "→E");
        let (f, j) = parse_line("P ∨ ¬P | ∨I 2", Logic::Tfl).unwrap();
        assert_eq!(f.to_string(), "P ∨ ¬P");
        assert_eq!(j.citations, vec![Citation::Line(2)]);
        assert_eq!(
            parse_line("Q", Logic::Tfl).unwrap_err().kind(),
            ErrorKind::SyntaxError
        );
        assert_eq!(
            parse_line("□Q; □E, 1", Logic::Tfl).unwrap_err().kind(),
            ErrorKind::OperatorNotSupportedError
        );
    }

    #[test]
    fn premises() {
        assert_eq!(
            parse_premises("P → Q, P", Logic::Tfl).unwrap(),
            vec![
                Formula::implies(Formula::letter("P"), Formula::letter("Q")),
                Formula::letter("P")
            ]
        );
        assert!(parse_premises("P, , Q", Logic::Tfl).is_err());
        assert!(parse_premises("NA", Logic::Tfl).unwrap().is_empty());
    }

    #[test]
    fn premise_lists() {
        assert_eq!(
            split_premises("R(a, f(b, c)), (P ∨ (Q, R)); S"),
            vec!["R(a, f(b, c))", "(P ∨ (Q, R))", "S"]
        );
        assert_eq!(split_premises("P, "), vec!["P", ""]);
        assert_eq!(split_premises("P,,Q"), vec!["P", "", "Q"]);
        assert_eq!(split_premises("P, F(a, Q"), vec!["P, F(a, Q"]);
        assert_eq!(split_premises("P), Q"), vec!["P), Q"]);
        assert!(parse_premises("P, F(a", Logic::Fol).is_err());
    }
}

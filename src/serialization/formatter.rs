use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit0, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, not, opt, peek, recognize},
    error::context,
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::{
    error::{ProofError, ProofResult},
    formula::{Formula, Term, EQUALITY},
    logic::Logic,
};

use super::error::{or_fail, GreedyError};

type ParseResult<'a, T> = IResult<&'a str, T, GreedyError<&'a str>>;

const NOT: char = '¬';
const AND: char = '∧';
const OR: char = '∨';
const IMPLIES: char = '→';
const IFF: char = '↔';
const BOTTOM: char = '⊥';
const FOR_ALL: char = '∀';
const EXISTS: char = '∃';
const NECESSARILY: char = '□';
const POSSIBLY: char = '♢';
/// `♢` and its alternative glyph `◇`
const POSSIBLY_GLYPHS: &str = "♢◇";

fn symbol<'a>(c: char) -> impl FnMut(&'a str) -> ParseResult<'a, char> {
    delimited(multispace0, char(c), multispace0)
}

fn identifier(input: &str) -> ParseResult<&str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_lowercase()),
        take_while(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()),
    ))(input)
}

/// Parses a term: a variable, a constant or a function application `f(t, ...)`
pub fn term(input: &str) -> ParseResult<Term> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(delimited(
        char('('),
        or_fail(separated_list1(symbol(','), term)),
        context("closing parenthesis", or_fail(char(')'))),
    ))(input)?;
    let term = match args {
        Some(args) => Term::Function(name.to_owned(), args),
        None => Term::name(name),
    };
    Ok((input, term))
}

fn predicate_name(input: &str) -> ParseResult<&str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_uppercase()),
        take_while(|c: char| c.is_ascii_digit()),
    ))(input)
}

/// `F`, `Fab` or `F(a, f(b))`
fn predicate(input: &str) -> ParseResult<Formula> {
    let (input, name) = predicate_name(input)?;
    let (input, terms) = alt((
        delimited(
            char('('),
            or_fail(separated_list1(symbol(','), term)),
            context("closing parenthesis", or_fail(char(')'))),
        ),
        many0(map(satisfy(|c| c.is_ascii_lowercase()), |c| {
            Term::name(&c.to_string())
        })),
    ))(input)?;
    Ok((input, Formula::predicate(name, terms)))
}

fn equality(input: &str) -> ParseResult<Formula> {
    map(
        tuple((term, symbol('='), context("term", or_fail(term)))),
        |(left, _, right)| Formula::equality(left, right),
    )(input)
}

fn atom(input: &str) -> ParseResult<Formula> {
    context(
        "formula",
        alt((
            map(char(BOTTOM), |_| Formula::Bottom),
            delimited(
                terminated(char('('), multispace0),
                or_fail(iff),
                context(
                    "closing parenthesis",
                    or_fail(preceded(multispace0, char(')'))),
                ),
            ),
            equality,
            predicate,
        )),
    )(input)
}

/// A variable name, `s` to `z` optionally followed by digits
fn variable(input: &str) -> ParseResult<&str> {
    recognize(pair(satisfy(|c| ('s'..='z').contains(&c)), digit0))(input)
}

fn quantifier(input: &str) -> ParseResult<Formula> {
    let (input, q) = one_of("∀∃")(input)?;
    let (input, var) = context("variable", or_fail(preceded(multispace0, variable)))(input)?;
    let (input, body) = preceded(multispace0, or_fail(unary))(input)?;
    let formula = if q == FOR_ALL {
        Formula::for_all(var, body)
    } else {
        Formula::exists(var, body)
    };
    Ok((input, formula))
}

fn unary(input: &str) -> ParseResult<Formula> {
    alt((
        map(
            preceded(terminated(char(NOT), multispace0), or_fail(unary)),
            Formula::not,
        ),
        map(
            preceded(terminated(char(NECESSARILY), multispace0), or_fail(unary)),
            Formula::necessarily,
        ),
        map(
            preceded(
                terminated(one_of(POSSIBLY_GLYPHS), multispace0),
                or_fail(unary),
            ),
            Formula::possibly,
        ),
        quantifier,
        atom,
    ))(input)
}

/// Left associative chain of `op`
fn chain<'a>(
    op: char,
    operand: fn(&'a str) -> ParseResult<'a, Formula>,
    build: fn(Formula, Formula) -> Formula,
) -> impl FnMut(&'a str) -> ParseResult<'a, Formula> {
    move |input| {
        let (mut input, mut formula) = operand(input)?;
        while let Ok((rest, _)) = symbol(op)(input) {
            let (rest, right) = context("formula", or_fail(operand))(rest)?;
            formula = build(formula, right);
            input = rest;
        }
        Ok((input, formula))
    }
}

fn and(input: &str) -> ParseResult<Formula> {
    chain(AND, unary, Formula::and)(input)
}

fn or(input: &str) -> ParseResult<Formula> {
    chain(OR, and, Formula::or)(input)
}

/// At most one `op`; a second one without parentheses is rejected
fn non_associative<'a>(
    op: char,
    operand: fn(&'a str) -> ParseResult<'a, Formula>,
    build: fn(Formula, Formula) -> Formula,
    message: &'static str,
) -> impl FnMut(&'a str) -> ParseResult<'a, Formula> {
    move |input| {
        let (input, left) = operand(input)?;
        match symbol(op)(input) {
            Ok((rest, _)) => {
                let (rest, right) = context("formula", or_fail(operand))(rest)?;
                let (rest, _) = context(message, or_fail(not(peek(symbol(op)))))(rest)?;
                Ok((rest, build(left, right)))
            }
            Err(_) => Ok((input, left)),
        }
    }
}

fn implies(input: &str) -> ParseResult<Formula> {
    non_associative(
        IMPLIES,
        or,
        Formula::implies,
        "parentheses around nested →",
    )(input)
}

fn iff(input: &str) -> ParseResult<Formula> {
    non_associative(IFF, implies, Formula::iff, "parentheses around nested ↔")(input)
}

/// Parses a formula without checking it against a logic
pub fn formula(input: &str) -> ParseResult<Formula> {
    delimited(multispace0, iff, multispace0)(input)
}

/// Parses a complete formula and checks that it is a sentence of `logic`
///
/// # Errors
/// * `Syntax` - if the text is malformed, has a free variable or rebinds a bound variable
/// * `OperatorNotSupported` - if the formula uses an operator `logic` does not allow
///
/// # Example
/// ```
/// use fitch::{serialization::parse_formula, Formula, Logic};
///
/// let f = parse_formula("P ∧ Q → ¬R", Logic::Tfl).unwrap();
/// assert_eq!(
///     f,
///     Formula::implies(
///         Formula::and(Formula::letter("P"), Formula::letter("Q")),
///         Formula::not(Formula::letter("R")),
///     )
/// );
/// assert_eq!(f.to_string(), "(P ∧ Q) → ¬R");
/// assert!(parse_formula("P → Q → R", Logic::Tfl).is_err());
/// assert!(parse_formula("∀xFx", Logic::Tfl).is_err());
/// ```
pub fn parse_formula(text: &str, logic: Logic) -> ProofResult<Formula> {
    let (_, formula) = all_consuming(formula)(text)?;
    check_sentence(&formula, logic)?;
    Ok(formula)
}

/// Checks the operator set of `logic`, shadowing and closedness
pub fn check_sentence(formula: &Formula, logic: Logic) -> ProofResult<()> {
    logic.check_operators(formula)?;
    if let Some(var) = formula.shadowed_variable() {
        return Err(ProofError::syntax(
            format!("{} is bound twice", var),
            formula.to_string(),
        ));
    }
    if let Some(var) = formula.free_variables().into_iter().next() {
        return Err(ProofError::syntax(
            format!("variable {} is not bound", var),
            formula.to_string(),
        ));
    }
    Ok(())
}

pub fn format_term(s: &mut String, term: &Term) {
    match term {
        Term::Variable(name) | Term::Constant(name) => s.push_str(name),
        Term::Function(name, args) => {
            s.push_str(name);
            format_term_list(s, args);
        }
    }
}

fn format_term_list(s: &mut String, terms: &[Term]) {
    s.push('(');
    for (i, t) in terms.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        format_term(s, t);
    }
    s.push(')');
}

fn format_operand(s: &mut String, formula: &Formula) {
    if formula.is_binary() {
        s.push('(');
        format_formula(s, formula);
        s.push(')');
    } else {
        format_formula(s, formula);
    }
}

/// Writes `formula` in the same notation [`parse_formula`] reads
pub fn format_formula(s: &mut String, formula: &Formula) {
    match formula {
        Formula::Atom(name, terms) if name == EQUALITY && terms.len() == 2 => {
            format_term(s, &terms[0]);
            s.push_str(" = ");
            format_term(s, &terms[1]);
        }
        Formula::Atom(name, terms) => {
            s.push_str(name);
            if terms.iter().all(Term::is_letter) {
                terms.iter().for_each(|t| format_term(s, t));
            } else {
                format_term_list(s, terms);
            }
        }
        Formula::Bottom => s.push(BOTTOM),
        Formula::Not(f) => {
            s.push(NOT);
            format_operand(s, f);
        }
        Formula::Necessarily(f) => {
            s.push(NECESSARILY);
            format_operand(s, f);
        }
        Formula::Possibly(f) => {
            s.push(POSSIBLY);
            format_operand(s, f);
        }
        Formula::ForAll(v, f) | Formula::Exists(v, f) => {
            s.push(if matches!(formula, Formula::ForAll(..)) {
                FOR_ALL
            } else {
                EXISTS
            });
            s.push_str(v);
            if f.as_equality().is_some() {
                s.push(' ');
            }
            format_operand(s, f);
        }
        Formula::And(a, b) | Formula::Or(a, b) | Formula::Implies(a, b) | Formula::Iff(a, b) => {
            let op = match formula {
                Formula::And(..) => AND,
                Formula::Or(..) => OR,
                Formula::Implies(..) => IMPLIES,
                _ => IFF,
            };
            format_operand(s, a);
            s.push(' ');
            s.push(op);
            s.push(' ');
            format_operand(s, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, formula::NodeKind};

    fn parse(text: &str) -> Formula {
        let (rest, f) = all_consuming(formula)(text).unwrap();
        assert_eq!(rest, "");
        f
    }

    quickcheck! {
        fn format_then_parse(f: Formula) -> bool {
            let text = f.to_string();
            parse_formula(&text, Logic::Fomls5) == Ok(f)
        }
    }

    #[test]
    fn precedence() {
        let p = || Formula::letter("P");
        let q = || Formula::letter("Q");
        let r = || Formula::letter("R");
        assert_eq!(
            parse("P ∨ Q ∧ R"),
            Formula::or(p(), Formula::and(q(), r()))
        );
        assert_eq!(
            parse("P ∧ Q ∧ R"),
            Formula::and(Formula::and(p(), q()), r())
        );
        assert_eq!(
            parse("P ↔ Q → R"),
            Formula::iff(p(), Formula::implies(q(), r()))
        );
        assert_eq!(
            parse("¬□P ∨ ♢¬Q"),
            Formula::or(
                Formula::not(Formula::necessarily(p())),
                Formula::possibly(Formula::not(q()))
            )
        );
        assert_eq!(parse("◇P"), Formula::possibly(p()));
        assert_eq!(parse("( P→Q )"), Formula::implies(p(), q()));
    }

    #[test]
    fn non_associative_connectives() {
        assert!(all_consuming(formula)("P → Q → R").is_err());
        assert!(all_consuming(formula)("P ↔ Q ↔ R").is_err());
        assert!(all_consuming(formula)("(P → Q) → R").is_ok());
        assert!(all_consuming(formula)("P → (Q → R)").is_ok());
    }

    #[test]
    fn first_order() {
        let f = parse("∀x(Fx → ∃y Rxy)");
        assert_eq!(
            f,
            Formula::for_all(
                "x",
                Formula::implies(
                    Formula::predicate("F", vec![Term::name("x")]),
                    Formula::exists(
                        "y",
                        Formula::predicate("R", vec![Term::name("x"), Term::name("y")])
                    )
                )
            )
        );
        assert_eq!(f.to_string(), "∀x(Fx → ∃yRxy)");

        let g = parse("F(ab, f(c, x1)) ∧ a = g(b)");
        assert_eq!(g.to_string(), "F(ab, f(c, x1)) ∧ a = g(b)");
        assert_eq!(parse("¬a = b").to_string(), "¬a = b");
        assert_eq!(parse("∀x x = x").to_string(), "∀x x = x");
        assert_eq!(parse("∀xa = b").to_string(), "∀x a = b");
    }

    #[test]
    fn syntax_errors() {
        for text in &["P ∧", "(P ∧ Q", "P Q", "∀aFa", "F(a,", "", "P ∧ ⊤"] {
            let err = parse_formula(text, Logic::Fol).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SyntaxError, "{:?}", text);
        }
    }

    #[test]
    fn sentences_are_closed() {
        assert_eq!(
            parse_formula("Fx", Logic::Fol).unwrap_err().kind(),
            ErrorKind::SyntaxError
        );
        assert_eq!(
            parse_formula("∀x∃xFx", Logic::Fol).unwrap_err().kind(),
            ErrorKind::SyntaxError
        );
        assert!(parse_formula("∀xFx ∧ ∃xGx", Logic::Fol).is_ok());
    }

    #[test]
    fn operators_per_logic() {
        assert_eq!(
            parse_formula("□P", Logic::Tfl),
            Err(ProofError::OperatorNotSupported {
                operator: NodeKind::Necessarily,
                logic: Logic::Tfl
            })
        );
        assert_eq!(
            parse_formula("a = b", Logic::Mls5),
            Err(ProofError::OperatorNotSupported {
                operator: NodeKind::Equality,
                logic: Logic::Mls5
            })
        );
        assert!(parse_formula("□∀xFx", Logic::Fomlk).is_ok());
    }
}

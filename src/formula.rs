use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

use crate::{
    serialization::{format_formula, format_term},
    substitution::{SingleSubstitution, Substitution},
};

/// Predicate name used for identity statements `a = b`
pub const EQUALITY: &str = "=";

/// A term of first-order logic
///
/// Names starting with one of the letters `s` to `z` (optionally followed by digits) are
/// variables, every other lowercase name is a constant.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum Term {
    Variable(String),
    Constant(String),
    Function(String, Vec<Term>),
}

impl Term {
    /// Creates a variable or constant depending on the naming convention
    ///
    /// # Example
    /// ```
    /// use fitch::Term;
    ///
    /// assert_eq!(Term::name("x"), Term::Variable("x".to_owned()));
    /// assert_eq!(Term::name("y2"), Term::Variable("y2".to_owned()));
    /// assert_eq!(Term::name("a"), Term::Constant("a".to_owned()));
    /// assert_eq!(Term::name("xa"), Term::Constant("xa".to_owned()));
    /// ```
    pub fn name(name: &str) -> Self {
        if is_variable_name(name) {
            Term::Variable(name.to_owned())
        } else {
            Term::Constant(name.to_owned())
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Constant(_) => true,
            Term::Function(_, args) => args.iter().all(Term::is_closed),
        }
    }

    pub fn contains_constant(&self, name: &str) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Constant(c) => c == name,
            Term::Function(_, args) => args.iter().any(|t| t.contains_constant(name)),
        }
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Term::Variable(v) => {
                out.insert(v.clone());
            }
            Term::Constant(_) => {}
            Term::Function(_, args) => args.iter().for_each(|t| t.collect_variables(out)),
        }
    }

    fn collect_constants(&self, out: &mut BTreeSet<String>) {
        match self {
            Term::Variable(_) => {}
            Term::Constant(c) => {
                out.insert(c.clone());
            }
            Term::Function(_, args) => args.iter().for_each(|t| t.collect_constants(out)),
        }
    }

    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    /// Single lowercase letter without arguments, i.e. printable in compact predicate form
    pub(crate) fn is_letter(&self) -> bool {
        match self {
            Term::Variable(n) | Term::Constant(n) => {
                n.len() == 1 && n.chars().all(|c| c.is_ascii_lowercase())
            }
            Term::Function(..) => false,
        }
    }

    fn replaces_some(&self, target: &Term, from: &Term, to: &Term) -> bool {
        if self == target || (self == from && target == to) {
            return true;
        }
        match (self, target) {
            (Term::Function(f, args), Term::Function(g, args1)) => {
                f == g
                    && args.len() == args1.len()
                    && args
                        .iter()
                        .zip(args1)
                        .all(|(a, b)| a.replaces_some(b, from, to))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        format_term(&mut s, self);
        f.write_str(&s)
    }
}

/// Returns true if `name` follows the variable naming convention (`s`-`z` plus digits)
pub fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some('s'..='z')) && chars.all(|c| c.is_ascii_digit())
}

/// A formula of any of the supported logics
///
/// Equality is structural; bound variables are compared by name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum Formula {
    /// Sentence letter (no terms), predicate or identity (`=`) applied to terms
    Atom(String, Vec<Term>),
    Bottom,
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    ForAll(String, Box<Formula>),
    Exists(String, Box<Formula>),
    Necessarily(Box<Formula>),
    Possibly(Box<Formula>),
}

/// The syntactic categories a logic may allow or forbid
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    SentenceLetter,
    Predicate,
    Equality,
    Bottom,
    Not,
    And,
    Or,
    Implies,
    Iff,
    ForAll,
    Exists,
    Necessarily,
    Possibly,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::SentenceLetter => "sentence letter",
            NodeKind::Predicate => "predicate",
            NodeKind::Equality => "=",
            NodeKind::Bottom => "⊥",
            NodeKind::Not => "¬",
            NodeKind::And => "∧",
            NodeKind::Or => "∨",
            NodeKind::Implies => "→",
            NodeKind::Iff => "↔",
            NodeKind::ForAll => "∀",
            NodeKind::Exists => "∃",
            NodeKind::Necessarily => "□",
            NodeKind::Possibly => "♢",
        };
        f.write_str(s)
    }
}

/// Reason why a formula is not an instance of a quantified formula's body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceError {
    Mismatch,
    /// The instantiating term contains a variable bound at the substituted position
    Captures(Term, String),
}

impl Formula {
    pub fn letter(name: &str) -> Self {
        Formula::Atom(name.to_owned(), Vec::new())
    }

    pub fn predicate(name: &str, terms: Vec<Term>) -> Self {
        Formula::Atom(name.to_owned(), terms)
    }

    pub fn equality(left: Term, right: Term) -> Self {
        Formula::Atom(EQUALITY.to_owned(), vec![left, right])
    }

    pub fn not(f: Formula) -> Self {
        Formula::Not(Box::new(f))
    }

    pub fn and(a: Formula, b: Formula) -> Self {
        Formula::And(Box::new(a), Box::new(b))
    }

    pub fn or(a: Formula, b: Formula) -> Self {
        Formula::Or(Box::new(a), Box::new(b))
    }

    pub fn implies(a: Formula, b: Formula) -> Self {
        Formula::Implies(Box::new(a), Box::new(b))
    }

    pub fn iff(a: Formula, b: Formula) -> Self {
        Formula::Iff(Box::new(a), Box::new(b))
    }

    pub fn for_all(var: &str, f: Formula) -> Self {
        Formula::ForAll(var.to_owned(), Box::new(f))
    }

    pub fn exists(var: &str, f: Formula) -> Self {
        Formula::Exists(var.to_owned(), Box::new(f))
    }

    pub fn necessarily(f: Formula) -> Self {
        Formula::Necessarily(Box::new(f))
    }

    pub fn possibly(f: Formula) -> Self {
        Formula::Possibly(Box::new(f))
    }

    /// Returns the equality's two sides if this is an identity statement
    pub fn as_equality(&self) -> Option<(&Term, &Term)> {
        match self {
            Formula::Atom(name, terms) if name == EQUALITY && terms.len() == 2 => {
                Some((&terms[0], &terms[1]))
            }
            _ => None,
        }
    }

    /// The syntactic category of the outermost node
    pub fn kind(&self) -> NodeKind {
        match self {
            Formula::Atom(name, _) if name == EQUALITY => NodeKind::Equality,
            Formula::Atom(_, terms) if terms.is_empty() => NodeKind::SentenceLetter,
            Formula::Atom(..) => NodeKind::Predicate,
            Formula::Bottom => NodeKind::Bottom,
            Formula::Not(_) => NodeKind::Not,
            Formula::And(..) => NodeKind::And,
            Formula::Or(..) => NodeKind::Or,
            Formula::Implies(..) => NodeKind::Implies,
            Formula::Iff(..) => NodeKind::Iff,
            Formula::ForAll(..) => NodeKind::ForAll,
            Formula::Exists(..) => NodeKind::Exists,
            Formula::Necessarily(_) => NodeKind::Necessarily,
            Formula::Possibly(_) => NodeKind::Possibly,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Formula::And(..) | Formula::Or(..) | Formula::Implies(..) | Formula::Iff(..)
        )
    }

    /// Direct subformulas, left to right
    pub fn children(&self) -> Vec<&Formula> {
        match self {
            Formula::Atom(..) | Formula::Bottom => vec![],
            Formula::Not(f)
            | Formula::ForAll(_, f)
            | Formula::Exists(_, f)
            | Formula::Necessarily(f)
            | Formula::Possibly(f) => vec![&**f],
            Formula::And(a, b) | Formula::Or(a, b) | Formula::Implies(a, b) | Formula::Iff(a, b) => {
                vec![&**a, &**b]
            }
        }
    }

    /// All node kinds occurring anywhere in this formula
    pub fn kinds(&self) -> BTreeSet<NodeKind> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(f) = stack.pop() {
            out.insert(f.kind());
            stack.extend(f.children());
        }
        out
    }

    /// Variables occurring outside the scope of a quantifier binding them
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free<'a>(&'a self, bound: &mut Vec<&'a str>, out: &mut BTreeSet<String>) {
        match self {
            Formula::Atom(_, terms) => {
                let mut vars = BTreeSet::new();
                terms.iter().for_each(|t| t.collect_variables(&mut vars));
                out.extend(vars.into_iter().filter(|v| !bound.contains(&v.as_str())));
            }
            Formula::ForAll(v, f) | Formula::Exists(v, f) => {
                bound.push(v);
                f.collect_free(bound, out);
                bound.pop();
            }
            _ => self
                .children()
                .into_iter()
                .for_each(|f| f.collect_free(bound, out)),
        }
    }

    /// Returns the first variable that is bound by a quantifier inside the scope of another
    /// quantifier binding the same variable
    ///
    /// # Example
    /// ```
    /// use fitch::{Formula, Term};
    ///
    /// let px = Formula::predicate("P", vec![Term::name("x")]);
    /// let f = Formula::for_all("x", Formula::exists("x", px.clone()));
    /// assert_eq!(f.shadowed_variable(), Some("x"));
    /// let g = Formula::and(Formula::for_all("x", px.clone()), Formula::exists("x", px));
    /// assert_eq!(g.shadowed_variable(), None);
    /// ```
    pub fn shadowed_variable(&self) -> Option<&str> {
        fn helper<'a>(f: &'a Formula, bound: &mut Vec<&'a str>) -> Option<&'a str> {
            match f {
                Formula::ForAll(v, body) | Formula::Exists(v, body) => {
                    if bound.contains(&v.as_str()) {
                        return Some(v.as_str());
                    }
                    bound.push(v);
                    let res = helper(body, bound);
                    bound.pop();
                    res
                }
                _ => f.children().into_iter().find_map(|c| helper(c, bound)),
            }
        }
        helper(self, &mut Vec::new())
    }

    /// All constant names occurring in this formula (function symbols excluded)
    pub fn constants(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(f) = stack.pop() {
            if let Formula::Atom(_, terms) = f {
                terms.iter().for_each(|t| t.collect_constants(&mut out));
            }
            stack.extend(f.children());
        }
        out
    }

    pub fn contains_constant(&self, name: &str) -> bool {
        match self {
            Formula::Atom(_, terms) => terms.iter().any(|t| t.contains_constant(name)),
            _ => self.children().iter().any(|f| f.contains_constant(name)),
        }
    }

    /// Replaces every free occurrence of `var` by `term`
    ///
    /// # Example
    /// ```
    /// use fitch::{Formula, Term};
    ///
    /// let f = Formula::and(
    ///     Formula::predicate("F", vec![Term::name("x")]),
    ///     Formula::exists("x", Formula::predicate("G", vec![Term::name("x")])),
    /// );
    /// let g = f.instantiate("x", &Term::name("a"));
    /// assert_eq!(g.to_string(), "Fa ∧ ∃xGx");
    /// ```
    pub fn instantiate(&self, var: &str, term: &Term) -> Formula {
        self.substitute(&SingleSubstitution::new(var, term))
    }

    /// Applies `substitution` to every free variable occurrence
    pub fn substitute<S: Substitution>(&self, substitution: &S) -> Formula {
        self.substitute_helper(substitution, &mut Vec::new())
    }

    fn substitute_helper<'a, S: Substitution>(
        &'a self,
        substitution: &S,
        bound: &mut Vec<&'a str>,
    ) -> Formula {
        match self {
            Formula::Atom(name, terms) => Formula::Atom(
                name.clone(),
                terms
                    .iter()
                    .map(|t| substitution.substitute_term(t, bound))
                    .collect(),
            ),
            Formula::Bottom => Formula::Bottom,
            Formula::Not(f) => Formula::not(f.substitute_helper(substitution, bound)),
            Formula::And(a, b) => Formula::and(
                a.substitute_helper(substitution, bound),
                b.substitute_helper(substitution, bound),
            ),
            Formula::Or(a, b) => Formula::or(
                a.substitute_helper(substitution, bound),
                b.substitute_helper(substitution, bound),
            ),
            Formula::Implies(a, b) => Formula::implies(
                a.substitute_helper(substitution, bound),
                b.substitute_helper(substitution, bound),
            ),
            Formula::Iff(a, b) => Formula::iff(
                a.substitute_helper(substitution, bound),
                b.substitute_helper(substitution, bound),
            ),
            Formula::ForAll(v, f) => {
                bound.push(v);
                let f = f.substitute_helper(substitution, bound);
                bound.pop();
                Formula::for_all(v, f)
            }
            Formula::Exists(v, f) => {
                bound.push(v);
                let f = f.substitute_helper(substitution, bound);
                bound.pop();
                Formula::exists(v, f)
            }
            Formula::Necessarily(f) => {
                Formula::necessarily(f.substitute_helper(substitution, bound))
            }
            Formula::Possibly(f) => Formula::possibly(f.substitute_helper(substitution, bound)),
        }
    }

    /// Treats `self` as the body of a quantifier over `var` and finds the term `t` with
    /// `self[t/var] == target`.
    ///
    /// Returns `Ok(None)` if `var` does not occur free in `self` and `self == target`.
    ///
    /// # Errors
    /// * `Mismatch` - if `target` is not an instance of `self`
    /// * `Captures` - if the only candidate term contains a variable that is bound where it
    /// would be substituted
    ///
    /// # Example
    /// ```
    /// use fitch::{Formula, Term, formula::InstanceError};
    ///
    /// let body = Formula::predicate("R", vec![Term::name("x"), Term::name("x")]);
    /// let target = Formula::predicate("R", vec![Term::name("a"), Term::name("a")]);
    /// assert_eq!(body.instance_term("x", &target), Ok(Some(Term::name("a"))));
    ///
    /// let target = Formula::predicate("R", vec![Term::name("a"), Term::name("b")]);
    /// assert_eq!(body.instance_term("x", &target), Err(InstanceError::Mismatch));
    /// ```
    pub fn instance_term(&self, var: &str, target: &Formula) -> Result<Option<Term>, InstanceError> {
        let mut binding = None;
        self.match_instance(var, target, &mut binding, &mut Vec::new())?;
        Ok(binding)
    }

    fn match_instance<'a>(
        &'a self,
        var: &str,
        target: &Formula,
        binding: &mut Option<Term>,
        bound: &mut Vec<&'a str>,
    ) -> Result<(), InstanceError> {
        use Formula::*;
        match (self, target) {
            (Atom(p, terms), Atom(q, terms1)) if p == q && terms.len() == terms1.len() => {
                for (t, t1) in terms.iter().zip(terms1) {
                    match_term(t, var, t1, binding, bound)?;
                }
                Ok(())
            }
            (Bottom, Bottom) => Ok(()),
            (Not(a), Not(a1)) | (Necessarily(a), Necessarily(a1)) | (Possibly(a), Possibly(a1)) => {
                a.match_instance(var, a1, binding, bound)
            }
            (And(a, b), And(a1, b1))
            | (Or(a, b), Or(a1, b1))
            | (Implies(a, b), Implies(a1, b1))
            | (Iff(a, b), Iff(a1, b1)) => {
                a.match_instance(var, a1, binding, bound)?;
                b.match_instance(var, b1, binding, bound)
            }
            (ForAll(v, a), ForAll(v1, a1)) | (Exists(v, a), Exists(v1, a1)) if v == v1 => {
                if v == var {
                    // `var` is rebound here, so nothing below is substituted
                    return if a == a1 {
                        Ok(())
                    } else {
                        Err(InstanceError::Mismatch)
                    };
                }
                bound.push(v);
                let res = a.match_instance(var, a1, binding, bound);
                bound.pop();
                res
            }
            _ => Err(InstanceError::Mismatch),
        }
    }

    /// Tests whether `target` arises from `self` by replacing zero or more occurrences of
    /// `from` with `to`
    ///
    /// # Example
    /// ```
    /// use fitch::{Formula, Term};
    ///
    /// let a = Term::name("a");
    /// let b = Term::name("b");
    /// let faa = Formula::predicate("F", vec![a.clone(), a.clone()]);
    /// let fab = Formula::predicate("F", vec![a.clone(), b.clone()]);
    /// assert!(faa.replaces_some(&fab, &a, &b));
    /// assert!(!fab.replaces_some(&faa, &a, &b));
    /// ```
    pub fn replaces_some(&self, target: &Formula, from: &Term, to: &Term) -> bool {
        use Formula::*;
        match (self, target) {
            (Atom(p, terms), Atom(q, terms1)) => {
                p == q
                    && terms.len() == terms1.len()
                    && terms
                        .iter()
                        .zip(terms1)
                        .all(|(t, t1)| t.replaces_some(t1, from, to))
            }
            (Bottom, Bottom) => true,
            (Not(a), Not(a1)) | (Necessarily(a), Necessarily(a1)) | (Possibly(a), Possibly(a1)) => {
                a.replaces_some(a1, from, to)
            }
            (And(a, b), And(a1, b1))
            | (Or(a, b), Or(a1, b1))
            | (Implies(a, b), Implies(a1, b1))
            | (Iff(a, b), Iff(a1, b1)) => a.replaces_some(a1, from, to) && b.replaces_some(b1, from, to),
            (ForAll(v, a), ForAll(v1, a1)) | (Exists(v, a), Exists(v1, a1)) => {
                v == v1 && a.replaces_some(a1, from, to)
            }
            _ => false,
        }
    }
}

fn match_term(
    pattern: &Term,
    var: &str,
    target: &Term,
    binding: &mut Option<Term>,
    bound: &[&str],
) -> Result<(), InstanceError> {
    match pattern {
        Term::Variable(v) if v == var => {
            if let Some(captured) = target.variables().into_iter().find(|v| bound.contains(&v.as_str())) {
                return Err(InstanceError::Captures(target.clone(), captured));
            }
            match binding {
                Some(old) if old != target => Err(InstanceError::Mismatch),
                Some(_) => Ok(()),
                None => {
                    *binding = Some(target.clone());
                    Ok(())
                }
            }
        }
        Term::Function(f, args) => match target {
            Term::Function(g, args1) if f == g && args.len() == args1.len() => {
                for (a, a1) in args.iter().zip(args1) {
                    match_term(a, var, a1, binding, bound)?;
                }
                Ok(())
            }
            _ => Err(InstanceError::Mismatch),
        },
        _ if pattern == target => Ok(()),
        _ => Err(InstanceError::Mismatch),
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        format_formula(&mut s, self);
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    /// Generates closed formulas without shadowed variables
    fn arbitrary_formula(g: &mut Gen, depth: usize, bound: &mut Vec<String>) -> Formula {
        const LETTERS: &[&str] = &["P", "Q", "R", "S1"];
        const CONSTANTS: &[&str] = &["a", "b", "c", "ab"];
        const VARIABLES: &[&str] = &["x", "y", "z", "w2"];
        let term = |g: &mut Gen, bound: &Vec<String>| -> Term {
            let candidates: Vec<String> = CONSTANTS
                .iter()
                .map(|c| c.to_string())
                .chain(bound.iter().cloned())
                .collect();
            let name = g.choose(&candidates).cloned().unwrap_or_else(|| "a".to_owned());
            let t = Term::name(&name);
            if bool::arbitrary(g) && bool::arbitrary(g) {
                Term::Function("f".to_owned(), vec![t])
            } else {
                t
            }
        };
        let choice = if depth == 0 {
            u8::arbitrary(g) % 3
        } else {
            u8::arbitrary(g) % 13
        };
        match choice {
            0 => Formula::letter(g.choose(LETTERS).unwrap()),
            1 => {
                let n = 1 + usize::arbitrary(g) % 3;
                let terms = (0..n).map(|_| term(g, bound)).collect();
                Formula::predicate(g.choose(&["F", "G"]).unwrap(), terms)
            }
            2 if bool::arbitrary(g) => Formula::Bottom,
            2 => Formula::equality(term(g, bound), term(g, bound)),
            3 => Formula::not(arbitrary_formula(g, depth - 1, bound)),
            4 => Formula::necessarily(arbitrary_formula(g, depth - 1, bound)),
            5 => Formula::possibly(arbitrary_formula(g, depth - 1, bound)),
            6 => Formula::and(
                arbitrary_formula(g, depth - 1, bound),
                arbitrary_formula(g, depth - 1, bound),
            ),
            7 => Formula::or(
                arbitrary_formula(g, depth - 1, bound),
                arbitrary_formula(g, depth - 1, bound),
            ),
            8 => Formula::implies(
                arbitrary_formula(g, depth - 1, bound),
                arbitrary_formula(g, depth - 1, bound),
            ),
            9 => Formula::iff(
                arbitrary_formula(g, depth - 1, bound),
                arbitrary_formula(g, depth - 1, bound),
            ),
            _ => {
                let free: Vec<&str> = VARIABLES
                    .iter()
                    .copied()
                    .filter(|v| !bound.iter().any(|b| b == v))
                    .collect();
                let var = match g.choose(&free) {
                    Some(v) => v.to_string(),
                    None => return Formula::letter("P"),
                };
                bound.push(var.clone());
                let body = arbitrary_formula(g, depth - 1, bound);
                bound.pop();
                if bool::arbitrary(g) {
                    Formula::for_all(&var, body)
                } else {
                    Formula::exists(&var, body)
                }
            }
        }
    }

    impl Arbitrary for Formula {
        fn arbitrary(g: &mut Gen) -> Self {
            let depth = usize::arbitrary(g) % 5;
            arbitrary_formula(g, depth, &mut Vec::new())
        }
    }

    quickcheck! {
        fn arbitrary_formulas_are_closed(f: Formula) -> bool {
            f.free_variables().is_empty() && f.shadowed_variable().is_none()
        }

        fn instantiate_then_match(f: Formula) -> bool {
            let body = match &f {
                Formula::ForAll(v, body) | Formula::Exists(v, body) => (v.clone(), body.clone()),
                _ => return true,
            };
            let c = Term::name("c7");
            let instance = body.1.instantiate(&body.0, &c);
            match body.1.instance_term(&body.0, &instance) {
                Ok(Some(t)) => t == c,
                Ok(None) => !body.1.free_variables().contains(&body.0),
                Err(_) => false,
            }
        }
    }

    #[test]
    fn free_variables() {
        let f = Formula::and(
            Formula::predicate("F", vec![Term::name("x")]),
            Formula::for_all("y", Formula::predicate("G", vec![Term::name("y"), Term::name("a")])),
        );
        assert_eq!(
            f.free_variables().into_iter().collect::<Vec<_>>(),
            vec!["x".to_owned()]
        );
        assert_eq!(
            f.constants().into_iter().collect::<Vec<_>>(),
            vec!["a".to_owned()]
        );
    }

    #[test]
    fn kinds() {
        let f = Formula::necessarily(Formula::implies(
            Formula::letter("P"),
            Formula::equality(Term::name("a"), Term::name("b")),
        ));
        let kinds: Vec<_> = f.kinds().into_iter().collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::SentenceLetter,
                NodeKind::Equality,
                NodeKind::Implies,
                NodeKind::Necessarily
            ]
        );
    }

    #[test]
    fn instance_capture() {
        // ∀y Rxy instantiated so that x becomes y would be captured
        let body = Formula::for_all(
            "y",
            Formula::predicate("R", vec![Term::name("x"), Term::name("y")]),
        );
        let target = Formula::for_all(
            "y",
            Formula::predicate("R", vec![Term::name("y"), Term::name("y")]),
        );
        assert_eq!(
            body.instance_term("x", &target),
            Err(InstanceError::Captures(Term::name("y"), "y".to_owned()))
        );
    }

    #[test]
    fn vacuous_instance() {
        let body = Formula::letter("P");
        assert_eq!(body.instance_term("x", &Formula::letter("P")), Ok(None));
        assert_eq!(
            body.instance_term("x", &Formula::letter("Q")),
            Err(InstanceError::Mismatch)
        );
    }

    #[test]
    fn instance_in_function_argument() {
        let body = Formula::predicate(
            "F",
            vec![Term::Function("f".to_owned(), vec![Term::name("x")])],
        );
        let target = Formula::predicate(
            "F",
            vec![Term::Function(
                "f".to_owned(),
                vec![Term::Function("g".to_owned(), vec![Term::name("a")])],
            )],
        );
        assert_eq!(
            body.instance_term("x", &target),
            Ok(Some(Term::Function("g".to_owned(), vec![Term::name("a")])))
        );
    }
}

use crate::formula::Term;

/// A `Substitution` maps variable names to terms
///
/// This is intended to be used together with
/// [`Formula::substitute`](../formula/enum.Formula.html#method.substitute), which only hands
/// free occurrences to the substitution.
pub trait Substitution {
    /// Get the replacement for the variable `var`, or `None` if it should be kept.
    fn substitution_opt(&self, var: &str) -> Option<&Term>;

    /// Applies this substitution to every variable of `term` that is not in `bound`
    fn substitute_term(&self, term: &Term, bound: &[&str]) -> Term {
        match term {
            Term::Variable(v) if !bound.contains(&v.as_str()) => self
                .substitution_opt(v)
                .cloned()
                .unwrap_or_else(|| term.clone()),
            Term::Function(f, args) => Term::Function(
                f.clone(),
                args.iter()
                    .map(|t| self.substitute_term(t, bound))
                    .collect(),
            ),
            _ => term.clone(),
        }
    }
}

/// A [`Substitution`] replacing a single variable
pub struct SingleSubstitution<'a> {
    from: &'a str,
    to: &'a Term,
}

impl<'a> SingleSubstitution<'a> {
    pub fn new(from: &'a str, to: &'a Term) -> Self {
        SingleSubstitution { from, to }
    }
}

impl Substitution for SingleSubstitution<'_> {
    fn substitution_opt(&self, var: &str) -> Option<&Term> {
        if var == self.from {
            Some(self.to)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Formula;

    #[test]
    fn bound_occurrences_are_kept() {
        let f = Formula::and(
            Formula::predicate("F", vec![Term::name("x"), Term::name("y")]),
            Formula::for_all("x", Formula::predicate("G", vec![Term::name("x")])),
        );
        let a = Term::name("a");
        let fb = Term::Function("f".to_owned(), vec![Term::name("b")]);
        let g = f
            .substitute(&SingleSubstitution::new("x", &a))
            .substitute(&SingleSubstitution::new("y", &fb));
        assert_eq!(g.to_string(), "F(a, f(b)) ∧ ∀xGx");
    }
}

//! The logic registry: which operators and which rules each system admits.
//!
//! The registry is a set of constant tables; nothing in here is mutated at runtime, so a
//! [`Logic`] can be passed around freely between concurrent verifications.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{ProofError, ProofResult},
    formula::{Formula, NodeKind},
    rules::{RuleSpec, FOL_RULES, K_RULES, S4_RULES, S5_RULES, TFL_RULES, T_RULES},
};

/// A logical system proofs can be checked in
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use-serde", serde(rename_all = "UPPERCASE"))]
pub enum Logic {
    /// Truth-functional (propositional) logic
    Tfl,
    /// First-order logic with identity
    Fol,
    Mlk,
    Mlt,
    Mls4,
    Mls5,
    /// First-order modal logic over K
    Fomlk,
    Fomlt,
    Fomls4,
    Fomls5,
}

/// Constraint on the accessibility relation between worlds, deciding how far a `□φ` may be
/// carried into nested strict subproofs
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "use-serde", derive(Serialize, Deserialize))]
pub enum WorldDiscipline {
    None,
    Reflexive,
    Transitive,
    Equivalence,
}

impl WorldDiscipline {
    /// Tests whether `□φ` asserted `distance` worlds out licenses `φ` in the current world
    ///
    /// # Example
    /// ```
    /// use fitch::WorldDiscipline;
    ///
    /// assert!(WorldDiscipline::None.permits_box_elim(1));
    /// assert!(!WorldDiscipline::None.permits_box_elim(0));
    /// assert!(WorldDiscipline::Reflexive.permits_box_elim(0));
    /// assert!(!WorldDiscipline::Reflexive.permits_box_elim(2));
    /// assert!(WorldDiscipline::Transitive.permits_box_elim(3));
    /// ```
    pub fn permits_box_elim(self, distance: usize) -> bool {
        match self {
            WorldDiscipline::None => distance == 1,
            WorldDiscipline::Reflexive => distance <= 1,
            WorldDiscipline::Transitive | WorldDiscipline::Equivalence => true,
        }
    }
}

const TFL_OPERATORS: &[NodeKind] = &[
    NodeKind::SentenceLetter,
    NodeKind::Bottom,
    NodeKind::Not,
    NodeKind::And,
    NodeKind::Or,
    NodeKind::Implies,
    NodeKind::Iff,
];
const FOL_OPERATORS: &[NodeKind] = &[
    NodeKind::Predicate,
    NodeKind::Equality,
    NodeKind::ForAll,
    NodeKind::Exists,
];
const MODAL_OPERATORS: &[NodeKind] = &[NodeKind::Necessarily, NodeKind::Possibly];

impl Logic {
    pub const ALL: [Logic; 10] = [
        Logic::Tfl,
        Logic::Fol,
        Logic::Mlk,
        Logic::Mlt,
        Logic::Mls4,
        Logic::Mls5,
        Logic::Fomlk,
        Logic::Fomlt,
        Logic::Fomls4,
        Logic::Fomls5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Logic::Tfl => "TFL",
            Logic::Fol => "FOL",
            Logic::Mlk => "MLK",
            Logic::Mlt => "MLT",
            Logic::Mls4 => "MLS4",
            Logic::Mls5 => "MLS5",
            Logic::Fomlk => "FOMLK",
            Logic::Fomlt => "FOMLT",
            Logic::Fomls4 => "FOMLS4",
            Logic::Fomls5 => "FOMLS5",
        }
    }

    pub fn is_first_order(self) -> bool {
        matches!(
            self,
            Logic::Fol | Logic::Fomlk | Logic::Fomlt | Logic::Fomls4 | Logic::Fomls5
        )
    }

    pub fn is_modal(self) -> bool {
        !matches!(self, Logic::Tfl | Logic::Fol)
    }

    pub fn world_discipline(self) -> WorldDiscipline {
        match self {
            Logic::Tfl | Logic::Fol | Logic::Mlk | Logic::Fomlk => WorldDiscipline::None,
            Logic::Mlt | Logic::Fomlt => WorldDiscipline::Reflexive,
            Logic::Mls4 | Logic::Fomls4 => WorldDiscipline::Transitive,
            Logic::Mls5 | Logic::Fomls5 => WorldDiscipline::Equivalence,
        }
    }

    /// The node kinds formulas of this logic may be built from
    pub fn operators(self) -> impl Iterator<Item = NodeKind> {
        let first_order: &[NodeKind] = if self.is_first_order() {
            FOL_OPERATORS
        } else {
            &[]
        };
        let modal: &[NodeKind] = if self.is_modal() {
            MODAL_OPERATORS
        } else {
            &[]
        };
        TFL_OPERATORS
            .iter()
            .chain(first_order)
            .chain(modal)
            .copied()
    }

    pub fn allows(self, kind: NodeKind) -> bool {
        self.operators().any(|k| k == kind)
    }

    fn rule_tiers(self) -> &'static [&'static [RuleSpec]] {
        match self {
            Logic::Tfl => &[TFL_RULES],
            Logic::Fol => &[TFL_RULES, FOL_RULES],
            Logic::Mlk => &[TFL_RULES, K_RULES],
            Logic::Mlt => &[TFL_RULES, K_RULES, T_RULES],
            Logic::Mls4 => &[TFL_RULES, K_RULES, T_RULES, S4_RULES],
            Logic::Mls5 => &[TFL_RULES, K_RULES, T_RULES, S4_RULES, S5_RULES],
            Logic::Fomlk => &[TFL_RULES, FOL_RULES, K_RULES],
            Logic::Fomlt => &[TFL_RULES, FOL_RULES, K_RULES, T_RULES],
            Logic::Fomls4 => &[TFL_RULES, FOL_RULES, K_RULES, T_RULES, S4_RULES],
            Logic::Fomls5 => &[TFL_RULES, FOL_RULES, K_RULES, T_RULES, S4_RULES, S5_RULES],
        }
    }

    /// Every rule available in this logic
    pub fn rules(self) -> impl Iterator<Item = &'static RuleSpec> {
        self.rule_tiers().iter().flat_map(|tier| tier.iter())
    }

    /// Looks up a rule by name or alias
    ///
    /// # Example
    /// ```
    /// use fitch::{Logic, rules::Rule};
    ///
    /// assert_eq!(Logic::Fol.rule("∀I").map(|r| r.rule), Some(Rule::ForAllIntro));
    /// assert!(Logic::Tfl.rule("∀I").is_none());
    /// assert!(Logic::Mlk.rule("RT").is_none());
    /// assert!(Logic::Mlt.rule("RT").is_some());
    /// ```
    pub fn rule(self, name: &str) -> Option<&'static RuleSpec> {
        self.rules().find(|spec| spec.is_named(name))
    }

    /// Checks that `formula` only uses operators this logic allows
    ///
    /// # Errors
    /// * `OperatorNotSupported` - naming the first offending operator
    pub fn check_operators(self, formula: &Formula) -> ProofResult<()> {
        match formula.kinds().into_iter().find(|k| !self.allows(*k)) {
            Some(operator) => Err(ProofError::OperatorNotSupported {
                operator,
                logic: self,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Logic {
    type Err = ProofError;

    /// Parses a logic name, case-insensitively; the bare modal system names `K`, `T`, `S4`
    /// and `S5` denote the propositional modal logics
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let upper = match upper.as_str() {
            "K" | "T" | "S4" | "S5" => format!("ML{}", upper),
            _ => upper,
        };
        Logic::ALL
            .iter()
            .copied()
            .find(|logic| logic.name() == upper)
            .ok_or_else(|| ProofError::syntax("unknown logic", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Term;

    #[test]
    fn parse_names() {
        assert_eq!("tfl".parse::<Logic>().unwrap(), Logic::Tfl);
        assert_eq!("S4".parse::<Logic>().unwrap(), Logic::Mls4);
        assert_eq!("FOMLS5".parse::<Logic>().unwrap(), Logic::Fomls5);
        assert!("S6".parse::<Logic>().is_err());
        for logic in Logic::ALL {
            assert_eq!(logic.to_string().parse::<Logic>().unwrap(), logic);
        }
    }

    #[test]
    fn composites_union_rules() {
        let fomls4: Vec<&str> = Logic::Fomls4.rules().map(|r| r.name).collect();
        for name in Logic::Fol.rules().chain(Logic::Mls4.rules()).map(|r| r.name) {
            assert!(fomls4.contains(&name), "{} missing", name);
        }
        assert_eq!(
            fomls4.len(),
            Logic::Fol.rules().count() + Logic::Mls4.rules().count() - TFL_RULES.len()
        );
    }

    #[test]
    fn operator_sets() {
        let forall = Formula::for_all("x", Formula::predicate("F", vec![Term::name("x")]));
        assert!(Logic::Fol.check_operators(&forall).is_ok());
        assert_eq!(
            Logic::Tfl.check_operators(&forall),
            Err(ProofError::OperatorNotSupported {
                operator: NodeKind::Predicate,
                logic: Logic::Tfl
            })
        );
        let boxed = Formula::necessarily(Formula::letter("P"));
        assert!(Logic::Mlk.check_operators(&boxed).is_ok());
        assert!(Logic::Fol.check_operators(&boxed).is_err());
        assert!(Logic::Fomlk.check_operators(&boxed).is_ok());
        assert!(Logic::Mls5
            .check_operators(&Formula::possibly(forall))
            .is_err());
    }

    #[test]
    fn disciplines() {
        assert_eq!(Logic::Tfl.world_discipline(), WorldDiscipline::None);
        assert_eq!(Logic::Fomlt.world_discipline(), WorldDiscipline::Reflexive);
        assert_eq!(Logic::Mls5.world_discipline(), WorldDiscipline::Equivalence);
    }
}

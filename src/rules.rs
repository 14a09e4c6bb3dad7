//! Inference rules and the per-tier rule tables the [`Logic`](crate::Logic) registry is built
//! from.
//!
//! A [`RuleSpec`] only describes the outer shape of a rule application (what has to be cited
//! and which side condition applies). The structural premise patterns are checked in
//! [`verifier`](crate::verifier).

use std::fmt;

/// Every inference rule known to the kernel
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Rule {
    Reiteration,
    Explosion,
    IndirectProof,
    AndIntro,
    AndElim,
    OrIntro,
    OrElim,
    ImpliesIntro,
    ImpliesElim,
    IffIntro,
    IffElim,
    NotIntro,
    NotElim,
    DisjunctiveSyllogism,
    ModusTollens,
    DoubleNegationElim,
    ExcludedMiddle,
    DeMorgan,
    ForAllIntro,
    ForAllElim,
    ExistsIntro,
    ExistsElim,
    EqualityIntro,
    EqualityElim,
    QuantifierConversion,
    BoxIntro,
    BoxElim,
    PossiblyIntro,
    PossiblyElim,
    PossiblyDefinition,
    ModalConversion,
    ReflexiveReiteration,
    TransitiveReiteration,
    EuclideanReiteration,
}

/// What a single citation of a rule has to refer to
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CitationShape {
    /// A single visible line, `n`
    Line,
    /// A whole closed subproof, `n-m`
    Range,
}

impl fmt::Display for CitationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationShape::Line => f.write_str("line"),
            CitationShape::Range => f.write_str("subproof"),
        }
    }
}

/// Checks beyond the structural pattern
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SideCondition {
    None,
    /// The instantiating constant must not occur in undischarged assumptions
    FreshConstant,
    /// The cited subproof must open a new world without a hypothesis
    StrictSubproof,
    /// The cited subproof must open a new world with a hypothesis
    WorldHypothesis,
    /// The cited line may lie in an enclosing world, as far as the world discipline allows
    ModalImport,
}

/// Description of a rule as it appears in a logic's rule table
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RuleSpec {
    pub rule: Rule,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub citations: &'static [CitationShape],
    pub side_condition: SideCondition,
}

impl RuleSpec {
    const fn new(rule: Rule, name: &'static str, citations: &'static [CitationShape]) -> Self {
        RuleSpec {
            rule,
            name,
            aliases: &[],
            citations,
            side_condition: SideCondition::None,
        }
    }

    const fn aliases(self, aliases: &'static [&'static str]) -> Self {
        RuleSpec { aliases, ..self }
    }

    const fn side(self, side_condition: SideCondition) -> Self {
        RuleSpec {
            side_condition,
            ..self
        }
    }

    /// Returns true if `name` denotes this rule
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| *alias == name)
    }

    /// Rules citing closed subproofs discharge their assumptions
    pub fn discharges(&self) -> bool {
        self.citations.contains(&CitationShape::Range)
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

use CitationShape::{Line as L, Range as S};

/// Truth-functional rules, shared by every logic
pub const TFL_RULES: &[RuleSpec] = &[
    RuleSpec::new(Rule::Reiteration, "R", &[L]),
    RuleSpec::new(Rule::Explosion, "X", &[L]),
    RuleSpec::new(Rule::IndirectProof, "IP", &[S]),
    RuleSpec::new(Rule::AndIntro, "∧I", &[L, L]),
    RuleSpec::new(Rule::AndElim, "∧E", &[L]),
    RuleSpec::new(Rule::OrIntro, "∨I", &[L]),
    RuleSpec::new(Rule::OrElim, "∨E", &[L, S, S]),
    RuleSpec::new(Rule::ImpliesIntro, "→I", &[S]),
    RuleSpec::new(Rule::ImpliesElim, "→E", &[L, L]),
    RuleSpec::new(Rule::IffIntro, "↔I", &[S, S]),
    RuleSpec::new(Rule::IffElim, "↔E", &[L, L]),
    RuleSpec::new(Rule::NotIntro, "¬I", &[S]),
    RuleSpec::new(Rule::NotElim, "¬E", &[L, L]),
    RuleSpec::new(Rule::DisjunctiveSyllogism, "DS", &[L, L]),
    RuleSpec::new(Rule::ModusTollens, "MT", &[L, L]),
    RuleSpec::new(Rule::DoubleNegationElim, "DNE", &[L]),
    RuleSpec::new(Rule::ExcludedMiddle, "LEM", &[S, S]),
    RuleSpec::new(Rule::DeMorgan, "DeM", &[L]),
];

/// Quantifier and identity rules of first-order logic
pub const FOL_RULES: &[RuleSpec] = &[
    RuleSpec::new(Rule::ForAllIntro, "∀I", &[L]).side(SideCondition::FreshConstant),
    RuleSpec::new(Rule::ForAllElim, "∀E", &[L]),
    RuleSpec::new(Rule::ExistsIntro, "∃I", &[L]),
    RuleSpec::new(Rule::ExistsElim, "∃E", &[L, S]).side(SideCondition::FreshConstant),
    RuleSpec::new(Rule::EqualityIntro, "=I", &[]),
    RuleSpec::new(Rule::EqualityElim, "=E", &[L, L]),
    RuleSpec::new(Rule::QuantifierConversion, "CQ", &[L]),
];

/// Rules of the weakest modal system K
pub const K_RULES: &[RuleSpec] = &[
    RuleSpec::new(Rule::BoxIntro, "□I", &[S]).side(SideCondition::StrictSubproof),
    RuleSpec::new(Rule::BoxElim, "□E", &[L]).side(SideCondition::ModalImport),
    RuleSpec::new(Rule::PossiblyElim, "♢E", &[L, S])
        .aliases(&["◇E"])
        .side(SideCondition::WorldHypothesis),
    RuleSpec::new(Rule::PossiblyDefinition, "Def♢", &[L]).aliases(&["Def◇"]),
    RuleSpec::new(Rule::ModalConversion, "MC", &[L]),
];

/// Rules sanctioned by reflexive accessibility (T)
pub const T_RULES: &[RuleSpec] = &[
    RuleSpec::new(Rule::ReflexiveReiteration, "RT", &[L]),
    RuleSpec::new(Rule::PossiblyIntro, "♢I", &[L]).aliases(&["◇I"]),
];

/// Rules sanctioned by transitive accessibility (S4)
pub const S4_RULES: &[RuleSpec] =
    &[RuleSpec::new(Rule::TransitiveReiteration, "R4", &[L]).side(SideCondition::ModalImport)];

/// Rules sanctioned by euclidean accessibility (S5)
pub const S5_RULES: &[RuleSpec] =
    &[RuleSpec::new(Rule::EuclideanReiteration, "R5", &[L]).side(SideCondition::ModalImport)];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let all: Vec<&RuleSpec> = [TFL_RULES, FOL_RULES, K_RULES, T_RULES, S4_RULES, S5_RULES]
            .iter()
            .flat_map(|tier| tier.iter())
            .collect();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!b.is_named(a.name), "{} is defined twice", a.name);
                assert_ne!(a.rule, b.rule);
            }
        }
    }

    #[test]
    fn discharging_rules() {
        let discharging: Vec<&str> = [TFL_RULES, FOL_RULES, K_RULES]
            .iter()
            .flat_map(|tier| tier.iter())
            .filter(|spec| spec.discharges())
            .map(|spec| spec.name)
            .collect();
        assert_eq!(
            discharging,
            vec!["IP", "∨E", "→I", "↔I", "¬I", "LEM", "∃E", "□I", "♢E"]
        );
    }
}

//! Coverage criteria over parsed rules.
//!
//! Three independent, read-only grouping algorithms select rule subsets for
//! trace generation: shared responses, declared mutually-exclusive response
//! pairs, and shared measure usages.

use crate::rules::measures::{rule_usages, Bound, CmpOp, MeasureUsage};
use crate::rules::parser::Rule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Reference to a rule contributing a response. A rule reached through an
/// `unless` clause carries the alternate tag: its main and unless responses
/// are logically mutually exclusive, so the two contributions must stay
/// distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleRef {
    pub rule: String,
    pub via_unless: bool,
}

impl RuleRef {
    pub fn main(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            via_unless: false,
        }
    }

    pub fn unless(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            via_unless: true,
        }
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.via_unless {
            write!(f, "{} (unless)", self.rule)
        } else {
            f.write_str(&self.rule)
        }
    }
}

/// Response name mapped to the set of rule refs producing it.
pub type ResponseGroups = BTreeMap<String, BTreeSet<RuleRef>>;

/// Bucket every rule ref by the response it produces: the main response
/// under the rule's own ref, each unless-response under the tagged ref.
pub fn group_by_response(rules: &[Rule]) -> ResponseGroups {
    let mut groups = ResponseGroups::new();
    for rule in rules {
        groups
            .entry(rule.main_response.clone())
            .or_default()
            .insert(RuleRef::main(&rule.name));
        for clause in &rule.unless_clauses {
            if let Some(response) = &clause.response {
                groups
                    .entry(response.clone())
                    .or_default()
                    .insert(RuleRef::unless(&rule.name));
            }
        }
    }
    groups
}

/// Keep only responses produced by more than one rule ref.
pub fn shared_response_groups(groups: &ResponseGroups) -> ResponseGroups {
    groups
        .iter()
        .filter(|(_, refs)| refs.len() > 1)
        .map(|(response, refs)| (response.clone(), refs.clone()))
        .collect()
}

/// One declared mutually-exclusive response pair with the rules witnessing
/// each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusiveGroup {
    pub left_response: String,
    pub left_rules: BTreeSet<RuleRef>,
    pub right_response: String,
    pub right_rules: BTreeSet<RuleRef>,
}

/// Resolve declared response pairs against the response groups.
///
/// A rule whose base name occurs on both sides of a pair produces both
/// responses itself (main vs. unless) and is not evidence of an exclusivity
/// violation; such rules are removed from both sides. A pair yields a group
/// only if both filtered sides remain non-empty.
pub fn mutually_exclusive_groups(
    groups: &ResponseGroups,
    pairs: &[(String, String)],
) -> Vec<ExclusiveGroup> {
    let mut result = Vec::new();

    for (left, right) in pairs {
        let (left, right) = (left.trim(), right.trim());
        let (Some(left_refs), Some(right_refs)) = (groups.get(left), groups.get(right)) else {
            continue;
        };

        let bases = |refs: &BTreeSet<RuleRef>| -> BTreeSet<String> {
            refs.iter().map(|r| r.rule.clone()).collect()
        };
        let overlap: BTreeSet<String> = bases(left_refs)
            .intersection(&bases(right_refs))
            .cloned()
            .collect();

        let keep = |refs: &BTreeSet<RuleRef>| -> BTreeSet<RuleRef> {
            refs.iter()
                .filter(|r| !overlap.contains(&r.rule))
                .cloned()
                .collect()
        };
        let left_rules = keep(left_refs);
        let right_rules = keep(right_refs);

        if left_rules.is_empty() || right_rules.is_empty() {
            debug!(left, right, "Exclusive pair has no independent witnesses");
            continue;
        }

        result.push(ExclusiveGroup {
            left_response: left.to_string(),
            left_rules,
            right_response: right.to_string(),
            right_rules,
        });
    }

    result
}

/// A parsed measure search term.
///
/// Accepted spellings: `bool_<name>` and `not_<name>` prefixes, explicit
/// comparisons (`UserAge<legalAge`, `UserAge_<_legalAge`, ASCII or glyph
/// operators), or a bare name meaning "boolean usage only".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageQuery {
    Boolean(String),
    NegatedBoolean(String),
    Comparison {
        measure: String,
        op: CmpOp,
        bound: String,
    },
}

impl UsageQuery {
    pub fn parse(term: &str) -> Self {
        let term = term.trim();
        if let Some(name) = term.strip_prefix("bool_") {
            return Self::Boolean(name.to_string());
        }
        if let Some(name) = term.strip_prefix("not_") {
            return Self::NegatedBoolean(name.to_string());
        }

        // Underscore-delimited alternate spellings fold into the plain form.
        let mut folded = term.to_string();
        for op in ["<=", ">=", "≤", "≥", "<", ">", "="] {
            folded = folded.replace(&format!("_{op}_"), op);
        }

        for glyph in ["<=", ">=", "≤", "≥", "<", ">", "="] {
            if let Some((measure, bound)) = folded.split_once(glyph) {
                // CmpOp::parse covers every glyph in the list
                if let Some(op) = CmpOp::parse(glyph) {
                    return Self::Comparison {
                        measure: measure.trim().to_string(),
                        op,
                        bound: bound.trim().to_string(),
                    };
                }
            }
        }

        Self::Boolean(term.to_string())
    }

    /// Case-insensitive match against one classified usage.
    pub fn matches(&self, usage: &MeasureUsage) -> bool {
        match (self, usage) {
            (Self::Boolean(want), MeasureUsage::Boolean(have)) => eq_fold(want, have),
            (Self::NegatedBoolean(want), MeasureUsage::NegatedBoolean(have)) => eq_fold(want, have),
            (
                Self::Comparison {
                    measure: want,
                    op: want_op,
                    bound: want_bound,
                },
                MeasureUsage::Comparison { measure, op, bound },
            ) => {
                eq_fold(want, measure)
                    && want_op == op
                    && eq_fold(want_bound, &bound_text(bound))
            }
            _ => false,
        }
    }
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn bound_text(bound: &Bound) -> String {
    bound.to_string()
}

/// Rules whose usage set contains a usage matching any query, with the
/// matching usages. Search is over main and unless conditions alike.
pub fn find_rules_with_usages(
    rules: &[Rule],
    queries: &[UsageQuery],
) -> BTreeMap<String, BTreeSet<MeasureUsage>> {
    let mut matching = BTreeMap::new();
    for rule in rules {
        let usages = rule_usages(rule);
        let hits: BTreeSet<MeasureUsage> = usages
            .iter()
            .filter(|u| queries.iter().any(|q| q.matches(u)))
            .cloned()
            .collect();
        if !hits.is_empty() {
            matching.insert(rule.name.clone(), hits);
        }
    }
    matching
}

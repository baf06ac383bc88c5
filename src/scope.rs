//! Per-event measure scopes.
//!
//! A rule is triggered by the first event identifier in its main condition.
//! Every measure usage of that rule (main and unless conditions alike)
//! lands in the scope of its trigger event; rules sharing a trigger
//! accumulate into the same scope by monotone set union.

use crate::rules::measures::{extract_usages, Bound, CmpOp, MeasureUsage};
use crate::rules::parser::Rule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A numeric constraint attached to an event scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NumericConstraint {
    pub measure: String,
    pub op: CmpOp,
    pub bound: Bound,
}

/// The measures relevant to one triggering event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventScope {
    /// Measures referenced as plain booleans.
    pub booleans: BTreeSet<String>,

    /// Measures referenced under negation.
    pub negated: BTreeSet<String>,

    /// Measures referenced in numeric comparisons.
    pub numeric: BTreeSet<NumericConstraint>,
}

impl EventScope {
    pub fn is_empty(&self) -> bool {
        self.booleans.is_empty() && self.negated.is_empty() && self.numeric.is_empty()
    }

    fn insert(&mut self, usage: &MeasureUsage) {
        match usage {
            MeasureUsage::Boolean(name) => {
                self.booleans.insert(name.clone());
            }
            MeasureUsage::NegatedBoolean(name) => {
                self.negated.insert(name.clone());
            }
            MeasureUsage::Comparison { measure, op, bound } => {
                self.numeric.insert(NumericConstraint {
                    measure: measure.clone(),
                    op: *op,
                    bound: bound.clone(),
                });
            }
        }
    }
}

/// Event name mapped to its accumulated scope.
pub type ScopeMap = BTreeMap<String, EventScope>;

/// Build the scope map for a rule set. Rules without a recognizable
/// trigger event are skipped.
pub fn build_scopes(rules: &[Rule]) -> ScopeMap {
    let mut scopes = ScopeMap::new();
    for rule in rules {
        add_rule(&mut scopes, rule);
    }
    scopes
}

/// Accumulate one rule into the map. Union only; existing entries are
/// never narrowed.
pub fn add_rule(scopes: &mut ScopeMap, rule: &Rule) {
    let Some(event) = trigger_event(&rule.condition) else {
        debug!(rule = %rule.name, "Rule has no trigger event, skipped");
        return;
    };

    let scope = scopes.entry(event.clone()).or_default();
    for usage in extract_usages(&rule.condition) {
        scope.insert(&usage);
    }
    for clause in &rule.unless_clauses {
        for usage in extract_usages(&clause.condition) {
            scope.insert(&usage);
        }
    }
    debug!(rule = %rule.name, event = %event, "Accumulated rule into event scope");
}

/// First capitalized identifier outside brace references: event names are
/// bare tokens, measure names live inside `{...}`.
pub fn trigger_event(condition: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut word = String::new();
    for c in condition.chars().chain([' ']) {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_alphanumeric() || c == '_') => {
                word.push(c);
                continue;
            }
            _ => {}
        }
        if is_event_name(&word) {
            return Some(std::mem::take(&mut word));
        }
        word.clear();
    }
    None
}

fn is_event_name(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && word.len() >= 2
        && word.chars().all(|c| c.is_ascii_alphabetic())
}

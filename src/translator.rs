//! Trace-to-LTS translation.
//!
//! Combines a parsed trace with per-event measure scopes into a linear
//! labelled transition system: one transition per event entry, labelled
//! with the event name, the scope-filtered measure values, and the time.
//! The output `.aut` text is the byte-level contract with the downstream
//! equivalence checker, so rendering is fully deterministic.

use crate::bounds::BoundEnv;
use crate::error::Diagnostic;
use crate::rules::measures::Bound;
use crate::scope::{EventScope, ScopeMap};
use crate::trace::TraceEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// One labelled transition between dense state ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: usize,
    pub label: String,
    pub to: usize,
}

/// A linear labelled transition system over states `0..=len`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lts {
    pub transitions: Vec<Transition>,
}

impl Lts {
    pub fn initial_state(&self) -> usize {
        0
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn state_count(&self) -> usize {
        self.transitions.len() + 1
    }

    /// Render the `.aut` serialization consumed by the equivalence checker.
    pub fn to_aut(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Lts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "des ({}, {}, {})",
            self.initial_state(),
            self.transition_count(),
            self.state_count()
        )?;
        for t in &self.transitions {
            write!(f, "\n({}, \"{}\", {})", t.from, t.label, t.to)?;
        }
        Ok(())
    }
}

/// Translation result: the LTS plus non-fatal findings (unresolved bounds,
/// non-numeric snapshot values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub lts: Lts,
    pub diagnostics: Vec<Diagnostic>,
}

/// Translate a chronological trace into a linear LTS.
///
/// A `Snapshot` entry replaces the running valuation wholesale; an `Event`
/// entry appends one transition labelled with the measures its scope
/// selects from the current valuation. Events without a known scope get a
/// bare `Name(time=T)` label. States are dense and strictly trace-ordered;
/// equivalent states are never merged.
pub fn translate(entries: &[TraceEntry], scopes: &ScopeMap, bounds: &BoundEnv) -> Translation {
    let mut snapshot: BTreeMap<String, String> = BTreeMap::new();
    let mut transitions = Vec::new();
    let mut diagnostics = Vec::new();
    let empty = EventScope::default();

    for entry in entries {
        match entry {
            TraceEntry::Snapshot { values, .. } => {
                // replace, never merge
                snapshot = values.clone();
            }
            TraceEntry::Event { time, name, .. } => {
                let scope = scopes.get(name).unwrap_or(&empty);
                let label = event_label(name, *time, scope, &snapshot, bounds, &mut diagnostics);
                let from = transitions.len();
                debug!(label = %label, from, "Appending transition");
                transitions.push(Transition {
                    from,
                    label,
                    to: from + 1,
                });
            }
        }
    }

    let lts = Lts { transitions };
    info!(
        transitions = lts.transition_count(),
        states = lts.state_count(),
        diagnostics = diagnostics.len(),
        "Translated trace to LTS"
    );
    Translation { lts, diagnostics }
}

/// Build one transition label: `Name(m1=v1, ..., time=T)` with measures
/// sorted by name, or `Name(time=T)` when none qualify.
fn event_label(
    event: &str,
    time: u64,
    scope: &EventScope,
    snapshot: &BTreeMap<String, String>,
    bounds: &BoundEnv,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let mut selected: BTreeMap<&str, &str> = BTreeMap::new();

    for measure in &scope.booleans {
        if let Some(value) = snapshot.get(measure) {
            if value.eq_ignore_ascii_case("true") {
                selected.insert(measure, value);
            }
        }
    }

    for measure in &scope.negated {
        if let Some(value) = snapshot.get(measure) {
            if value.eq_ignore_ascii_case("false") {
                selected.insert(measure, value);
            }
        }
    }

    for constraint in &scope.numeric {
        let Some(value) = snapshot.get(&constraint.measure) else {
            continue;
        };
        if comparison_holds(event, constraint, value, bounds, diagnostics) {
            selected.insert(&constraint.measure, value);
        }
    }

    let mut label = String::from(event);
    label.push('(');
    for (name, value) in &selected {
        label.push_str(name);
        label.push('=');
        label.push_str(value);
        label.push_str(", ");
    }
    label.push_str(&format!("time={time})"));
    label
}

/// Evaluate a numeric constraint against a snapshot value. Unresolvable
/// symbolic bounds and non-numeric values default to "satisfied" so the
/// measure is over-included rather than silently dropped; both cases are
/// reported as diagnostics.
fn comparison_holds(
    event: &str,
    constraint: &crate::scope::NumericConstraint,
    value: &str,
    bounds: &BoundEnv,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let Ok(value) = value.parse::<i64>() else {
        diagnostics.push(Diagnostic::new(format!(
            "non-numeric value '{value}' for measure '{}' at event '{event}', included by default",
            constraint.measure
        )));
        return true;
    };

    let target = match &constraint.bound {
        Bound::Literal(n) => *n,
        Bound::Name(name) => match bounds.resolve(name) {
            Some(n) => n,
            None => {
                diagnostics.push(Diagnostic::new(format!(
                    "unresolved bound '{name}' for measure '{}' at event '{event}', included by default",
                    constraint.measure
                )));
                return true;
            }
        },
    };

    constraint.op.holds(value, target)
}

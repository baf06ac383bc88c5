//! Best-effort parser for raw timestamped traces.
//!
//! The external trace generator emits one entry per line:
//!
//! ```text
//! at time 0: Measure(a=true, b=false, c=10)
//! at time 0: MeetingUser()
//! ```
//!
//! `Measure(...)` lines snapshot the state variables; every other entry is
//! an event occurrence. Lines that match neither shape are skipped with a
//! diagnostic. Entries whose event name carries the `blocked_` prefix are
//! generator bookkeeping and are dropped.

use crate::error::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One chronological trace entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEntry {
    /// Measure snapshot: the full state-variable valuation at a time.
    Snapshot {
        time: u64,
        values: BTreeMap<String, String>,
    },

    /// Event occurrence.
    Event {
        time: u64,
        name: String,
        raw_args: String,
    },
}

impl TraceEntry {
    pub fn time(&self) -> u64 {
        match self {
            Self::Snapshot { time, .. } | Self::Event { time, .. } => *time,
        }
    }
}

/// Parsed trace plus non-fatal diagnostics for skipped lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTrace {
    pub entries: Vec<TraceEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedTrace {
    /// Number of event entries (the transition count of the eventual LTS).
    pub fn event_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, TraceEntry::Event { .. }))
            .count()
    }
}

/// Parse a raw trace. Entry order follows the input; times are copied
/// verbatim and not validated for monotonicity.
pub fn parse_trace(text: &str) -> ParsedTrace {
    let mut parsed = ParsedTrace::default();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_num = idx + 1;

        let Some((time, action)) = split_timestamp(line) else {
            parsed
                .diagnostics
                .push(Diagnostic::at_line("skipped unrecognized trace line", line_num));
            continue;
        };

        if let Some(args) = action
            .strip_prefix("Measure(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            parsed.entries.push(TraceEntry::Snapshot {
                time,
                values: parse_value_pairs(args),
            });
            continue;
        }

        let (name, raw_args) = match action.split_once('(') {
            Some((name, rest)) => (name.trim(), rest.strip_suffix(')').unwrap_or(rest).trim()),
            None => (action, ""),
        };
        if name.is_empty() {
            parsed
                .diagnostics
                .push(Diagnostic::at_line("skipped event with empty name", line_num));
            continue;
        }
        if name.starts_with("blocked_") {
            debug!(event = name, time, "Dropped blocked event");
            continue;
        }
        parsed.entries.push(TraceEntry::Event {
            time,
            name: name.to_string(),
            raw_args: raw_args.to_string(),
        });
    }

    parsed
}

/// `at time <T>: <action>` -> `(T, action)`.
fn split_timestamp(line: &str) -> Option<(u64, &str)> {
    let rest = line.strip_prefix("at time")?.trim_start();
    let (time, action) = rest.split_once(':')?;
    Some((time.trim().parse().ok()?, action.trim()))
}

/// `a=true, b=10` -> ordered name/value mapping. Values keep their raw
/// spelling; typing happens at translation time.
fn parse_value_pairs(args: &str) -> BTreeMap<String, String> {
    args.split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

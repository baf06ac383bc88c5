//! Measure declarations and per-condition measure usage extraction.
//!
//! A condition references measures in braces: `{m}` is a boolean reference,
//! `not {m}` a negation, `{m} > bound` a numeric comparison. Extraction
//! classifies every reference into exactly one [`MeasureUsage`] variant.

use crate::rules::parser::Rule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

/// Declared type of a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    Boolean,
    Numeric,
}

/// A measure declaration from the definition block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    pub kind: MeasureKind,
}

/// Comparison operator in a numeric measure usage.
///
/// Rendered with the canonical glyph set; ASCII `<=`/`>=` normalize to
/// `≤`/`≥` on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    Gt,
    Eq,
    Le,
    Ge,
}

impl CmpOp {
    /// Parse an operator spelling, ASCII or glyph.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "=" => Some(Self::Eq),
            "<=" | "≤" => Some(Self::Le),
            ">=" | "≥" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn holds(self, value: i64, target: i64) -> bool {
        match self {
            Self::Lt => value < target,
            Self::Gt => value > target,
            Self::Eq => value == target,
            Self::Le => value <= target,
            Self::Ge => value >= target,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "=",
            Self::Le => "≤",
            Self::Ge => "≥",
        };
        f.write_str(glyph)
    }
}

/// Right-hand side of a numeric comparison: a literal or a symbolic name
/// resolved later through a bound environment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bound {
    Literal(i64),
    Name(String),
}

impl Bound {
    fn parse(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(n) => Self::Literal(n),
            Err(_) => Self::Name(token.to_string()),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// A classified measure reference inside a condition.
///
/// Replaces the string-prefix encoding (`bool_m`, `not_m`, `m>v`) with a
/// tagged union. A condition maps to a set of usages; duplicates collapse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasureUsage {
    /// Bare `{m}` reference.
    Boolean(String),

    /// `not {m}` reference.
    NegatedBoolean(String),

    /// `{m} <op> bound` reference.
    Comparison {
        measure: String,
        op: CmpOp,
        bound: Bound,
    },
}

impl MeasureUsage {
    /// Name of the referenced measure.
    pub fn measure(&self) -> &str {
        match self {
            Self::Boolean(name) | Self::NegatedBoolean(name) => name,
            Self::Comparison { measure, .. } => measure,
        }
    }
}

impl fmt::Display for MeasureUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(name) => write!(f, "{name}"),
            Self::NegatedBoolean(name) => write!(f, "not {name}"),
            Self::Comparison { measure, op, bound } => write!(f, "{measure} {op} {bound}"),
        }
    }
}

/// Parsed content of a `def_start`/`def_end` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definitions {
    /// Declared measures, in declaration order.
    pub measures: Vec<Measure>,

    /// Declared symbolic constants (`constant name = value` lines).
    pub constants: BTreeMap<String, i64>,
}

impl Definitions {
    /// Declared kind of a measure, if any. References to undeclared
    /// measures are tolerated everywhere, so a `None` here is not an error.
    pub fn kind_of(&self, name: &str) -> Option<MeasureKind> {
        self.measures
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.kind)
    }
}

/// Extract measure and constant declarations from a document's definition
/// block. Comment lines are ignored. A document without a definition block
/// yields empty `Definitions`.
pub fn parse_definitions(document: &str) -> Definitions {
    let Some(block) = block_between(document, "def_start", "def_end") else {
        return Definitions::default();
    };

    let mut defs = Definitions::default();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if let Some(measure) = parse_measure_line(line) {
            defs.measures.push(measure);
        } else if let Some((name, value)) = parse_constant_line(line) {
            defs.constants.insert(name, value);
        }
    }
    defs
}

/// Slice the text between the first `start` marker and the following `end`
/// marker, exclusive.
pub(crate) fn block_between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let len = text[from..].find(end)?;
    Some(&text[from..from + len])
}

/// `measure <name> : boolean|numeric`
fn parse_measure_line(line: &str) -> Option<Measure> {
    let rest = line.strip_prefix("measure")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, kind) = rest.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    let kind = match kind.trim().split_whitespace().next()? {
        "boolean" => MeasureKind::Boolean,
        "numeric" => MeasureKind::Numeric,
        _ => return None,
    };
    Some(Measure {
        name: name.to_string(),
        kind,
    })
}

/// `constant <name> = <integer>`
fn parse_constant_line(line: &str) -> Option<(String, i64)> {
    let rest = line.strip_prefix("constant")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, value) = rest.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    let value = value.trim().parse::<i64>().ok()?;
    Some((name.to_string(), value))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Extract the set of measure usages from a single condition span.
///
/// Classification runs in priority order per reference: a `not` immediately
/// preceding the brace wins, then a trailing comparison operator, then the
/// bare boolean reading. Parenthesized sub-expressions need no special
/// handling here: every brace reference in the span is visited once, so the
/// union over a compound condition is already complete.
pub fn extract_usages(condition: &str) -> BTreeSet<MeasureUsage> {
    let mut usages = BTreeSet::new();
    let mut rest = 0usize;

    while let Some(open) = condition[rest..].find('{') {
        let open = rest + open;
        let Some(close) = condition[open..].find('}') else {
            break;
        };
        let close = open + close;
        let name = condition[open + 1..close].trim();
        rest = close + 1;
        if name.is_empty() {
            continue;
        }

        if negation_precedes(&condition[..open]) {
            usages.insert(MeasureUsage::NegatedBoolean(name.to_string()));
        } else if let Some((op, bound)) = comparison_follows(&condition[close + 1..]) {
            usages.insert(MeasureUsage::Comparison {
                measure: name.to_string(),
                op,
                bound,
            });
        } else {
            usages.insert(MeasureUsage::Boolean(name.to_string()));
        }
    }

    usages
}

/// All usages a rule contributes: its main condition unioned with every
/// `unless` condition.
pub fn rule_usages(rule: &Rule) -> BTreeSet<MeasureUsage> {
    let mut usages = extract_usages(&rule.condition);
    for clause in &rule.unless_clauses {
        usages.extend(extract_usages(&clause.condition));
    }
    usages
}

/// True when the text before a brace ends with the word `not`.
fn negation_precedes(before: &str) -> bool {
    let trimmed = before.trim_end();
    let Some(head) = trimmed.strip_suffix("not") else {
        return false;
    };
    head.is_empty() || head.ends_with(|c: char| !is_ident_char(c))
}

/// Comparison operator plus bound token after a brace, if present.
fn comparison_follows(after: &str) -> Option<(CmpOp, Bound)> {
    let after = after.trim_start();
    let (op, tail) = ["<=", ">=", "≤", "≥", "<", ">", "="]
        .iter()
        .find_map(|glyph| Some((CmpOp::parse(glyph)?, after.strip_prefix(glyph)?)))?;
    let tail = tail.trim_start();
    let end = tail
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map_or(tail.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    Some((op, Bound::parse(&tail[..end])))
}

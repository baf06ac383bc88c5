//! Rule-language front end: structural rule parsing and measure extraction.
//!
//! A rule document has three optional marker-delimited blocks:
//!
//! ```text
//! def_start
//! measure <name> : boolean|numeric
//! constant <name> = <int>
//! def_end
//!
//! rule_start
//! <Name> when <condition> then <response> [unless <condition> then <response>]
//! rule_end
//!
//! relation_start
//! mutualExclusive <responseA> <responseB>
//! relation_end
//! ```
//!
//! Conditions reference measures as `{name}`, `not {name}`, or
//! `{name} <op> <bound>`, combinable with `and`/`or`/parentheses.

pub mod measures;
pub mod parser;

pub use measures::{
    extract_usages, parse_definitions, rule_usages, Bound, CmpOp, Definitions, Measure,
    MeasureKind, MeasureUsage,
};
pub use parser::{parse_rules, ParsedRules, Rule, UnlessClause};

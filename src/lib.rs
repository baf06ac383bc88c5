//! sleec-connect: SLEEC rule coverage analysis and trace-to-LTS translation.
//!
//! Connects a normative rule language (rules of the form
//! `Name when CONDITION then RESPONSE [unless CONDITION then RESPONSE]`
//! over typed state variables called *measures*) to an external
//! equivalence-checking toolchain:
//!
//! 1. **Parse**: recover structured rules and typed measure usages from a
//!    rule document ([`rules`]).
//! 2. **Select**: group rules by a coverage criterion — shared response,
//!    declared mutually-exclusive responses, or shared measures
//!    ([`coverage`]).
//! 3. **Synthesize**: re-emit a valid rule document for the selected
//!    subset ([`synth`]), feed it to an external trace generator
//!    ([`trace_gen`], feature `trace-gen`).
//! 4. **Translate**: map the raw timestamped trace onto a linear LTS whose
//!    transition labels carry exactly the measures in each event's scope
//!    ([`scope`], [`translator`]).
//! 5. **Check**: hand the `.aut` output and a label rename mapping to the
//!    CADP toolchain for weak-trace comparison ([`check`], feature
//!    `check`).
//!
//! # Quick Start
//!
//! ```
//! use sleec_connect::Pipeline;
//!
//! let pipeline = Pipeline::new(
//!     "rule_start\n\
//!      R1 when MeetingUser and {userPayingAttention} then Inform\n\
//!      R2 when MeetingUser then Inform\n\
//!      rule_end",
//! );
//! let selection = pipeline.shared_response_selection();
//! let subset = pipeline.synthesize(&selection)?;
//! let scopes = pipeline.scopes_for(&subset);
//!
//! // trace text normally comes from the external generator
//! let translation = pipeline.translate(
//!     &scopes,
//!     "at time 0: Measure(userPayingAttention=true)\n\
//!      at time 0: MeetingUser()",
//! );
//! assert!(translation.lts.to_aut().starts_with("des (0, 1, 2)"));
//! # Ok::<(), sleec_connect::Error>(())
//! ```

pub mod bounds;
pub mod coverage;
pub mod error;
pub mod pipeline;
pub mod rules;
pub mod scope;
pub mod synth;
pub mod trace;
pub mod translator;

#[cfg(feature = "check")]
pub mod check;
#[cfg(feature = "trace-gen")]
pub mod trace_gen;

#[cfg(any(feature = "trace-gen", feature = "check"))]
mod util;

// Re-export core types for convenience
pub use bounds::BoundEnv;
pub use coverage::{
    find_rules_with_usages, group_by_response, mutually_exclusive_groups, shared_response_groups,
    ExclusiveGroup, ResponseGroups, RuleRef, UsageQuery,
};
pub use error::{Diagnostic, Error, SleecResult};
pub use pipeline::Pipeline;
pub use rules::{
    extract_usages, parse_definitions, parse_rules, Bound, CmpOp, Definitions, Measure,
    MeasureKind, MeasureUsage, ParsedRules, Rule, UnlessClause,
};
pub use scope::{build_scopes, EventScope, ScopeMap};
pub use synth::{synthesize, verify_round_trip, Selection};
pub use trace::{parse_trace, ParsedTrace, TraceEntry};
pub use translator::{translate, Lts, Transition, Translation};

#[cfg(feature = "check")]
pub use check::{check_equivalence, CheckConfig, RenameMap, Verdict};
#[cfg(feature = "trace-gen")]
pub use trace_gen::{generate_trace, TraceGenConfig};

//! Rule document synthesis from a coverage selection.
//!
//! Re-emits a valid rule-language document for a selected rule subset:
//! definition block (copied from the original document when present), the
//! selected rules' verbatim full texts, and, for exclusivity selections, a
//! relation block declaring the inferred `mutualExclusive` pairs.

use crate::coverage::{ExclusiveGroup, ResponseGroups, RuleRef};
use crate::error::{Error, SynthError};
use crate::rules::measures::{block_between, rule_usages};
use crate::rules::parser::{parse_rules, ParsedRules};
use similar::{ChangeTag, TextDiff};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use tracing::{debug, info};

/// Fallback definition block for documents without one.
const DEFAULT_DEFINITIONS: &str = "\
measure userPayingAttention: boolean
measure userDataInformed: boolean
measure userSensoryNeedsMet: boolean
measure urgentNeed: boolean
measure severityOfState: numeric
measure stablePsychologicalState: boolean
measure timeElapsed: numeric
measure informationAvailable: boolean
measure informationDisclosureNotPermitted: boolean
measure languagePreferenceAvailable: boolean
measure directlyToUser: boolean
measure userConsentAvalaible: boolean
measure guardianConsentAvalaible: boolean
measure medicalEmergency: boolean
measure culturalIndicatorA: boolean
measure genderTypeB: boolean
measure userNameUnknown: boolean
measure userDirectsOtherwise: boolean
measure instructionRepeat: numeric
measure bodyPartInvolvedInExam: boolean
measure behaviorAggressive: boolean
measure dataNoiseConsidered: boolean
measure dataRelevantToContext: boolean
measure dataUnnecessary: boolean
measure trainingDataRepresentative: boolean
measure patientComfortable: boolean
measure patientAgeConsidered: boolean
measure patientXReligion: boolean
measure stablePhysicalState: boolean
measure UserUnableToConsent: boolean
measure UserAge: numeric";

/// A rule subset chosen by one of the coverage criteria, or given
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Responses produced by more than one rule, with their contributors.
    SharedResponses(ResponseGroups),

    /// Declared mutually-exclusive response pairs with their witnesses.
    /// Synthesis emits a relation block for these.
    MutuallyExclusive(Vec<ExclusiveGroup>),

    /// Rules sharing the searched measure usages.
    SharedMeasures {
        terms: Vec<String>,
        rules: Vec<String>,
    },

    /// An explicit rule list.
    Rules(Vec<String>),
}

impl Selection {
    /// Base names of every selected rule, in emission order.
    pub fn rule_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut push = |name: &str| {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        };
        match self {
            Self::SharedResponses(groups) => {
                for refs in groups.values() {
                    refs.iter().for_each(|r| push(&r.rule));
                }
            }
            Self::MutuallyExclusive(groups) => {
                for group in groups {
                    group.left_rules.iter().for_each(|r| push(&r.rule));
                    group.right_rules.iter().for_each(|r| push(&r.rule));
                }
            }
            Self::SharedMeasures { rules, .. } | Self::Rules(rules) => {
                rules.iter().for_each(|r| push(r));
            }
        }
        names
    }

    fn is_empty(&self) -> bool {
        self.rule_names().is_empty()
    }
}

/// Emit a rule-language document for the selection.
///
/// The definition block is copied verbatim from the original document when
/// present, else the built-in fallback is used. A rule selected through
/// several groups appears once. A selected rule missing from the full-text
/// map degrades to emitting its reference text verbatim rather than
/// failing the synthesis.
pub fn synthesize(
    selection: &Selection,
    full_texts: &BTreeMap<String, String>,
    original_document: &str,
) -> Result<String, Error> {
    if selection.is_empty() {
        return Err(SynthError::EmptySelection.into());
    }

    let defs = block_between(original_document, "def_start", "def_end")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .unwrap_or(DEFAULT_DEFINITIONS);

    let mut out = String::new();
    let _ = writeln!(out, "def_start\n{defs}\ndef_end\n\nrule_start");

    let mut seen = BTreeSet::new();
    let mut exclusive_pairs: Vec<(String, String)> = Vec::new();

    match selection {
        Selection::SharedResponses(groups) => {
            for (response, refs) in groups {
                let _ = writeln!(out, "// Response: {response}");
                for r in refs {
                    emit_rule(&mut out, &mut seen, full_texts, r);
                }
                out.push('\n');
            }
        }
        Selection::MutuallyExclusive(groups) => {
            for (idx, group) in groups.iter().enumerate() {
                let _ = writeln!(out, "// Group {}", idx + 1);
                exclusive_pairs.push((group.left_response.clone(), group.right_response.clone()));
                for r in group.left_rules.iter().chain(&group.right_rules) {
                    emit_rule(&mut out, &mut seen, full_texts, r);
                }
                out.push('\n');
            }
        }
        Selection::SharedMeasures { terms, rules } => {
            let _ = writeln!(out, "// Rules sharing specified measures:");
            for term in terms {
                let _ = writeln!(out, "// {term}");
            }
            for rule in rules {
                emit_rule(&mut out, &mut seen, full_texts, &RuleRef::main(rule));
            }
        }
        Selection::Rules(rules) => {
            for rule in rules {
                emit_rule(&mut out, &mut seen, full_texts, &RuleRef::main(rule));
            }
        }
    }

    let _ = writeln!(out, "rule_end");

    if !exclusive_pairs.is_empty() {
        let _ = writeln!(out, "\nrelation_start");
        for (a, b) in &exclusive_pairs {
            let _ = writeln!(out, "mutualExclusive {a} {b}");
        }
        let _ = writeln!(out, "relation_end");
    }

    info!(
        rules = selection.rule_names().len(),
        exclusive_pairs = exclusive_pairs.len(),
        "Synthesized rule document"
    );
    Ok(out)
}

/// Append one selected rule's verbatim text. A rule occurring in several
/// groups is emitted once; a rule missing from the full-text map degrades
/// to its reference text.
fn emit_rule(
    out: &mut String,
    seen: &mut BTreeSet<String>,
    full_texts: &BTreeMap<String, String>,
    r: &RuleRef,
) {
    if !seen.insert(r.rule.clone()) {
        return;
    }
    match full_texts.get(&r.rule) {
        Some(text) => {
            let _ = writeln!(out, "{text}\n");
        }
        None => {
            debug!(rule = %r, "No full text for selected rule, emitting reference");
            let _ = writeln!(out, "{r}\n");
        }
    }
}

/// Verify the idempotence contract: re-parsing the synthesized document
/// must reproduce the selected rule names and their usage sets. Reports a
/// unified diff of the two usage listings on mismatch.
pub fn verify_round_trip(original: &ParsedRules, synthesized: &str) -> Result<(), Error> {
    let reparsed = parse_rules(synthesized);

    let listing = |parsed: &ParsedRules, names: &[String]| -> String {
        let mut out = String::new();
        for name in names {
            let usages = parsed
                .rule(name)
                .map(|rule| {
                    rule_usages(rule)
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_else(|| "<missing>".into());
            let _ = writeln!(out, "{name}: [{usages}]");
        }
        out
    };

    let names: Vec<String> = reparsed.rules.iter().map(|r| r.name.clone()).collect();
    let expected = listing(original, &names);
    let actual = listing(&reparsed, &names);

    if expected != actual || names.iter().any(|n| original.rule(n).is_none()) {
        return Err(SynthError::RoundTrip {
            diff: unified_diff(&expected, &actual),
        }
        .into());
    }
    Ok(())
}

/// Produce a unified diff between two debug-formatted strings.
pub(crate) fn unified_diff(left: &str, right: &str) -> String {
    let diff = TextDiff::from_lines(left, right);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        output.push_str(sign);
        output.push_str(change.value());
        if !change.value().ends_with('\n') {
            output.push('\n');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{group_by_response, shared_response_groups};

    const DOC: &str = "\
def_start
measure a: boolean
measure age: numeric
constant legalAge = 18
def_end

rule_start
R1 when EventA and {a} then Inform
R2 when EventB then Inform
R3 when EventC then Warn unless {age} < legalAge then Inform
R4 when EventD then Warn
rule_end";

    #[test]
    fn shared_selection_round_trips() {
        let parsed = parse_rules(DOC);
        let shared = shared_response_groups(&group_by_response(&parsed.rules));
        let selection = Selection::SharedResponses(shared);

        let doc = synthesize(&selection, &parsed.full_texts, DOC).unwrap();
        verify_round_trip(&parsed, &doc).unwrap();

        let reparsed = parse_rules(&doc);
        let mut names: Vec<_> = reparsed.rules.iter().map(|r| r.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["R1", "R2", "R3", "R4"]);
    }

    #[test]
    fn original_definition_block_is_copied() {
        let parsed = parse_rules(DOC);
        let doc = synthesize(
            &Selection::Rules(vec!["R1".into()]),
            &parsed.full_texts,
            DOC,
        )
        .unwrap();
        assert!(doc.contains("constant legalAge = 18"));
        assert!(!doc.contains("userPayingAttention"));
    }

    #[test]
    fn fallback_definitions_used_without_block() {
        let source = "R1 when EventA then Inform";
        let parsed = parse_rules(source);
        let doc = synthesize(
            &Selection::Rules(vec!["R1".into()]),
            &parsed.full_texts,
            source,
        )
        .unwrap();
        assert!(doc.contains("measure userPayingAttention: boolean"));
    }

    #[test]
    fn exclusive_selection_declares_relations() {
        let parsed = parse_rules(DOC);
        let groups = group_by_response(&parsed.rules);
        let exclusive =
            crate::coverage::mutually_exclusive_groups(&groups, &[("Warn".into(), "Inform".into())]);
        let doc = synthesize(
            &Selection::MutuallyExclusive(exclusive),
            &parsed.full_texts,
            DOC,
        )
        .unwrap();
        assert!(doc.contains("relation_start"));
        assert!(doc.contains("mutualExclusive Warn Inform"));
        assert!(doc.contains("relation_end"));
        verify_round_trip(&parsed, &doc).unwrap();
    }

    #[test]
    fn missing_full_text_degrades_to_reference() {
        let parsed = parse_rules(DOC);
        let doc = synthesize(
            &Selection::Rules(vec!["Ghost".into()]),
            &parsed.full_texts,
            DOC,
        )
        .unwrap();
        assert!(doc.contains("Ghost"));
    }

    #[test]
    fn empty_selection_is_an_error() {
        let parsed = parse_rules(DOC);
        let err = synthesize(&Selection::Rules(vec![]), &parsed.full_texts, DOC);
        assert!(matches!(
            err,
            Err(Error::Synth(SynthError::EmptySelection))
        ));
    }

    #[test]
    fn round_trip_mismatch_reports_diff() {
        let parsed = parse_rules(DOC);
        let tampered = "rule_start\nR1 when EventA and not {a} then Inform\nrule_end";
        let err = verify_round_trip(&parsed, tampered).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("round-trip") || text.contains("not a"), "{text}");
    }

    #[test]
    fn shared_measures_selection_carries_term_comments() {
        let parsed = parse_rules(DOC);
        let selection = Selection::SharedMeasures {
            terms: vec!["a".into()],
            rules: vec!["R1".into()],
        };
        let doc = synthesize(&selection, &parsed.full_texts, DOC).unwrap();
        assert!(doc.contains("// Rules sharing specified measures:"));
        assert!(doc.contains("// a"));
        verify_round_trip(&parsed, &doc).unwrap();
    }
}

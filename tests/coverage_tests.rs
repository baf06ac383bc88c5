//! Tests for the coverage grouping criteria over a realistic document.

use sleec_connect::*;

const DOC: &str = "\
def_start
measure userPayingAttention: boolean
measure userDataInformed: boolean
measure urgentNeed: boolean
measure severityOfState: numeric
measure UserAge: numeric
measure medicalEmergency: boolean
constant legalAge = 18
def_end

rule_start
// greeting and information
R1 when MeetingUser and {userPayingAttention} then InformUser
R2 when MeetingUser and {userDataInformed} then InformUser
R3 when ExaminationStarted then ObtainConsent unless {UserAge} < legalAge then ObtainGuardianConsent
R4 when ExaminationStarted and {medicalEmergency} then CallEmergencyServices unless not {urgentNeed} then ObtainConsent
R5 when UserRequestsInfo and {severityOfState} > StateThreshold then InformUser
R6 when GuardianPresent then ObtainGuardianConsent
rule_end";

fn parsed() -> ParsedRules {
    parse_rules(DOC)
}

#[test]
fn test_shared_response_grouping() {
    let groups = shared_response_groups(&group_by_response(&parsed().rules));

    let inform = &groups["InformUser"];
    assert_eq!(inform.len(), 3);
    assert!(inform.contains(&RuleRef::main("R1")));
    assert!(inform.contains(&RuleRef::main("R5")));

    let consent = &groups["ObtainConsent"];
    assert!(consent.contains(&RuleRef::main("R3")));
    assert!(consent.contains(&RuleRef::unless("R4")));

    // single-contributor responses are not shared
    assert!(!groups.contains_key("CallEmergencyServices"));
}

#[test]
fn test_self_exclusion_exclusion() {
    // R3 produces ObtainConsent (main) and ObtainGuardianConsent (unless);
    // declaring that pair exclusive must not put R3 on either side.
    let groups = group_by_response(&parsed().rules);
    let exclusive = mutually_exclusive_groups(
        &groups,
        &[("ObtainConsent".into(), "ObtainGuardianConsent".into())],
    );

    assert_eq!(exclusive.len(), 1);
    let group = &exclusive[0];
    assert!(group.left_rules.iter().all(|r| r.rule != "R3"));
    assert!(group.right_rules.iter().all(|r| r.rule != "R3"));
    assert_eq!(group.left_rules, [RuleRef::unless("R4")].into());
    assert_eq!(group.right_rules, [RuleRef::main("R6")].into());
}

#[test]
fn test_exclusive_pair_dropped_when_one_side_empties() {
    // Every CallEmergencyServices witness (R4) also produces ObtainConsent
    // through its unless clause, so the pair has no independent evidence.
    let groups = group_by_response(&parsed().rules);
    let exclusive = mutually_exclusive_groups(
        &groups,
        &[("CallEmergencyServices".into(), "ObtainConsent".into())],
    );
    assert!(exclusive.is_empty());
}

#[test]
fn test_shared_measure_search_polarity() {
    let rules = parsed().rules;

    // bare name: boolean usages only
    let hits = find_rules_with_usages(&rules, &[UsageQuery::parse("userPayingAttention")]);
    assert_eq!(hits.len(), 1);
    assert!(hits.contains_key("R1"));

    // negated usages need the not_ prefix
    let hits = find_rules_with_usages(&rules, &[UsageQuery::parse("urgentNeed")]);
    assert!(hits.is_empty());
    let hits = find_rules_with_usages(&rules, &[UsageQuery::parse("not_urgentNeed")]);
    assert!(hits.contains_key("R4"));
}

#[test]
fn test_shared_measure_search_comparison_spellings() {
    let rules = parsed().rules;

    for term in [
        "UserAge<legalAge",
        "UserAge_<_legalAge",
        "userage<LEGALAGE",
    ] {
        let hits = find_rules_with_usages(&rules, &[UsageQuery::parse(term)]);
        assert!(hits.contains_key("R3"), "term {term} should match R3");
    }

    let hits = find_rules_with_usages(
        &rules,
        &[UsageQuery::parse("severityOfState>StateThreshold")],
    );
    assert!(hits.contains_key("R5"));
}

#[test]
fn test_polarity_extraction_main_vs_unless() {
    let parsed = parse_rules(
        "R1 when EventX and {a} and not {b} then Resp1 unless {c} > 5 then Resp2",
    );
    let rule = parsed.rule("R1").unwrap();

    let main: std::collections::BTreeSet<_> = extract_usages(&rule.condition);
    assert_eq!(
        main,
        [
            MeasureUsage::Boolean("a".into()),
            MeasureUsage::NegatedBoolean("b".into()),
        ]
        .into()
    );

    let unless: std::collections::BTreeSet<_> =
        extract_usages(&rule.unless_clauses[0].condition);
    assert_eq!(
        unless,
        [MeasureUsage::Comparison {
            measure: "c".into(),
            op: CmpOp::Gt,
            bound: Bound::Literal(5),
        }]
        .into()
    );
}

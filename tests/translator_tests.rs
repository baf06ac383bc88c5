//! End-to-end trace translation tests.

use sleec_connect::scope::NumericConstraint;
use sleec_connect::*;

/// Scope fixture: event R1 watches {a}, not {b}, {c} > 5.
fn r1_scope_map() -> ScopeMap {
    let mut scope = EventScope::default();
    scope.booleans.insert("a".into());
    scope.negated.insert("b".into());
    scope.numeric.insert(NumericConstraint {
        measure: "c".into(),
        op: CmpOp::Gt,
        bound: Bound::Literal(5),
    });
    [("R1".to_string(), scope)].into()
}

#[test]
fn test_translator_determinism_end_to_end() {
    let trace = parse_trace(
        "at time 0: Measure(a=true, b=false, c=10)\n\
         at time 0: R1()",
    );
    assert!(trace.diagnostics.is_empty());

    let translation = translate(&trace.entries, &r1_scope_map(), &BoundEnv::default());
    assert_eq!(
        translation.lts.to_aut(),
        "des (0, 1, 2)\n(0, \"R1(a=true, b=false, c=10, time=0)\", 1)"
    );
    assert!(translation.diagnostics.is_empty());
}

#[test]
fn test_state_density_ignores_time_gaps() {
    let trace = parse_trace(
        "at time 0: A()\n\
         at time 7: B()\n\
         at time 7: C()\n\
         at time 42: D()\n\
         at time 99: E()",
    );
    let translation = translate(&trace.entries, &ScopeMap::new(), &BoundEnv::default());

    assert_eq!(translation.lts.transition_count(), 5);
    assert_eq!(translation.lts.state_count(), 6);
    assert_eq!(translation.lts.initial_state(), 0);
    for (i, t) in translation.lts.transitions.iter().enumerate() {
        assert_eq!(t.from, i);
        assert_eq!(t.to, i + 1);
    }

    // times appear verbatim in the labels
    assert_eq!(translation.lts.transitions[3].label, "D(time=42)");
}

#[test]
fn test_scope_filtering_drops_out_of_scope_measures() {
    let trace = parse_trace(
        "at time 1: Measure(a=true, b=false, c=10, unrelated=true)\n\
         at time 1: R1()",
    );
    let translation = translate(&trace.entries, &r1_scope_map(), &BoundEnv::default());
    assert!(!translation.lts.transitions[0].label.contains("unrelated"));
}

#[test]
fn test_polarity_gates_inclusion() {
    // a=false fails the boolean gate, b=true fails the negated gate, c=3
    // fails the comparison: the label degenerates to the bare form.
    let trace = parse_trace(
        "at time 2: Measure(a=false, b=true, c=3)\n\
         at time 2: R1()",
    );
    let translation = translate(&trace.entries, &r1_scope_map(), &BoundEnv::default());
    assert_eq!(translation.lts.transitions[0].label, "R1(time=2)");
}

#[test]
fn test_symbolic_bound_via_document_constants() {
    let doc = "\
def_start
measure UserAge: numeric
constant legalAge = 18
def_end
rule_start
R1 when ExaminationStarted then ObtainConsent unless {UserAge} < legalAge then ObtainGuardianConsent
rule_end";
    let pipeline = Pipeline::new(doc);
    let scopes = pipeline.scopes_for(doc);

    let minor = pipeline.translate(
        &scopes,
        "at time 0: Measure(UserAge=15)\nat time 0: ExaminationStarted()",
    );
    assert_eq!(
        minor.lts.transitions[0].label,
        "ExaminationStarted(UserAge=15, time=0)"
    );

    let adult = pipeline.translate(
        &scopes,
        "at time 0: Measure(UserAge=40)\nat time 0: ExaminationStarted()",
    );
    assert_eq!(adult.lts.transitions[0].label, "ExaminationStarted(time=0)");
}

#[test]
fn test_unresolved_bound_is_permissive_with_diagnostic() {
    let doc = "\
rule_start
R1 when UserRequestsInfo and {severityOfState} > StateThreshold then InformUser
rule_end";
    let pipeline = Pipeline::new(doc);
    let scopes = pipeline.scopes_for(doc);

    let translation = pipeline.translate(
        &scopes,
        "at time 0: Measure(severityOfState=1)\nat time 0: UserRequestsInfo()",
    );
    assert_eq!(
        translation.lts.transitions[0].label,
        "UserRequestsInfo(severityOfState=1, time=0)"
    );
    assert_eq!(translation.diagnostics.len(), 1);
    assert!(translation.diagnostics[0].message.contains("StateThreshold"));
}

#[test]
fn test_snapshot_replacement_and_stale_values() {
    let trace = parse_trace(
        "at time 0: Measure(a=true, b=false, c=10)\n\
         at time 0: R1()\n\
         at time 1: Measure(c=10)\n\
         at time 1: R1()",
    );
    let translation = translate(&trace.entries, &r1_scope_map(), &BoundEnv::default());
    assert_eq!(
        translation.lts.transitions[0].label,
        "R1(a=true, b=false, c=10, time=0)"
    );
    // the second snapshot replaced the valuation wholesale
    assert_eq!(translation.lts.transitions[1].label, "R1(c=10, time=1)");
}

#[test]
fn test_unknown_events_still_advance_states() {
    let trace = parse_trace(
        "at time 0: R1()\n\
         at time 1: Mystery()\n\
         at time 2: R1()",
    );
    let translation = translate(&trace.entries, &r1_scope_map(), &BoundEnv::default());
    assert_eq!(translation.lts.transition_count(), 3);
    assert_eq!(translation.lts.transitions[1].label, "Mystery(time=1)");
}

#[test]
fn test_blocked_entries_do_not_become_transitions() {
    let trace = parse_trace(
        "at time 0: blocked_R1()\n\
         at time 0: R1()",
    );
    let translation = translate(&trace.entries, &r1_scope_map(), &BoundEnv::default());
    assert_eq!(translation.lts.transition_count(), 1);
}

#[test]
fn test_lts_serialization_shape() {
    let lts = Lts {
        transitions: vec![
            Transition {
                from: 0,
                label: "A(time=0)".into(),
                to: 1,
            },
            Transition {
                from: 1,
                label: "B(x=2, time=1)".into(),
                to: 2,
            },
        ],
    };
    assert_eq!(
        lts.to_aut(),
        "des (0, 2, 3)\n(0, \"A(time=0)\", 1)\n(1, \"B(x=2, time=1)\", 2)"
    );
}

//! Example: from a rule document to a checkable LTS.
//!
//! This example demonstrates how to:
//! 1. Parse a SLEEC-style rule document
//! 2. Select the rules sharing a response
//! 3. Synthesize a standalone document for the subset
//! 4. Translate a generated trace into the `.aut` automaton
//!
//! The trace is inlined here; in a real run it comes from the external
//! trace generator (see the `generate_and_check` example).
//!
//! Run with: cargo run --example coverage_to_lts

use sleec_connect::*;

const DOCUMENT: &str = "\
def_start
measure userPayingAttention: boolean
measure userDataInformed: boolean
measure urgentNeed: boolean
measure UserAge: numeric
constant legalAge = 18
def_end

rule_start
R1 when MeetingUser and {userPayingAttention} then InformUser
R2 when MeetingUser and ({userDataInformed} or not {urgentNeed}) then InformUser
R3 when ExaminationStarted then ObtainConsent unless {UserAge} < legalAge then ObtainGuardianConsent
R4 when GuardianPresent then ObtainGuardianConsent
rule_end";

const TRACE: &str = "\
at time 0: Measure(userPayingAttention=true, userDataInformed=false, urgentNeed=false, UserAge=15)
at time 0: MeetingUser()
at time 1: ExaminationStarted()";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(DOCUMENT);
    for diagnostic in pipeline.diagnostics() {
        eprintln!("warning: {diagnostic}");
    }

    let selection = pipeline.shared_response_selection();
    println!("Selected rules: {:?}", selection.rule_names());

    let subset = pipeline.synthesize(&selection)?;
    println!("--- synthesized document ---\n{subset}");

    let scopes = pipeline.scopes_for(&subset);
    let translation = pipeline.translate(&scopes, TRACE);
    for diagnostic in &translation.diagnostics {
        eprintln!("warning: {diagnostic}");
    }

    println!("--- LTS ---\n{}", translation.lts.to_aut());
    Ok(())
}

//! Example: drive the external toolchain end to end.
//!
//! This example demonstrates how to:
//! 1. Synthesize a rule subset document for every shared response
//! 2. Run an external trace generator on it
//! 3. Translate the trace into an `.aut` automaton
//! 4. Compare it against an augmented automaton with CADP
//!
//! Requires a trace generator binary plus CADP (`bcg_io`, `svl`,
//! `bcg_open`) on PATH, and three input files in the working directory:
//! `rules.sleec`, `augmented.aut`, `rename.ren`.
//!
//! Run with: cargo run --example generate_and_check

use sleec_connect::*;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document = std::fs::read_to_string("rules.sleec")?;
    let pipeline = Pipeline::new(document);

    let selection = pipeline.shared_response_selection();
    let subset = pipeline.synthesize(&selection)?;

    let gen_config = TraceGenConfig::builder()
        .generator_bin("legos-sim")
        .time_window(15)
        .timeout(Duration::from_secs(120))
        .build()?;
    println!("Generating trace...");
    let trace = generate_trace(&gen_config, &subset)?;

    let scopes = pipeline.scopes_for(&subset);
    let translation = pipeline.translate(&scopes, &trace);
    for diagnostic in &translation.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
    println!(
        "Translated {} events into {} states",
        translation.lts.transition_count(),
        translation.lts.state_count()
    );

    let augmented = std::fs::read_to_string("augmented.aut")?;
    let rename = RenameMap::parse(&std::fs::read_to_string("rename.ren")?)?;

    let check_config = CheckConfig::builder()
        .timeout(Duration::from_secs(300))
        .build();
    println!("Running CADP equivalence check...");
    match check_equivalence(&check_config, &translation.lts.to_aut(), &augmented, &rename)? {
        Verdict::Equivalent => println!("Automata are weak-trace equivalent"),
        Verdict::NotEquivalent { diagnostic } => {
            println!("Automata differ:\n{diagnostic}");
        }
    }
    Ok(())
}

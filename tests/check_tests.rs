//! Tests for CADP equivalence-check plumbing (rename maps, SVL scripts,
//! error paths). The toolchain itself is not required: execution tests
//! only assert the typed failure when the binaries are absent.

#![cfg(feature = "check")]

use sleec_connect::error::CheckError;
use sleec_connect::*;

#[test]
fn test_rename_map_render_parse_round_trip() {
    let map = RenameMap::new()
        .with_rename("InformUser(userPayingAttention=true, time=0)", "greets the user")
        .with_rename("Tick(time=3)", "i");

    let rendered = map.render();
    assert_eq!(
        rendered,
        "\"InformUser(userPayingAttention=true, time=0)\" -> \"greets the user\"\n\
         \"Tick(time=3)\" -> \"i\"\n"
    );
    assert_eq!(RenameMap::parse(&rendered).unwrap(), map);
}

#[test]
fn test_rename_map_parse_is_lenient_on_quoting() {
    let parsed = RenameMap::parse(
        "\"A(time=0)\" -> \"i\"\n\
         B(time=1) -> renamed\n\
         \n",
    )
    .unwrap();
    assert_eq!(parsed.pairs().len(), 2);
    assert_eq!(parsed.pairs()[1], ("B(time=1)".to_string(), "renamed".to_string()));
}

#[test]
fn test_rename_map_rejects_malformed_line() {
    let err = RenameMap::parse("\"A\" -> \"B\"\nnot a mapping").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("line 2"), "{text}");
}

#[test]
fn test_svl_script_shape() {
    let map = RenameMap::new().with_rename("A(time=0)", "first step");
    let svl = map.to_svl_script();

    assert!(svl.starts_with("property RENAME_RULES"));
    assert!(svl.contains("\"renamed.bcg\" = total rename"));
    assert!(svl.contains("    \"A(time=0)\" -> \"first step\""));
    assert!(svl.contains("in \"l2.bcg\";"));
    assert!(svl.trim_end().ends_with("end property"));
}

#[test]
fn test_empty_automata_are_terminal_errors() {
    let config = CheckConfig::default();

    let err = check_equivalence(&config, "", "des (0, 0, 1)", &RenameMap::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Check(CheckError::EmptyAutomaton { role: "reference" })
    ));

    let err = check_equivalence(&config, "des (0, 0, 1)", "\n", &RenameMap::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Check(CheckError::EmptyAutomaton { role: "augmented" })
    ));
}

#[test]
fn test_missing_toolchain_reports_tool_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = CheckConfig::builder()
        .bcg_io_bin("sleec-connect-no-such-tool")
        .work_dir(dir.path())
        .build();

    let err = check_equivalence(
        &config,
        "des (0, 0, 1)",
        "des (0, 0, 1)",
        &RenameMap::new(),
    )
    .unwrap_err();

    match err {
        Error::Check(CheckError::ToolNotFound { tool, .. }) => {
            assert_eq!(tool, "sleec-connect-no-such-tool");
        }
        other => panic!("expected ToolNotFound, got: {other}"),
    }

    // inputs were staged before the failure
    assert!(dir.path().join("l1.aut").exists());
    assert!(dir.path().join("l2.aut").exists());
    assert!(dir.path().join("rename.svl").exists());
}

#[test]
fn test_work_dir_receives_lts_bytes_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let config = CheckConfig::builder()
        .bcg_io_bin("sleec-connect-no-such-tool")
        .work_dir(dir.path())
        .build();

    let lts = Lts {
        transitions: vec![Transition {
            from: 0,
            label: "A(time=0)".into(),
            to: 1,
        }],
    };
    let aut = lts.to_aut();
    let _ = check_equivalence(&config, &aut, &aut, &RenameMap::new());

    let staged = std::fs::read_to_string(dir.path().join("l1.aut")).unwrap();
    assert_eq!(staged, "des (0, 1, 2)\n(0, \"A(time=0)\", 1)");
}

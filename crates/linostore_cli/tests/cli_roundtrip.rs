use std::path::Path;
use std::process::{Command, Output};

fn run(binary: &str, args: &[&Path], document: &str) -> Output {
    Command::new(binary)
        .args(args)
        .arg(document)
        .output()
        .expect("binary should start")
}

fn import(notation: &Path, storage: &Path, document: &str) -> Output {
    run(env!("CARGO_BIN_EXE_lino-import"), &[notation, storage], document)
}

fn export(storage: &Path, notation: &Path, document: &str) -> Output {
    run(env!("CARGO_BIN_EXE_lino-export"), &[storage, notation], document)
}

fn round_trip(notation: &str, document: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.lino");
    let storage = dir.path().join("links.db");
    let output = dir.path().join("output.lino");
    std::fs::write(&input, notation).unwrap();

    let imported = import(&input, &storage, document);
    assert!(
        imported.status.success(),
        "import failed: {}",
        String::from_utf8_lossy(&imported.stderr)
    );
    let exported = export(&storage, &output, document);
    assert!(
        exported.status.success(),
        "export failed: {}",
        String::from_utf8_lossy(&exported.stderr)
    );
    std::fs::read_to_string(&output).unwrap()
}

#[test]
fn raw_mode_round_trips_through_binaries() {
    for notation in ["(1: 1 1)", "(1: 1 1)\n(2: 2 2)", "(1: 2 2)", "(1: 2 2)\n(2: 1 1)"] {
        assert_eq!(round_trip(notation, ""), notation);
    }
}

#[test]
fn document_mode_round_trips_through_binaries() {
    for notation in [
        "(1: 1 1)",
        "(1: 1 1)\n(2: 2 2)",
        "(2: 2 2)",
        "(1: 2 (3: 3 3))\n(2: 1 1)",
        "(son: lovesMama)",
        "(papa: (lovesMama: loves mama))",
        "(papa: (lovesMama: loves mama)\nson lovesMama\ndaughter lovesMama\nall (love: mama))",
    ] {
        assert_eq!(round_trip(notation, "family"), notation);
    }
}

#[test]
fn duplicate_document_fails_and_keeps_original() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.lino");
    let second = dir.path().join("second.lino");
    let storage = dir.path().join("links.db");
    let output = dir.path().join("output.lino");
    std::fs::write(&first, "(1: 1 1)").unwrap();
    std::fs::write(&second, "(2: 2 2)").unwrap();

    assert!(import(&first, &storage, "d1").status.success());
    let duplicate = import(&second, &storage, "d1");
    assert!(!duplicate.status.success());
    assert!(String::from_utf8_lossy(&duplicate.stderr).contains("already exists"));

    assert!(export(&storage, &output, "d1").status.success());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "(1: 1 1)");
}

#[test]
fn missing_document_fails() {
    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().join("links.db");
    let output = dir.path().join("output.lino");

    let exported = export(&storage, &output, "ghost");
    assert!(!exported.status.success());
    assert!(String::from_utf8_lossy(&exported.stderr).contains("not found"));
    assert!(!output.exists());
}

#[test]
fn deeply_nested_document_round_trips_through_binaries() {
    const DEPTH: usize = 100_000;
    let notation = format!("{}x{}", "(".repeat(DEPTH), ")".repeat(DEPTH));

    assert_eq!(round_trip(&notation, "deep"), notation);
}

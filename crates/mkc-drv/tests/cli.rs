//! End-to-end tests for the `mkc` binary: full pipeline runs against
//! real files, plus exit-code behavior.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn mkc() -> Command {
    Command::cargo_bin("mkc").expect("mkc binary builds")
}

/// `fn main() -> String { "hello" }` compiles to a program that prints
/// `hello`, and the OpenAPI output has empty paths.
#[test]
fn hello_program_compiles_and_registers_main() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("hello.mk");
    let api = dir.path().join("api.json");
    fs::write(&input, r#"fn main() -> String { "hello" }"#).unwrap();

    mkc()
        .arg(&input)
        .arg("-a")
        .arg(&api)
        .assert()
        .success();

    let js = fs::read_to_string(dir.path().join("hello.js")).unwrap();
    assert!(js.starts_with("\"use strict\";\n"), "{js}");
    assert!(js.contains("return \"hello\";"), "{js}");
    assert!(js.trim_end().ends_with("console.log(main());"), "{js}");

    let openapi = fs::read_to_string(&api).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&openapi).unwrap();
    assert_eq!(doc["openapi"], "3.0.0");
    assert_eq!(doc["paths"], serde_json::json!({}));
}

/// A `/ping` route shows up in the OpenAPI document with a string
/// schema, and the emitted program registers the handler.
#[test]
fn ping_route_emits_registration_and_openapi_entry() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ping.mk");
    let api = dir.path().join("api.json");
    fs::write(&input, r#"api get "/ping" () -> String { "pong" }"#).unwrap();

    mkc().arg(&input).arg("-a").arg(&api).assert().success();

    let js = fs::read_to_string(dir.path().join("ping.js")).unwrap();
    assert!(
        js.contains("__router.register(\"GET\", \"/ping\""),
        "{js}"
    );
    assert!(js.contains("return \"pong\";"), "{js}");

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&api).unwrap()).unwrap();
    assert_eq!(
        doc["paths"]["/ping"]["get"]["responses"]["200"]["content"]["application/json"]["schema"],
        serde_json::json!({ "type": "string" })
    );
}

/// A well-typed program passes check mode with exit code 0.
#[test]
fn check_mode_passes_clean_program() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("add.mk");
    fs::write(
        &input,
        "fn add(a: Int, b: Int) -> Int { a + b } fn main() -> Int { add(2, 3) }",
    )
    .unwrap();

    mkc()
        .arg("-c")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Type check passed"));

    // Check mode produces no output file.
    assert!(!dir.path().join("add.js").exists());
}

/// A purity violation fails with exactly one E3002.
#[test]
fn purity_violation_is_reported_with_e3002() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pure.mk");
    fs::write(
        &input,
        "fn pure_caller() -> Unit { log_it() } \
         fn log_it() -> Unit uses { log } { log.info(\"x\") }",
    )
    .unwrap();

    mkc()
        .arg("-c")
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[E3002]"))
        .stderr(predicate::str::contains("1 error(s)"));
}

/// A non-exhaustive match fails with E4001 naming the missing
/// constructor.
#[test]
fn non_exhaustive_match_names_missing_constructor() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("shapes.mk");
    fs::write(
        &input,
        "type T = A | B fn f(x: T) -> Int { match x { A -> 1 } }",
    )
    .unwrap();

    mkc()
        .arg("-c")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("[E4001]"))
        .stderr(predicate::str::contains("`B`"));
}

/// A two-module import cycle fails with E5004 naming the full cycle.
#[test]
fn import_cycle_names_full_path() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.mk"), "module a { import b }").unwrap();
    fs::write(dir.path().join("b.mk"), "module b { import a }").unwrap();

    mkc()
        .arg(dir.path().join("a.mk"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[E5004]"))
        .stderr(predicate::str::contains("a -> b -> a"));
}

#[test]
fn format_mode_prints_canonical_source_and_does_not_compile() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("messy.mk");
    fs::write(&input, "fn   main( )->String{\"hello\"}").unwrap();

    mkc()
        .arg("-f")
        .arg(&input)
        .assert()
        .success()
        .stdout("fn main() -> String {\n    \"hello\"\n}\n");

    assert!(!dir.path().join("messy.js").exists());
}

#[test]
fn syntax_error_reports_position_and_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.mk");
    fs::write(&input, "fn broken( -> Int { 1 }").unwrap();

    mkc()
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("bad.mk:1:"))
        .stderr(predicate::str::contains("expected"));
}

#[test]
fn shadowing_is_rejected_with_e2006() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("shadow.mk");
    fs::write(&input, "fn f(x: Int) -> Int { let x = 2 x }").unwrap();

    mkc()
        .arg("-c")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("[E2006]"));
}

#[test]
fn missing_input_file_fails_with_io_error() {
    mkc()
        .arg("no-such-file.mk")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read input file"));
}

#[test]
fn missing_import_fails_with_e5001() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("app.mk");
    fs::write(&input, "module app { import ghost }").unwrap();

    mkc()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("[E5001]"))
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn output_path_can_be_overridden() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("app.mk");
    let output = dir.path().join("bundle.out.js");
    fs::write(&input, r#"fn main() -> String { "ok" }"#).unwrap();

    mkc()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
    assert!(!dir.path().join("app.js").exists());
}

#[test]
fn verbose_mode_reports_generated_files() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("app.mk");
    fs::write(&input, r#"fn main() -> String { "ok" }"#).unwrap();

    mkc()
        .arg("-v")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated"));
}

#[test]
fn oversized_source_is_rejected_with_e8001() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("big.mk");
    // One byte past the 16 MiB cap, all comments so it would otherwise
    // lex trivially.
    let mut content = String::with_capacity(16 * 1024 * 1024 + 16);
    content.push_str("// ");
    while content.len() <= 16 * 1024 * 1024 {
        content.push('x');
    }
    fs::write(&input, content).unwrap();

    mkc()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("[E8001]"));
}

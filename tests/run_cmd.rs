use predicates::prelude::*;

mod common;
use common::{cargo_bin, fixture, program_file};

#[test]
fn hello_world_fixture_prints_exact_bytes() {
    cargo_bin()
        .arg(fixture("hello.bf"))
        .assert()
        .success()
        .stdout("Hello World!\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn multiplication_fixture_prints_eight() {
    let assert = cargo_bin().arg(fixture("multiply.bf")).assert().success();
    assert_eq!(assert.get_output().stdout, vec![8u8]);
}

#[test]
fn file_flag_is_equivalent_to_positional_path() {
    cargo_bin()
        .arg("--file")
        .arg(fixture("hello.bf"))
        .assert()
        .success()
        .stdout("Hello World!\n");
}

#[test]
fn no_trailing_newline_is_added() {
    let tf = program_file("+++.");
    let assert = cargo_bin().arg(tf.path()).assert().success();
    assert_eq!(assert.get_output().stdout, vec![3u8]);
}

#[test]
fn empty_program_succeeds_silently() {
    let tf = program_file("");
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn pointer_wraps_by_default() {
    let tf = program_file("<+.");
    let assert = cargo_bin().arg(tf.path()).arg("-m").arg("4").assert().success();
    assert_eq!(assert.get_output().stdout, vec![1u8]);
}

#[test]
fn check_flag_rejects_unbalanced_program_before_running() {
    let tf = program_file("+.[");
    cargo_bin()
        .arg("--check")
        .arg(tf.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unmatched bracket '['"));
}

#[test]
fn entered_unclosed_loop_runs_without_check() {
    let tf = program_file("+.[");
    let assert = cargo_bin().arg(tf.path()).assert().success();
    assert_eq!(assert.get_output().stdout, vec![1u8]);
}

#[test]
fn same_program_and_input_give_identical_output() {
    let run = || {
        cargo_bin()
            .arg(fixture("cat.bf"))
            .write_stdin("repeat me")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    let first = run();
    let second = run();
    assert_eq!(first, b"repeat me");
    assert_eq!(first, second);
}

#[test]
fn help_flag_prints_usage_and_exits_zero() {
    cargo_bin()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Usage:").and(predicate::str::contains("--memory")));
}

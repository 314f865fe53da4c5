use predicates::prelude::*;
use std::time::Duration;

mod common;
use common::{cargo_bin, program_file};

fn infinite_bf() -> &'static str {
    "+[]" // increments to 1, then [] spins forever
}

#[test]
fn step_limit_flag_aborts_infinite_loop() {
    let tf = program_file(infinite_bf());
    cargo_bin()
        .arg("--max-steps").arg("50").arg(tf.path())
        .timeout(Duration::from_secs(5))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn step_limit_env_aborts_infinite_loop() {
    let tf = program_file(infinite_bf());
    cargo_bin()
        .env("BFI_MAX_STEPS", "50")
        .arg(tf.path())
        .timeout(Duration::from_secs(5))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (50)"));
}

#[test]
fn timeout_flag_aborts_infinite_loop() {
    let tf = program_file(infinite_bf());
    cargo_bin()
        .arg("--timeout").arg("100").arg(tf.path())
        .timeout(Duration::from_secs(5))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timeout exceeded (100 ms)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn generous_limits_do_not_affect_finishing_programs() {
    let tf = program_file("+++.");
    let assert = cargo_bin()
        .args(["--max-steps", "1000", "--timeout", "5000"])
        .arg(tf.path())
        .assert()
        .success();
    assert_eq!(assert.get_output().stdout, vec![3u8]);
}

// Exercises the ',' (input) instruction through the bfi binary.
use predicates::prelude::*;

mod common;
use common::{cargo_bin, fixture, program_file};

#[test]
fn reads_from_stdin_and_echoes_byte() {
    let tf = program_file(",.");
    cargo_bin()
        .arg(tf.path())
        .write_stdin("Z")
        .assert()
        .success()
        .stdout("Z");
}

#[test]
fn end_of_input_sets_cell_to_255_and_continues() {
    let tf = program_file(",.+.");
    let assert = cargo_bin().arg(tf.path()).write_stdin("").assert().success();
    assert_eq!(assert.get_output().stdout, vec![0xFFu8, 0x00]);
}

#[test]
fn cat_copies_all_input() {
    cargo_bin()
        .arg(fixture("cat.bf"))
        .write_stdin("line one\nline two\n")
        .assert()
        .success()
        .stdout("line one\nline two\n")
        .stderr(predicate::str::is_empty());
}

#![allow(dead_code)]

use assert_cmd::prelude::*;
use assert_cmd::Command;
use std::io::Write;
use std::path::PathBuf;

/// `bfi` with every settings source except flags cleared.
pub fn cargo_bin() -> Command {
    Command::from(process_cmd())
}

/// Same as [`cargo_bin`], as a plain `std::process::Command` for spawning.
pub fn process_cmd() -> std::process::Command {
    let mut cmd = std::process::Command::cargo_bin("bfi").unwrap();
    cmd.env("BFI_CONFIG", "/nonexistent/bfi-test-config.toml")
        .env_remove("BFI_MEMORY")
        .env_remove("BFI_STRICT")
        .env_remove("BFI_MAX_STEPS")
        .env_remove("BFI_TIMEOUT_MS")
        .env_remove("BFI_LOG");
    cmd
}

pub fn program_file(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

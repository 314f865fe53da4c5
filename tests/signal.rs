#![cfg(unix)]

use std::io::Read;
use std::process::{Child, Stdio};
use std::thread;
use std::time::{Duration, Instant};

mod common;
use common::{process_cmd, program_file};

/// Give the binary time to start and install its Ctrl+C handler.
const STARTUP: Duration = Duration::from_millis(500);

fn spawn(path: &std::path::Path) -> Child {
    process_cmd()
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn bfi")
}

fn sigint(child: &Child) {
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) };
    assert_eq!(rc, 0, "kill(SIGINT) failed");
}

/// Wait for exit, killing the child if it is still alive after `limit`.
fn wait_for_exit(child: &mut Child, limit: Duration) -> Option<i32> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status.code();
        }
        if start.elapsed() > limit {
            let _ = child.kill();
            let _ = child.wait();
            panic!("bfi still running {limit:?} after SIGINT");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn sigint_during_execution_exits_130() {
    let tf = program_file("+[]");
    let mut child = spawn(tf.path());
    thread::sleep(STARTUP);

    sigint(&child);
    let code = wait_for_exit(&mut child, Duration::from_secs(5));
    assert_eq!(code, Some(130));

    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
    assert!(stderr.contains("interrupted"), "stderr: {stderr}");
}

#[test]
fn second_sigint_while_blocked_on_input_exits_130() {
    let tf = program_file("+.,");
    let mut child = spawn(tf.path());
    // Hold stdin open so ',' blocks.
    let _stdin = child.stdin.take().unwrap();
    thread::sleep(STARTUP);

    // The first signal only sets the cancel flag; the read is still blocked.
    sigint(&child);
    thread::sleep(Duration::from_millis(200));
    sigint(&child);

    let code = wait_for_exit(&mut child, Duration::from_secs(5));
    assert_eq!(code, Some(130));

    // Output written before the read was flushed.
    let mut stdout = Vec::new();
    child.stdout.take().unwrap().read_to_end(&mut stdout).unwrap();
    assert_eq!(stdout, vec![1u8]);
}

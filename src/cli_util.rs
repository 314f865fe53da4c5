use std::io::{self, Write};

use crate::interpreter::InterpreterError;
use crate::program::BracketError;
use crate::theme::Palette;

/// Bytes of program text shown on each side of the failing instruction.
const WINDOW_BYTES: usize = 32;

/// Pretty-print an interpreter error with caret positioning.
/// If `program` is `Some("bfi")`, prefix messages with "bfi: ...".
pub fn print_interpreter_error(program: Option<&str>, code: &[u8], err: &InterpreterError, palette: &Palette) {
    let msg = with_program(program, &describe_interpreter_error(err));
    match err.ip() {
        Some(ip) => print_error_with_context(&msg, code, ip, palette),
        None => {
            eprintln!("{}", palette.error.paint(msg));
            let _ = io::stderr().flush();
        }
    }
}

pub fn print_bracket_error(program: Option<&str>, code: &[u8], err: &BracketError, palette: &Palette) {
    let BracketError::Unmatched { ip, kind } = err;
    let msg = with_program(program, &format!("Syntax error: unmatched bracket {kind}"));
    print_error_with_context(&msg, code, *ip, palette);
}

/// Print a concise error with instruction index and a caret context window.
pub fn print_error_with_context(prefix: &str, code: &[u8], pos: usize, palette: &Palette) {
    let mut stderr = io::stderr().lock();
    let _ = stderr.write_all(render_error_with_context(prefix, code, pos, palette).as_bytes());
    let _ = stderr.flush();
}

/// Message without position; the caret window carries the position.
fn describe_interpreter_error(err: &InterpreterError) -> String {
    match err {
        InterpreterError::UnmatchedClose { .. } => "Syntax error: unmatched closing bracket ']'".to_string(),
        InterpreterError::UnterminatedLoop { .. } => {
            "Syntax error: unterminated loop, no matching ']' for '['".to_string()
        }
        InterpreterError::PointerOutOfBounds { ptr, op, .. } => {
            format!("Runtime error: pointer out of bounds (ptr={ptr}, op={op})")
        }
        InterpreterError::Io { source, .. } => format!("I/O error: {source}"),
        InterpreterError::Allocation { source, .. } => format!("Out of memory: {source}"),
        other => other.to_string(),
    }
}

fn with_program(program: Option<&str>, msg: &str) -> String {
    match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg.to_string(),
    }
}

pub fn render_error_with_context(prefix: &str, code: &[u8], pos: usize, palette: &Palette) -> String {
    let mut out = format!("{} at instruction {pos}\n", palette.error.paint(prefix));

    let start = pos.saturating_sub(WINDOW_BYTES);
    let end = (pos + WINDOW_BYTES + 1).min(code.len());
    if start >= end {
        return out;
    }

    let slice: String = code[start..end].iter().map(|&b| display_byte(b)).collect();
    out.push_str(&format!("  {}\n", palette.context.paint(slice)));

    // Caret under the exact position
    let underline = format!("{}^", " ".repeat(pos - start));
    out.push_str(&format!("  {}\n", palette.caret.paint(underline)));
    out
}

/// One column per byte so the caret lines up.
fn display_byte(b: u8) -> char {
    match b {
        b' '..=b'~' => b as char,
        b'\t' | b'\n' | b'\r' => ' ',
        _ => '?',
    }
}

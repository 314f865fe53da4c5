//! A Brainfuck interpreter library.
//!
//! Programs run on a tape of byte cells (default 30,000) with a single data
//! pointer. Loops are resolved as they are reached, using a stack of return
//! points instead of a precomputed jump table.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; cells wrap on overflow and underflow.
//! - The data pointer wraps around the ends of the tape by default, or
//!   reports an error under [`PointerPolicy::Strict`].
//! - Input `,` reads a single byte; at end of input the cell is set to 255
//!   ([`EOF_SENTINEL`]) and execution continues.
//! - Output `.` writes the byte at the current cell.
//! - A stray `]`, or a `[` that has to be skipped but has no partner, halts
//!   with an error. Output produced before the error is kept.
//! - Any byte outside `><+-.,[]` is a comment.
//!
//! Quick start:
//!
//! ```no_run
//! use bfi::Interpreter;
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let mut bf = Interpreter::new(code);
//! bf.run_stdio().expect("program should run");
//! ```
//!
//! Running against in-memory streams:
//!
//! ```
//! use bfi::Interpreter;
//!
//! let mut bf = Interpreter::new_with_memory(",[.-]", 8).unwrap();
//! let mut out = Vec::new();
//! bf.run(&b"\x03"[..], &mut out).unwrap();
//! assert_eq!(out, vec![3, 2, 1]);
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod instruction;
pub mod interpreter;
pub mod program;
pub mod stack;
pub mod tape;
pub mod theme;

pub use instruction::Instruction;
pub use interpreter::{ExecutionState, Interpreter, InterpreterError, StepControl, EOF_SENTINEL};
pub use program::{BracketError, LoadError, Program, UnmatchedBracketKind};
pub use stack::{BracketStack, StackError};
pub use tape::{PointerPolicy, Tape, TapeError, DEFAULT_TAPE_LEN};

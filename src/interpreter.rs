//! The execution engine.
//!
//! Brackets are resolved as they are reached rather than from a precomputed
//! jump table:
//! - `[` on a zero cell scans forward to the matching `]`, counting nested
//!   pairs. Running off the end of the program is an error.
//! - `[` on a nonzero cell pushes the PC of the first body instruction onto
//!   the [`BracketStack`].
//! - `]` on a nonzero cell jumps to the saved PC on top of the stack; on a
//!   zero cell it pops. Either way an empty stack is an unmatched `]`.
//!
//! A `[` that is entered but never closed is therefore not an error as long
//! as execution never needs its partner.

use std::collections::TryReserveError;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::instruction::Instruction;
use crate::program::Program;
use crate::stack::{BracketStack, StackError};
use crate::tape::{Tape, TapeError};

/// Value stored by `,` once input is exhausted: C's `EOF` (-1) truncated to a byte.
pub const EOF_SENTINEL: u8 = -1i8 as u8;

/// Cancellation and deadline are sampled once per this many steps.
const POLL_INTERVAL: usize = 1024;

/// Errors that halt the interpreter.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// `]` reached with no loop on the bracket stack.
    #[error("Unmatched closing bracket at instruction {ip}")]
    UnmatchedClose { ip: usize },

    /// `[` on a zero cell with no matching `]` before the end of the program.
    #[error("Unterminated loop: no matching ']' for '[' at instruction {ip}")]
    UnterminatedLoop { ip: usize },

    /// The data pointer left the tape under the strict pointer policy.
    #[error("Pointer out of bounds at instruction {ip} (ptr={ptr}, op='{op}')")]
    PointerOutOfBounds { ip: usize, ptr: usize, op: char },

    /// Reading input or writing output failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },

    /// The bracket stack could not grow.
    #[error("Out of memory at instruction {ip}: {source}")]
    Allocation {
        ip: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    #[error("Execution aborted: timeout exceeded ({timeout_ms} ms)")]
    TimedOut { timeout_ms: u128 },

    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl InterpreterError {
    /// Instruction index the error happened at, if it is tied to one.
    pub fn ip(&self) -> Option<usize> {
        match self {
            InterpreterError::UnmatchedClose { ip }
            | InterpreterError::UnterminatedLoop { ip }
            | InterpreterError::PointerOutOfBounds { ip, .. }
            | InterpreterError::Io { ip, .. }
            | InterpreterError::Allocation { ip, .. } => Some(*ip),
            InterpreterError::StepLimitExceeded { .. }
            | InterpreterError::TimedOut { .. }
            | InterpreterError::Canceled => None,
        }
    }

    fn from_stack(ip: usize, err: StackError) -> Self {
        match err {
            StackError::Underflow => InterpreterError::UnmatchedClose { ip },
            StackError::Allocation(source) => InterpreterError::Allocation { ip, source },
        }
    }
}

/// Where the interpreter is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Ready,
    Running,
    HaltedNormal,
    HaltedError,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionState::Ready => "ready",
            ExecutionState::Running => "running",
            ExecutionState::HaltedNormal => "halted",
            ExecutionState::HaltedError => "halted (error)",
        };
        f.write_str(s)
    }
}

/// Controls for cooperative cancellation, step limiting and timeouts.
#[derive(Clone, Debug, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub timeout: Option<Duration>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self {
            max_steps,
            timeout: None,
            cancel_flag,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask a running interpreter to stop at its next poll.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }
}

/// A Brainfuck interpreter.
///
/// Owns the program, the tape, the bracket stack and the program counter.
/// Input and output streams are supplied per run.
pub struct Interpreter {
    program: Program,
    tape: Tape,
    stack: BracketStack,
    pc: usize,
    steps: usize,
    state: ExecutionState,
    step_control: Option<StepControl>,
    trace_sink: Option<Box<dyn Write>>,
}

impl Interpreter {
    /// Create an interpreter with a default-sized, wrapping tape.
    pub fn new(program: impl Into<Program>) -> Self {
        Self::with_tape(program, Tape::default())
    }

    /// Create an interpreter with `memory_size` cells.
    pub fn new_with_memory(program: impl Into<Program>, memory_size: usize) -> Result<Self, TapeError> {
        Ok(Self::with_tape(program, Tape::new(memory_size)?))
    }

    pub fn with_tape(program: impl Into<Program>, tape: Tape) -> Self {
        Self {
            program: program.into(),
            tape,
            stack: BracketStack::new(),
            pc: 0,
            steps: 0,
            state: ExecutionState::Ready,
            step_control: None,
            trace_sink: None,
        }
    }

    pub fn set_step_control(&mut self, step_control: StepControl) {
        self.step_control = Some(step_control);
    }

    /// Write a step-by-step table of executed instructions to `sink`.
    ///
    /// Program I/O is unaffected.
    pub fn set_trace_sink<W>(&mut self, sink: W)
    where
        W: Write + 'static,
    {
        self.trace_sink = Some(Box::new(sink));
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn pointer(&self) -> usize {
        self.tape.pointer()
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Execute the program from the start, on a zeroed tape, until it halts.
    ///
    /// `,` reads single bytes from `input` and `.` writes to `output`.
    /// `output` is flushed before every read and when execution stops,
    /// whether or not it stopped with an error.
    pub fn run<R: Read, W: Write>(&mut self, mut input: R, mut output: W) -> Result<(), InterpreterError> {
        self.pc = 0;
        self.steps = 0;
        self.stack.clear();
        self.tape.reset();
        self.state = ExecutionState::Running;
        tracing::debug!(
            program_len = self.program.len(),
            tape_len = self.tape.len(),
            policy = %self.tape.policy(),
            "starting run"
        );

        let result = self.execute(&mut input, &mut output);
        if let Some(t) = self.trace_sink.as_mut() {
            let _ = t.flush();
        }
        let flushed = output
            .flush()
            .map_err(|source| InterpreterError::Io { ip: self.pc, source });
        let result = result.and(flushed);

        match &result {
            Ok(()) => {
                self.state = ExecutionState::HaltedNormal;
                tracing::debug!(steps = self.steps, "halted");
            }
            Err(err) => {
                self.state = ExecutionState::HaltedError;
                tracing::debug!(steps = self.steps, pc = self.pc, error = %err, "halted with error");
            }
        }
        result
    }

    /// Run against the process's stdin and stdout.
    ///
    /// Stdout is not locked for the duration of the run, so other threads
    /// (the Ctrl+C handler) never block on it.
    pub fn run_stdio(&mut self) -> Result<(), InterpreterError> {
        self.run(io::stdin().lock(), io::BufWriter::new(io::stdout()))
    }

    fn execute<R: Read, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<(), InterpreterError> {
        let deadline = self
            .step_control
            .as_ref()
            .and_then(|ctrl| ctrl.timeout)
            .map(|timeout| Instant::now() + timeout);
        let code_len = self.program.len();
        let tape_len = self.tape.len();

        if let Some(t) = self.trace_sink.as_mut() {
            write_trace_header(t, tape_len).map_err(|source| InterpreterError::Io { ip: 0, source })?;
        }

        while self.pc < code_len {
            self.check_control(deadline)?;

            let ip = self.pc;
            self.steps += 1;
            let Some(instr) = self.program.instruction(ip) else {
                // Comment byte.
                self.pc += 1;
                continue;
            };

            let (ptr_before, cell_before) = (self.tape.pointer(), self.tape.get());
            let mut action: Option<String> = self.trace_sink.is_some().then(String::new);
            let mut next_pc = ip + 1;

            match instr {
                Instruction::Right | Instruction::Left => {
                    let moved = if instr == Instruction::Right {
                        self.tape.move_right()
                    } else {
                        self.tape.move_left()
                    };
                    moved.map_err(|_| InterpreterError::PointerOutOfBounds {
                        ip,
                        ptr: ptr_before,
                        op: instr.symbol(),
                    })?;
                    if let Some(a) = action.as_mut() {
                        *a = format!("Moved pointer head to index {}", self.tape.pointer());
                    }
                }
                Instruction::Increment => {
                    let after = self.tape.increment();
                    if let Some(a) = action.as_mut() {
                        *a = format!("Increment cell[{ptr_before}] from {cell_before} to {after}");
                    }
                }
                Instruction::Decrement => {
                    let after = self.tape.decrement();
                    if let Some(a) = action.as_mut() {
                        *a = format!("Decrement cell[{ptr_before}] from {cell_before} to {after}");
                    }
                }
                Instruction::Output => {
                    output
                        .write_all(&[cell_before])
                        .map_err(|source| InterpreterError::Io { ip, source })?;
                    if let Some(a) = action.as_mut() {
                        *a = format!("Output byte {cell_before} ({:?})", cell_before as char);
                    }
                }
                Instruction::Input => {
                    // Make pending output (prompts) visible before blocking.
                    output.flush().map_err(|source| InterpreterError::Io { ip, source })?;
                    let byte = read_byte(input).map_err(|source| InterpreterError::Io { ip, source })?;
                    self.tape.set(byte.unwrap_or(EOF_SENTINEL));
                    if let Some(a) = action.as_mut() {
                        *a = match byte {
                            Some(b) => format!("Read byte {b} into cell[{ptr_before}]"),
                            None => format!("End of input; set cell[{ptr_before}] to {EOF_SENTINEL}"),
                        };
                    }
                }
                Instruction::LoopStart => {
                    if cell_before == 0 {
                        let close = self
                            .program
                            .matching_close(ip)
                            .ok_or(InterpreterError::UnterminatedLoop { ip })?;
                        tracing::trace!(ip, close, "skipping loop body");
                        next_pc = close + 1;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Cell is 0; skip forward past matching ']' at IP {close}");
                        }
                    } else {
                        self.stack
                            .push(ip + 1)
                            .map_err(|e| InterpreterError::from_stack(ip, e))?;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Enter loop (cell != 0), depth {}", self.stack.depth());
                        }
                    }
                }
                Instruction::LoopEnd => {
                    if cell_before != 0 {
                        let target = self
                            .stack
                            .peek()
                            .map_err(|e| InterpreterError::from_stack(ip, e))?;
                        next_pc = target;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Cell != 0; jump back to IP {target}");
                        }
                    } else {
                        self.stack
                            .pop()
                            .map_err(|e| InterpreterError::from_stack(ip, e))?;
                        if let Some(a) = action.as_mut() {
                            *a = "Exit loop (cell is 0)".to_string();
                        }
                    }
                }
            }

            if let Some(t) = self.trace_sink.as_mut() {
                writeln!(
                    t,
                    "{:<5} | {:<5} | {:<5} | {:<4} |  {}    | {}",
                    self.steps - 1,
                    ip,
                    ptr_before,
                    cell_before,
                    instr,
                    action.unwrap_or_default()
                )
                .map_err(|source| InterpreterError::Io { ip, source })?;
            }

            self.pc = next_pc;
        }

        Ok(())
    }

    fn check_control(&self, deadline: Option<Instant>) -> Result<(), InterpreterError> {
        let Some(ctrl) = self.step_control.as_ref() else {
            return Ok(());
        };

        if let Some(max) = ctrl.max_steps {
            if self.steps >= max {
                return Err(InterpreterError::StepLimitExceeded { limit: max });
            }
        }

        if self.steps % POLL_INTERVAL == 0 {
            if ctrl.cancel_flag.load(Ordering::Relaxed) {
                return Err(InterpreterError::Canceled);
            }
            if let (Some(deadline), Some(timeout)) = (deadline, ctrl.timeout) {
                if Instant::now() >= deadline {
                    return Err(InterpreterError::TimedOut {
                        timeout_ms: timeout.as_millis(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn write_trace_header<W: Write + ?Sized>(t: &mut W, tape_len: usize) -> io::Result<()> {
    writeln!(t, "Memory Size: {tape_len}")?;
    writeln!(t)?;
    writeln!(t, "STEP  | IP    | PTR   | CELL | INSTR | ACTION")?;
    writeln!(t, "------+-------+-------+------+-------+------------------------------------------------")
}

/// Read one byte, returning `None` at end of input.
fn read_byte<R: Read>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli_util::{print_bracket_error, print_interpreter_error};
use crate::config::{parse_positive, parse_positive_u64, ConfigError, PartialSettings, Settings};
use crate::interpreter::{Interpreter, InterpreterError};
use crate::program::Program;
use crate::tape::Tape;
use crate::theme::Palette;

/// Exit status after Ctrl+C.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Args, Debug, Default)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Brainfuck program file
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Brainfuck program file (alternative to the positional PATH)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Number of tape cells (fallback BFI_MEMORY, config file; default 30000)
    #[arg(short = 'm', long = "memory", value_name = "CELLS", value_parser = parse_positive)]
    pub memory: Option<usize>,

    /// Print the tape size and a step-by-step table of operations to stderr
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Fail when the pointer leaves the tape instead of wrapping around
    #[arg(long = "strict")]
    pub strict: bool,

    /// Check that all brackets are balanced before running
    #[arg(long = "check")]
    pub check: bool,

    /// Maximum interpreter steps before abort (fallback BFI_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N", value_parser = parse_positive)]
    pub max_steps: Option<usize>,

    /// Wall-clock timeout in milliseconds (fallback BFI_TIMEOUT_MS; default unlimited)
    #[arg(long = "timeout", value_name = "MS", value_parser = parse_positive_u64)]
    pub timeout_ms: Option<u64>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl RunArgs {
    /// The program file, from either the positional argument or `--file`.
    pub fn program_path(&self) -> Result<PathBuf, ConfigError> {
        match (&self.path, &self.file) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingProgram),
            (Some(p), None) | (None, Some(p)) => Ok(p.clone()),
            (None, None) => Err(ConfigError::MissingProgram),
        }
    }

    pub fn overrides(&self) -> PartialSettings {
        PartialSettings {
            memory: self.memory,
            strict: self.strict.then_some(true),
            max_steps: self.max_steps,
            timeout_ms: self.timeout_ms,
        }
    }
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let path = match args.program_path() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{program}: {e}");
            usage_and_exit(program, 2);
        }
    };

    let settings = match Settings::load(&args.overrides()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 2;
        }
    };
    tracing::debug!(?settings, path = %path.display(), "resolved settings");

    let palette = Palette::for_stderr();

    let code = match Program::from_file(&path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", palette.error.paint(format!("{program}: {e}")));
            let _ = io::stderr().flush();
            return 1;
        }
    };

    if args.check {
        if let Err(err) = code.check_brackets() {
            print_bracket_error(Some(program), code.as_bytes(), &err, &palette);
            return 1;
        }
    }

    let tape = match Tape::new(settings.memory) {
        Ok(tape) => tape.with_policy(settings.policy),
        Err(e) => {
            eprintln!("{}", palette.error.paint(format!("{program}: {e}")));
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(program, cancel.clone());

    let mut bf = Interpreter::with_tape(code, tape);
    bf.set_step_control(settings.step_control(cancel));
    if args.debug {
        bf.set_trace_sink(io::BufWriter::new(io::stderr()));
    }

    match bf.run_stdio() {
        Ok(()) => 0,
        Err(InterpreterError::Canceled) => {
            eprintln!("{}", palette.error.paint("Execution aborted: interrupted"));
            let _ = io::stderr().flush();
            EXIT_INTERRUPTED
        }
        Err(err) => {
            print_interpreter_error(Some(program), bf.program().as_bytes(), &err, &palette);
            1
        }
    }
}

/// First Ctrl+C asks the interpreter to stop; a second one exits immediately,
/// which covers a program blocked on `,`.
///
/// The handler must not touch stdout: the interpreter may be holding its lock.
/// Output is flushed before every `,`, so nothing is pending while blocked there.
fn install_interrupt_handler(program: &str, cancel: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        if cancel.swap(true, Ordering::Relaxed) {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });
    if let Err(e) = result {
        tracing::warn!(program, error = %e, "failed to set ctrl+c handler");
    }
}

pub fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [OPTIONS] <PATH>
  {0} [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>    Read the Brainfuck program from PATH
  --memory, -m <CELLS>  Number of tape cells (default 30000)
  --debug, -d           Print the tape size and a step-by-step table to stderr
  --strict              Error when the pointer leaves the tape instead of wrapping
  --check               Verify that brackets are balanced before running
  --max-steps <N>       Abort after N steps
  --timeout <MS>        Abort after MS milliseconds
  --help,  -h           Show this help

Notes:
- Only ><+-.,[] are instructions; every other byte is a comment.
- Input (`,`) reads one byte from stdin; at end of input the cell is set to 255.
- Settings fall back to BFI_MEMORY, BFI_STRICT, BFI_MAX_STEPS and BFI_TIMEOUT_MS,
  then to the [interpreter] section of bfi.toml (path overridable with BFI_CONFIG).

Examples:
- Run a program:
    {0} hello.bf
- Feed a file to `,`:
    {0} -m 1024 cat.bf < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_or_file_but_not_both() {
        let args = RunArgs { path: Some("a.bf".into()), ..Default::default() };
        assert_eq!(args.program_path().unwrap(), PathBuf::from("a.bf"));

        let args = RunArgs { file: Some("b.bf".into()), ..Default::default() };
        assert_eq!(args.program_path().unwrap(), PathBuf::from("b.bf"));

        let args = RunArgs {
            path: Some("a.bf".into()),
            file: Some("b.bf".into()),
            ..Default::default()
        };
        assert!(matches!(args.program_path(), Err(ConfigError::ConflictingProgram)));

        assert!(matches!(RunArgs::default().program_path(), Err(ConfigError::MissingProgram)));
    }

    #[test]
    fn strict_flag_only_overrides_when_set() {
        assert_eq!(RunArgs::default().overrides().strict, None);
        let args = RunArgs { strict: true, ..Default::default() };
        assert_eq!(args.overrides().strict, Some(true));
    }
}

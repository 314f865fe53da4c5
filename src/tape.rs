//! The interpreter's memory: byte cells and the data pointer.

use std::collections::TryReserveError;
use std::fmt;
use std::str::FromStr;

/// Number of cells used when no length is configured.
pub const DEFAULT_TAPE_LEN: usize = 30_000;

#[derive(Debug, thiserror::Error)]
pub enum TapeError {
    #[error("tape length must be at least 1")]
    ZeroLength,

    #[error("could not allocate tape: {0}")]
    Allocation(#[from] TryReserveError),

    /// Only produced under [`PointerPolicy::Strict`].
    #[error("pointer moved out of bounds (ptr={ptr}, len={len})")]
    OutOfBounds { ptr: usize, len: usize },
}

/// What happens when the data pointer leaves the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPolicy {
    /// Wrap around to the other end of the tape.
    #[default]
    Wrap,
    /// Fail with [`TapeError::OutOfBounds`].
    Strict,
}

impl fmt::Display for PointerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerPolicy::Wrap => write!(f, "wrap"),
            PointerPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for PointerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrap" => Ok(PointerPolicy::Wrap),
            "strict" => Ok(PointerPolicy::Strict),
            other => Err(format!("unknown pointer policy '{other}'")),
        }
    }
}

/// Fixed-length, zero-initialized tape of byte cells.
pub struct Tape {
    cells: Vec<u8>,
    pointer: usize,
    policy: PointerPolicy,
}

// A tape always has at least one cell.
#[allow(clippy::len_without_is_empty)]
impl Tape {
    /// Allocate `len` zeroed cells. Allocation failure is returned, not aborted on.
    pub fn new(len: usize) -> Result<Self, TapeError> {
        if len == 0 {
            return Err(TapeError::ZeroLength);
        }
        let mut cells = Vec::new();
        cells.try_reserve_exact(len)?;
        cells.resize(len, 0);
        Ok(Self {
            cells,
            pointer: 0,
            policy: PointerPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: PointerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PointerPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Value of the cell under the data pointer.
    pub fn get(&self) -> u8 {
        self.cells[self.pointer]
    }

    pub fn set(&mut self, value: u8) {
        self.cells[self.pointer] = value;
    }

    pub fn increment(&mut self) -> u8 {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1);
        *cell
    }

    pub fn decrement(&mut self) -> u8 {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1);
        *cell
    }

    pub fn move_right(&mut self) -> Result<(), TapeError> {
        let last = self.cells.len() - 1;
        if self.pointer < last {
            self.pointer += 1;
            return Ok(());
        }
        match self.policy {
            PointerPolicy::Wrap => {
                self.pointer = 0;
                Ok(())
            }
            PointerPolicy::Strict => Err(TapeError::OutOfBounds {
                ptr: self.pointer,
                len: self.cells.len(),
            }),
        }
    }

    pub fn move_left(&mut self) -> Result<(), TapeError> {
        if self.pointer > 0 {
            self.pointer -= 1;
            return Ok(());
        }
        match self.policy {
            PointerPolicy::Wrap => {
                self.pointer = self.cells.len() - 1;
                Ok(())
            }
            PointerPolicy::Strict => Err(TapeError::OutOfBounds {
                ptr: self.pointer,
                len: self.cells.len(),
            }),
        }
    }

    /// Zero every cell and move the pointer back to cell 0.
    pub fn reset(&mut self) {
        self.cells.fill(0);
        self.pointer = 0;
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self {
            cells: vec![0; DEFAULT_TAPE_LEN],
            pointer: 0,
            policy: PointerPolicy::default(),
        }
    }
}

impl fmt::Debug for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tape")
            .field("len", &self.cells.len())
            .field("pointer", &self.pointer)
            .field("cell", &self.get())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_is_rejected() {
        assert!(matches!(Tape::new(0), Err(TapeError::ZeroLength)));
    }

    #[test]
    fn starts_zeroed_at_cell_zero() {
        let tape = Tape::new(8).unwrap();
        assert_eq!(tape.pointer(), 0);
        assert!(tape.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn cells_wrap_on_overflow_and_underflow() {
        let mut tape = Tape::new(1).unwrap();
        assert_eq!(tape.decrement(), 255);
        assert_eq!(tape.increment(), 0);
    }

    #[test]
    fn wrap_policy_moves_around_both_ends() {
        let mut tape = Tape::new(3).unwrap();
        tape.move_left().unwrap();
        assert_eq!(tape.pointer(), 2);
        tape.move_right().unwrap();
        assert_eq!(tape.pointer(), 0);
    }

    #[test]
    fn strict_policy_reports_out_of_bounds() {
        let mut tape = Tape::new(2).unwrap().with_policy(PointerPolicy::Strict);
        assert!(matches!(tape.move_left(), Err(TapeError::OutOfBounds { ptr: 0, len: 2 })));
        tape.move_right().unwrap();
        assert!(matches!(tape.move_right(), Err(TapeError::OutOfBounds { ptr: 1, len: 2 })));
        assert_eq!(tape.pointer(), 1);
    }

    #[test]
    fn reset_zeroes_cells_and_pointer() {
        let mut tape = Tape::new(4).unwrap().with_policy(PointerPolicy::Strict);
        tape.increment();
        tape.move_right().unwrap();
        tape.set(42);
        tape.reset();
        assert_eq!(tape.pointer(), 0);
        assert_eq!(tape.cells(), &[0, 0, 0, 0]);
        assert_eq!(tape.policy(), PointerPolicy::Strict);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Strict".parse::<PointerPolicy>().unwrap(), PointerPolicy::Strict);
        assert_eq!(" wrap ".parse::<PointerPolicy>().unwrap(), PointerPolicy::Wrap);
        assert!("clamp".parse::<PointerPolicy>().is_err());
    }
}

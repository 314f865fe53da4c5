//! Return points for loops that are currently being executed.

use std::collections::TryReserveError;

/// Capacity the stack starts with before its first growth.
pub const INITIAL_CAPACITY: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// `pop`/`peek` on an empty stack.
    #[error("bracket stack underflow")]
    Underflow,

    #[error("could not grow bracket stack: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Growable stack of saved program counters.
///
/// Each entry is the PC of the first instruction inside a loop that was
/// entered, so its depth always equals the current dynamic nesting depth.
/// Capacity doubles when full; a failed reservation is reported instead of
/// aborting the process.
#[derive(Debug)]
pub struct BracketStack {
    frames: Vec<usize>,
}

impl BracketStack {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn push(&mut self, pc: usize) -> Result<(), StackError> {
        if self.frames.len() == self.frames.capacity() {
            // Double, like the fixed-array version this replaces.
            let additional = self.frames.capacity().max(1);
            self.frames.try_reserve_exact(additional)?;
        }
        self.frames.push(pc);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<usize, StackError> {
        self.frames.pop().ok_or(StackError::Underflow)
    }

    /// Top of the stack without removing it.
    pub fn peek(&self) -> Result<usize, StackError> {
        self.frames.last().copied().ok_or(StackError::Underflow)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.frames.capacity()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for BracketStack {
    fn default() -> Self {
        Self::new()
    }
}

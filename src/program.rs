//! Loading program text and scanning it for brackets.

use std::collections::TryReserveError;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::instruction::Instruction;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not allocate program buffer: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BracketError {
    #[error("unmatched bracket {kind} at instruction {ip}")]
    Unmatched {
        ip: usize,
        kind: UnmatchedBracketKind,
    },
}

/// An immutable, fully buffered Brainfuck program.
///
/// Any byte is allowed; bytes outside `><+-.,[]` are comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    bytes: Box<[u8]>,
}

impl Program {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into().into_boxed_slice(),
        }
    }

    /// Read the whole file at `path` into memory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let io_err = |source: io::Error| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let size_hint = file
            .metadata()
            .ok()
            .and_then(|m| usize::try_from(m.len()).ok())
            .unwrap_or(0);

        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size_hint)?;
        file.read_to_end(&mut bytes).map_err(io_err)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded program");
        Ok(Self::from_bytes(bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get(&self, pc: usize) -> Option<u8> {
        self.bytes.get(pc).copied()
    }

    /// Decoded instruction at `pc`, or `None` for comments and out of range.
    pub fn instruction(&self, pc: usize) -> Option<Instruction> {
        self.get(pc).and_then(Instruction::decode)
    }

    /// Number of bytes that are actual instructions.
    pub fn instruction_count(&self) -> usize {
        self.bytes
            .iter()
            .filter(|&&b| Instruction::decode(b).is_some())
            .count()
    }

    /// Find the `]` matching the `[` at `open`, skipping nested pairs.
    ///
    /// Returns `None` when the program ends first.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, &b) in self.bytes.iter().enumerate().skip(open + 1) {
            match b {
                b'[' => depth += 1,
                b']' if depth == 0 => return Some(i),
                b']' => depth -= 1,
                _ => {}
            }
        }
        None
    }

    /// Statically check that every bracket has a partner.
    ///
    /// Execution never calls this: brackets are resolved as they are reached,
    /// so a program can run successfully even if this check would fail.
    pub fn check_brackets(&self) -> Result<(), BracketError> {
        let mut open: Vec<usize> = Vec::new();
        for (i, &b) in self.bytes.iter().enumerate() {
            if b == b'[' {
                open.push(i);
            } else if b == b']' && open.pop().is_none() {
                return Err(BracketError::Unmatched {
                    ip: i,
                    kind: UnmatchedBracketKind::Close,
                });
            }
        }

        if let Some(unmatched_open) = open.last().copied() {
            return Err(BracketError::Unmatched {
                ip: unmatched_open,
                kind: UnmatchedBracketKind::Open,
            });
        }
        Ok(())
    }
}

impl From<&str> for Program {
    fn from(code: &str) -> Self {
        Self::from_bytes(code.as_bytes())
    }
}

impl From<String> for Program {
    fn from(code: String) -> Self {
        Self::from_bytes(code.into_bytes())
    }
}

impl From<Vec<u8>> for Program {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

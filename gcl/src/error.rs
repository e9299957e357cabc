//! Error and diagnostic types for the GCL translator

use gcl_asm::AsmError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A message tied to a position in the translation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub unit: String,
    pub file: Option<String>,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GCL {}", self.severity)?;
        if !self.unit.is_empty() {
            write!(f, " [{}]", self.unit)?;
        }
        if let Some(file) = &self.file {
            write!(f, " file '{}'", file)?;
        }
        write!(f, " line {}: {}", self.line, self.message)
    }
}

/// Conditions that stop a translation pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Invalid GCL version '{0}'")]
    InvalidVersion(String),

    #[error("Spurious '{0}'")]
    Spurious(char),

    #[error("Unexpected '{0}'")]
    Unexpected(String),

    #[error("Too many '{0}'")]
    TooMany(String),

    #[error("Loop without do")]
    LoopWithoutDo,

    #[error("Loop outside page")]
    LoopOutsidePage,

    #[error("Unterminated block")]
    UnterminatedBlock,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Out of code space")]
    OutOfCodeSpace,

    #[error("Value out of range {0} (must be 0..255)")]
    ValueOutOfRange(i64),

    #[error("Index out of range {0}")]
    IndexOutOfRange(i64),

    #[error("Address out of range {0:#x}")]
    AddressOutOfRange(i64),

    #[error("Zero-page segment at {0:04x} can only be the first segment")]
    ZeroPageSegment(u16),

    #[error("Segment length {0} outside 1..256")]
    SegmentLength(u32),

    #[error("({word}) Undefined symbol {name}")]
    UndefinedSymbol { word: String, name: String },

    #[error("({0}) Invalid value (must be even)")]
    OddValue(String),

    #[error("({0}) Invalid word")]
    InvalidWord(String),

    #[error("Dangling labels: {}", .0.join(", "))]
    DanglingLabels(Vec<String>),

    #[error(transparent)]
    Backend(#[from] AsmError),
}

/// Errors surfaced by the public translator API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GclError {
    #[error("{diagnostic}")]
    Fatal {
        diagnostic: Diagnostic,
        kind: ErrorKind,
    },

    #[error("Translation of '{unit}' was aborted by an earlier error")]
    Aborted { unit: String },

    #[error("Image error: {0}")]
    Backend(#[from] AsmError),
}

impl GclError {
    /// The underlying condition of a fatal error
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            GclError::Fatal { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Result type for the public API
pub type Result<T> = std::result::Result<T, GclError>;

/// Result type inside a translation pass, before position information is attached
pub(crate) type Fallible<T> = std::result::Result<T, ErrorKind>;

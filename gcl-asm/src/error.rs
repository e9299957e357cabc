//! Error types for the emission backend

use thiserror::Error;

/// Errors raised while accumulating or resolving the output image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Undefined symbol: {name}")]
    UndefinedSymbol { name: String },

    #[error("Symbol {name} already defined as {old}, cannot redefine as {new}")]
    DuplicateSymbol { name: String, old: i64, new: i64 },

    #[error("Zero page full: need {bytes} bytes at {free:02x} (limit {limit:02x})")]
    ZeroPageFull { bytes: u8, free: u8, limit: u8 },

    #[error("ROM full at {address:04x}")]
    RomFull { address: u16 },
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, AsmError>;

//! # GCL translator
//!
//! Translates GCL, a small stack-oriented language, into vCPU byte code in a
//! single pass. Output is organised in page-aligned segments, each preceded by
//! a header with its load address and length. Branch targets that are not yet
//! known are emitted as placeholders and backpatched through the backend's
//! symbol table when the enclosing block closes.
//!
//! ## Example
//!
//! ```rust
//! use gcl::{compile, GclError};
//!
//! fn main() -> Result<(), GclError> {
//!     let compiled = compile("gcl0x 10 20+", "demo", 0x0200)?;
//!
//!     // Header (address 0200, length 4), LDI 10, ADDI 20, end marker
//!     assert_eq!(
//!         compiled.bytes,
//!         vec![0x02, 0x00, 0x04, 0x59, 10, 0xe3, 20, 0x00]
//!     );
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod blocks;
pub mod error;
pub mod opcodes;
pub mod program;
pub mod segment;
pub mod summary;
pub mod vars;
pub mod word;

pub use address::Address;
pub use error::{Diagnostic, ErrorKind, GclError, Result, Severity};
pub use program::{Program, ProgramOptions, VERSION};
pub use summary::Summary;

use gcl_asm::RomImage;

/// Output of [`compile`]
#[derive(Debug, Clone)]
pub struct Compiled {
    /// Segment headers, code and the terminating zero
    pub bytes: Vec<u8>,
    pub summary: Summary,
    /// Entry point of the unit
    pub execute: Option<u16>,
    pub warnings: Vec<Diagnostic>,
}

/// Translate a complete source text into a RAM image starting at `start`
pub fn compile(source: &str, name: &str, start: u16) -> Result<Compiled> {
    let mut program = Program::new(RomImage::with_system_symbols(0), start, name, false);
    for line in source.lines() {
        program.line(line)?;
    }
    let summary = program.end()?;
    let bytes = program.backend().finish()?;
    Ok(Compiled {
        bytes,
        summary,
        execute: program.execute(),
        warnings: program.warnings().to_vec(),
    })
}


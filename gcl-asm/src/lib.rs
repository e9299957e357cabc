//! # GCL emission backend
//!
//! The translator in the `gcl` crate never touches the output stream directly.
//! It talks to a [`Backend`]: something that accepts one byte at a time, owns
//! the global symbol table (including symbols that are referenced before they
//! are defined), knows the current ROM address and hands out zero-page bytes.
//!
//! [`RomImage`] is an in-memory backend. Bytes whose value depends on a symbol
//! that is not yet known are kept as deferred references and patched in by
//! [`RomImage::finish`].
//!
//! ```rust
//! use gcl_asm::{Backend, Operand, RomImage};
//!
//! let mut image = RomImage::new(0x0000);
//! let length = image.lo("length");
//! image.put(Operand::Byte(0x59), Some("LDI")).unwrap();
//! image.put(length, None).unwrap();
//! image.define("length", 0x1234).unwrap();
//! assert_eq!(image.finish().unwrap(), vec![0x59, 0x34]);
//! ```

pub mod error;
pub mod rom;
pub mod symbols;

pub use error::{AsmError, Result};
pub use rom::{RomImage, RomWord};
pub use symbols::SymbolTable;

/// A byte headed for the output stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Known value
    Byte(u8),
    /// Low byte of a symbol, resolved when the image is finished
    Lo(String),
}

impl From<u8> for Operand {
    fn from(byte: u8) -> Self {
        Operand::Byte(byte)
    }
}

/// Services the translator consumes from the output image.
///
/// All calls are synchronous and in-process.
pub trait Backend {
    /// Append one byte, optionally annotated
    fn put(&mut self, operand: Operand, comment: Option<&str>) -> Result<()>;

    /// Current ROM address
    fn pc(&self) -> u16;

    /// Hop to the next ROM page; only meaningful for images placed in ROM
    fn trampoline(&mut self) -> Result<()>;

    /// Give a symbol its value. Symbols are write-once.
    fn define(&mut self, name: &str, value: i64) -> Result<()>;

    /// Low byte of a symbol, deferred when the symbol is not defined yet
    fn lo(&self, name: &str) -> Operand;

    /// Value of an already defined symbol
    fn symbol(&self, name: &str) -> Option<i64>;

    /// Allocate `bytes` fresh zero-page bytes and return the first address
    fn zp_alloc(&mut self, bytes: u8) -> Result<u8>;

    /// Next free zero-page address
    fn zp_free(&self) -> u8;
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn put(&mut self, operand: Operand, comment: Option<&str>) -> Result<()> {
        (**self).put(operand, comment)
    }

    fn pc(&self) -> u16 {
        (**self).pc()
    }

    fn trampoline(&mut self) -> Result<()> {
        (**self).trampoline()
    }

    fn define(&mut self, name: &str, value: i64) -> Result<()> {
        (**self).define(name, value)
    }

    fn lo(&self, name: &str) -> Operand {
        (**self).lo(name)
    }

    fn symbol(&self, name: &str) -> Option<i64> {
        (**self).symbol(name)
    }

    fn zp_alloc(&mut self, bytes: u8) -> Result<u8> {
        (**self).zp_alloc(bytes)
    }

    fn zp_free(&self) -> u8 {
        (**self).zp_free()
    }
}

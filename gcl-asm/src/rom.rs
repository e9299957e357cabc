//! In-memory output image

use crate::error::{AsmError, Result};
use crate::symbols::SymbolTable;
use crate::{Backend, Operand};

/// First zero-page byte handed out to translated programs
pub const ZP_USER_START: u8 = 0x30;
/// Zero-page allocation ceiling (exclusive)
pub const ZP_USER_LIMIT: u8 = 0x80;

/// ROM page offset where a trampoline has to be placed
pub const TRAMPOLINE_OFFSET: u16 = 251;

/// One entry of the ROM table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomWord {
    Data {
        address: u16,
        operand: Operand,
        comment: Option<String>,
    },
    /// Page hop occupying the rest of the page starting at `address`
    Trampoline { address: u16 },
}

/// Output image holding the byte stream and the symbol table
pub struct RomImage {
    words: Vec<RomWord>,
    start: u16,
    pc: u32,
    symbols: SymbolTable,
    zp_free: u8,
    zp_limit: u8,
}

impl RomImage {
    /// Create an empty image whose table starts at ROM address `start`
    pub fn new(start: u16) -> Self {
        Self {
            words: Vec::new(),
            start,
            pc: start as u32,
            symbols: SymbolTable::new(),
            zp_free: ZP_USER_START,
            zp_limit: ZP_USER_LIMIT,
        }
    }

    /// Create an image with the vCPU system symbols predefined
    pub fn with_system_symbols(start: u16) -> Self {
        let mut image = Self::new(start);
        image.symbols = [("vAC", 0x18), ("vPC", 0x16), ("vLR", 0x1a), ("maxTicks", 14)]
            .into_iter()
            .collect();
        image
    }

    /// Restrict zero-page allocation to `free..limit`
    pub fn set_zero_page(&mut self, free: u8, limit: u8) {
        self.zp_free = free;
        self.zp_limit = limit;
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn words(&self) -> &[RomWord] {
        &self.words
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    /// Number of data bytes written so far
    pub fn len(&self) -> usize {
        self.data_words().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn data_words(&self) -> impl Iterator<Item = (&u16, &Operand, &Option<String>)> {
        self.words.iter().filter_map(|word| match word {
            RomWord::Data {
                address,
                operand,
                comment,
            } => Some((address, operand, comment)),
            RomWord::Trampoline { .. } => None,
        })
    }

    fn resolve(&self, operand: &Operand) -> Result<u8> {
        match operand {
            Operand::Byte(byte) => Ok(*byte),
            Operand::Lo(name) => self
                .symbols
                .get(name)
                .map(|value| (value & 0xff) as u8)
                .ok_or_else(|| AsmError::UndefinedSymbol { name: name.clone() }),
        }
    }

    /// Names still referenced but never defined
    pub fn unresolved(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .data_words()
            .filter_map(|(_, operand, _)| match operand {
                Operand::Lo(name) if !self.symbols.contains(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Resolve every deferred reference and return the data bytes in order
    pub fn finish(&self) -> Result<Vec<u8>> {
        let bytes = self
            .data_words()
            .map(|(_, operand, _)| self.resolve(operand))
            .collect::<Result<Vec<u8>>>()?;
        log::debug!(
            "Finished image: {} bytes, {} symbols",
            bytes.len(),
            self.symbols.len()
        );
        Ok(bytes)
    }

    /// Annotated listing, one ROM word per line
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for word in &self.words {
            match word {
                RomWord::Data {
                    address,
                    operand,
                    comment,
                } => {
                    let value = match self.resolve(operand) {
                        Ok(byte) => format!("{:02x}", byte),
                        Err(_) => "??".to_string(),
                    };
                    out.push_str(&format!("{:04x}  {}", address, value));
                    if let Some(comment) = comment {
                        out.push_str(&format!("  ; {}", comment));
                    }
                    out.push('\n');
                }
                RomWord::Trampoline { address } => {
                    out.push_str(&format!("{:04x}  --  ; trampoline\n", address));
                }
            }
        }
        out
    }

    fn address(&self) -> Result<u16> {
        u16::try_from(self.pc).map_err(|_| AsmError::RomFull { address: 0xffff })
    }
}

impl Default for RomImage {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Backend for RomImage {
    fn put(&mut self, operand: Operand, comment: Option<&str>) -> Result<()> {
        let address = self.address()?;
        self.words.push(RomWord::Data {
            address,
            operand,
            comment: comment.map(str::to_string),
        });
        self.pc += 1;
        Ok(())
    }

    fn pc(&self) -> u16 {
        self.pc as u16
    }

    fn trampoline(&mut self) -> Result<()> {
        let address = self.address()?;
        log::debug!("Trampoline at {:04x}", address);
        self.words.push(RomWord::Trampoline { address });
        self.pc = (self.pc | 0xff) + 1;
        Ok(())
    }

    fn define(&mut self, name: &str, value: i64) -> Result<()> {
        log::debug!("Define {} = {:04x}", name, value);
        self.symbols.define(name, value)
    }

    fn lo(&self, name: &str) -> Operand {
        match self.symbols.get(name) {
            Some(value) => Operand::Byte((value & 0xff) as u8),
            None => Operand::Lo(name.to_string()),
        }
    }

    fn symbol(&self, name: &str) -> Option<i64> {
        self.symbols.get(name)
    }

    fn zp_alloc(&mut self, bytes: u8) -> Result<u8> {
        let base = self.zp_free;
        match base.checked_add(bytes) {
            Some(next) if next <= self.zp_limit => {
                self.zp_free = next;
                Ok(base)
            }
            _ => Err(AsmError::ZeroPageFull {
                bytes,
                free: base,
                limit: self.zp_limit,
            }),
        }
    }

    fn zp_free(&self) -> u8 {
        self.zp_free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_reference_resolved_on_finish() {
        let mut image = RomImage::new(0x0100);
        let operand = image.lo("later");
        assert_eq!(operand, Operand::Lo("later".to_string()));
        image.put(Operand::Byte(1), None).unwrap();
        image.put(operand, Some("forward")).unwrap();
        assert_eq!(image.unresolved(), vec!["later"]);
        assert_eq!(
            image.finish(),
            Err(AsmError::UndefinedSymbol {
                name: "later".to_string()
            })
        );

        image.define("later", 0x0234).unwrap();
        assert!(image.unresolved().is_empty());
        assert_eq!(image.finish().unwrap(), vec![1, 0x34]);
    }

    #[test]
    fn test_lo_of_defined_symbol_is_immediate() {
        let image = RomImage::with_system_symbols(0);
        assert_eq!(image.lo("vAC"), Operand::Byte(0x18));
        assert_eq!(image.symbol("maxTicks"), Some(14));
        assert_eq!(image.symbol("nope"), None);
    }

    #[test]
    fn test_zero_page_allocation() {
        let mut image = RomImage::new(0);
        assert_eq!(image.zp_alloc(2).unwrap(), 0x30);
        assert_eq!(image.zp_alloc(2).unwrap(), 0x32);
        assert_eq!(image.zp_free(), 0x34);

        image.set_zero_page(0x7e, 0x80);
        assert_eq!(image.zp_alloc(2).unwrap(), 0x7e);
        assert_eq!(
            image.zp_alloc(2),
            Err(AsmError::ZeroPageFull {
                bytes: 2,
                free: 0x80,
                limit: 0x80
            })
        );
    }

    #[test]
    fn test_trampoline_moves_to_next_page() {
        let mut image = RomImage::new(0x01fa);
        image.put(Operand::Byte(0xaa), None).unwrap();
        assert_eq!(image.pc(), 0x01fb);
        image.trampoline().unwrap();
        assert_eq!(image.pc(), 0x0200);
        image.put(Operand::Byte(0xbb), None).unwrap();

        assert_eq!(image.finish().unwrap(), vec![0xaa, 0xbb]);
        assert_eq!(image.len(), 2);
        assert_eq!(
            image.words()[1],
            RomWord::Trampoline { address: 0x01fb }
        );
        let listing = image.listing();
        assert!(listing.contains("01fb  --  ; trampoline"));
        assert!(listing.contains("0200  bb"));
    }

    #[test]
    fn test_listing_marks_unresolved_bytes() {
        let mut image = RomImage::new(0);
        let operand = image.lo("x");
        image.put(operand, Some("pending")).unwrap();
        assert_eq!(image.listing(), "0000  ??  ; pending\n");
    }

    #[test]
    fn test_rom_full() {
        let mut image = RomImage::new(0xffff);
        image.put(Operand::Byte(0), None).unwrap();
        assert!(matches!(
            image.put(Operand::Byte(0), None),
            Err(AsmError::RomFull { .. })
        ));
    }

    #[test]
    fn test_system_symbols() {
        let image = RomImage::with_system_symbols(0x0b00);
        assert_eq!(image.start(), 0x0b00);
        assert_eq!(image.pc(), 0x0b00);
        assert!(image.is_empty());
        assert_eq!(
            image.symbols().iter().collect::<Vec<_>>(),
            vec![("vAC", 0x18), ("vPC", 0x16), ("vLR", 0x1a), ("maxTicks", 14)]
        );
    }
}

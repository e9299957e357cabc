//! Variable table: names to lazily allocated zero-page words

use crate::error::{ErrorKind, Fallible};
use crate::word::Arg;
use gcl_asm::Backend;
use std::collections::HashMap;

/// Bytes of storage per variable
pub const VAR_SIZE: u8 = 2;

#[derive(Debug, Default, Clone)]
pub struct Variables {
    slots: HashMap<String, u8>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-page address for an operand.
    ///
    /// A name gets two fresh bytes on first use and keeps them for the rest
    /// of the unit. A literal is an explicit slot and must fit in one byte.
    pub fn address<B: Backend>(&mut self, arg: &Arg, backend: &mut B) -> Fallible<u8> {
        match arg {
            Arg::Var(name) => {
                if let Some(&address) = self.slots.get(name) {
                    return Ok(address);
                }
                let address = backend.zp_alloc(VAR_SIZE)?;
                log::debug!("Variable {} at {:02x}", name, address);
                self.slots.insert(name.clone(), address);
                Ok(address)
            }
            Arg::Lit(index) => u8::try_from(*index).map_err(|_| ErrorKind::IndexOutOfRange(*index)),
        }
    }

    pub fn get(&self, name: &str) -> Option<u8> {
        self.slots.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Variables in alphabetical order
    pub fn sorted(&self) -> Vec<(&str, u8)> {
        let mut vars: Vec<_> = self
            .slots
            .iter()
            .map(|(name, &address)| (name.as_str(), address))
            .collect();
        vars.sort_unstable();
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcl_asm::{AsmError, RomImage};
    use proptest::prelude::*;

    fn var(name: &str) -> Arg {
        Arg::Var(name.to_string())
    }

    #[test]
    fn test_same_name_same_address() {
        let mut image = RomImage::new(0);
        let mut vars = Variables::new();
        let x = vars.address(&var("x"), &mut image).unwrap();
        let y = vars.address(&var("y"), &mut image).unwrap();
        assert_eq!(x, 0x30);
        assert_eq!(y, 0x32);
        assert_eq!(vars.address(&var("x"), &mut image).unwrap(), x);
        assert_eq!(image.zp_free(), 0x34);
        assert_eq!(vars.sorted(), vec![("x", 0x30), ("y", 0x32)]);
    }

    #[test]
    fn test_literal_index() {
        let mut image = RomImage::new(0);
        let mut vars = Variables::new();
        assert_eq!(vars.address(&Arg::Lit(0x81), &mut image), Ok(0x81));
        assert_eq!(
            vars.address(&Arg::Lit(256), &mut image),
            Err(ErrorKind::IndexOutOfRange(256))
        );
        assert_eq!(
            vars.address(&Arg::Lit(-1), &mut image),
            Err(ErrorKind::IndexOutOfRange(-1))
        );
        assert!(vars.is_empty());
    }

    #[test]
    fn test_zero_page_exhausted() {
        let mut image = RomImage::new(0);
        image.set_zero_page(0x7e, 0x80);
        let mut vars = Variables::new();
        vars.address(&var("a"), &mut image).unwrap();
        assert!(matches!(
            vars.address(&var("b"), &mut image),
            Err(ErrorKind::Backend(AsmError::ZeroPageFull { .. }))
        ));
    }

    proptest! {
        #[test]
        fn addresses_are_stable_and_distinct(names in proptest::collection::vec("[a-z]{1,3}", 1..20)) {
            let mut image = RomImage::new(0);
            let mut vars = Variables::new();
            let first: Vec<u8> = names
                .iter()
                .map(|n| vars.address(&var(n), &mut image).unwrap())
                .collect();
            for (name, address) in names.iter().zip(&first) {
                prop_assert_eq!(vars.address(&var(name), &mut image).unwrap(), *address);
            }
            let sorted = vars.sorted();
            for pair in sorted.windows(2) {
                prop_assert_ne!(pair[0].1, pair[1].1);
            }
        }
    }
}

//! vCPU address arithmetic with explicit page and offset

use crate::error::{ErrorKind, Fallible};
use std::fmt;

/// Distance a branch target is kept behind its re-entry point.
///
/// The vCPU advances its program counter by two before each fetch, staying
/// inside the current page.
pub const BRANCH_STEP: u8 = 2;

/// A position in vCPU memory.
///
/// One past the end of the last page (0x10000) is representable so that a
/// completely filled top page still has a well-defined end address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    pub const fn new(value: u32) -> Self {
        Address(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn page(self) -> u32 {
        self.0 >> 8
    }

    pub const fn page_base(self) -> u32 {
        self.0 & !0xff
    }

    pub const fn offset(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub const fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Step back within the page; the offset wraps, the page never changes
    pub const fn prev(self, step: u8) -> Address {
        Address(self.page_base() | self.offset().wrapping_sub(step) as u32)
    }

    /// One-byte branch operand that re-enters at `self` from `site`
    pub fn branch_from(self, site: Address) -> Fallible<u8> {
        let target = self.prev(BRANCH_STEP);
        if target.page() != site.page() {
            return Err(ErrorKind::LoopOutsidePage);
        }
        Ok(target.offset())
    }
}

impl From<u16> for Address {
    fn from(value: u16) -> Self {
        Address(value as u32)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prev_wraps_inside_page() {
        assert_eq!(Address::new(0x0234).prev(2), Address::new(0x0232));
        assert_eq!(Address::new(0x0200).prev(2), Address::new(0x02fe));
        assert_eq!(Address::new(0x0201).prev(2), Address::new(0x02ff));
        assert_eq!(Address::new(0x0200).prev(1), Address::new(0x02ff));
    }

    #[test]
    fn test_split() {
        let a = Address::new(0x12ab);
        assert_eq!(a.page(), 0x12);
        assert_eq!(a.hi(), 0x12);
        assert_eq!(a.offset(), 0xab);
        assert_eq!(a.page_base(), 0x1200);
        assert_eq!(a.to_string(), "12ab");
    }

    #[test]
    fn test_branch_same_page() {
        let entry = Address::new(0x0300);
        assert_eq!(entry.branch_from(Address::new(0x0310)), Ok(0xfe));
        assert_eq!(Address::new(0x0340).branch_from(Address::new(0x0350)), Ok(0x3e));
    }

    #[test]
    fn test_branch_across_page_rejected() {
        let entry = Address::new(0x05f0);
        assert_eq!(
            entry.branch_from(Address::new(0x0600)),
            Err(ErrorKind::LoopOutsidePage)
        );
    }
}

//! Bounds of the output region currently being filled

use crate::address::Address;
use crate::error::{ErrorKind, Fallible};

/// Pages whose segments stop short of the page end
pub const RESERVED_PAGES: std::ops::RangeInclusive<u32> = 0x0100..=0x0400;
/// Usable bytes of a page in the reserved range
pub const RESERVED_CEILING: u32 = 250;
pub const PAGE_SIZE: u32 = 256;

/// An open segment: start, fill pointer and ceiling.
///
/// The ceiling is measured from the page start, not from the segment start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    start: Address,
    vpc: Address,
    end: Address,
}

impl Segment {
    pub fn at(start: u16) -> Self {
        let start = Address::from(start);
        let page = start.page_base();
        let room = if RESERVED_PAGES.contains(&page) {
            RESERVED_CEILING
        } else {
            PAGE_SIZE
        };
        Self {
            start,
            vpc: start,
            end: Address::new(page + room),
        }
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn vpc(&self) -> Address {
        self.vpc
    }

    pub fn end(&self) -> Address {
        self.end
    }

    /// Nothing written yet; the next byte opens the segment
    pub fn is_empty(&self) -> bool {
        self.vpc == self.start
    }

    pub fn size(&self) -> u32 {
        self.end.value().saturating_sub(self.start.value())
    }

    pub fn used(&self) -> u32 {
        self.vpc.value() - self.start.value()
    }

    pub fn unused(&self) -> u32 {
        self.end.value().saturating_sub(self.vpc.value())
    }

    /// Room for one more byte
    pub fn check_space(&self) -> Fallible<()> {
        if self.vpc >= self.end {
            return Err(ErrorKind::OutOfCodeSpace);
        }
        Ok(())
    }

    pub fn advance(&mut self) {
        self.vpc = Address::new(self.vpc.value() + 1);
    }
}

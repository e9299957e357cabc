//! Byte emission and segment management

use super::Program;
use crate::address::BRANCH_STEP;
use crate::blocks::Label;
use crate::error::{ErrorKind, Fallible};
use crate::opcodes::Mnemonic;
use crate::segment::{Segment, PAGE_SIZE};
use crate::summary::SegmentReport;
use crate::word::Arg;
use gcl_asm::rom::TRAMPOLINE_OFFSET;
use gcl_asm::{Backend, Operand};

impl<B: Backend> Program<B> {
    /// Append to the ROM table, hopping pages where the ROM layout needs it
    pub(super) fn put(&mut self, operand: Operand, comment: Option<&str>) -> Fallible<()> {
        self.backend.put(operand, comment)?;
        if self.for_rom && self.backend.pc() & 0xff == TRAMPOLINE_OFFSET {
            self.backend.trampoline()?;
        }
        Ok(())
    }

    /// Next program byte in RAM
    pub(super) fn emit(&mut self, value: i64, comment: Option<&str>) -> Fallible<()> {
        self.segment.check_space()?;
        let byte = u8::try_from(value).map_err(|_| ErrorKind::ValueOutOfRange(value))?;
        self.emit_operand(Operand::Byte(byte), comment)
    }

    /// Next program byte, possibly still a placeholder
    pub(super) fn emit_operand(&mut self, operand: Operand, comment: Option<&str>) -> Fallible<()> {
        self.segment.check_space()?;
        if self.segment.is_empty() {
            self.open_segment()?;
        }
        log::debug!("{} {:?}", self.segment.vpc(), operand);
        self.put(operand, comment)?;
        self.segment.advance();
        Ok(())
    }

    /// Next opcode in RAM
    pub(super) fn opcode<M: Mnemonic>(&mut self, ins: M) -> Fallible<()> {
        let comment = format!("{} {}", self.segment.vpc(), ins.mnemonic());
        self.emit_operand(Operand::Byte(ins.byte()), Some(&comment))
    }

    /// Zero-page operand for a variable or a literal slot, plus `offset`
    pub(super) fn address(&mut self, arg: &Arg, offset: i64) -> Fallible<()> {
        let base = self.vars.address(arg, &mut self.backend)?;
        let mut comment = format!("{} {}", self.segment.vpc().prev(1), arg);
        if offset != 0 {
            comment.push_str(&format!("{:+}", offset));
        }
        self.emit(base as i64 + offset, Some(&comment))
    }

    /// Branch operand back to the nearest enclosing `do`
    pub(super) fn loop_target(&self) -> Fallible<u8> {
        let entry = self.blocks.loop_entry()?;
        entry.branch_from(self.segment.vpc())
    }

    /// Target for a forward label resolved at the current position
    pub(super) fn here(&self) -> i64 {
        self.segment.vpc().prev(BRANCH_STEP).value() as i64
    }

    pub(super) fn redirect(&mut self, address: u16) -> Fallible<()> {
        self.close_segment()?;
        log::debug!("Segment at {:04x}", address);
        self.segment = Segment::at(address);
        Ok(())
    }

    /// Write the header: target address (high byte first) and length
    fn open_segment(&mut self) -> Fallible<()> {
        let start = self.segment.start();
        let start16 = start.value() as u16;
        if self.execute.is_none() {
            self.execute = Some(start16);
        }
        if self.seg_id != 0 && start.page() == 0 {
            return Err(ErrorKind::ZeroPageSegment(start16));
        }
        self.put(
            Operand::Byte(start.hi()),
            Some("| RAM segment address (high byte first)"),
        )?;
        self.put(Operand::Byte(start.offset()), Some("|"))?;
        let length = self.reference(Label::Segment(self.seg_id));
        self.put(length, Some("| Length (1..256)"))
    }

    /// Register the length of the segment, if anything was written
    pub(super) fn close_segment(&mut self) -> Fallible<()> {
        if !self.blocks.is_top_level() {
            return Err(ErrorKind::UnterminatedBlock);
        }
        if self.segment.is_empty() {
            return Ok(());
        }
        let report = SegmentReport {
            start: self.segment.start().value(),
            size: self.segment.size(),
            used: self.segment.used(),
        };
        log::info!("{}", report);
        let length = report.used;
        if !(1..=PAGE_SIZE).contains(&length) {
            return Err(ErrorKind::SegmentLength(length));
        }
        self.resolve(Label::Segment(self.seg_id), length as i64)?;
        self.reports.push(report);
        self.seg_id += 1;
        Ok(())
    }
}

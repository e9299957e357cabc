//! Translation context for one GCL unit

mod dispatch;
mod emit;
mod lexer;

pub use dispatch::{Form, Keyword, Operator};

use crate::address::Address;
use crate::blocks::{BlockId, Blocks, Label};
use crate::error::{Diagnostic, ErrorKind, Fallible, GclError, Result, Severity};
use crate::segment::Segment;
use crate::summary::{SegmentReport, Summary, VariableReport};
use crate::vars::Variables;
use gcl_asm::{Backend, Operand};
use std::collections::{BTreeSet, HashMap};

/// The only accepted first word
pub const VERSION: &str = "gcl0x";

/// Default load address for user programs
pub const DEFAULT_START: u16 = 0x0200;

/// Construction parameters of a [`Program`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOptions {
    pub start: u16,
    pub name: String,
    /// Insert trampolines because the table is placed in ROM
    pub for_rom: bool,
}

impl ProgramOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: DEFAULT_START,
            name: name.into(),
            for_rom: true,
        }
    }

    pub fn start(mut self, start: u16) -> Self {
        self.start = start;
        self
    }

    pub fn for_rom(mut self, for_rom: bool) -> Self {
        self.for_rom = for_rom;
        self
    }
}

/// Key of a length annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LengthKey {
    Var(String),
    Block(BlockId),
}

/// One GCL translation unit writing into a backend.
///
/// Feed it source with [`line`](Program::line), redirect output with
/// [`org`](Program::org) and finish with [`end`](Program::end). The first
/// fatal error poisons the program; later calls return
/// [`GclError::Aborted`].
pub struct Program<B: Backend> {
    backend: B,
    name: String,
    filename: Option<String>,
    for_rom: bool,
    comment: u32,
    line_number: usize,
    blocks: Blocks,
    vars: Variables,
    lengths: HashMap<LengthKey, Option<u32>>,
    segment: Segment,
    seg_id: u32,
    reports: Vec<SegmentReport>,
    version: Option<String>,
    execute: Option<u16>,
    need_patch: bool,
    pending: BTreeSet<String>,
    warnings: Vec<Diagnostic>,
    aborted: bool,
}

impl<B: Backend> Program<B> {
    pub fn new(backend: B, address: u16, name: impl Into<String>, for_rom: bool) -> Self {
        Self {
            backend,
            name: name.into(),
            filename: None,
            for_rom,
            comment: 0,
            line_number: 0,
            blocks: Blocks::new(),
            vars: Variables::new(),
            lengths: HashMap::new(),
            segment: Segment::at(address),
            seg_id: 0,
            reports: Vec::new(),
            version: None,
            execute: None,
            need_patch: false,
            pending: BTreeSet::new(),
            warnings: Vec::new(),
            aborted: false,
        }
    }

    pub fn with_options(backend: B, options: ProgramOptions) -> Self {
        Self::new(backend, options.start, options.name, options.for_rom)
    }

    /// Source file name shown in diagnostics
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    /// Process one line of source
    pub fn line(&mut self, text: &str) -> Result<()> {
        self.guard()?;
        self.line_number += 1;
        let result = self.scan(text);
        self.settle(result)
    }

    /// Close the current segment and continue output at `address`
    pub fn org(&mut self, address: u16) -> Result<()> {
        self.guard()?;
        let result = self.redirect(address);
        self.settle(result)
    }

    /// Finish the unit: close the last segment, terminate the stream and
    /// report segment and variable usage
    pub fn end(&mut self) -> Result<Summary> {
        self.guard()?;
        let result = self.finish();
        self.settle(result)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Start of the first segment written, the unit's entry point
    pub fn execute(&self) -> Option<u16> {
        self.execute
    }

    /// A `ret` was used at the top level
    pub fn needs_patch(&self) -> bool {
        self.need_patch
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Placeholders referenced but not yet defined
    pub fn pending_labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.pending.iter().map(String::as_str)
    }

    pub fn vpc(&self) -> Address {
        self.segment.vpc()
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Open blocks including the top level
    pub fn block_depth(&self) -> usize {
        self.blocks.depth()
    }

    pub fn variable(&self, name: &str) -> Option<u8> {
        self.vars.get(name)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    fn guard(&self) -> Result<()> {
        if self.aborted {
            return Err(GclError::Aborted {
                unit: self.name.clone(),
            });
        }
        Ok(())
    }

    fn diagnostic(&self, severity: Severity, message: String) -> Diagnostic {
        Diagnostic {
            severity,
            unit: self.name.clone(),
            file: self.filename.clone(),
            line: self.line_number,
            message,
        }
    }

    /// Attach position information to an internal failure and poison the program
    fn settle<T>(&mut self, result: Fallible<T>) -> Result<T> {
        result.map_err(|kind| {
            self.aborted = true;
            let diagnostic = self.diagnostic(Severity::Error, kind.to_string());
            log::error!("{}", diagnostic);
            GclError::Fatal { diagnostic, kind }
        })
    }

    fn warning(&mut self, message: String) {
        let diagnostic = self.diagnostic(Severity::Warning, message);
        log::warn!("{}", diagnostic);
        self.warnings.push(diagnostic);
    }

    /// Low byte of a placeholder, remembered until it is defined
    fn reference(&mut self, label: Label) -> Operand {
        let name = label.name(&self.name);
        let operand = self.backend.lo(&name);
        if matches!(operand, Operand::Lo(_)) {
            self.pending.insert(name);
        }
        operand
    }

    fn resolve(&mut self, label: Label, value: i64) -> Fallible<()> {
        let name = label.name(&self.name);
        self.backend.define(&name, value)?;
        self.pending.remove(&name);
        Ok(())
    }

    fn symbol(&self, word: &str, name: &str) -> Fallible<i64> {
        self.backend
            .symbol(name)
            .ok_or_else(|| ErrorKind::UndefinedSymbol {
                word: word.to_string(),
                name: name.to_string(),
            })
    }

    fn finish(&mut self) -> Fallible<Summary> {
        if self.comment > 0 {
            return Err(ErrorKind::UnterminatedComment);
        }
        self.close_segment()?;

        let variables: Vec<VariableReport> = self
            .vars
            .sorted()
            .into_iter()
            .map(|(name, address)| VariableReport {
                name: name.to_string(),
                address,
                length: self
                    .lengths
                    .get(&LengthKey::Var(name.to_string()))
                    .copied()
                    .flatten(),
            })
            .collect();
        let summary = Summary {
            segments: self.reports.clone(),
            variables,
            zp_end: self.backend.zp_free(),
        };
        log::info!("{}", summary.variable_header());
        for line in summary.variable_lines() {
            log::info!("{}", line);
        }

        // Zero marks the end of stream
        self.put(Operand::Byte(0), Some("End of file"))?;

        if !self.pending.is_empty() {
            return Err(ErrorKind::DanglingLabels(self.pending.iter().cloned().collect()));
        }
        Ok(summary)
    }

    /// `X=`: inherit the length of a procedure just closed in this block
    fn note_assignment(&mut self, name: &str) {
        let key = LengthKey::Var(name.to_string());
        let block = self.lengths.get(&LengthKey::Block(self.blocks.current())).copied();
        let length = match block {
            Some(length) if !self.lengths.contains_key(&key) => length,
            _ => None,
        };
        self.lengths.insert(key, length);
    }
}

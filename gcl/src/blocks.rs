//! Block stack and the labels that are resolved when a block closes

use crate::address::Address;
use crate::error::{ErrorKind, Fallible};
use std::collections::HashMap;

/// Block identifier; 0 is the implicit top level
pub type BlockId = u32;

pub const TOP_LEVEL: BlockId = 0;

/// Which branch of a conditional still waits for its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondState {
    /// `if` emitted, target is the end of the block
    Then,
    /// `else` emitted, target is the end of the block
    Else,
}

impl CondState {
    pub fn index(self) -> u8 {
        match self {
            CondState::Then => 0,
            CondState::Else => 1,
        }
    }
}

/// Forward labels opened by the translator, named per translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Length byte of a segment header
    Segment(u32),
    /// Branch target of a conditional
    If(BlockId, CondState),
    /// End of a procedure body, keyed by its start address
    Def(u32),
}

impl Label {
    pub fn name(self, unit: &str) -> String {
        match self {
            Label::Segment(id) => format!("${}.seg.{}", unit, id),
            Label::If(block, state) => format!("${}.if.{}.{}", unit, block, state.index()),
            Label::Def(start) => format!("${}.def.{}", unit, start),
        }
    }
}

/// What was pending on a block when it closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    pub block: BlockId,
    pub cond: Option<CondState>,
    pub def: Option<Address>,
}

/// Nested lexical scopes and their facets.
///
/// A block can be a loop, a conditional and a procedure body at the same time.
#[derive(Debug, Clone)]
pub struct Blocks {
    stack: Vec<BlockId>,
    next_id: BlockId,
    loops: HashMap<BlockId, Address>,
    conds: HashMap<BlockId, CondState>,
    defs: HashMap<BlockId, Address>,
}

impl Blocks {
    pub fn new() -> Self {
        Self {
            stack: vec![TOP_LEVEL],
            next_id: TOP_LEVEL + 1,
            loops: HashMap::new(),
            conds: HashMap::new(),
            defs: HashMap::new(),
        }
    }

    pub fn current(&self) -> BlockId {
        self.stack.last().copied().unwrap_or(TOP_LEVEL)
    }

    /// Number of open blocks including the top level
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_top_level(&self) -> bool {
        self.stack.len() == 1
    }

    pub fn open(&mut self) -> BlockId {
        let id = self.next_id;
        self.next_id += 1;
        self.stack.push(id);
        id
    }

    /// Pop the innermost block and take its pending facets
    pub fn close(&mut self) -> Fallible<Closed> {
        if self.stack.len() <= 1 {
            return Err(ErrorKind::Unexpected("]".to_string()));
        }
        let block = self.stack.pop().unwrap_or(TOP_LEVEL);
        self.loops.remove(&block);
        Ok(Closed {
            block,
            cond: self.conds.remove(&block),
            def: self.defs.remove(&block),
        })
    }

    /// `do`: remember where the innermost block loops back to
    pub fn mark_loop(&mut self, address: Address) {
        self.loops.insert(self.current(), address);
    }

    /// Entry of the nearest enclosing loop
    pub fn loop_entry(&self) -> Fallible<Address> {
        self.stack
            .iter()
            .rev()
            .find_map(|block| self.loops.get(block).copied())
            .ok_or(ErrorKind::LoopWithoutDo)
    }

    /// `if…`: the innermost block now has an open "then" target
    pub fn begin_if(&mut self) -> BlockId {
        let block = self.current();
        self.conds.insert(block, CondState::Then);
        block
    }

    /// Validate an `else` for the innermost block
    pub fn check_else(&self) -> Fallible<BlockId> {
        let block = self.current();
        match self.conds.get(&block) {
            None => Err(ErrorKind::Unexpected("else".to_string())),
            Some(CondState::Else) => Err(ErrorKind::TooMany("else".to_string())),
            Some(CondState::Then) => Ok(block),
        }
    }

    pub fn begin_else(&mut self, block: BlockId) {
        self.conds.insert(block, CondState::Else);
    }

    /// `def`: the innermost block is a procedure body starting at `start`
    pub fn begin_def(&mut self, start: Address) {
        self.defs.insert(self.current(), start);
    }

    /// True when no facet of any block is pending
    pub fn is_settled(&self) -> bool {
        self.conds.is_empty() && self.defs.is_empty()
    }
}

impl Default for Blocks {
    fn default() -> Self {
        Self::new()
    }
}

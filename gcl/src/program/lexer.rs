//! Line tokenizer: comments, blocks and word splitting

use super::{LengthKey, Program};
use crate::blocks::Label;
use crate::error::{ErrorKind, Fallible};
use gcl_asm::Backend;

impl<B: Backend> Program<B> {
    /// Split a line into words, tracking `{}` comments and `[]` blocks
    pub(super) fn scan(&mut self, text: &str) -> Fallible<()> {
        let mut word = String::new();
        for c in text.chars() {
            if self.comment > 0 {
                // Inside comments anything goes
                match c {
                    '{' => self.comment += 1,
                    '}' => self.comment -= 1,
                    _ => {}
                }
                continue;
            }
            match c {
                '{' | '}' | '[' | ']' | '(' | ')' => {
                    self.flush(&mut word)?;
                    match c {
                        '{' => self.comment += 1,
                        '}' => return Err(ErrorKind::Spurious(c)),
                        '[' => {
                            let block = self.blocks.open();
                            log::trace!("open block {}", block);
                        }
                        ']' => self.close_block()?,
                        // Reserved for grouping
                        _ => {}
                    }
                }
                c if c.is_whitespace() => self.flush(&mut word)?,
                c => word.push(c),
            }
        }
        self.flush(&mut word)
    }

    fn flush(&mut self, word: &mut String) -> Fallible<()> {
        if word.is_empty() {
            return Ok(());
        }
        let word = std::mem::take(word);
        log::trace!("word {:?}", word);
        self.word(&word)
    }

    /// `]`: resolve whatever the innermost block left pending
    fn close_block(&mut self) -> Fallible<()> {
        let closed = self.blocks.close()?;
        log::trace!("close block {}", closed.block);
        let here = self.here();
        if let Some(state) = closed.cond {
            self.resolve(Label::If(closed.block, state), here)?;
        }
        if let Some(start) = closed.def {
            self.resolve(Label::Def(start.value()), here)?;
            let length = self.segment.vpc().value() - start.value() + 2;
            self.lengths
                .insert(LengthKey::Block(self.blocks.current()), Some(length));
        }
        Ok(())
    }
}

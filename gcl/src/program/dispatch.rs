//! Instruction selection: every word form and the bytes it produces

use super::{Program, VERSION};
use crate::blocks::{CondState, Label};
use crate::error::{ErrorKind, Fallible};
use crate::opcodes::{Cond, Opcode};
use crate::word::{parse_word, Arg, QUOTE};
use gcl_asm::Backend;

/// Words recognised before any operator parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Loop,
    Def,
    Do,
    /// Skip the rest of the block when the condition holds
    If(Cond),
    /// Branch back to `do` when the condition holds
    IfLoop(Cond),
    Else,
    Push,
    Pop,
    Ret,
    Call,
    Peek,
    Deek,
}

impl Keyword {
    pub fn parse(word: &str) -> Option<Self> {
        let keyword = match word {
            "loop" => Keyword::Loop,
            "def" => Keyword::Def,
            "do" => Keyword::Do,
            "if<>0" => Keyword::If(Cond::Eq),
            "if=0" => Keyword::If(Cond::Ne),
            "if>=0" => Keyword::If(Cond::Lt),
            "if<=0" => Keyword::If(Cond::Gt),
            "if>0" => Keyword::If(Cond::Le),
            "if<0" => Keyword::If(Cond::Ge),
            "if<>0loop" => Keyword::IfLoop(Cond::Ne),
            "if=0loop" => Keyword::IfLoop(Cond::Eq),
            "if>0loop" => Keyword::IfLoop(Cond::Gt),
            "if<0loop" => Keyword::IfLoop(Cond::Lt),
            "if>=0loop" => Keyword::IfLoop(Cond::Ge),
            "if<=0loop" => Keyword::IfLoop(Cond::Le),
            "else" => Keyword::Else,
            "push" => Keyword::Push,
            "pop" => Keyword::Pop,
            "ret" => Keyword::Ret,
            "call" => Keyword::Call,
            "peek" => Keyword::Peek,
            "deek" => Keyword::Deek,
            _ => return None,
        };
        Some(keyword)
    }
}

/// Operators attached to an operand. Prefix forms are spelled with a
/// trailing space by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `;` load word, through a pointer for variables
    Semicolon,
    /// `:` store word, through a pointer for variables
    Colon,
    /// `=` store word
    Equals,
    /// `.` store byte, through a pointer for variables
    Period,
    /// `,` load byte, through a pointer for variables
    Comma,
    Plus,
    Minus,
    ShiftLeft,
    /// `--` grow the stack frame
    MinusMinus,
    /// `++` shrink the stack frame
    PlusPlus,
    /// `%=` store into the stack frame
    PercentEquals,
    /// `%` load from the stack frame
    Percent,
    Backtick,
    /// `i#` raw byte
    Hash,
    /// `#i` raw byte
    PrefixHash,
    /// `?` table lookup
    Question,
    Ampersand,
    Bar,
    Caret,
    /// `<X.` store low byte
    LowPeriod,
    /// `>X.` store high byte
    HighPeriod,
    /// `<X,` load low byte
    LowComma,
    /// `>X,` load high byte
    HighComma,
    /// `<X++` increment low byte
    LowIncrement,
    /// `>X++` increment high byte
    HighIncrement,
    /// `X<++`, older spelling of `<X++`
    LegacyLowIncrement,
    /// `X>++`, older spelling of `>X++`
    LegacyHighIncrement,
    /// `!` call a variable, or a system function with a cycle budget
    Bang,
}

impl Operator {
    pub fn parse(op: &str) -> Option<Self> {
        let operator = match op {
            ";" => Operator::Semicolon,
            ":" => Operator::Colon,
            "=" => Operator::Equals,
            "." => Operator::Period,
            "," => Operator::Comma,
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "<<" => Operator::ShiftLeft,
            "--" => Operator::MinusMinus,
            "++" => Operator::PlusPlus,
            "%=" => Operator::PercentEquals,
            "%" => Operator::Percent,
            "`" => Operator::Backtick,
            "#" => Operator::Hash,
            "# " => Operator::PrefixHash,
            "?" => Operator::Question,
            "&" => Operator::Ampersand,
            "|" => Operator::Bar,
            "^" => Operator::Caret,
            "< ." => Operator::LowPeriod,
            "> ." => Operator::HighPeriod,
            "< ," => Operator::LowComma,
            "> ," => Operator::HighComma,
            "< ++" => Operator::LowIncrement,
            "> ++" => Operator::HighIncrement,
            "<++" => Operator::LegacyLowIncrement,
            ">++" => Operator::LegacyHighIncrement,
            "!" => Operator::Bang,
            _ => return None,
        };
        Some(operator)
    }
}

/// A classified word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    Keyword(Keyword),
    /// Bare operand: load it into vAC
    Load(Arg),
    Apply(Operator, Arg),
}

impl Form {
    /// Classify a word; `lookup` resolves `\symbol` references
    pub fn classify<F>(word: &str, lookup: F) -> Fallible<Form>
    where
        F: Fn(&str) -> Option<i64>,
    {
        if let Some(keyword) = Keyword::parse(word) {
            return Ok(Form::Keyword(keyword));
        }
        let parsed = parse_word(word, lookup)?;
        let invalid = || ErrorKind::InvalidWord(word.to_string());
        let arg = parsed.arg().ok_or_else(invalid)?;
        match parsed.op {
            None => Ok(Form::Load(arg)),
            Some(op) => {
                let operator = Operator::parse(&op).ok_or_else(invalid)?;
                Ok(Form::Apply(operator, arg))
            }
        }
    }
}

impl<B: Backend> Program<B> {
    /// Process a word and emit its code
    pub(super) fn word(&mut self, word: &str) -> Fallible<()> {
        if self.version.is_none() {
            if word != VERSION {
                return Err(ErrorKind::InvalidVersion(word.to_string()));
            }
            self.version = Some(word.to_string());
            return Ok(());
        }
        let backend = &self.backend;
        let form = Form::classify(word, |name| backend.symbol(name))?;
        match form {
            Form::Keyword(keyword) => self.keyword(keyword),
            Form::Load(arg) => self.load(&arg),
            Form::Apply(operator, arg) => self.apply(word, operator, arg),
        }
    }

    fn keyword(&mut self, keyword: Keyword) -> Fallible<()> {
        match keyword {
            Keyword::Loop => {
                let to = self.loop_target()?;
                self.opcode(Opcode::Bra)?;
                self.emit(to as i64, None)
            }
            Keyword::Def => {
                // The start address doubles as the procedure's identifier
                let start = self.segment.vpc();
                self.opcode(Opcode::Def)?;
                self.blocks.begin_def(start);
                let end = self.reference(Label::Def(start.value()));
                self.emit_operand(end, None)
            }
            Keyword::Do => {
                self.blocks.mark_loop(self.segment.vpc());
                Ok(())
            }
            Keyword::If(cond) => {
                self.opcode(Opcode::Bcc)?;
                self.opcode(cond)?;
                let block = self.blocks.begin_if();
                let target = self.reference(Label::If(block, CondState::Then));
                self.emit_operand(target, None)
            }
            Keyword::IfLoop(cond) => {
                let to = self.loop_target()?;
                self.opcode(Opcode::Bcc)?;
                self.opcode(cond)?;
                self.emit(to as i64, None)
            }
            Keyword::Else => {
                let block = self.blocks.check_else()?;
                self.opcode(Opcode::Bra)?;
                let target = self.reference(Label::If(block, CondState::Else));
                self.emit_operand(target, None)?;
                let here = self.here();
                self.resolve(Label::If(block, CondState::Then), here)?;
                self.blocks.begin_else(block);
                Ok(())
            }
            Keyword::Push => self.opcode(Opcode::Push),
            Keyword::Pop => self.opcode(Opcode::Pop),
            Keyword::Ret => {
                self.opcode(Opcode::Ret)?;
                if self.blocks.is_top_level() {
                    self.need_patch = true;
                }
                Ok(())
            }
            Keyword::Call => {
                self.opcode(Opcode::Call)?;
                let vac = self.symbol("call", "vAC")?;
                let comment = format!("{} vAC", self.segment.vpc().prev(1));
                self.emit(vac, Some(&comment))
            }
            Keyword::Peek => self.opcode(Opcode::Peek),
            Keyword::Deek => self.opcode(Opcode::Deek),
        }
    }

    fn load(&mut self, arg: &Arg) -> Fallible<()> {
        match *arg {
            Arg::Var(_) => {
                self.opcode(Opcode::Ldw)?;
                self.address(arg, 0)
            }
            Arg::Lit(value) if (0..256).contains(&value) => {
                self.opcode(Opcode::Ldi)?;
                self.emit(value, None)
            }
            Arg::Lit(value) => {
                self.opcode(Opcode::Ldwi)?;
                self.emit(value & 0xff, None)?;
                self.emit((value >> 8) & 0xff, None)
            }
        }
    }

    fn apply(&mut self, word: &str, operator: Operator, arg: Arg) -> Fallible<()> {
        use Operator::*;

        match (operator, &arg) {
            (Semicolon, Arg::Lit(_)) => self.op_address(Opcode::Ldw, &arg, 0),
            (Semicolon, Arg::Var(_)) => {
                self.op_address(Opcode::Ldw, &arg, 0)?;
                self.opcode(Opcode::Deek)
            }

            (Colon, &Arg::Lit(address)) if address > 0xff => {
                let address = u16::try_from(address)
                    .map_err(|_| ErrorKind::AddressOutOfRange(address))?;
                self.redirect(address)
            }
            (Colon, Arg::Lit(_)) => self.op_address(Opcode::Stw, &arg, 0),
            (Colon, Arg::Var(_)) => self.op_address(Opcode::Doke, &arg, 0),

            (Equals, Arg::Lit(_)) => {
                self.warning(format!("({}) i= is deprecated, use i:", word));
                self.op_address(Opcode::Stw, &arg, 0)
            }
            (Equals, Arg::Var(name)) => {
                self.note_assignment(name);
                self.op_address(Opcode::Stw, &arg, 0)
            }

            (Period, Arg::Lit(_)) => self.op_address(Opcode::St, &arg, 0),
            (Period, Arg::Var(_)) => self.op_address(Opcode::Poke, &arg, 0),

            (Comma, Arg::Lit(_)) => self.op_address(Opcode::Ld, &arg, 0),
            (Comma, Arg::Var(_)) => {
                self.op_address(Opcode::Ldw, &arg, 0)?;
                self.opcode(Opcode::Peek)
            }

            (Plus, Arg::Var(_)) => self.op_address(Opcode::Addw, &arg, 0),
            (Plus, &Arg::Lit(value)) => self.op_immediate(Opcode::Addi, value),
            (Minus, Arg::Var(_)) => self.op_address(Opcode::Subw, &arg, 0),
            (Minus, &Arg::Lit(value)) => self.op_immediate(Opcode::Subi, value),
            (Ampersand, Arg::Var(_)) => self.op_address(Opcode::Andw, &arg, 0),
            (Ampersand, &Arg::Lit(value)) => self.op_immediate(Opcode::Andi, value),
            (Bar, Arg::Var(_)) => self.op_address(Opcode::Orw, &arg, 0),
            (Bar, &Arg::Lit(value)) => self.op_immediate(Opcode::Ori, value),
            (Caret, Arg::Var(_)) => self.op_address(Opcode::Xorw, &arg, 0),
            (Caret, &Arg::Lit(value)) => self.op_immediate(Opcode::Xori, value),

            (ShiftLeft, &Arg::Lit(count)) => {
                for _ in 0..count.max(0) {
                    self.opcode(Opcode::Lslw)?;
                }
                Ok(())
            }

            (MinusMinus, &Arg::Lit(bytes)) => {
                self.op_immediate(Opcode::Alloc, bytes.wrapping_neg() & 0xff)
            }
            (PlusPlus, &Arg::Lit(bytes)) => self.op_immediate(Opcode::Alloc, bytes),

            (PercentEquals, &Arg::Lit(offset)) => self.op_immediate(Opcode::Stlw, offset),
            (Percent, &Arg::Lit(offset)) => self.op_immediate(Opcode::Ldlw, offset),

            (Backtick, Arg::Var(text)) => self.quoted(text),

            (Hash | PrefixHash, &Arg::Lit(value)) => self.emit(value & 0xff, None),

            (Question, &Arg::Lit(index)) => self.op_immediate(Opcode::Lup, index),

            (LowPeriod, Arg::Var(_)) => self.op_address(Opcode::St, &arg, 0),
            (HighPeriod, Arg::Var(_)) => self.op_address(Opcode::St, &arg, 1),
            (LowComma, Arg::Var(_)) => self.op_address(Opcode::Ld, &arg, 0),
            (HighComma, Arg::Var(_)) => self.op_address(Opcode::Ld, &arg, 1),

            (LegacyLowIncrement, _) => {
                self.deprecated_increment(word, &arg, '<');
                self.op_address(Opcode::Inc, &arg, 0)
            }
            (LegacyHighIncrement, _) => {
                self.deprecated_increment(word, &arg, '>');
                self.op_address(Opcode::Inc, &arg, 1)
            }
            (LowIncrement, _) => self.op_address(Opcode::Inc, &arg, 0),
            (HighIncrement, _) => self.op_address(Opcode::Inc, &arg, 1),

            (Bang, Arg::Var(_)) => self.op_address(Opcode::Call, &arg, 0),
            (Bang, &Arg::Lit(cycles)) => self.sys(word, cycles),

            (
                ShiftLeft | MinusMinus | PlusPlus | PercentEquals | Percent | Hash | PrefixHash
                | Question | LowPeriod | HighPeriod | LowComma | HighComma,
                _,
            )
            | (Backtick, Arg::Lit(_)) => Err(ErrorKind::InvalidWord(word.to_string())),
        }
    }

    /// Opcode followed by a zero-page operand
    fn op_address(&mut self, opcode: Opcode, arg: &Arg, offset: i64) -> Fallible<()> {
        self.opcode(opcode)?;
        self.address(arg, offset)
    }

    /// Opcode followed by a one-byte immediate
    fn op_immediate(&mut self, opcode: Opcode, value: i64) -> Fallible<()> {
        self.opcode(opcode)?;
        self.emit(value, None)
    }

    fn deprecated_increment(&mut self, word: &str, arg: &Arg, side: char) {
        let canonical = match arg {
            Arg::Var(name) => format!("{}{}++", side, name),
            Arg::Lit(value) => format!("{}{}++", side, value),
        };
        self.warning(format!(
            "({}) postfix {}++ is deprecated, use {}",
            word, side, canonical
        ));
    }

    /// `n!`: system call with a budget of `n` cycles
    fn sys(&mut self, word: &str, cycles: i64) -> Fallible<()> {
        if cycles & 1 != 0 {
            return Err(ErrorKind::OddValue(word.to_string()));
        }
        self.opcode(Opcode::Sys)?;
        let max_ticks = self.symbol(word, "maxTicks")?;
        let extra_ticks = cycles / 2 - max_ticks;
        self.emit(if extra_ticks > 0 { 256 - extra_ticks } else { 0 }, None)
    }

    /// Inline character data, emitted as its UTF-8 bytes
    fn quoted(&mut self, text: &str) -> Fallible<()> {
        // A bare backtick stands for a space
        let mut escape = text.is_empty();
        for c in text.chars() {
            if escape {
                if c != QUOTE {
                    self.emit_char(QUOTE)?;
                }
                self.emit_char(c)?;
                escape = false;
            } else if c == QUOTE {
                escape = true;
            } else {
                self.emit_char(c)?;
            }
        }
        if escape {
            self.emit_char(' ')?;
        }
        Ok(())
    }

    fn emit_char(&mut self, c: char) -> Fallible<()> {
        let mut buf = [0u8; 4];
        for &byte in c.encode_utf8(&mut buf).as_bytes() {
            self.emit(byte as i64, None)?;
        }
        Ok(())
    }
}

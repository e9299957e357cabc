//! Token parser: splits one word into name, number and operator

use crate::error::{ErrorKind, Fallible};
use std::fmt;

/// Characters that may precede the operand as prefix operators
pub const PREFIX_OPERATORS: [char; 4] = ['%', '#', '<', '>'];
/// At most this many prefix characters are taken
pub const MAX_PREFIXES: usize = 3;
/// Marks inline character data
pub const QUOTE: char = '`';

/// The pieces of one word.
///
/// Prefix operators are recorded with a trailing space (`"< "`), so `<X++`
/// yields the operator `"< ++"` and never collides with the postfix `X<++`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    pub name: Option<String>,
    pub number: Option<i64>,
    pub op: Option<String>,
}

/// The operand of a word: a variable name or a literal number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Var(String),
    Lit(i64),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Var(name) => write!(f, "'{}'", name),
            Arg::Lit(value) => write!(f, "{}", value),
        }
    }
}

impl Word {
    /// The operand, preferring the name when both are absent or present
    pub fn arg(&self) -> Option<Arg> {
        match (&self.name, self.number) {
            (Some(name), _) => Some(Arg::Var(name.clone())),
            (None, Some(number)) => Some(Arg::Lit(number)),
            (None, None) => None,
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\\'
}

/// Parse one non-empty word.
///
/// `lookup` resolves `\symbol` references against the backend symbol table.
pub fn parse_word<F>(word: &str, lookup: F) -> Fallible<Word>
where
    F: Fn(&str) -> Option<i64>,
{
    let chars: Vec<char> = word.chars().collect();
    if chars.first() == Some(&QUOTE) {
        return Ok(Word {
            name: Some(chars[1..].iter().collect()),
            number: None,
            op: Some(QUOTE.to_string()),
        });
    }

    let at = |ix: usize| chars.get(ix).copied();
    let mut ix = 0;
    let mut op = String::new();
    let mut name = None;
    let mut number: Option<i64> = None;

    while ix < MAX_PREFIXES && at(ix).is_some_and(|c| PREFIX_OPERATORS.contains(&c)) {
        op.push(chars[ix]);
        op.push(' ');
        ix += 1;
    }

    let sign = match at(ix) {
        Some(c @ ('+' | '-')) => {
            ix += 1;
            Some(c)
        }
        _ => None,
    };

    if at(ix) == Some('$') && at(ix + 1).is_some_and(|c| c.is_ascii_hexdigit()) {
        let mut value: i64 = 0;
        ix += 1;
        while let Some(digit) = at(ix).and_then(|c| c.to_digit(16)) {
            value = value.wrapping_mul(16).wrapping_add(digit as i64);
            ix += 1;
        }
        number = Some(value);
    } else if at(ix).is_some_and(|c| c.is_ascii_digit()) {
        let mut value: i64 = 0;
        while let Some(digit) = at(ix).and_then(|c| c.to_digit(10)) {
            value = value.wrapping_mul(10).wrapping_add(digit as i64);
            ix += 1;
        }
        number = Some(value);
    } else {
        let start = ix;
        while at(ix).is_some_and(is_name_char) {
            ix += 1;
        }
        if ix > start {
            let text: String = chars[start..ix].iter().collect();
            if let Some(symbol) = text.strip_prefix('\\') {
                // Assembler symbol, not a GCL variable
                number = Some(lookup(symbol).ok_or_else(|| ErrorKind::UndefinedSymbol {
                    word: word.to_string(),
                    name: text.clone(),
                })?);
                op.clear();
            } else {
                name = Some(text);
            }
        }
    }

    if sign == Some('-') {
        number = number.map(i64::wrapping_neg);
    }

    op.extend(&chars[ix..]);
    Ok(Word {
        name,
        number,
        op: if op.is_empty() { None } else { Some(op) },
    })
}

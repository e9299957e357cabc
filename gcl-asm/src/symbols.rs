//! Write-once symbol table

use crate::error::{AsmError, Result};
use std::collections::HashMap;

/// Named integer values shared by every translation unit writing into one image.
///
/// A symbol is defined at most once. Defining it again with the same value is
/// accepted, a different value is an error.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    values: HashMap<String, i64>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, value: i64) -> Result<()> {
        match self.values.get(name) {
            Some(&old) if old == value => Ok(()),
            Some(&old) => Err(AsmError::DuplicateSymbol {
                name: name.to_string(),
                old,
                new: value,
            }),
            None => {
                self.values.insert(name.to_string(), value);
                self.order.push(name.to_string());
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Symbols in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.values[name]))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, i64)> for SymbolTable {
    /// Collect definitions; the first value given for a name is kept
    fn from_iter<I: IntoIterator<Item = (&'a str, i64)>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        for (name, value) in iter {
            if !table.contains(name) {
                table.values.insert(name.to_string(), value);
                table.order.push(name.to_string());
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_is_write_once() {
        let mut symbols = SymbolTable::new();
        symbols.define("vAC", 0x18).unwrap();
        symbols.define("vAC", 0x18).unwrap();
        assert_eq!(
            symbols.define("vAC", 0x19),
            Err(AsmError::DuplicateSymbol {
                name: "vAC".to_string(),
                old: 0x18,
                new: 0x19
            })
        );
        assert_eq!(symbols.get("vAC"), Some(0x18));
    }

    #[test]
    fn test_iter_keeps_definition_order() {
        let mut symbols = SymbolTable::new();
        symbols.define("b", 2).unwrap();
        symbols.define("a", 1).unwrap();
        let names: Vec<_> = symbols.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(symbols.len(), 2);
        assert!(!symbols.contains("c"));
    }

    #[test]
    fn test_collect_keeps_first_definition() {
        let table: SymbolTable = [("vAC", 0x18), ("vPC", 0x16), ("vAC", 0x99)]
            .into_iter()
            .collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("vAC"), Some(0x18));
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![("vAC", 0x18), ("vPC", 0x16)]
        );
    }
}

//! name -> (value, defined-flag, definition-line, owning-section-index).

use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Symbol {
    pub value: u32,
    pub defined: bool,
    pub definition_line: u32,
    pub section: Option<usize>,
}

#[derive(Default, Debug)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DefineOutcome {
    /// First definition, or a pass-2 redefinition with a different value
    /// than the one recorded in pass 1 (legal: the table keeps the pass-2
    /// value).
    Accepted,
    /// Redefinition within the same pass to a different value.
    ConflictingRedefinition { previous_value: u32 },
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Pass-1 forward reference: records a placeholder (value 0,
    /// `defined=false`) if the name is not already known, so that
    /// addressing-mode classification downstream doesn't cascade.
    pub fn reference_forward(&mut self, name: &str) {
        self.symbols.entry(name.to_string()).or_insert(Symbol {
            value: 0,
            defined: false,
            definition_line: 0,
            section: None,
        });
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Define or redefine `name`. Within a single pass, redefining to a
    /// different value is a conflict the caller should diagnose; across
    /// passes (the table is reset between passes by `clear_definitions`)
    /// this always succeeds.
    pub fn define(
        &mut self,
        name: &str,
        value: u32,
        line: u32,
        section: Option<usize>,
    ) -> DefineOutcome {
        match self.symbols.get(name) {
            Some(existing) if existing.defined && existing.value != value => {
                let previous_value = existing.value;
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        value,
                        defined: true,
                        definition_line: line,
                        section,
                    },
                );
                DefineOutcome::ConflictingRedefinition { previous_value }
            }
            _ => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        value,
                        defined: true,
                        definition_line: line,
                        section,
                    },
                );
                DefineOutcome::Accepted
            }
        }
    }

    /// Between pass 1 and pass 2, values are allowed to change (section
    /// linking moves them); only the "different value within one pass" case
    /// is ever a conflict. Call this once pass 1 finishes so pass 2's
    /// `define` calls compare against pass-1 values without re-triggering
    /// the same-pass conflict check across passes.
    pub fn begin_new_pass(&mut self) {
        for symbol in self.symbols.values_mut() {
            symbol.defined = false;
        }
    }

    /// Apply a section relocation delta to every symbol owned by that
    /// section (used after section linking moves a section's origin).
    pub fn relocate_section(&mut self, section: usize, delta: i64) {
        for symbol in self.symbols.values_mut() {
            if symbol.section == Some(section) {
                symbol.value = (symbol.value as i64 + delta) as u32;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.symbols.iter()
    }
}

/// `R0..R63` map to the aligned direct-page slots `0, 4, 8, ..., 252`.
pub fn register_alias_lookup(name: &str) -> Option<u32> {
    let upper = name.to_uppercase();
    let digits = upper.strip_prefix('R')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = digits.parse().ok()?;
    isa::register::register_alias_value(n)
}

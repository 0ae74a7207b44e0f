//! RV32 general-purpose register file

use super::{RegisterLookup, UndefinedRegister, Word};

/// ABI names indexed by register number
pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", // x0 - x7
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", // x8 - x15
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", // x16 - x23
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6", // x24 - x31
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    gpr: [Word; 32],
    pc: Word,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a register name to its index, or `None` for `pc`/unknown names.
    ///
    /// Accepts ABI names, `x0`..`x31`, and the aliases `0` and `fp`.
    pub fn index_of(name: &str) -> Option<usize> {
        match name {
            "0" => return Some(0),
            "fp" => return Some(8),
            _ => {}
        }

        if let Some(idx) = ABI_NAMES.iter().position(|n| *n == name) {
            return Some(idx);
        }

        let num = name.strip_prefix('x')?;
        // Reject forms like "x01" so every register has one spelling
        if num.len() > 1 && num.starts_with('0') {
            return None;
        }
        num.parse::<usize>().ok().filter(|idx| *idx < 32)
    }

    /// Write a general-purpose register. Writes to `x0` are dropped.
    pub fn set_gpr(&mut self, idx: usize, value: Word) {
        if idx != 0 {
            self.gpr[idx] = value;
        }
    }

    pub fn set_pc(&mut self, value: Word) {
        self.pc = value;
    }

    /// Write a register by name.
    pub fn set(&mut self, name: &str, value: Word) -> Result<(), UndefinedRegister> {
        if name == "pc" {
            self.pc = value;
            return Ok(());
        }
        let idx = Self::index_of(name).ok_or_else(|| UndefinedRegister {
            name: name.to_string(),
        })?;
        self.set_gpr(idx, value);
        Ok(())
    }

    /// All registers in display order: `x0`..`x31` by ABI name, then `pc`.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Word)> + '_ {
        ABI_NAMES
            .iter()
            .copied()
            .zip(self.gpr.iter().copied())
            .chain(std::iter::once(("pc", self.pc)))
    }
}

impl RegisterLookup for RegisterFile {
    fn lookup(&self, name: &str) -> Result<Word, UndefinedRegister> {
        if name == "pc" {
            return Ok(self.pc);
        }
        Self::index_of(name)
            .map(|idx| self.gpr[idx])
            .ok_or_else(|| UndefinedRegister {
                name: name.to_string(),
            })
    }
}

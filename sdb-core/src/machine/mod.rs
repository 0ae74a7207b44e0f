//! Simulated machine capabilities
//!
//! The evaluator never touches the simulator directly. It goes through
//! [`RegisterLookup`] and [`MemoryReader`], which the ISA layer and the
//! memory subsystem implement. A reference RV32 register file and a flat
//! physical memory are provided for the dispatcher and for tests.

mod memory;
mod registers;

use thiserror::Error;

pub use memory::Memory;
pub use registers::RegisterFile;

/// Machine word of the simulated ISA (RV32).
pub type Word = u32;

/// Width in bytes of a dereference read.
pub const DEREF_WIDTH: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Undefined register: '{name}'")]
pub struct UndefinedRegister {
    pub name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Address 0x{address:08x} (width {width}) is outside physical memory")]
pub struct BadAddress {
    pub address: Word,
    pub width: usize,
}

/// Register-value lookup supplied by the ISA layer
pub trait RegisterLookup {
    /// Resolve a register by name (without the `$` sigil).
    fn lookup(&self, name: &str) -> Result<Word, UndefinedRegister>;
}

/// Memory read supplied by the simulated memory subsystem
pub trait MemoryReader {
    fn read(&self, address: Word, width: usize) -> Result<Word, BadAddress>;
}

impl<T: RegisterLookup + ?Sized> RegisterLookup for &T {
    fn lookup(&self, name: &str) -> Result<Word, UndefinedRegister> {
        (**self).lookup(name)
    }
}

impl<T: MemoryReader + ?Sized> MemoryReader for &T {
    fn read(&self, address: Word, width: usize) -> Result<Word, BadAddress> {
        (**self).read(address, width)
    }
}

/// Register file and memory of one simulated hart
#[derive(Debug, Clone)]
pub struct Machine {
    pub registers: RegisterFile,
    pub memory: Memory,
}

impl Machine {
    pub fn new(memory_base: Word, memory_size: usize) -> Self {
        let mut registers = RegisterFile::new();
        registers.set_pc(memory_base);
        Self {
            registers,
            memory: Memory::new(memory_base, memory_size),
        }
    }
}

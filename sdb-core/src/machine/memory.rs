//! Flat little-endian physical memory

use super::{BadAddress, MemoryReader, Word};

#[derive(Debug, Clone)]
pub struct Memory {
    base: Word,
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(base: Word, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0; size],
        }
    }

    pub fn base(&self) -> Word {
        self.base
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Byte offset of `[address, address + width)`, if fully inside memory.
    fn offset(&self, address: Word, width: usize) -> Result<usize, BadAddress> {
        let bad = BadAddress { address, width };
        let offset = address.checked_sub(self.base).ok_or(bad.clone())? as usize;
        match offset.checked_add(width) {
            Some(end) if end <= self.bytes.len() => Ok(offset),
            _ => Err(bad),
        }
    }

    pub fn write(&mut self, address: Word, width: usize, value: Word) -> Result<(), BadAddress> {
        if !matches!(width, 1 | 2 | 4) {
            return Err(BadAddress { address, width });
        }
        let offset = self.offset(address, width)?;
        let le = value.to_le_bytes();
        self.bytes[offset..offset + width].copy_from_slice(&le[..width]);
        Ok(())
    }

    /// Copy raw bytes (e.g. a program image) into memory.
    pub fn load(&mut self, address: Word, data: &[u8]) -> Result<(), BadAddress> {
        let offset = self.offset(address, data.len())?;
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl MemoryReader for Memory {
    fn read(&self, address: Word, width: usize) -> Result<Word, BadAddress> {
        if !matches!(width, 1 | 2 | 4) {
            return Err(BadAddress { address, width });
        }
        let offset = self.offset(address, width)?;
        let mut le = [0u8; 4];
        le[..width].copy_from_slice(&self.bytes[offset..offset + width]);
        Ok(Word::from_le_bytes(le))
    }
}

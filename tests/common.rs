#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use std::ops::Range;

/// Byte addressable EEPROM: writes only clear bits, erases reset single bytes to 0xFF.
#[derive(Default)]
pub struct Eeprom {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
    /// Writes to these addresses are recorded but leave the cell unchanged.
    pub stuck: Vec<usize>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
    Erase { offset: u32, len: usize },
}

impl Eeprom {
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0xffu8; size],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn new_with_fault(size: usize, fail_after_operation: usize) -> Self {
        Self {
            buf: vec![0xffu8; size],
            fail_after_operation,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    pub fn erases(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Erase { .. }))
            .count()
    }

    pub fn writes(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    /// Number of erase operations starting at an address in `range`.
    pub fn erases_in(&self, range: Range<usize>) -> usize {
        self.operations
            .iter()
            .filter(|op| match op {
                Operation::Erase { offset, .. } => range.contains(&(*offset as usize)),
                _ => false,
            })
            .count()
    }

    /// Number of write operations that touched an address in `range`.
    pub fn writes_in(&self, range: Range<usize>) -> usize {
        self.operations
            .iter()
            .filter(|op| match op {
                Operation::Write { offset, .. } => range.contains(&(*offset as usize)),
                _ => false,
            })
            .count()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }

    fn record(&mut self, operation: Operation) -> Result<(), EepromError> {
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(operation);
        Ok(())
    }
}

#[derive(Debug)]
pub struct EepromError;

impl NorFlashError for EepromError {
    fn kind(&self) -> NorFlashErrorKind {
        NorFlashErrorKind::Other
    }
}

impl ErrorType for Eeprom {
    type Error = EepromError;
}

impl ReadNorFlash for Eeprom {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: read:  0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        self.record(Operation::Read {
            offset,
            len: bytes.len(),
        })?;

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl NorFlash for Eeprom {
    const WRITE_SIZE: usize = 1;

    const ERASE_SIZE: usize = 1;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        println!(
            "    eeprom: erase: {from:04X} - {to:04X} #{:>2}",
            self.operations.len()
        );
        assert!(from < to);
        assert!(to as usize <= self.buf.len());

        self.record(Operation::Erase {
            offset: from,
            len: (to - from) as usize,
        })?;

        for addr in from..to {
            self.buf[addr as usize] = 0xff;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        assert!(bytes.len() > 0);

        self.record(Operation::Write {
            offset,
            len: bytes.len(),
        })?;

        let offset = offset as usize;
        for (i, &val) in bytes.iter().enumerate() {
            if self.stuck.contains(&(offset + i)) {
                continue;
            }
            // programming can only flip bits from 1 to 0
            self.buf[offset + i] &= val;
        }
        Ok(())
    }
}

/// A sector erased flash, only used to check that it is rejected.
pub struct SectorFlash;

impl ErrorType for SectorFlash {
    type Error = EepromError;
}

impl ReadNorFlash for SectorFlash {
    const READ_SIZE: usize = 4;

    fn read(&mut self, _offset: u32, _bytes: &mut [u8]) -> Result<(), Self::Error> {
        unreachable!()
    }

    fn capacity(&self) -> usize {
        4096 * 2
    }
}

impl NorFlash for SectorFlash {
    const WRITE_SIZE: usize = 4;

    const ERASE_SIZE: usize = 4096;

    fn erase(&mut self, _from: u32, _to: u32) -> Result<(), Self::Error> {
        unreachable!()
    }

    fn write(&mut self, _offset: u32, _bytes: &[u8]) -> Result<(), Self::Error> {
        unreachable!()
    }
}

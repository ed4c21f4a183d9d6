use crate::error::Error;
use core::ops::Range;
#[cfg(feature = "defmt")]
use defmt::trace;
use embedded_storage::nor_flash::NorFlash;

/// Any byte granular device whose `write` only clears bits (the new cell value is the old value
/// ANDed with the written byte) and whose `erase` resets single bytes to 0xFF. This is how AVR
/// style EEPROMs behave when programming in "write only" and "erase only" mode.
///
/// `READ_SIZE`, `WRITE_SIZE` and `ERASE_SIZE` must all be 1, see [`check_granularity`].
pub trait Platform: NorFlash {}

impl<T: NorFlash> Platform for T {}

pub(crate) fn check_granularity<T: Platform>() -> Result<(), Error> {
    if T::READ_SIZE != 1 || T::WRITE_SIZE != 1 || T::ERASE_SIZE != 1 {
        return Err(Error::UnsupportedGranularity);
    }
    Ok(())
}

/// Byte level primitives on top of the flash traits.
pub trait ByteOps: Platform {
    fn read_byte(&mut self, address: usize) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.read(address as _, &mut buf)
            .map_err(|_| Error::FlashError)?;
        Ok(buf[0])
    }

    /// Programs every bit that is 0 in `byte_with_zeros` to 0 without an erase, bits that are 1
    /// stay untouched. The byte is read back after each attempt. Returns `false` if any of the
    /// requested bits still reads as 1 after `attempts` tries.
    fn program_zero_bits(
        &mut self,
        address: usize,
        byte_with_zeros: u8,
        attempts: u8,
    ) -> Result<bool, Error> {
        let mut remaining = attempts.max(1);
        loop {
            #[cfg(feature = "defmt")]
            trace!("program_zero_bits: @{:#06x} {:#010b}", address, byte_with_zeros);

            #[cfg(feature = "debug-logs")]
            println!("  platform: program_zero_bits @{address:#06x} {byte_with_zeros:#010b}");

            self.write(address as _, &[byte_with_zeros])
                .map_err(|_| Error::FlashError)?;
            remaining -= 1;

            let current = self.read_byte(address)?;
            if current & !byte_with_zeros == 0 {
                return Ok(true);
            }
            if remaining == 0 {
                return Ok(false);
            }
        }
    }

    /// Resets all bytes in `range` to 0xFF. Bytes that already read as 0xFF are not erased again,
    /// neighbouring dirty bytes share a single erase operation.
    fn erase_bytes(&mut self, range: Range<usize>) -> Result<(), Error> {
        let mut dirty_from = None;
        for address in range.clone() {
            let dirty = self.read_byte(address)? != 0xFF;
            match (dirty, dirty_from) {
                (true, None) => dirty_from = Some(address),
                (false, Some(from)) => {
                    erase_range(self, from..address)?;
                    dirty_from = None;
                }
                _ => {}
            }
        }
        if let Some(from) = dirty_from {
            erase_range(self, from..range.end)?;
        }
        Ok(())
    }

    /// Writes `bytes` to `address` the way an EEPROM update does: bytes that already hold their
    /// value are skipped, bytes that need a bit to go from 0 to 1 are erased before programming.
    fn update_bytes(&mut self, address: usize, bytes: &[u8]) -> Result<(), Error> {
        for (address, &value) in (address..).zip(bytes) {
            let current = self.read_byte(address)?;
            if current == value {
                continue;
            }
            if current & value != value {
                erase_range(self, address..address + 1)?;
            }
            self.write(address as _, &[value])
                .map_err(|_| Error::FlashError)?;
        }
        Ok(())
    }
}

impl<T: Platform> ByteOps for T {}

fn erase_range<T: Platform + ?Sized>(hal: &mut T, range: Range<usize>) -> Result<(), Error> {
    #[cfg(feature = "defmt")]
    trace!("erase: {:#06x} - {:#06x}", range.start, range.end);

    #[cfg(feature = "debug-logs")]
    println!("  platform: erase {:#06x} - {:#06x}", range.start, range.end);

    hal.erase(range.start as _, range.end as _)
        .map_err(|_| Error::FlashError)
}

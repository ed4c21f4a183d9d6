//! Control bits mark which data bytes of a slot were written since its last erase. There is one
//! bit per data byte, MSB first and in address order. A 1 bit is free, a 0 bit is committed.

use crate::error::Error;
use crate::layout::{Slot, VERSION_ADDRESS};
use crate::platform::{ByteOps, Platform};
use crate::{PROGRAM_ATTEMPTS, WearLevel};
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

impl<T: Platform> WearLevel<T> {
    /// Checks the layout version and restores the write position of every slot.
    ///
    /// A changed version erases the control bytes of all slots before the new version is
    /// written, so an interrupted reset is simply repeated on the next start.
    pub(crate) fn load_slots(&mut self) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("load_slots");

        #[cfg(feature = "debug-logs")]
        println!("internal: load_slots");

        let previous_version = self.hal.read_byte(VERSION_ADDRESS)?;
        if previous_version != self.layout_version {
            #[cfg(feature = "defmt")]
            trace!(
                "layout version changed: {} -> {}",
                previous_version, self.layout_version
            );

            #[cfg(feature = "debug-logs")]
            println!(
                "internal: layout version changed: {previous_version} -> {}",
                self.layout_version
            );

            for slot in &self.slots {
                self.hal.erase_bytes(slot.control_range())?;
            }
            self.hal
                .update_bytes(VERSION_ADDRESS, &[self.layout_version])?;
        }

        for slot in self.slots.iter_mut() {
            slot.recover(&mut self.hal)?;
        }

        Ok(())
    }
}

impl Slot {
    /// Restores `last_written` from the control bytes.
    pub(crate) fn recover<T: Platform>(&mut self, hal: &mut T) -> Result<(), Error> {
        let boundary = self.find_boundary_byte(hal)?;
        let byte = hal.read_byte(boundary)?;
        let committed = (boundary - self.control_start) * 8 + byte.leading_zeros() as usize;

        if committed > self.max_data_length() {
            // more bits are committed than there are data bytes, which no sequence of writes
            // can produce. Start over with an empty slot.
            #[cfg(feature = "defmt")]
            warn!(
                "recover: @{:#06x}: {} bits committed, capacity {}",
                self.control_start,
                committed,
                self.max_data_length()
            );

            #[cfg(feature = "debug-logs")]
            println!(
                "internal: recover @{:#06x}: {committed} bits committed, capacity {}, erasing",
                self.control_start,
                self.max_data_length()
            );

            hal.erase_bytes(self.control_range())?;
            self.last_written = None;
            return Ok(());
        }

        self.last_written = committed.checked_sub(1).map(|n| self.data_start() + n);

        #[cfg(feature = "defmt")]
        trace!(
            "recover: @{:#06x}: boundary {:#06x}, committed {}",
            self.control_start, boundary, committed
        );

        #[cfg(feature = "debug-logs")]
        println!(
            "internal: recover @{:#06x}: boundary {boundary:#06x}, committed {committed}",
            self.control_start
        );

        Ok(())
    }

    /// Returns the address of the control byte holding the first free bit. That is the first
    /// byte that is not 0x00, or the last control byte if all are 0x00.
    ///
    /// A binary search looks for a byte that is neither 0x00 nor 0xFF. If the boundary falls
    /// exactly between two bytes the search ends on one side of it and a linear scan walks
    /// over the remaining 0x00 or 0xFF bytes.
    fn find_boundary_byte<T: Platform>(&self, hal: &mut T) -> Result<usize, Error> {
        let range = self.control_range();

        let mut lower = range.start;
        let mut upper = range.end;
        let mut address = range.start;
        let mut byte = 0xFF;
        while lower < upper {
            address = lower + (upper - lower) / 2;
            byte = hal.read_byte(address)?;
            match byte {
                0x00 => lower = address + 1,
                0xFF => upper = address,
                _ => return Ok(address),
            }
        }

        if byte == 0x00 {
            // boundary is above
            while byte == 0x00 && address + 1 < range.end {
                address += 1;
                byte = hal.read_byte(address)?;
            }
            Ok(address)
        } else {
            // boundary is below, find the last byte which is not free
            while byte == 0xFF && address > range.start {
                address -= 1;
                byte = hal.read_byte(address)?;
            }
            match byte {
                // the next one is the first free byte
                0x00 => Ok(address + 1),
                _ => Ok(address),
            }
        }
    }

    /// Commits `length` data bytes written at `address` by clearing their control bits. Bits are
    /// grouped per control byte so every touched control byte is programmed once.
    ///
    /// All control bytes are attempted even if one fails to verify, the first failure is
    /// returned.
    pub(crate) fn commit<T: Platform>(
        &mut self,
        hal: &mut T,
        address: usize,
        length: usize,
    ) -> Result<(), Error> {
        self.last_written = Some(address + length - 1);

        let first_bit = address - self.data_start();
        let end_bit = first_bit + length;

        let mut result = Ok(());
        let mut bit = first_bit;
        while bit < end_bit {
            let control_byte = bit / 8;
            let byte_end_bit = ((control_byte + 1) * 8).min(end_bit);

            let byte_with_zeros = (bit..byte_end_bit)
                .fold(0xFFu8, |acc, position| acc & !(0x80 >> (position % 8)));
            let control_address = self.control_start + control_byte;

            if !hal.program_zero_bits(control_address, byte_with_zeros, PROGRAM_ATTEMPTS)?
                && result.is_ok()
            {
                #[cfg(feature = "defmt")]
                warn!("commit: @{:#06x} did not verify", control_address);

                #[cfg(feature = "debug-logs")]
                println!("internal: commit @{control_address:#06x} did not verify");

                result = Err(Error::VerifyFailed {
                    address: control_address,
                });
            }

            bit = byte_end_bit;
        }

        result
    }
}

use crate::error::Error;
use crate::layout::Slot;
use crate::platform::{ByteOps, Platform};
use crate::{WearLevel, WriteMode, WriteOutcome};
#[cfg(feature = "defmt")]
use defmt::trace;

/// Where the next value of a slot goes.
#[derive(Debug, PartialEq)]
pub(crate) enum Placement {
    At(usize),
    /// The value equals the current one, nothing has to be written.
    Skip,
}

impl<T: Platform> WearLevel<T> {
    pub(crate) fn write_slot(
        &mut self,
        index: usize,
        bytes: &[u8],
        mode: WriteMode,
    ) -> Result<WriteOutcome, Error> {
        #[cfg(feature = "debug-logs")]
        println!("internal: write_slot {index}: {} bytes, {mode:?}", bytes.len());

        let slots = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::SlotOutOfRange { slot: index, slots })?;

        if bytes.is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let address = match slot.place(&mut self.hal, bytes, mode)? {
            Placement::At(address) => address,
            Placement::Skip => return Ok(WriteOutcome::Skipped),
        };

        self.hal.update_bytes(address, bytes)?;
        slot.commit(&mut self.hal, address, bytes.len())?;

        Ok(WriteOutcome::Written { address })
    }
}

impl Slot {
    /// Finds the address for the next `bytes.len()` bytes. Erases the control bytes if the value
    /// does not fit behind the current one anymore.
    pub(crate) fn place<T: Platform>(
        &mut self,
        hal: &mut T,
        bytes: &[u8],
        mode: WriteMode,
    ) -> Result<Placement, Error> {
        let length = bytes.len();
        let max = self.max_data_length();
        if length > max {
            #[cfg(feature = "debug-logs")]
            println!("internal: place: value too long, max: {max}, is: {length}");

            return Err(Error::ValueTooLong { length, max });
        }

        // without data the previous end is the byte before the data region
        let previous_end = self.last_written.unwrap_or(self.data_start() - 1);

        if mode == WriteMode::Update
            && self.used() >= length
            && self.holds(hal, previous_end + 1 - length, bytes)?
        {
            #[cfg(feature = "defmt")]
            trace!("place: @{:#06x}: value unchanged", self.control_start);

            #[cfg(feature = "debug-logs")]
            println!("internal: place: value is equal, do not write it");

            return Ok(Placement::Skip);
        }

        let candidate = previous_end + 1;
        if candidate + length > self.end {
            #[cfg(feature = "defmt")]
            trace!("place: @{:#06x}: all used, start again", self.control_start);

            #[cfg(feature = "debug-logs")]
            println!("internal: place: all used, start again");

            hal.erase_bytes(self.control_range())?;
            self.last_written = None;
            return Ok(Placement::At(self.data_start()));
        }

        Ok(Placement::At(candidate))
    }

    fn holds<T: Platform>(&self, hal: &mut T, address: usize, bytes: &[u8]) -> Result<bool, Error> {
        for (address, &expected) in (address..).zip(bytes) {
            if hal.read_byte(address)? != expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

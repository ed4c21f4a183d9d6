#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

mod control;
pub mod error;
mod get;
mod layout;
mod placement;
pub mod platform;
mod set;

pub use get::Get;
pub use layout::Layout;
pub use set::Set;

extern crate alloc;

use crate::error::Error;
use crate::layout::Slot;
use crate::platform::{ByteOps, Platform, check_granularity};
use alloc::vec::Vec;

/// How often a control byte is programmed before a write is reported as not verified.
pub(crate) const PROGRAM_ATTEMPTS: u8 = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteMode {
    /// Compare with the current value first and skip the write if it is unchanged.
    Update,
    /// Always write to the next position.
    Always,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteOutcome {
    /// The value was written, `address` is its first byte on the device.
    Written { address: usize },
    /// Nothing was written, either because the value did not change or because it was empty.
    Skipped,
}

#[derive(strum::Display, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// Nothing written since the last erase of the slot.
    Empty,
    PartiallyFilled,
    /// The last write ended on the last data byte, the next one erases the control bytes.
    Full,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotStatus {
    pub index: usize,
    pub control_start: usize,
    pub control_bytes: usize,
    pub data_start: usize,
    /// First address behind the slot.
    pub end: usize,
    pub last_written: Option<usize>,
    pub state: SlotState,
}

/// Spreads the writes of a fixed number of slots over the device. Every write of a slot goes
/// behind the previous one until the slot is used up, only then the slot's control bytes are
/// erased and writing starts over at the beginning.
///
/// All state lives in this struct, there is no locking. Wrap it in a mutex if the device is
/// shared between execution contexts.
pub struct WearLevel<T: Platform> {
    pub(crate) hal: T,
    pub(crate) layout_version: u8,
    pub(crate) faulted: bool,
    pub(crate) slots: Vec<Slot>,
}

impl<T: Platform> WearLevel<T> {
    /// Computes the layout and restores the current position of every slot from the device.
    ///
    /// Increment `layout_version` whenever the layout changes. A version that differs from the
    /// one stored in the first byte of the device resets all slots.
    pub fn new(hal: T, layout_version: u8, layout: Layout<'_>) -> Result<WearLevel<T>, Error> {
        check_granularity::<T>()?;

        let slots = layout.slots(hal.capacity())?;

        let mut wear_level = Self {
            hal,
            layout_version,
            faulted: false,
            slots,
        };

        wear_level.load_slots()?;

        Ok(wear_level)
    }

    /// Number of slots in the layout.
    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    pub fn layout_version(&self) -> u8 {
        self.layout_version
    }

    /// The maximum length of a single value in this slot. Values longer than half of it can't be
    /// wear leveled as every write needs an erase.
    pub fn max_data_length(&self, slot: usize) -> Result<usize, Error> {
        Ok(self.slot(slot)?.max_data_length())
    }

    /// Reads the last written value of the slot into `buf`. The value ends at the last written
    /// byte, so a `buf` longer than the last write also returns the bytes in front of it.
    ///
    /// Returns `false` and leaves `buf` untouched if nothing was written yet or if the data
    /// region in front of the last written byte is shorter than `buf`.
    pub fn read_bytes(&mut self, slot: usize, buf: &mut [u8]) -> Result<bool, Error> {
        if self.faulted {
            return Err(Error::FlashError);
        }

        let current = self.slot(slot)?;
        let max = current.max_data_length();
        if buf.len() > max {
            return Err(Error::ValueTooLong {
                length: buf.len(),
                max,
            });
        }

        let data_start = current.data_start();
        let Some(first) = current
            .last_written
            .and_then(|last| (last + 1).checked_sub(buf.len()))
            .filter(|&first| first >= data_start)
        else {
            #[cfg(feature = "debug-logs")]
            println!("wear_level: read_bytes {slot}: no data");

            return Ok(false);
        };

        for (address, byte) in (first..).zip(buf.iter_mut()) {
            match self.hal.read_byte(address) {
                Ok(value) => *byte = value,
                Err(e) => {
                    self.faulted = true;
                    return Err(e);
                }
            }
        }

        Ok(true)
    }

    /// Writes a value to the slot.
    ///
    /// With [`WriteMode::Update`] the value is compared with the current one first and not
    /// written again if equal.
    pub fn write_bytes(
        &mut self,
        slot: usize,
        bytes: &[u8],
        mode: WriteMode,
    ) -> Result<WriteOutcome, Error> {
        if self.faulted {
            return Err(Error::FlashError);
        }

        match self.write_slot(slot, bytes, mode) {
            Ok(outcome) => Ok(outcome),
            Err(Error::FlashError) => {
                self.faulted = true;
                Err(Error::FlashError)
            }
            Err(e) => Err(e),
        }
    }

    /// Get the value of a slot. `None` if nothing was written yet.
    ///
    /// Supported types are bool, signed and unsigned integers up to 64-bit width, f32, f64 and
    /// byte arrays.
    pub fn get<R>(&mut self, slot: usize) -> Result<Option<R>, Error>
    where
        WearLevel<T>: Get<R>,
    {
        Get::get(self, slot)
    }

    /// Writes a value unless it equals the current one.
    pub fn put<R>(&mut self, slot: usize, value: R) -> Result<WriteOutcome, Error>
    where
        WearLevel<T>: Set<R>,
    {
        Set::set(self, slot, value, WriteMode::Update)
    }

    /// Writes a value to the next position no matter what was written before.
    pub fn put_always<R>(&mut self, slot: usize, value: R) -> Result<WriteOutcome, Error>
    where
        WearLevel<T>: Set<R>,
    {
        Set::set(self, slot, value, WriteMode::Always)
    }

    /// First data address of the slot. Together with [`Self::ring_current`] this allows using a
    /// slot as ring buffer of fixed size records through [`Self::device_mut`].
    pub fn ring_start(&self, slot: usize) -> Result<usize, Error> {
        Ok(self.slot(slot)?.data_start())
    }

    /// Address of the current record of `record_length` bytes, `None` if nothing was written
    /// yet.
    pub fn ring_current(&self, slot: usize, record_length: usize) -> Result<Option<usize>, Error> {
        Ok(self
            .slot(slot)?
            .last_written
            .and_then(|last| (last + 1).checked_sub(record_length)))
    }

    /// Returns the layout and fill state of every slot.
    pub fn status(&self) -> Vec<SlotStatus> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotStatus {
                index,
                control_start: slot.control_start,
                control_bytes: slot.control_bytes,
                data_start: slot.data_start(),
                end: slot.end,
                last_written: slot.last_written,
                state: match slot.last_written {
                    None => SlotState::Empty,
                    Some(last) if last + 1 == slot.end => SlotState::Full,
                    Some(_) => SlotState::PartiallyFilled,
                },
            })
            .collect()
    }

    /// Direct access to the device. Writing to slot regions behind the back of this struct
    /// is only consistent if it follows the control bytes.
    pub fn device_mut(&mut self) -> &mut T {
        &mut self.hal
    }

    /// Gives the device back.
    pub fn release(self) -> T {
        self.hal
    }

    fn slot(&self, index: usize) -> Result<&Slot, Error> {
        self.slots.get(index).ok_or(Error::SlotOutOfRange {
            slot: index,
            slots: self.slots.len(),
        })
    }
}

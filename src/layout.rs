use crate::error::Error;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

/// Address of the byte holding the layout version.
pub(crate) const VERSION_ADDRESS: usize = 0;

/// Slots start right after the version byte.
const FIRST_SLOT_ADDRESS: usize = VERSION_ADDRESS + 1;

/// Describes how the device is split into slots. Every slot length includes its control bytes,
/// use [`crate::WearLevel::max_data_length`] to get the usable length.
///
/// The layout is not persisted. Pass the same layout on every start or increment the layout
/// version, which erases all slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout<'a> {
    /// Divides `length` bytes into `slots` equally sized slots, the remainder stays unused.
    /// Without `length` the whole device behind the version byte is used.
    Uniform { slots: usize, length: Option<usize> },

    /// One length per slot.
    Explicit(&'a [usize]),
}

impl<'a> Layout<'a> {
    pub const fn uniform(slots: usize) -> Self {
        Self::Uniform {
            slots,
            length: None,
        }
    }

    pub const fn uniform_with_length(slots: usize, length: usize) -> Self {
        Self::Uniform {
            slots,
            length: Some(length),
        }
    }

    pub const fn explicit(lengths: &'a [usize]) -> Self {
        Self::Explicit(lengths)
    }

    /// Computes the address range of every slot for a device with `capacity` bytes.
    pub(crate) fn slots(&self, capacity: usize) -> Result<Vec<Slot>, Error> {
        let usable = capacity
            .checked_sub(FIRST_SLOT_ADDRESS)
            .ok_or(Error::InvalidLayout)?;

        let lengths = match *self {
            Layout::Uniform { slots, length } => {
                if slots == 0 {
                    return Err(Error::InvalidLayout);
                }
                vec![length.unwrap_or(usable) / slots; slots]
            }
            Layout::Explicit(lengths) => lengths.to_vec(),
        };

        // every slot needs room for at least one data byte behind its control bytes
        if lengths.is_empty()
            || lengths
                .iter()
                .any(|&length| length <= control_bytes_count(length))
        {
            return Err(Error::InvalidLayout);
        }

        let total = lengths
            .iter()
            .try_fold(0usize, |acc, &length| acc.checked_add(length))
            .ok_or(Error::InvalidLayout)?;
        if total > usable {
            return Err(Error::InvalidLayout);
        }

        let mut control_start = FIRST_SLOT_ADDRESS;
        Ok(lengths
            .into_iter()
            .map(|length| {
                let slot = Slot::new(control_start, control_start + length);
                control_start += length;
                slot
            })
            .collect())
    }
}

/// Every byte of data costs 8 bits for the data plus 1 control bit, 9 bits in total.
///
/// - 9 bytes: 1 control byte, 8 data bytes
/// - 17 bytes: 2 control bytes (1 bit unused), 15 data bytes
/// - 79 bytes: 9 control bytes (2 bits unused), 70 data bytes
pub(crate) const fn control_bytes_count(slot_length: usize) -> usize {
    slot_length.div_ceil(9)
}

#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "debug-logs", derive(Debug))]
pub(crate) struct Slot {
    pub(crate) control_start: usize,
    pub(crate) control_bytes: usize,
    /// First address of the next slot. For the last slot this is the end of the used region.
    pub(crate) end: usize,
    /// Last byte of the most recent write. `None` if nothing was written since the last erase.
    pub(crate) last_written: Option<usize>,
}

impl Slot {
    pub(crate) fn new(control_start: usize, end: usize) -> Self {
        Self {
            control_start,
            control_bytes: control_bytes_count(end - control_start),
            end,
            last_written: None,
        }
    }

    pub(crate) fn data_start(&self) -> usize {
        self.control_start + self.control_bytes
    }

    pub(crate) fn max_data_length(&self) -> usize {
        self.end - self.data_start()
    }

    pub(crate) fn control_range(&self) -> Range<usize> {
        self.control_start..self.data_start()
    }

    /// Number of data bytes written in the current erase generation.
    pub(crate) fn used(&self) -> usize {
        self.last_written
            .map_or(0, |last| last + 1 - self.data_start())
    }
}

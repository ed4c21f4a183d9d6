use thiserror::Error;

/// Errors that can occur during wear leveling operations. Marked as non-exhaustive to allow for
/// future additions without breaking the API. A caller would likely only need to handle
/// SlotOutOfRange and ValueTooLong as the other errors are static for a given device and layout.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The layout has no slots, a slot without any space or does not fit into the device.
    #[error("invalid layout")]
    InvalidLayout,

    /// Read, write and erase granularity of the device all have to be a single byte.
    #[error("unsupported device granularity")]
    UnsupportedGranularity,

    /// The internal error value is returned from the provided device
    #[error("internal flash error")]
    FlashError,

    /// The slot index is not part of the layout passed to `WearLevel::new`
    #[error("slot {slot} out of range, layout has {slots} slots")]
    SlotOutOfRange { slot: usize, slots: usize },

    /// The value does not fit into the data region of the slot. Nothing was written.
    #[error("value too long: {length} bytes, max {max}")]
    ValueTooLong { length: usize, max: usize },

    /// A control byte did not read back as programmed after all retries. The data itself was
    /// written, but the write might not be found again after a restart.
    #[error("verification failed at {address:#06x}")]
    VerifyFailed { address: usize },
}

use crate::error::Error;
use crate::platform::Platform;
use crate::{WearLevel, WriteMode, WriteOutcome};

pub trait Set<T> {
    fn set(&mut self, slot: usize, value: T, mode: WriteMode) -> Result<WriteOutcome, Error>;
}

impl<T, S: Set<T>> Set<T> for &mut S {
    fn set(&mut self, slot: usize, value: T, mode: WriteMode) -> Result<WriteOutcome, Error> {
        (*self).set(slot, value, mode)
    }
}

macro_rules! impl_set_le_bytes {
    ($($type:ty),*) => {
        $(
            impl<T: Platform> Set<$type> for WearLevel<T> {
                fn set(
                    &mut self,
                    slot: usize,
                    value: $type,
                    mode: WriteMode,
                ) -> Result<WriteOutcome, Error> {
                    self.write_bytes(slot, &value.to_le_bytes(), mode)
                }
            }
        )*
    };
}

impl_set_le_bytes!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<T: Platform> Set<bool> for WearLevel<T> {
    fn set(&mut self, slot: usize, value: bool, mode: WriteMode) -> Result<WriteOutcome, Error> {
        self.write_bytes(slot, &[value as u8], mode)
    }
}

impl<T: Platform, const N: usize> Set<[u8; N]> for WearLevel<T> {
    fn set(&mut self, slot: usize, value: [u8; N], mode: WriteMode) -> Result<WriteOutcome, Error> {
        self.write_bytes(slot, &value, mode)
    }
}

impl<T: Platform> Set<&[u8]> for WearLevel<T> {
    fn set(&mut self, slot: usize, value: &[u8], mode: WriteMode) -> Result<WriteOutcome, Error> {
        self.write_bytes(slot, value, mode)
    }
}

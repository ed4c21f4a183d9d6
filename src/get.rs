//! The `Get<T>` trait and its implementation in this module allows providing a single generic,
//! overloaded function `get<T>()` for all supported types.
//!
//! Numbers are stored little endian with their native width.

use crate::error::Error;
use crate::platform::Platform;
use crate::WearLevel;
use core::mem::size_of;

pub trait Get<T> {
    fn get(&mut self, slot: usize) -> Result<Option<T>, Error>;
}

impl<T, G: Get<T>> Get<T> for &mut G {
    fn get(&mut self, slot: usize) -> Result<Option<T>, Error> {
        (*self).get(slot)
    }
}

macro_rules! impl_get_le_bytes {
    ($($type:ty),*) => {
        $(
            impl<T: Platform> Get<$type> for WearLevel<T> {
                fn get(&mut self, slot: usize) -> Result<Option<$type>, Error> {
                    let mut buf = [0u8; size_of::<$type>()];
                    let found = self.read_bytes(slot, &mut buf)?;
                    Ok(found.then(|| <$type>::from_le_bytes(buf)))
                }
            }
        )*
    };
}

impl_get_le_bytes!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<T: Platform> Get<bool> for WearLevel<T> {
    fn get(&mut self, slot: usize) -> Result<Option<bool>, Error> {
        let value: Option<u8> = Get::get(self, slot)?;
        Ok(value.map(|value| value != 0))
    }
}

impl<T: Platform, const N: usize> Get<[u8; N]> for WearLevel<T> {
    fn get(&mut self, slot: usize) -> Result<Option<[u8; N]>, Error> {
        let mut buf = [0u8; N];
        let found = self.read_bytes(slot, &mut buf)?;
        Ok(found.then_some(buf))
    }
}

//! Fixed-width big-endian integer tags
//!
//! The sequence allocator persists its high-water mark, and the sandwich
//! multiplexer identifies parts, with fixed-width unsigned integers serialized
//! in big-endian order, so that lexicographic byte order matches integer
//! order. The codec is explicit about byte order and independent of the host.
//!
//! `next_net` is the companion primitive: increment a big-endian byte array in
//! place, carrying through bytes, reporting saturation when the carry escapes.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// A fixed-width unsigned integer with a big-endian wire form.
///
/// Arithmetic on tags happens in raw `u64` space (`as_raw`/`from_raw`); the
/// width only matters at the wire boundary.
pub trait NetInt: Copy + Ord + Eq {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Largest representable raw value.
    const MAX_RAW: u64;

    /// Widen to the raw arithmetic domain.
    fn as_raw(self) -> u64;

    /// Narrow from the raw arithmetic domain.
    ///
    /// Callers keep `raw ≤ MAX_RAW`; the narrowing itself truncates.
    fn from_raw(raw: u64) -> Self;
}

macro_rules! net_int {
    ($ty:ty, $width:expr) => {
        impl NetInt for $ty {
            const WIDTH: usize = $width;
            const MAX_RAW: u64 = <$ty>::MAX as u64;

            fn as_raw(self) -> u64 {
                self as u64
            }

            fn from_raw(raw: u64) -> Self {
                raw as $ty
            }
        }
    };
}

net_int!(u8, 1);
net_int!(u16, 2);
net_int!(u32, 4);
net_int!(u64, 8);

/// Encode a tag into its big-endian wire form.
pub fn encode<T: NetInt>(value: T) -> Vec<u8> {
    let mut buf = vec![0u8; T::WIDTH];
    BigEndian::write_uint(&mut buf, value.as_raw(), T::WIDTH);
    buf
}

/// Decode a tag from its big-endian wire form.
///
/// A length mismatch is `Corruption`: it means a persisted record does not
/// have the shape this store wrote.
pub fn decode<T: NetInt>(bytes: &[u8]) -> Result<T> {
    if bytes.len() != T::WIDTH {
        return Err(Error::corruption(format!(
            "big-endian tag size mismatch: expected {} bytes, got {}",
            T::WIDTH,
            bytes.len()
        )));
    }
    Ok(T::from_raw(BigEndian::read_uint(bytes, T::WIDTH)))
}

/// Increment a big-endian byte array in place.
///
/// Returns `false` when the carry escapes the most significant byte, i.e. the
/// array was all `0xff` and has wrapped to all zeroes; callers must treat that
/// as saturation.
pub fn next_net(bytes: &mut [u8]) -> bool {
    for b in bytes.iter_mut().rev() {
        *b = b.wrapping_add(1);
        if *b != 0 {
            return true;
        }
    }
    false
}

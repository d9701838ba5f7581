//! Fixed-width values stored inline in tables and vectors.

/// A fixed-width value with a little-endian wire representation.
///
/// The on-wire order never depends on the host: `read_le` and `write_le`
/// always convert explicitly.
pub trait Scalar: Copy + PartialEq + std::fmt::Debug + bytemuck::NoUninit + 'static {
    /// Encoded size in bytes; also the required alignment.
    const SIZE: usize;

    /// Decodes a value from the first `SIZE` bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `SIZE`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encodes the value into the first `SIZE` bytes of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `SIZE`.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    #[inline]
    fn write_le(self, out: &mut [u8]) {
        out[0] = self as u8;
    }
}

//! Bounds-checked read access to a finished buffer.

use tablebuf_common::{Error, Result, verify_data};

use crate::{SIZE_UOFFSET, scalar::Scalar};

/// A read-only view over a contiguous byte region in little-endian order.
///
/// `BufferView` is `Copy`; every accessor carries one alongside its own
/// position. No read ever goes past the region: violations surface as
/// `OutOfRange` errors instead of panics.
#[derive(Clone, Copy)]
pub struct BufferView<'a> {
    data: &'a [u8],
}

impl<'a> BufferView<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> BufferView<'a> {
        BufferView { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Verifies that `size` bytes starting at `offset` lie within the region.
    #[inline]
    pub fn check(&self, offset: usize, size: usize) -> Result<()> {
        match offset.checked_add(size) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::out_of_range(offset, size, self.data.len())),
        }
    }

    /// Returns `size` bytes starting at `offset`.
    #[inline]
    pub fn bytes_at(&self, offset: usize, size: usize) -> Result<&'a [u8]> {
        self.check(offset, size)?;
        Ok(&self.data[offset..offset + size])
    }

    /// Reads a scalar at an arbitrary byte offset.
    #[inline]
    pub fn read<T: Scalar>(&self, offset: usize) -> Result<T> {
        self.check(offset, T::SIZE)?;
        Ok(T::read_le(&self.data[offset..]))
    }

    /// Reads an unsigned relative offset (vector elements, reference fields, root).
    #[inline]
    pub fn read_uoffset(&self, offset: usize) -> Result<u32> {
        self.read::<u32>(offset)
    }

    /// Reads a signed relative offset (table to vtable).
    #[inline]
    pub fn read_soffset(&self, offset: usize) -> Result<i32> {
        self.read::<i32>(offset)
    }

    /// Follows the relative offset stored at `offset` and returns the position
    /// it points to.
    ///
    /// The target must leave room for at least a length prefix or a vtable
    /// offset, since every referenced structure starts with one.
    #[inline]
    pub fn resolve_indirect(&self, offset: usize) -> Result<usize> {
        let rel = self.read_uoffset(offset)? as usize;
        let target = offset
            .checked_add(rel)
            .ok_or_else(|| Error::out_of_range(offset, rel, self.data.len()))?;
        self.check(target, SIZE_UOFFSET)?;
        Ok(target)
    }

    /// Returns the payload of the length-prefixed byte run starting at `offset`.
    pub fn read_bytes(&self, offset: usize) -> Result<&'a [u8]> {
        let len = self.read_uoffset(offset)? as usize;
        self.bytes_at(offset + SIZE_UOFFSET, len)
    }

    /// Returns the text of the string starting at `offset`.
    ///
    /// The trailing zero byte must be present; it is not part of the result.
    pub fn read_str(&self, offset: usize) -> Result<&'a str> {
        let bytes = self.read_bytes(offset)?;
        let terminator = offset + SIZE_UOFFSET + bytes.len();
        let zero = self.read::<u8>(terminator)?;
        verify_data!(string_terminator, zero == 0);
        Ok(std::str::from_utf8(bytes)?)
    }
}

impl std::fmt::Debug for BufferView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferView")
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

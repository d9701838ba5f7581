//! Byte buffers used by the tablebuf builder and readers: a back-to-front
//! arena for construction, and a shared immutable buffer for finished data.

use std::{
    ops::{Range, RangeBounds},
    sync::Arc,
};

pub mod align;
pub mod buffer;

pub use buffer::BackBuffer;

/// A contiguous, immutable byte region with shared ownership.
///
/// `Bytes` can be sliced and cloned without copying the underlying data, and
/// is `Send + Sync`, so any number of readers may share one finished buffer.
#[derive(Clone)]
pub struct Bytes {
    data: Arc<Vec<u8>>,
    range: Range<usize>,
}

impl Bytes {
    /// Creates a new empty `Bytes`.
    pub fn new() -> Self {
        Bytes {
            data: Arc::new(Vec::new()),
            range: 0..0,
        }
    }

    /// Takes over the written part of a `BackBuffer` without copying.
    pub fn from_back_buffer(buf: BackBuffer) -> Self {
        let (inner, head) = buf.into_vec();
        let end = inner.len();
        Bytes {
            data: Arc::new(inner),
            range: head..end,
        }
    }

    /// Creates a new `Bytes` containing a copy of the provided slice.
    pub fn copy_from_slice(data: &[u8]) -> Bytes {
        Bytes::from(data.to_vec())
    }

    /// Returns the length of the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns `true` if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Returns the buffer contents as a byte slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.range.clone()]
    }

    /// Creates a new `Bytes` representing a subrange of this one, sharing the
    /// underlying memory.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or extends past the end of the buffer.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Bytes {
        use std::ops::Bound;

        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).expect("out of range"),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).expect("out of range"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => len,
        };
        assert!(start <= end, "range start must not be greater than end: {start} <= {end}");
        assert!(end <= len, "range end out of bounds: {end} <= {len}");

        Bytes {
            data: self.data.clone(),
            range: self.range.start + start..self.range.start + end,
        }
    }

    /// Copies the contents into a new `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl std::ops::Deref for Bytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Debug for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_slice().fmt(f)
    }
}

impl Default for Bytes {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Bytes {}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        let end = vec.len();
        Bytes {
            data: Arc::new(vec),
            range: 0..end,
        }
    }
}

impl From<BackBuffer> for Bytes {
    fn from(buf: BackBuffer) -> Self {
        Bytes::from_back_buffer(buf)
    }
}

impl From<&[u8]> for Bytes {
    fn from(s: &[u8]) -> Self {
        Bytes::copy_from_slice(s)
    }
}

/// A byte arena that grows toward lower addresses.
///
/// Data occupies the tail of the underlying allocation: `inner[head..]`. Every
/// write is placed immediately in front of the previously written bytes, so a
/// location written earlier keeps a stable distance from the *end* of the
/// buffer. Callers address previously written data by that distance
/// ("offset from end"), which survives reallocation.
///
/// # Performance
/// - Capacity is managed in 64-byte blocks
/// - Growth doubles the capacity and moves the written tail to the end of the
///   new allocation
pub struct BackBuffer {
    /// The backing storage; bytes before `head` are unused and zeroed.
    inner: Vec<u8>,
    /// Index of the first written byte within `inner`.
    head: usize,
}

impl BackBuffer {
    /// Block size for capacity calculations
    const BLOCK_SIZE: usize = 64;

    /// Creates a new empty buffer with no capacity allocation.
    pub fn new() -> BackBuffer {
        BackBuffer {
            inner: Vec::new(),
            head: 0,
        }
    }

    /// Creates a new buffer able to hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> BackBuffer {
        let capacity = round_up(capacity, Self::BLOCK_SIZE);
        BackBuffer {
            inner: vec![0u8; capacity],
            head: capacity,
        }
    }

    /// Returns the number of written bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len() - self.head
    }

    /// Returns true if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of bytes the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.len()
    }

    /// Returns the written bytes, in final memory order.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.head..]
    }

    /// Reserves room for `additional` more bytes in front of the written data.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        if self.head >= additional {
            return;
        }
        self.grow(additional);
    }

    /// Claims `n` bytes in front of the written data and returns them.
    ///
    /// The returned bytes are zeroed.
    #[inline]
    pub fn make_space(&mut self, n: usize) -> &mut [u8] {
        self.reserve(n);
        let start = self.head - n;
        self.head = start;
        &mut self.inner[start..start + n]
    }

    /// Writes `data` in front of the written bytes.
    #[inline]
    pub fn prepend(&mut self, data: &[u8]) {
        self.make_space(data.len()).copy_from_slice(data);
    }

    /// Writes `n` zero bytes in front of the written bytes.
    #[inline]
    pub fn prepend_zeros(&mut self, n: usize) {
        // Unused capacity is kept zeroed, so claiming it is enough.
        self.make_space(n);
    }

    /// Writes the raw bytes of `values` in front of the written bytes.
    ///
    /// The bytes are copied in host order; callers must only use this when the
    /// host order matches the desired encoding.
    #[inline]
    pub fn prepend_typed<T>(&mut self, values: &[T])
    where
        T: bytemuck::NoUninit,
    {
        self.prepend(bytemuck::cast_slice(values));
    }

    /// Returns `len` bytes starting at the location that is `offset_from_end`
    /// bytes away from the end of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the range is not within the written data.
    #[inline]
    pub fn at_end_offset(&self, offset_from_end: usize, len: usize) -> &[u8] {
        let start = self.end_offset_to_index(offset_from_end, len);
        &self.inner[start..start + len]
    }

    /// Mutable counterpart of [`BackBuffer::at_end_offset`], used to patch
    /// previously written placeholders.
    #[inline]
    pub fn at_end_offset_mut(&mut self, offset_from_end: usize, len: usize) -> &mut [u8] {
        let start = self.end_offset_to_index(offset_from_end, len);
        &mut self.inner[start..start + len]
    }

    /// Discards all written data, keeping the allocation.
    pub fn clear(&mut self) {
        let head = self.head;
        self.inner[head..].fill(0);
        self.head = self.inner.len();
    }

    /// Consumes the buffer, returning the backing vector and the index at which
    /// the written data starts.
    pub fn into_vec(self) -> (Vec<u8>, usize) {
        (self.inner, self.head)
    }
}

impl BackBuffer {
    /// Grows the capacity to accommodate at least `additional` more bytes,
    /// moving the written data to the end of the new allocation.
    #[cold]
    fn grow(&mut self, additional: usize) {
        let len = self.len();
        let required = round_up(len.checked_add(additional).expect("add"), Self::BLOCK_SIZE);
        let new_cap = std::cmp::max(self.capacity() * 2, required);
        let mut inner = vec![0u8; new_cap];
        inner[new_cap - len..].copy_from_slice(self.as_slice());
        self.inner = inner;
        self.head = new_cap - len;
    }

    #[inline]
    fn end_offset_to_index(&self, offset_from_end: usize, len: usize) -> usize {
        assert!(
            offset_from_end <= self.len() && len <= offset_from_end,
            "range out of bounds: offset {offset_from_end}, len {len}, written {}",
            self.len()
        );
        self.inner.len() - offset_from_end
    }
}

impl std::fmt::Debug for BackBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackBuffer")
            .field("values", &self.as_slice())
            .field("len", &self.len())
            .field("cap", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl Default for BackBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounds up a number to the next multiple of block_size.
#[inline]
fn round_up(n: usize, block_size: usize) -> usize {
    n.checked_add(block_size - 1).expect("add") & !(block_size - 1)
}

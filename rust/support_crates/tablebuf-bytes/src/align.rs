/// Checks if a number is aligned to the specified alignment boundary.
///
/// ```
/// use tablebuf_bytes::align::is_aligned;
///
/// assert!(is_aligned(16, 8));
/// assert!(!is_aligned(17, 8));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Number of padding bytes to insert in front of a back-to-front buffer so that
/// a value of `len` bytes, written next, ends up aligned to `alignment` when
/// measured from the end of the buffer.
///
/// `used` is the number of bytes already written (the distance from the current
/// head to the end of the buffer).
///
/// # Examples
///
/// ```
/// use tablebuf_bytes::align::back_padding;
///
/// // 6 bytes written, a 4-byte value must start 12 bytes from the end.
/// assert_eq!(back_padding(6, 4, 4), 2);
/// assert_eq!(back_padding(8, 4, 4), 0);
/// // An 8-byte vector body plus 4-byte length prefix.
/// assert_eq!(back_padding(4, 8, 4), 0);
/// ```
#[inline]
pub fn back_padding(used: usize, len: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (!(used.wrapping_add(len))).wrapping_add(1) & (alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_padding_makes_end_distance_aligned() {
        for used in 0..64usize {
            for len in 0..16usize {
                for alignment in [1usize, 2, 4, 8, 16] {
                    let pad = back_padding(used, len, alignment);
                    assert!(pad < alignment);
                    assert!(is_aligned(used + pad + len, alignment));
                }
            }
        }
    }
}

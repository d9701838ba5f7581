//! Field offset resolution through a table's vtable.

use tablebuf_common::{Error, Result, verify_data};

use crate::{SIZE_VOFFSET, VTABLE_HEADER_SIZE, scalar::Scalar, view::BufferView};

/// The vtable of one table: `u16 byte_size`, `u16 table_inline_size`, then one
/// `u16` field offset per slot, where zero marks an absent field.
///
/// Construction validates that the whole vtable lies within the buffer, so
/// slot lookups afterwards cannot fail.
#[derive(Clone, Copy, Debug)]
pub struct VTable<'a> {
    view: BufferView<'a>,
    position: usize,
    byte_size: u16,
    inline_size: u16,
}

impl<'a> VTable<'a> {
    /// Locates the vtable of the table at `table_pos`.
    ///
    /// The table starts with a signed offset; the vtable lives at
    /// `table_pos - soffset`, before or after the table.
    pub fn for_table(view: BufferView<'a>, table_pos: usize) -> Result<VTable<'a>> {
        let soffset = view.read_soffset(table_pos)? as i64;
        let position = table_pos as i64 - soffset;
        if position < 0 || position as usize >= view.len() {
            return Err(Error::out_of_range(
                position.max(0) as usize,
                VTABLE_HEADER_SIZE,
                view.len(),
            ));
        }
        VTable::at(view, position as usize)
    }

    /// Reads the vtable that starts at `position`.
    pub fn at(view: BufferView<'a>, position: usize) -> Result<VTable<'a>> {
        let byte_size = view.read::<u16>(position)?;
        let inline_size = view.read::<u16>(position + SIZE_VOFFSET)?;
        verify_data!(byte_size, byte_size as usize >= VTABLE_HEADER_SIZE);
        verify_data!(byte_size, byte_size % 2 == 0);
        view.check(position, byte_size as usize)?;
        Ok(VTable {
            view,
            position,
            byte_size,
            inline_size,
        })
    }

    /// Position of the vtable within the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total vtable size in bytes, header included.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.byte_size as usize
    }

    /// Size in bytes of the table's inline region, including its leading
    /// vtable offset.
    #[inline]
    pub fn table_inline_size(&self) -> usize {
        self.inline_size as usize
    }

    /// Number of field slots the vtable declares. Slots at or beyond this
    /// count are absent.
    #[inline]
    pub fn num_slots(&self) -> usize {
        (self.byte_size() - VTABLE_HEADER_SIZE) / SIZE_VOFFSET
    }

    /// Returns the field's byte offset from the table start, or `None` when
    /// the field is absent.
    #[inline]
    pub fn field_offset(&self, slot: usize) -> Option<u16> {
        if slot >= self.num_slots() {
            return None;
        }
        let pos = self.position + VTABLE_HEADER_SIZE + slot * SIZE_VOFFSET;
        match u16::read_le(&self.view.as_slice()[pos..]) {
            0 => None,
            offset => Some(offset),
        }
    }

    /// Iterates over the present slots as `(slot, offset)` pairs.
    pub fn present_slots(&self) -> impl Iterator<Item = (usize, u16)> + 'a {
        let vtable = *self;
        (0..self.num_slots()).filter_map(move |slot| vtable.field_offset(slot).map(|o| (slot, o)))
    }

    /// The raw vtable bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.view.as_slice()[self.position..self.position + self.byte_size()]
    }
}

#[cfg(test)]
mod tests {
    use tablebuf_common::ErrorKind;

    use super::*;

    /// vtable at 0: size 8, inline 8, slot0 absent, slot1 at +4;
    /// table at 8: soffset 8, value 42.
    const SAMPLE: [u8; 16] = [8, 0, 8, 0, 0, 0, 4, 0, 8, 0, 0, 0, 42, 0, 0, 0];

    #[test]
    fn test_resolve_fields() {
        let view = BufferView::new(&SAMPLE);
        let vt = VTable::for_table(view, 8).unwrap();
        assert_eq!(vt.position(), 0);
        assert_eq!(vt.byte_size(), 8);
        assert_eq!(vt.table_inline_size(), 8);
        assert_eq!(vt.num_slots(), 2);
        assert_eq!(vt.field_offset(0), None);
        assert_eq!(vt.field_offset(1), Some(4));
        assert_eq!(vt.field_offset(2), None);
        assert_eq!(vt.field_offset(100), None);
        assert_eq!(vt.present_slots().collect::<Vec<_>>(), vec![(1, 4)]);
    }

    #[test]
    fn test_vtable_after_table() {
        // table at 0 with negative soffset; vtable at 8.
        let mut data = vec![0u8; 12];
        data[0..4].copy_from_slice(&(-8i32).to_le_bytes());
        data[8..12].copy_from_slice(&[4, 0, 4, 0]);
        let view = BufferView::new(&data);
        let vt = VTable::for_table(view, 0).unwrap();
        assert_eq!(vt.position(), 8);
        assert_eq!(vt.num_slots(), 0);
    }

    #[test]
    fn test_invalid_vtables() {
        // Odd byte size.
        let data = [5, 0, 4, 0, 0, 0, 4, 0, 0, 0, 0, 0];
        let view = BufferView::new(&data);
        assert!(matches!(
            VTable::at(view, 0).unwrap_err().kind(),
            ErrorKind::InvalidFormat { .. }
        ));

        // Declared size runs past the end.
        let data = [32, 0, 4, 0, 0, 0];
        let view = BufferView::new(&data);
        assert!(matches!(
            VTable::at(view, 0).unwrap_err().kind(),
            ErrorKind::OutOfRange { .. }
        ));

        // soffset pointing before the buffer start.
        let mut data = vec![0u8; 8];
        data[4..8].copy_from_slice(&64i32.to_le_bytes());
        let view = BufferView::new(&data);
        assert!(VTable::for_table(view, 4).is_err());
    }
}

//! Generic table access and the per-schema accessor trait.

use tablebuf_common::{Error, Result};

use crate::{
    FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR,
    scalar::Scalar,
    union::UnionRef,
    vector::{Follow, Vector},
    view::BufferView,
    vtable::VTable,
};

/// A table located at `position` within a buffer.
///
/// `Table` is a lightweight cursor: it holds the buffer view and a position,
/// never owns bytes, and resolves every field lazily on access.
#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    view: BufferView<'a>,
    position: usize,
}

impl<'a> Table<'a> {
    /// Creates a table cursor. The position is validated lazily, on first
    /// field access.
    #[inline]
    pub fn new(view: BufferView<'a>, position: usize) -> Table<'a> {
        Table { view, position }
    }

    #[inline]
    pub fn view(&self) -> BufferView<'a> {
        self.view
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn vtable(&self) -> Result<VTable<'a>> {
        VTable::for_table(self.view, self.position)
    }

    /// Returns the absolute position of the field in `slot`, or `None` when
    /// the field was never written.
    pub fn field_location(&self, slot: usize) -> Result<Option<usize>> {
        let vtable = self.vtable()?;
        let Some(offset) = vtable.field_offset(slot) else {
            return Ok(None);
        };
        let offset = offset as usize;
        if offset < crate::SIZE_SOFFSET || offset >= vtable.table_inline_size() {
            return Err(Error::invalid_format(
                "vtable",
                format!(
                    "field offset {offset} of slot {slot} is outside the table inline size {}",
                    vtable.table_inline_size()
                ),
            ));
        }
        Ok(Some(self.position + offset))
    }

    /// Reads a scalar field, substituting `default` when it is absent.
    #[inline]
    pub fn get<T: Scalar>(&self, slot: usize, default: T) -> Result<T> {
        Ok(self.get_optional(slot)?.unwrap_or(default))
    }

    /// Reads a scalar field, or `None` when it is absent.
    pub fn get_optional<T: Scalar>(&self, slot: usize) -> Result<Option<T>> {
        match self.field_location(slot)? {
            Some(loc) => Ok(Some(self.view.read(loc)?)),
            None => Ok(None),
        }
    }

    /// Position of the structure the reference field in `slot` points to.
    pub fn reference(&self, slot: usize) -> Result<Option<usize>> {
        match self.field_location(slot)? {
            Some(loc) => Ok(Some(self.view.resolve_indirect(loc)?)),
            None => Ok(None),
        }
    }

    pub fn get_str(&self, slot: usize) -> Result<Option<&'a str>> {
        self.reference(slot)?
            .map(|pos| self.view.read_str(pos))
            .transpose()
    }

    pub fn get_bytes(&self, slot: usize) -> Result<Option<&'a [u8]>> {
        self.reference(slot)?
            .map(|pos| self.view.read_bytes(pos))
            .transpose()
    }

    pub fn get_vector<E: Follow<'a>>(&self, slot: usize) -> Result<Option<Vector<'a, E>>> {
        self.reference(slot)?
            .map(|pos| Vector::at(self.view, pos))
            .transpose()
    }

    pub fn get_table<T: TableAccessor<'a>>(&self, slot: usize) -> Result<Option<T>> {
        Ok(self
            .reference(slot)?
            .map(|pos| T::from_table(Table::new(self.view, pos))))
    }

    /// Reads a union stored as a `u8` tag in `type_slot` and a table reference
    /// in `value_slot`. A zero (or absent) tag means no value.
    pub fn get_union(&self, type_slot: usize, value_slot: usize) -> Result<Option<UnionRef<'a>>> {
        let tag = self.get::<u8>(type_slot, crate::UNION_NONE)?;
        if tag == crate::UNION_NONE {
            return Ok(None);
        }
        match self.reference(value_slot)? {
            Some(pos) => Ok(Some(UnionRef::new(tag, Table::new(self.view, pos)))),
            None => Err(Error::invalid_format(
                "union",
                format!("tag {tag} in slot {type_slot} has no value in slot {value_slot}"),
            )),
        }
    }
}

/// Converts a missing required field into an `InvalidFormat` error.
#[inline]
pub fn required<T>(value: Option<T>, table: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        Error::invalid_format(table, format!("required field '{field}' is missing"))
    })
}

/// One accessor type per schema table.
///
/// Accessors are plain `Copy` wrappers around a [`Table`]; a fresh one is
/// produced on every access instead of rebinding a shared instance.
pub trait TableAccessor<'a>: Sized + Copy {
    /// Schema name of the table, used in error messages.
    const NAME: &'static str;

    /// `(major, minor)` format version the accessor was generated for.
    const GENERATOR_VERSION: (u16, u16) = (FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR);

    /// File identifier a root buffer of this type is expected to carry.
    const IDENTIFIER: Option<[u8; 4]> = None;

    fn from_table(table: Table<'a>) -> Self;

    fn as_table(&self) -> Table<'a>;
}

impl<'a> TableAccessor<'a> for Table<'a> {
    const NAME: &'static str = "table";

    #[inline]
    fn from_table(table: Table<'a>) -> Self {
        table
    }

    #[inline]
    fn as_table(&self) -> Table<'a> {
        *self
    }
}

/// In-place scalar updates on a caller-owned buffer.
///
/// Only fields that are present can be overwritten: an absent field has no
/// storage, so [`TableMut::set`] reports `false` and leaves the buffer intact.
pub struct TableMut<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> TableMut<'a> {
    pub fn new(data: &'a mut [u8], position: usize) -> TableMut<'a> {
        TableMut { data, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Read access to the same table.
    pub fn as_table(&self) -> Table<'_> {
        Table::new(BufferView::new(&*self.data), self.position)
    }

    /// Overwrites the scalar in `slot`. Returns `false` when the field is
    /// absent.
    pub fn set<T: Scalar>(&mut self, slot: usize, value: T) -> Result<bool> {
        let Some(loc) = self.as_table().field_location(slot)? else {
            return Ok(false);
        };
        BufferView::new(&*self.data).check(loc, T::SIZE)?;
        value.write_le(&mut self.data[loc..loc + T::SIZE]);
        Ok(true)
    }
}

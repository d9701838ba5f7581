use crate::table::{Table, TableAccessor};

/// A resolved union value: the `u8` type tag and the referenced table.
///
/// The tag-to-type mapping belongs to the schema, so the caller picks the
/// accessor type with [`UnionRef::as_table`].
#[derive(Clone, Copy, Debug)]
pub struct UnionRef<'a> {
    tag: u8,
    table: Table<'a>,
}

impl<'a> UnionRef<'a> {
    pub fn new(tag: u8, table: Table<'a>) -> UnionRef<'a> {
        UnionRef { tag, table }
    }

    #[inline]
    pub fn tag(&self) -> u8 {
        self.tag
    }

    #[inline]
    pub fn table(&self) -> Table<'a> {
        self.table
    }

    /// Returns the value as `T` when the tag equals `expected_tag`.
    pub fn as_table<T: TableAccessor<'a>>(&self, expected_tag: u8) -> Option<T> {
        (self.tag == expected_tag).then(|| T::from_table(self.table))
    }
}

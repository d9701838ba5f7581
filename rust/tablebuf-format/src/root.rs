//! Root access for finished buffers.

use tablebuf_common::{Error, Result};

use crate::{
    FILE_IDENTIFIER_LENGTH, FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR, SIZE_SIZE_PREFIX,
    SIZE_UOFFSET,
    table::{Table, TableAccessor, TableMut},
    view::BufferView,
};

/// Returns the root table of `data` as accessor type `T`.
///
/// Fails with `SchemaVersionMismatch` when `T` was generated for another
/// major format version, or for a newer minor version than this runtime, and
/// when `T` declares a file identifier that the buffer does not carry.
pub fn root<'a, T: TableAccessor<'a>>(data: &'a [u8]) -> Result<T> {
    check_generator_version::<T>()?;
    if let Some(ident) = T::IDENTIFIER {
        check_identifier(T::NAME, data, &ident)?;
    }
    root_at(BufferView::new(data), 0)
}

/// Like [`root`], but requires the buffer to carry `ident` at bytes 4..8.
pub fn root_with_identifier<'a, T: TableAccessor<'a>>(
    data: &'a [u8],
    ident: &[u8; FILE_IDENTIFIER_LENGTH],
) -> Result<T> {
    check_generator_version::<T>()?;
    check_identifier(T::NAME, data, ident)?;
    root_at(BufferView::new(data), 0)
}

/// Returns the root of a buffer produced by `Builder::finish_size_prefixed`.
///
/// The `u32` prefix must match the number of bytes that follow it. The
/// returned accessor views the buffer without the prefix.
pub fn size_prefixed_root<'a, T: TableAccessor<'a>>(data: &'a [u8]) -> Result<T> {
    check_generator_version::<T>()?;
    let payload = size_prefixed_payload(data)?;
    if let Some(ident) = T::IDENTIFIER {
        check_identifier(T::NAME, payload, &ident)?;
    }
    root_at(BufferView::new(payload), 0)
}

/// Checks whether `data` carries `ident` after its root offset.
pub fn buffer_has_identifier(
    data: &[u8],
    ident: &[u8; FILE_IDENTIFIER_LENGTH],
    size_prefixed: bool,
) -> bool {
    let start = SIZE_UOFFSET + if size_prefixed { SIZE_SIZE_PREFIX } else { 0 };
    data.get(start..start + FILE_IDENTIFIER_LENGTH) == Some(&ident[..])
}

/// Returns a mutable cursor over the root table, for in-place scalar updates.
pub fn root_mut(data: &mut [u8]) -> Result<TableMut<'_>> {
    let position = BufferView::new(data).resolve_indirect(0)?;
    Ok(TableMut::new(data, position))
}

/// The bytes following the size prefix, checked against the prefix value.
pub(crate) fn size_prefixed_payload(data: &[u8]) -> Result<&[u8]> {
    let view = BufferView::new(data);
    let size = view.read_uoffset(0)? as usize;
    if size != data.len() - SIZE_SIZE_PREFIX {
        return Err(Error::invalid_format(
            "size_prefix",
            format!(
                "prefix declares {size} bytes, but {} follow",
                data.len() - SIZE_SIZE_PREFIX
            ),
        ));
    }
    Ok(&data[SIZE_SIZE_PREFIX..])
}

fn root_at<'a, T: TableAccessor<'a>>(view: BufferView<'a>, offset: usize) -> Result<T> {
    let position = view.resolve_indirect(offset)?;
    Ok(T::from_table(Table::new(view, position)))
}

fn check_generator_version<'a, T: TableAccessor<'a>>() -> Result<()> {
    let (major, minor) = T::GENERATOR_VERSION;
    if major != FORMAT_VERSION_MAJOR || minor > FORMAT_VERSION_MINOR {
        return Err(Error::schema_version_mismatch(
            T::NAME,
            format!("{FORMAT_VERSION_MAJOR}.{FORMAT_VERSION_MINOR}"),
            format!("{major}.{minor}"),
        ));
    }
    Ok(())
}

fn check_identifier(
    element: &str,
    data: &[u8],
    ident: &[u8; FILE_IDENTIFIER_LENGTH],
) -> Result<()> {
    if buffer_has_identifier(data, ident, false) {
        return Ok(());
    }
    let found = data
        .get(SIZE_UOFFSET..SIZE_UOFFSET + FILE_IDENTIFIER_LENGTH)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();
    Err(Error::schema_version_mismatch(
        element,
        format!("file identifier '{}'", String::from_utf8_lossy(ident)),
        format!("'{found}'"),
    ))
}

#[cfg(test)]
mod tests {
    use tablebuf_common::ErrorKind;

    use super::*;

    #[derive(Clone, Copy)]
    struct Future<'a>(Table<'a>);

    impl<'a> TableAccessor<'a> for Future<'a> {
        const NAME: &'static str = "Future";
        const GENERATOR_VERSION: (u16, u16) = (FORMAT_VERSION_MAJOR + 1, 0);

        fn from_table(table: Table<'a>) -> Self {
            Future(table)
        }

        fn as_table(&self) -> Table<'a> {
            self.0
        }
    }

    #[derive(Clone, Copy)]
    struct Tagged<'a>(Table<'a>);

    impl<'a> TableAccessor<'a> for Tagged<'a> {
        const NAME: &'static str = "Tagged";
        const IDENTIFIER: Option<[u8; 4]> = Some(*b"TAGD");

        fn from_table(table: Table<'a>) -> Self {
            Tagged(table)
        }

        fn as_table(&self) -> Table<'a> {
            self.0
        }
    }

    /// root 12, identifier "TAGD", empty vtable at 8, table at 12.
    fn tagged_buffer() -> Vec<u8> {
        let mut data = vec![12, 0, 0, 0];
        data.extend_from_slice(b"TAGD");
        data.extend_from_slice(&[4, 0, 4, 0]);
        data.extend_from_slice(&4i32.to_le_bytes());
        data
    }

    #[test]
    fn test_root_resolves_table() {
        let data = tagged_buffer();
        let table = root::<Table>(&data).unwrap();
        assert_eq!(table.position(), 12);
        assert_eq!(table.vtable().unwrap().num_slots(), 0);
    }

    #[test]
    fn test_generator_version_mismatch() {
        let data = tagged_buffer();
        assert!(matches!(
            root::<Future>(&data).err().unwrap().kind(),
            ErrorKind::SchemaVersionMismatch { .. }
        ));
    }

    #[test]
    fn test_identifier() {
        let mut data = tagged_buffer();
        assert!(buffer_has_identifier(&data, b"TAGD", false));
        assert!(!buffer_has_identifier(&data, b"TAGD", true));
        assert!(root::<Tagged>(&data).is_ok());
        assert!(root_with_identifier::<Table>(&data, b"TAGD").is_ok());

        data[4] = b'X';
        assert!(matches!(
            root::<Tagged>(&data).err().unwrap().kind(),
            ErrorKind::SchemaVersionMismatch { .. }
        ));
        assert!(root_with_identifier::<Table>(&data, b"TAGD").is_err());
        assert!(!buffer_has_identifier(&[0, 0], b"TAGD", false));
    }

    #[test]
    fn test_size_prefixed_root() {
        let inner = tagged_buffer();
        let mut data = (inner.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&inner);
        assert!(buffer_has_identifier(&data, b"TAGD", true));
        let table = size_prefixed_root::<Tagged>(&data).unwrap();
        assert_eq!(table.as_table().position(), 12);

        data.push(0);
        assert!(size_prefixed_root::<Table>(&data).is_err());
    }

    #[test]
    fn test_truncated_root() {
        assert!(root::<Table>(&[]).is_err());
        assert!(root::<Table>(&[200, 0, 0, 0]).is_err());
    }
}

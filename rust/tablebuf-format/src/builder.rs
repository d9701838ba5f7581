//! Back-to-front buffer construction.
//!
//! The builder writes every structure in front of the previously written
//! bytes, so a child is always complete, and at a known distance from the end
//! of the buffer, before any parent refers to it. All offsets the builder
//! hands out are measured from the end of the buffer; they stay valid when
//! the arena grows and are converted to forward relative offsets on write.

use std::marker::PhantomData;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tablebuf_bytes::{BackBuffer, Bytes, align::back_padding};
use tablebuf_common::{Error, Result, verify_arg, verify_state};

use crate::{
    FILE_IDENTIFIER_LENGTH, MAX_BUFFER_SIZE, SIZE_SOFFSET, SIZE_UOFFSET, SIZE_VOFFSET,
    UNION_NONE, VTABLE_HEADER_SIZE, scalar::Scalar,
};

/// A typed handle to a structure written by a [`Builder`].
///
/// The value is the structure's distance from the end of the buffer. It is
/// only meaningful for the builder session that produced it.
pub struct Offset<T> {
    value: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Offset<T> {
    #[inline]
    pub fn new(value: u32) -> Offset<T> {
        Offset {
            value,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Drops the type tag, e.g. to store a table as a union value.
    #[inline]
    pub fn as_untyped(&self) -> Offset<()> {
        Offset::new(self.value)
    }
}

impl<T> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Offset<T> {}

impl<T> PartialEq for Offset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Offset<T> {}

impl<T> std::fmt::Debug for Offset<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Offset({})", self.value)
    }
}

/// Marker for offsets to strings.
pub enum StringOffset {}

/// Marker for offsets to vectors of `E`.
pub struct VectorOffset<E>(PhantomData<E>);

/// Configuration of a [`Builder`] session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Bytes reserved up front.
    pub initial_capacity: usize,
    /// Write scalar fields even when they equal their default.
    pub force_defaults: bool,
    /// Share byte-identical vtables between tables.
    pub dedup_vtables: bool,
    /// Upper bound on the finished buffer size.
    pub max_buffer_size: usize,
}

impl BuilderOptions {
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn force_defaults(mut self, force_defaults: bool) -> Self {
        self.force_defaults = force_defaults;
        self
    }

    pub fn dedup_vtables(mut self, dedup_vtables: bool) -> Self {
        self.dedup_vtables = dedup_vtables;
        self
    }

    /// Clamped to [`MAX_BUFFER_SIZE`].
    pub fn max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size.min(MAX_BUFFER_SIZE);
        self
    }
}

impl Default for BuilderOptions {
    fn default() -> Self {
        BuilderOptions {
            initial_capacity: 1024,
            force_defaults: false,
            dedup_vtables: true,
            max_buffer_size: MAX_BUFFER_SIZE,
        }
    }
}

/// Boundary (from the buffer end) at which every table's inline region starts.
/// Equal to the widest scalar.
const TABLE_ALIGNMENT: usize = 8;

/// A field written into the currently open table.
#[derive(Debug, Clone, Copy)]
struct FieldLoc {
    /// End offset of the field value.
    offset: u32,
    slot: u16,
}

/// An open table: where its inline region begins and where its fields start
/// in the shared `field_locs` arena.
#[derive(Debug, Clone, Copy)]
struct TableScope {
    start: u32,
    num_fields: u16,
    first_field: usize,
}

/// Serializes tables, vectors and strings into a single buffer.
///
/// A session is: write children, write their parents, then `finish` with the
/// root table. After a failed call the session is in an unspecified state
/// and must be [`reset`](Builder::reset) before reuse.
///
/// ```
/// use tablebuf_format::{Builder, Table, root};
///
/// let mut builder = Builder::new();
/// let name = builder.create_string("abc").unwrap();
/// builder.start_table(2).unwrap();
/// builder.add_offset(0, name).unwrap();
/// builder.add_field::<i32>(1, 42, 0).unwrap();
/// let table = builder.end_table::<()>().unwrap();
/// builder.finish(table).unwrap();
///
/// let table = root::<Table>(builder.finished_data().unwrap()).unwrap();
/// assert_eq!(table.get_str(0).unwrap(), Some("abc"));
/// assert_eq!(table.get::<i32>(1, 0).unwrap(), 42);
/// ```
pub struct Builder {
    buf: BackBuffer,
    options: BuilderOptions,
    min_align: usize,
    field_locs: Vec<FieldLoc>,
    scopes: Vec<TableScope>,
    /// xxh3 of the vtable bytes to the end offsets of vtables with that hash.
    written_vtables: AHashMap<u64, Vec<u32>>,
    shared_strings: AHashMap<Box<str>, u32>,
    tables_completed: usize,
    finished: bool,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::with_options(BuilderOptions::default())
    }

    pub fn with_options(options: BuilderOptions) -> Builder {
        Builder {
            buf: BackBuffer::with_capacity(options.initial_capacity),
            options,
            min_align: 1,
            field_locs: Vec::new(),
            scopes: Vec::new(),
            written_vtables: AHashMap::new(),
            shared_strings: AHashMap::new(),
            tables_completed: 0,
            finished: false,
        }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Discards all written data and starts a new session, keeping the
    /// allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.min_align = 1;
        self.field_locs.clear();
        self.scopes.clear();
        self.written_vtables.clear();
        self.shared_strings.clear();
        self.tables_completed = 0;
        self.finished = false;
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of vtables recorded for sharing in this session.
    pub fn num_vtables(&self) -> usize {
        self.written_vtables.values().map(Vec::len).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Opens a table scope with `num_fields` slots.
    ///
    /// Scopes nest: a table started while another one is open must end before
    /// the outer table does, and fields always go to the innermost scope.
    pub fn start_table(&mut self, num_fields: usize) -> Result<()> {
        verify_state!("start_table", !self.finished);
        verify_arg!(
            num_fields,
            num_fields <= (u16::MAX as usize - VTABLE_HEADER_SIZE) / SIZE_VOFFSET
        );
        // Field alignments never exceed the table alignment, so padding within
        // the table depends only on the order and types of its fields.
        let padding = back_padding(self.buf.len(), 0, TABLE_ALIGNMENT);
        self.space(padding)?;
        self.scopes.push(TableScope {
            start: self.buf.len() as u32,
            num_fields: num_fields as u16,
            first_field: self.field_locs.len(),
        });
        log::trace!("start_table: depth {}, {num_fields} slots", self.scopes.len());
        Ok(())
    }

    /// Writes a scalar field unless it equals `default`.
    pub fn add_field<T: Scalar>(&mut self, slot: usize, value: T, default: T) -> Result<()> {
        self.check_field("add_field", slot)?;
        if value == default && !self.options.force_defaults {
            return Ok(());
        }
        let offset = self.push_scalar(value)?;
        self.track_field(slot, offset)
    }

    /// Writes a scalar field if it has a value. A `Some(default)` value is
    /// always written, so presence survives the round trip.
    pub fn add_field_optional<T: Scalar>(&mut self, slot: usize, value: Option<T>) -> Result<()> {
        self.check_field("add_field_optional", slot)?;
        let Some(value) = value else {
            return Ok(());
        };
        let offset = self.push_scalar(value)?;
        self.track_field(slot, offset)
    }

    /// Writes a reference field pointing at a previously written structure.
    pub fn add_offset<T>(&mut self, slot: usize, target: Offset<T>) -> Result<()> {
        self.check_field("add_offset", slot)?;
        let offset = self.push_uoffset(target.value())?;
        self.track_field(slot, offset)
    }

    /// Writes a union as a `u8` tag in `type_slot` and a table reference in
    /// `value_slot`. A `UNION_NONE` tag writes nothing.
    pub fn add_union<T>(
        &mut self,
        type_slot: usize,
        value_slot: usize,
        tag: u8,
        value: Offset<T>,
    ) -> Result<()> {
        if tag == UNION_NONE {
            self.check_field("add_union", type_slot)?;
            return self.check_field("add_union", value_slot);
        }
        self.add_offset(value_slot, value)?;
        self.add_field(type_slot, tag, UNION_NONE)
    }

    /// Closes the innermost table scope, writes (or reuses) its vtable and
    /// returns the table's offset.
    pub fn end_table<T>(&mut self) -> Result<Offset<T>> {
        let Some(scope) = self.scopes.pop() else {
            return Err(Error::invalid_state("end_table", "no open table"));
        };

        // The table begins with its soffset, patched once the vtable is known.
        let object_offset = self.push_scalar::<i32>(0)?;
        let inline_size = object_offset - scope.start;
        verify_arg!(inline_size, inline_size <= u16::MAX as u32);

        let num_slots = self.field_locs[scope.first_field..]
            .iter()
            .map(|f| f.slot as usize + 1)
            .max()
            .unwrap_or(0);
        let vtable_size = VTABLE_HEADER_SIZE + num_slots * SIZE_VOFFSET;
        let mut vtable = vec![0u8; vtable_size];
        (vtable_size as u16).write_le(&mut vtable[0..]);
        (inline_size as u16).write_le(&mut vtable[SIZE_VOFFSET..]);
        for field in self.field_locs.drain(scope.first_field..) {
            let pos = VTABLE_HEADER_SIZE + field.slot as usize * SIZE_VOFFSET;
            ((object_offset - field.offset) as u16).write_le(&mut vtable[pos..]);
        }

        let vtable_offset = self.write_vtable(&vtable)?;
        let soffset = vtable_offset as i64 - object_offset as i64;
        let placeholder = self.buf.at_end_offset_mut(object_offset as usize, SIZE_SOFFSET);
        (soffset as i32).write_le(placeholder);

        self.tables_completed += 1;
        log::trace!(
            "end_table: {num_slots} slots, inline size {inline_size}, soffset {soffset}"
        );
        Ok(Offset::new(object_offset))
    }

    /// Like [`end_table`](Builder::end_table), but fails with `InvalidState`
    /// when any slot in `required` was not written.
    pub fn end_table_with_required<T>(&mut self, required: &[usize]) -> Result<Offset<T>> {
        let Some(scope) = self.scopes.last() else {
            return Err(Error::invalid_state("end_table", "no open table"));
        };
        let fields = &self.field_locs[scope.first_field..];
        if let Some(missing) = required
            .iter()
            .find(|&&slot| !fields.iter().any(|f| f.slot as usize == slot))
        {
            return Err(Error::invalid_state(
                "end_table",
                format!("required field in slot {missing} is missing"),
            ));
        }
        self.end_table()
    }

    /// Writes a zero-terminated UTF-8 string. Equal strings are written again
    /// each time; see [`create_shared_string`](Builder::create_shared_string).
    pub fn create_string(&mut self, value: &str) -> Result<Offset<StringOffset>> {
        verify_state!("create_string", !self.finished);
        let bytes = value.as_bytes();
        self.align(bytes.len() + 1, SIZE_UOFFSET)?;
        self.space(1)?;
        self.space(bytes.len())?.copy_from_slice(bytes);
        self.push_len(bytes.len())
    }

    /// Writes a string once per session and returns the same offset for
    /// every later equal string.
    pub fn create_shared_string(&mut self, value: &str) -> Result<Offset<StringOffset>> {
        verify_state!("create_shared_string", !self.finished);
        if let Some(&offset) = self.shared_strings.get(value) {
            return Ok(Offset::new(offset));
        }
        let offset = self.create_string(value)?;
        self.shared_strings.insert(value.into(), offset.value());
        Ok(offset)
    }

    /// Writes a vector of scalars.
    pub fn create_vector<T: Scalar>(&mut self, items: &[T]) -> Result<Offset<VectorOffset<T>>> {
        verify_state!("create_vector", !self.finished);
        let size = items.len() * T::SIZE;
        self.align(size, T::SIZE.max(SIZE_UOFFSET))?;
        self.write_scalars(items, size)?;
        self.push_len(items.len())
    }

    /// Writes a vector of bytes.
    pub fn create_byte_vector(&mut self, bytes: &[u8]) -> Result<Offset<VectorOffset<u8>>> {
        verify_state!("create_byte_vector", !self.finished);
        self.align(bytes.len(), SIZE_UOFFSET)?;
        self.space(bytes.len())?.copy_from_slice(bytes);
        self.push_len(bytes.len())
    }

    /// Writes a vector of references to previously written structures.
    pub fn create_vector_of_offsets<T>(
        &mut self,
        items: &[Offset<T>],
    ) -> Result<Offset<VectorOffset<T>>> {
        verify_state!("create_vector_of_offsets", !self.finished);
        self.align(items.len() * SIZE_UOFFSET, SIZE_UOFFSET)?;
        for item in items.iter().rev() {
            self.push_uoffset(item.value())?;
        }
        self.push_len(items.len())
    }

    /// Writes each string, then a vector referencing them in order.
    pub fn create_vector_of_strings(
        &mut self,
        items: &[&str],
    ) -> Result<Offset<VectorOffset<StringOffset>>> {
        let offsets = items
            .iter()
            .map(|s| self.create_string(s))
            .collect::<Result<Vec<_>>>()?;
        self.create_vector_of_offsets(&offsets)
    }

    /// Writes the root offset and completes the buffer.
    pub fn finish<T>(&mut self, root: Offset<T>) -> Result<()> {
        self.finish_impl(root.value(), None, false)
    }

    /// Like [`finish`](Builder::finish), and stores a 4-byte file identifier
    /// right after the root offset.
    pub fn finish_with_identifier<T>(
        &mut self,
        root: Offset<T>,
        ident: [u8; FILE_IDENTIFIER_LENGTH],
    ) -> Result<()> {
        self.finish_impl(root.value(), Some(ident), false)
    }

    /// Completes the buffer with a leading `u32` holding the size of the rest.
    pub fn finish_size_prefixed<T>(
        &mut self,
        root: Offset<T>,
        ident: Option<[u8; FILE_IDENTIFIER_LENGTH]>,
    ) -> Result<()> {
        self.finish_impl(root.value(), ident, true)
    }

    /// The finished buffer.
    pub fn finished_data(&self) -> Result<&[u8]> {
        verify_state!("finished_data", self.finished);
        Ok(self.buf.as_slice())
    }

    /// Consumes the builder and returns the finished buffer without copying.
    pub fn into_bytes(self) -> Result<Bytes> {
        verify_state!("into_bytes", self.finished);
        Ok(Bytes::from_back_buffer(self.buf))
    }
}

impl Builder {
    fn finish_impl(
        &mut self,
        root: u32,
        ident: Option<[u8; FILE_IDENTIFIER_LENGTH]>,
        size_prefixed: bool,
    ) -> Result<()> {
        verify_state!("finish", !self.finished);
        if !self.scopes.is_empty() {
            return Err(Error::invalid_state(
                "finish",
                format!("{} tables are still open", self.scopes.len()),
            ));
        }
        if self.tables_completed == 0 {
            return Err(Error::invalid_state("finish", "no table was completed"));
        }

        let header = SIZE_UOFFSET
            + ident.map_or(0, |_| FILE_IDENTIFIER_LENGTH)
            + if size_prefixed { SIZE_UOFFSET } else { 0 };
        self.align(header, self.min_align)?;
        if let Some(ident) = ident {
            self.space(FILE_IDENTIFIER_LENGTH)?.copy_from_slice(&ident);
        }
        self.push_uoffset(root)?;
        if size_prefixed {
            let size = self.buf.len() as u32;
            self.push_scalar(size)?;
        }
        self.finished = true;
        log::debug!(
            "finish: {} bytes, {} tables, {} vtables, min align {}",
            self.buf.len(),
            self.tables_completed,
            self.num_vtables(),
            self.min_align
        );
        Ok(())
    }

    /// Validates that a field can be added to the innermost open table.
    fn check_field(&self, operation: &str, slot: usize) -> Result<()> {
        verify_state!(operation, !self.finished);
        let Some(scope) = self.scopes.last() else {
            return Err(Error::invalid_state(operation, "no open table"));
        };
        if slot >= scope.num_fields as usize {
            return Err(Error::invalid_arg(
                "slot",
                format!("slot {slot} is beyond the {} declared fields", scope.num_fields),
            ));
        }
        Ok(())
    }

    fn track_field(&mut self, slot: usize, offset: u32) -> Result<()> {
        let first = self.scopes.last().map_or(0, |scope| scope.first_field);
        if self.field_locs[first..]
            .iter()
            .any(|f| f.slot as usize == slot)
        {
            return Err(Error::invalid_arg(
                "slot",
                format!("slot {slot} was already written in this table"),
            ));
        }
        self.field_locs.push(FieldLoc {
            offset,
            slot: slot as u16,
        });
        Ok(())
    }

    /// Emits `vtable` unless an identical one was already written, and
    /// returns the end offset of the vtable the table should use.
    fn write_vtable(&mut self, vtable: &[u8]) -> Result<u32> {
        if !self.options.dedup_vtables {
            return self.push_vtable(vtable);
        }
        let hash = xxhash_rust::xxh3::xxh3_64(vtable);
        if let Some(candidates) = self.written_vtables.get(&hash) {
            for &candidate in candidates {
                let existing = self.buf.at_end_offset(candidate as usize, SIZE_VOFFSET);
                if u16::read_le(existing) as usize == vtable.len()
                    && self.buf.at_end_offset(candidate as usize, vtable.len()) == vtable
                {
                    return Ok(candidate);
                }
            }
        }
        let offset = self.push_vtable(vtable)?;
        self.written_vtables.entry(hash).or_default().push(offset);
        Ok(offset)
    }

    fn push_vtable(&mut self, vtable: &[u8]) -> Result<u32> {
        self.align(vtable.len(), SIZE_VOFFSET)?;
        self.space(vtable.len())?.copy_from_slice(vtable);
        Ok(self.buf.len() as u32)
    }

    fn push_len<T>(&mut self, len: usize) -> Result<Offset<T>> {
        let offset = self.push_scalar(len as u32)?;
        Ok(Offset::new(offset))
    }

    #[cfg(target_endian = "little")]
    fn write_scalars<T: Scalar>(&mut self, items: &[T], size: usize) -> Result<()> {
        self.check_capacity(size)?;
        self.buf.prepend_typed(items);
        Ok(())
    }

    #[cfg(not(target_endian = "little"))]
    fn write_scalars<T: Scalar>(&mut self, items: &[T], size: usize) -> Result<()> {
        let space = self.space(size)?;
        for (item, chunk) in items.iter().zip(space.chunks_exact_mut(T::SIZE)) {
            item.write_le(chunk);
        }
        Ok(())
    }

    /// Writes a scalar aligned to its size and returns its end offset.
    fn push_scalar<T: Scalar>(&mut self, value: T) -> Result<u32> {
        self.align(T::SIZE, T::SIZE)?;
        value.write_le(self.space(T::SIZE)?);
        Ok(self.buf.len() as u32)
    }

    /// Writes a forward reference to the structure at end offset `target`.
    fn push_uoffset(&mut self, target: u32) -> Result<u32> {
        self.align(SIZE_UOFFSET, SIZE_UOFFSET)?;
        let used = self.buf.len() as u32;
        if target == 0 || target > used {
            return Err(Error::invalid_arg(
                "offset",
                format!("offset {target} does not refer to written data ({used} bytes)"),
            ));
        }
        let relative = used + SIZE_UOFFSET as u32 - target;
        relative.write_le(self.space(SIZE_UOFFSET)?);
        Ok(self.buf.len() as u32)
    }

    /// Pads so that after writing `len` more bytes, the written size is a
    /// multiple of `alignment`.
    fn align(&mut self, len: usize, alignment: usize) -> Result<()> {
        self.min_align = self.min_align.max(alignment);
        let padding = back_padding(self.buf.len(), len, alignment);
        self.space(padding)?;
        Ok(())
    }

    /// Claims `n` zeroed bytes in front of the written data.
    fn space(&mut self, n: usize) -> Result<&mut [u8]> {
        self.check_capacity(n)?;
        Ok(self.buf.make_space(n))
    }

    fn check_capacity(&self, additional: usize) -> Result<()> {
        let limit = self.options.max_buffer_size.min(MAX_BUFFER_SIZE);
        if self.buf.len().saturating_add(additional) > limit {
            return Err(Error::invalid_state(
                "write",
                format!(
                    "buffer would grow to {} bytes, beyond the limit of {limit}",
                    self.buf.len().saturating_add(additional)
                ),
            ));
        }
        Ok(())
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("len", &self.buf.len())
            .field("open_tables", &self.scopes.len())
            .field("tables_completed", &self.tables_completed)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

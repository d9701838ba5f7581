//! Up-front structural verification of untrusted buffers.
//!
//! Accessors are already bounds-checked, so verification is optional: it
//! moves every structural failure to a single call before any field is read,
//! and bounds the work a hostile buffer can cause through its limits.

use serde::{Deserialize, Serialize};
use tablebuf_bytes::align::is_aligned;
use tablebuf_common::{Error, Result};

use crate::{
    MAX_BUFFER_SIZE, SIZE_SIZE_PREFIX, SIZE_SOFFSET, SIZE_UOFFSET, SIZE_VOFFSET, UNION_NONE,
    root::size_prefixed_payload,
    scalar::Scalar,
    table::Table,
    vector::{BytesItem, StrItem, TableItem, Vector},
    view::BufferView,
    vtable::VTable,
};

/// Limits applied by a [`Verifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierOptions {
    /// Maximum nesting of tables.
    pub max_depth: usize,
    /// Maximum number of tables visited, shared references included.
    pub max_tables: usize,
    /// Maximum total size of all visited structures. Shared structures count
    /// once per reference, so this bounds the cost of reference cycles and
    /// diamonds.
    pub max_apparent_size: usize,
    /// Require scalars and offsets to be aligned to their size.
    pub check_alignment: bool,
}

impl VerifierOptions {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_tables(mut self, max_tables: usize) -> Self {
        self.max_tables = max_tables;
        self
    }

    pub fn max_apparent_size(mut self, max_apparent_size: usize) -> Self {
        self.max_apparent_size = max_apparent_size;
        self
    }

    pub fn check_alignment(mut self, check_alignment: bool) -> Self {
        self.check_alignment = check_alignment;
        self
    }
}

impl Default for VerifierOptions {
    fn default() -> Self {
        VerifierOptions {
            max_depth: 64,
            max_tables: 1_000_000,
            max_apparent_size: MAX_BUFFER_SIZE,
            check_alignment: true,
        }
    }
}

/// A structure that can be checked in place.
pub trait Verifiable {
    /// Whether vector elements of this type are stored inline rather than as
    /// offsets.
    const INLINE: bool = false;

    /// Size of one vector element slot.
    const ELEMENT_SIZE: usize = SIZE_UOFFSET;

    /// Checks the structure starting at `pos`.
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()>;

    /// Checks the vector element in the slot at `slot`.
    fn verify_element(v: &mut Verifier<'_, '_>, slot: usize) -> Result<()> {
        v.check_alignment(slot, SIZE_UOFFSET)?;
        let target = v.view().resolve_indirect(slot)?;
        Self::run_verifier(v, target)
    }
}

/// Walks a buffer from its root, checking every reachable structure.
pub struct Verifier<'a, 'o> {
    view: BufferView<'a>,
    options: &'o VerifierOptions,
    /// Position of `view` within the originally aligned buffer.
    align_origin: usize,
    depth: usize,
    num_tables: usize,
    apparent_size: usize,
}

impl<'a, 'o> Verifier<'a, 'o> {
    pub fn new(data: &'a [u8], options: &'o VerifierOptions) -> Verifier<'a, 'o> {
        Verifier {
            view: BufferView::new(data),
            options,
            align_origin: 0,
            depth: 0,
            num_tables: 0,
            apparent_size: 0,
        }
    }

    #[inline]
    pub fn view(&self) -> BufferView<'a> {
        self.view
    }

    /// Number of tables visited so far.
    pub fn num_tables(&self) -> usize {
        self.num_tables
    }

    /// Total size of the structures visited so far.
    pub fn apparent_size(&self) -> usize {
        self.apparent_size
    }

    /// Verifies the whole buffer, reading its root as `T`.
    pub fn verify_root<T: Verifiable>(&mut self) -> Result<()> {
        if self.view.len() > MAX_BUFFER_SIZE {
            return Err(Error::invalid_format(
                "buffer",
                format!("size {} exceeds the format limit", self.view.len()),
            ));
        }
        let root = self.view.resolve_indirect(0)?;
        T::run_verifier(self, root)?;
        log::debug!(
            "verified buffer of {} bytes: {} tables, apparent size {}",
            self.view.len(),
            self.num_tables,
            self.apparent_size
        );
        Ok(())
    }

    /// Checks the table header and vtable at `pos` and returns a verifier
    /// for its fields. The caller must call [`TableVerifier::finish`].
    pub fn visit_table<'v>(&'v mut self, pos: usize) -> Result<TableVerifier<'v, 'a, 'o>> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(Error::invalid_format(
                "verifier",
                format!("table nesting exceeds the limit of {}", self.options.max_depth),
            ));
        }
        self.num_tables += 1;
        if self.num_tables > self.options.max_tables {
            return Err(Error::invalid_format(
                "verifier",
                format!("more than {} tables", self.options.max_tables),
            ));
        }
        self.check_alignment(pos, SIZE_SOFFSET)?;
        let vtable = VTable::for_table(self.view, pos)?;
        self.check_alignment(vtable.position(), SIZE_VOFFSET)?;
        let inline_size = vtable.table_inline_size();
        if inline_size < SIZE_SOFFSET {
            return Err(Error::invalid_format(
                "vtable",
                format!("table inline size {inline_size} is smaller than its header"),
            ));
        }
        self.view.check(pos, inline_size)?;
        self.add_apparent_size(inline_size + vtable.byte_size())?;
        log::trace!(
            "visit_table: pos {pos}, depth {}, {} slots",
            self.depth,
            vtable.num_slots()
        );
        Ok(TableVerifier {
            verifier: self,
            position: pos,
            vtable,
        })
    }

    /// Checks the vector of `E` whose count prefix is at `pos`.
    pub fn visit_vector<E: Verifiable>(&mut self, pos: usize) -> Result<()> {
        self.check_alignment(pos, SIZE_UOFFSET)?;
        let len = self.view.read_uoffset(pos)? as usize;
        let body = pos + SIZE_UOFFSET;
        let size = len
            .checked_mul(E::ELEMENT_SIZE)
            .ok_or_else(|| Error::out_of_range(body, usize::MAX, self.view.len()))?;
        self.view.check(body, size)?;
        self.check_alignment(body, E::ELEMENT_SIZE)?;
        self.add_apparent_size(SIZE_UOFFSET + size)?;
        if !E::INLINE {
            for i in 0..len {
                E::verify_element(self, body + i * E::ELEMENT_SIZE)?;
            }
        }
        Ok(())
    }

    /// Fails when `pos` is not a multiple of `alignment` in the original
    /// buffer, if alignment checks are enabled.
    pub fn check_alignment(&self, pos: usize, alignment: usize) -> Result<()> {
        if !self.options.check_alignment || is_aligned(self.align_origin + pos, alignment) {
            return Ok(());
        }
        Err(Error::invalid_format(
            "alignment",
            format!("position {pos} is not aligned to {alignment}"),
        ))
    }

    fn add_apparent_size(&mut self, size: usize) -> Result<()> {
        self.apparent_size = self.apparent_size.saturating_add(size);
        if self.apparent_size > self.options.max_apparent_size {
            return Err(Error::invalid_format(
                "verifier",
                format!(
                    "apparent size exceeds the limit of {}",
                    self.options.max_apparent_size
                ),
            ));
        }
        Ok(())
    }
}

/// Checks the fields of one table, in the style of a builder chain:
///
/// ```ignore
/// v.visit_table(pos)?
///     .visit_field::<bool>("is_in_memory", 0, false)?
///     .visit_reference::<StrItem>("name", 1, true)?
///     .finish();
/// ```
pub struct TableVerifier<'v, 'a, 'o> {
    verifier: &'v mut Verifier<'a, 'o>,
    position: usize,
    vtable: VTable<'a>,
}

impl<'v, 'a, 'o> TableVerifier<'v, 'a, 'o> {
    /// Checks an inline scalar field.
    pub fn visit_field<T: Scalar>(self, name: &str, slot: usize, required: bool) -> Result<Self> {
        if let Some(loc) = self.field(name, slot, required, T::SIZE)? {
            self.verifier.check_alignment(loc, T::SIZE)?;
        }
        Ok(self)
    }

    /// Checks a reference field and the structure it points to.
    pub fn visit_reference<T: Verifiable>(
        self,
        name: &str,
        slot: usize,
        required: bool,
    ) -> Result<Self> {
        if let Some(loc) = self.field(name, slot, required, SIZE_UOFFSET)? {
            self.verifier.check_alignment(loc, SIZE_UOFFSET)?;
            let target = self.verifier.view.resolve_indirect(loc)?;
            T::run_verifier(self.verifier, target)?;
        }
        Ok(self)
    }

    /// Checks a union stored in `type_slot`/`value_slot`. `variant` verifies
    /// the value for a given tag; unknown tags should be accepted.
    pub fn visit_union<F>(
        self,
        name: &str,
        type_slot: usize,
        value_slot: usize,
        required: bool,
        variant: F,
    ) -> Result<Self>
    where
        F: FnOnce(u8, &mut Verifier<'a, 'o>, usize) -> Result<()>,
    {
        let tag = match self.field(name, type_slot, required, 1)? {
            Some(loc) => self.verifier.view.read::<u8>(loc)?,
            None => UNION_NONE,
        };
        if tag == UNION_NONE {
            return Ok(self);
        }
        let Some(loc) = self.field(name, value_slot, false, SIZE_UOFFSET)? else {
            return Err(Error::invalid_format(
                "union",
                format!("'{name}' has type {tag} but no value"),
            ));
        };
        self.verifier.check_alignment(loc, SIZE_UOFFSET)?;
        let target = self.verifier.view.resolve_indirect(loc)?;
        variant(tag, self.verifier, target)?;
        Ok(self)
    }

    /// Leaves the table.
    pub fn finish(self) {
        self.verifier.depth -= 1;
    }

    fn field(
        &self,
        name: &str,
        slot: usize,
        required: bool,
        size: usize,
    ) -> Result<Option<usize>> {
        let Some(offset) = self.vtable.field_offset(slot) else {
            if required {
                return Err(Error::invalid_format(
                    "table",
                    format!("required field '{name}' is missing"),
                ));
            }
            return Ok(None);
        };
        let offset = offset as usize;
        if offset < SIZE_SOFFSET || offset + size > self.vtable.table_inline_size() {
            return Err(Error::invalid_format(
                "table",
                format!(
                    "field '{name}' at +{offset} does not fit the inline size {}",
                    self.vtable.table_inline_size()
                ),
            ));
        }
        Ok(Some(self.position + offset))
    }
}

macro_rules! impl_verifiable_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Verifiable for $ty {
                const INLINE: bool = true;
                const ELEMENT_SIZE: usize = <$ty as Scalar>::SIZE;

                fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
                    v.check_alignment(pos, <$ty as Scalar>::SIZE)?;
                    v.view().check(pos, <$ty as Scalar>::SIZE)
                }

                fn verify_element(_v: &mut Verifier<'_, '_>, _slot: usize) -> Result<()> {
                    Ok(())
                }
            }
        )*
    };
}

impl_verifiable_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, bool);

impl Verifiable for StrItem {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
        v.check_alignment(pos, SIZE_UOFFSET)?;
        let text = v.view().read_str(pos)?;
        v.add_apparent_size(SIZE_UOFFSET + text.len() + 1)
    }
}

impl Verifiable for BytesItem {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
        v.visit_vector::<u8>(pos)
    }
}

impl<T: Verifiable> Verifiable for TableItem<T> {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
        T::run_verifier(v, pos)
    }
}

impl<E: Verifiable> Verifiable for Vector<'_, E> {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
        v.visit_vector::<E>(pos)
    }
}

impl Verifiable for Table<'_> {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
        v.visit_table(pos)?.finish();
        Ok(())
    }
}

/// Verifies `data` with its root read as `T`.
pub fn verify_root<T: Verifiable>(data: &[u8], options: &VerifierOptions) -> Result<()> {
    Verifier::new(data, options).verify_root::<T>()
}

/// Verifies a buffer produced by `Builder::finish_size_prefixed`.
pub fn verify_size_prefixed_root<T: Verifiable>(
    data: &[u8],
    options: &VerifierOptions,
) -> Result<()> {
    let payload = size_prefixed_payload(data)?;
    let mut verifier = Verifier::new(payload, options);
    verifier.align_origin = SIZE_SIZE_PREFIX;
    verifier.verify_root::<T>()
}

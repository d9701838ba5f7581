//! Typed, lazy views over length-prefixed element runs.

use std::marker::PhantomData;

use tablebuf_common::{Error, Result};

use crate::{
    SIZE_UOFFSET,
    table::{Table, TableAccessor},
    view::BufferView,
};

/// Describes how a vector element is decoded from its slot.
///
/// Scalars are read in place; reference elements hold a `u32` offset relative
/// to the slot and are followed before the child view is built.
pub trait Follow<'a> {
    type Inner;

    /// Distance between consecutive slots.
    const STRIDE: usize;

    fn follow(view: BufferView<'a>, slot: usize) -> Result<Self::Inner>;
}

macro_rules! impl_follow_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a> Follow<'a> for $ty {
                type Inner = $ty;
                const STRIDE: usize = <$ty as crate::scalar::Scalar>::SIZE;

                #[inline]
                fn follow(view: BufferView<'a>, slot: usize) -> Result<$ty> {
                    view.read::<$ty>(slot)
                }
            }
        )*
    };
}

impl_follow_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, bool);

/// Element marker for vectors of strings.
pub enum StrItem {}

impl<'a> Follow<'a> for StrItem {
    type Inner = &'a str;
    const STRIDE: usize = SIZE_UOFFSET;

    #[inline]
    fn follow(view: BufferView<'a>, slot: usize) -> Result<&'a str> {
        view.read_str(view.resolve_indirect(slot)?)
    }
}

/// Element marker for vectors of byte vectors.
pub enum BytesItem {}

impl<'a> Follow<'a> for BytesItem {
    type Inner = &'a [u8];
    const STRIDE: usize = SIZE_UOFFSET;

    #[inline]
    fn follow(view: BufferView<'a>, slot: usize) -> Result<&'a [u8]> {
        view.read_bytes(view.resolve_indirect(slot)?)
    }
}

/// Element marker for vectors of tables of accessor type `T`.
pub struct TableItem<T>(PhantomData<T>);

impl<'a, T: TableAccessor<'a>> Follow<'a> for TableItem<T> {
    type Inner = T;
    const STRIDE: usize = SIZE_UOFFSET;

    #[inline]
    fn follow(view: BufferView<'a>, slot: usize) -> Result<T> {
        Ok(T::from_table(Table::new(view, view.resolve_indirect(slot)?)))
    }
}

/// A vector of `len` elements starting right after its `u32` count prefix.
///
/// Element access is lazy; `get(i)` is idempotent and cheap, and the whole
/// element region is bounds-checked once when the vector is opened.
pub struct Vector<'a, E> {
    view: BufferView<'a>,
    position: usize,
    len: usize,
    _marker: PhantomData<E>,
}

impl<'a, E: Follow<'a>> Vector<'a, E> {
    /// Opens the vector whose count prefix is at `position`.
    pub fn at(view: BufferView<'a>, position: usize) -> Result<Vector<'a, E>> {
        let len = view.read_uoffset(position)? as usize;
        let body = position + SIZE_UOFFSET;
        let size = len
            .checked_mul(E::STRIDE)
            .ok_or_else(|| Error::out_of_range(body, usize::MAX, view.len()))?;
        view.check(body, size)?;
        Ok(Vector {
            view,
            position,
            len,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of the count prefix.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the element at `index`, or `IndexOutOfRange` when
    /// `index >= len()`.
    pub fn get(&self, index: usize) -> Result<E::Inner> {
        if index >= self.len {
            return Err(Error::index_out_of_range(index, self.len));
        }
        E::follow(self.view, self.slot(index))
    }

    pub fn first(&self) -> Option<Result<E::Inner>> {
        (!self.is_empty()).then(|| self.get(0))
    }

    pub fn last(&self) -> Option<Result<E::Inner>> {
        (!self.is_empty()).then(|| self.get(self.len - 1))
    }

    /// Iterates over the elements; each call starts from the beginning.
    pub fn iter(&self) -> VectorIter<'a, E> {
        VectorIter {
            vector: *self,
            front: 0,
            back: self.len,
        }
    }

    /// Decodes all elements into a `Vec`, failing on the first bad element.
    pub fn to_vec(&self) -> Result<Vec<E::Inner>> {
        self.iter().collect()
    }

    #[inline]
    fn slot(&self, index: usize) -> usize {
        self.position + SIZE_UOFFSET + index * E::STRIDE
    }
}

impl<'a> Vector<'a, u8> {
    /// The element payload as a byte slice, without copying.
    pub fn as_bytes(&self) -> &'a [u8] {
        let start = self.position + SIZE_UOFFSET;
        &self.view.as_slice()[start..start + self.len]
    }
}

impl<E> Clone for Vector<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Vector<'_, E> {}

impl<E> std::fmt::Debug for Vector<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("position", &self.position)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a, E: Follow<'a>> IntoIterator for Vector<'a, E> {
    type Item = Result<E::Inner>;
    type IntoIter = VectorIter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of a [`Vector`].
pub struct VectorIter<'a, E> {
    vector: Vector<'a, E>,
    front: usize,
    back: usize,
}

impl<'a, E: Follow<'a>> Iterator for VectorIter<'a, E> {
    type Item = Result<E::Inner>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        Some(self.vector.get(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, E: Follow<'a>> DoubleEndedIterator for VectorIter<'a, E> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.vector.get(self.back))
    }
}

impl<'a, E: Follow<'a>> ExactSizeIterator for VectorIter<'a, E> {}

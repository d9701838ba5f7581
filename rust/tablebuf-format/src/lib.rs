//! Zero-copy table serialization: a back-to-front [`builder::Builder`] that
//! lays out schema-defined tables, vectors and strings, and lazy, bounds-checked
//! accessors that read them in place.
//!
//! Buffer layout (little-endian throughout):
//!
//! ```text
//! [size_prefix: u32]?          only for size-prefixed buffers
//! root: u32                    relative to its own position
//! [file_identifier: [u8; 4]]?
//! ...                          vtables, tables, vectors, strings
//! ```
//!
//! A table starts with an `i32` offset to its vtable (`vtable = table - soffset`).
//! A vtable is `u16 byte_size, u16 inline_size, u16 field_offset[..]`, where a
//! zero field offset marks an absent field.

pub mod builder;
pub mod defs;
pub mod message;
pub mod root;
pub mod scalar;
pub mod table;
pub mod union;
pub mod vector;
pub mod verifier;
pub mod view;
pub mod vtable;
#[cfg(test)]
mod tests;

pub use builder::{Builder, BuilderOptions, Offset, StringOffset, VectorOffset};
pub use root::{
    buffer_has_identifier, root, root_mut, root_with_identifier, size_prefixed_root,
};
pub use scalar::Scalar;
pub use table::{Table, TableAccessor, TableMut};
pub use union::UnionRef;
pub use vector::{BytesItem, Follow, StrItem, TableItem, Vector};
pub use verifier::{Verifiable, Verifier, VerifierOptions};
pub use view::BufferView;
pub use vtable::VTable;

/// Size of an unsigned relative offset.
pub const SIZE_UOFFSET: usize = 4;

/// Size of the signed table-to-vtable offset.
pub const SIZE_SOFFSET: usize = 4;

/// Size of a vtable entry.
pub const SIZE_VOFFSET: usize = 2;

/// Size of the optional length prefix of a size-prefixed buffer.
pub const SIZE_SIZE_PREFIX: usize = 4;

/// Length of the optional file identifier following the root offset.
pub const FILE_IDENTIFIER_LENGTH: usize = 4;

/// `byte_size` and `inline_size` entries at the start of each vtable.
pub const VTABLE_HEADER_SIZE: usize = 2 * SIZE_VOFFSET;

/// Largest buffer a builder may produce; all relative offsets must fit `i32`.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// Union type tag meaning "no value".
pub const UNION_NONE: u8 = 0;

/// Size of the serialized message length prefix.
pub const MESSAGE_LEN_SIZE: usize = 4;

/// Size of the message checksum suffix.
pub const CHECKSUM_SIZE: usize = 4;

pub const FORMAT_VERSION_MAJOR: u16 = 1;
pub const FORMAT_VERSION_MINOR: u16 = 0;

/// Runtime version string that generated accessor modules check against at
/// compile time via [`check_version_compatibility`].
pub const FORMAT_VERSION: &str = "tablebuf-format-1.0";

/// Fails const evaluation when generated code targets a different major
/// version of the runtime.
///
/// Generated modules call it as `const _: () = check_version_compatibility("tablebuf-format-1.0");`.
pub const fn check_version_compatibility(generated: &str) {
    let generated = generated.as_bytes();
    let runtime = FORMAT_VERSION.as_bytes();
    let mut i = 0;
    loop {
        if i >= generated.len() || i >= runtime.len() || generated[i] != runtime[i] {
            panic!("generated code targets an incompatible tablebuf-format version");
        }
        if generated[i] == b'.' {
            break;
        }
        i += 1;
    }
}

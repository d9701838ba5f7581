//! Accessors for the settings schema:
//!
//! ```text
//! namespace openxml_office.document_2007;
//! table DocumentSettingsModel {}
//!
//! namespace openxml_office.presentation_2007;
//! table PresentationPropertiesModel {
//!     is_in_memory: bool = false;
//! }
//! ```

pub use root::*;

const _: () = crate::check_version_compatibility("tablebuf-format-1.0");

/// The root namespace
mod root {
    /// The namespace `openxml_office.document_2007`
    pub mod document_2007 {
        use tablebuf_common::{Error, Result};

        use crate::{
            Builder, Offset, Table, TableAccessor, TableItem, Vector, Verifiable, Verifier,
        };

        /// The table `DocumentSettingsModel`
        ///
        /// The table declares no fields.
        #[derive(
            Clone,
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        pub struct DocumentSettingsModel {}

        impl DocumentSettingsModel {
            /// Creates a [DocumentSettingsModelBuilder] for serializing an instance of this table.
            #[inline]
            pub fn builder(builder: &mut Builder) -> Result<DocumentSettingsModelBuilder<'_>> {
                DocumentSettingsModelBuilder::start(builder)
            }

            #[allow(clippy::too_many_arguments)]
            pub fn create(builder: &mut Builder) -> Result<Offset<DocumentSettingsModel>> {
                DocumentSettingsModelBuilder::start(builder)?.finish()
            }

            /// Serializes this value into `builder`.
            #[inline]
            pub fn prepare(&self, builder: &mut Builder) -> Result<Offset<DocumentSettingsModel>> {
                DocumentSettingsModel::create(builder)
            }
        }

        /// Builder for serializing an instance of the [DocumentSettingsModel] type.
        pub struct DocumentSettingsModelBuilder<'b> {
            builder: &'b mut Builder,
        }

        impl<'b> DocumentSettingsModelBuilder<'b> {
            pub const NUM_FIELDS: usize = 0;

            /// Opens the table in `builder`.
            pub fn start(builder: &'b mut Builder) -> Result<DocumentSettingsModelBuilder<'b>> {
                builder.start_table(Self::NUM_FIELDS)?;
                Ok(DocumentSettingsModelBuilder { builder })
            }

            /// Closes the table and returns its offset.
            #[inline]
            pub fn finish(self) -> Result<Offset<DocumentSettingsModel>> {
                self.builder.end_table()
            }
        }

        /// Reference to a serialized [DocumentSettingsModel].
        #[derive(Copy, Clone)]
        pub struct DocumentSettingsModelRef<'a>(Table<'a>);

        impl<'a> DocumentSettingsModelRef<'a> {
            /// Reads the root of a finished buffer.
            #[inline]
            pub fn from_root(data: &'a [u8]) -> Result<DocumentSettingsModelRef<'a>> {
                crate::root(data)
            }

            /// Reads the root of a size-prefixed buffer.
            #[inline]
            pub fn from_size_prefixed_root(data: &'a [u8]) -> Result<DocumentSettingsModelRef<'a>> {
                crate::size_prefixed_root(data)
            }
        }

        impl<'a> TableAccessor<'a> for DocumentSettingsModelRef<'a> {
            const NAME: &'static str = "DocumentSettingsModel";

            #[inline]
            fn from_table(table: Table<'a>) -> Self {
                DocumentSettingsModelRef(table)
            }

            #[inline]
            fn as_table(&self) -> Table<'a> {
                self.0
            }
        }

        impl<'a> ::core::fmt::Debug for DocumentSettingsModelRef<'a> {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct("DocumentSettingsModelRef").finish()
            }
        }

        impl<'a> ::core::convert::TryFrom<DocumentSettingsModelRef<'a>> for DocumentSettingsModel {
            type Error = Error;

            fn try_from(_value: DocumentSettingsModelRef<'a>) -> Result<Self> {
                Ok(DocumentSettingsModel {})
            }
        }

        impl<'a> Verifiable for DocumentSettingsModelRef<'a> {
            fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
                v.visit_table(pos)?.finish();
                Ok(())
            }
        }

        /// A vector of [DocumentSettingsModel] tables.
        pub type DocumentSettingsModelVector<'a> =
            Vector<'a, TableItem<DocumentSettingsModelRef<'a>>>;
    }

    /// The namespace `openxml_office.presentation_2007`
    pub mod presentation_2007 {
        use tablebuf_common::{Error, Result};

        use crate::{
            Builder, Offset, Table, TableAccessor, TableItem, TableMut, Vector, Verifiable,
            Verifier,
        };

        /// The table `PresentationPropertiesModel`
        #[derive(
            Clone,
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        pub struct PresentationPropertiesModel {
            /// The field `is_in_memory` in the table `PresentationPropertiesModel`
            pub is_in_memory: bool,
        }

        impl PresentationPropertiesModel {
            /// Slot of the `is_in_memory` field.
            pub const SLOT_IS_IN_MEMORY: usize = 0;

            /// Creates a [PresentationPropertiesModelBuilder] for serializing an instance of this table.
            #[inline]
            pub fn builder(builder: &mut Builder) -> Result<PresentationPropertiesModelBuilder<'_>> {
                PresentationPropertiesModelBuilder::start(builder)
            }

            #[allow(clippy::too_many_arguments)]
            pub fn create(
                builder: &mut Builder,
                field_is_in_memory: bool,
            ) -> Result<Offset<PresentationPropertiesModel>> {
                let mut table = PresentationPropertiesModelBuilder::start(builder)?;
                table.add_is_in_memory(field_is_in_memory)?;
                table.finish()
            }

            /// Serializes this value into `builder`.
            #[inline]
            pub fn prepare(
                &self,
                builder: &mut Builder,
            ) -> Result<Offset<PresentationPropertiesModel>> {
                PresentationPropertiesModel::create(builder, self.is_in_memory)
            }
        }

        /// Builder for serializing an instance of the [PresentationPropertiesModel] type.
        pub struct PresentationPropertiesModelBuilder<'b> {
            builder: &'b mut Builder,
        }

        impl<'b> PresentationPropertiesModelBuilder<'b> {
            pub const NUM_FIELDS: usize = 1;

            /// Opens the table in `builder`.
            pub fn start(builder: &'b mut Builder) -> Result<PresentationPropertiesModelBuilder<'b>> {
                builder.start_table(Self::NUM_FIELDS)?;
                Ok(PresentationPropertiesModelBuilder { builder })
            }

            /// Setter for the [`is_in_memory` field](PresentationPropertiesModel#structfield.is_in_memory).
            #[inline]
            pub fn add_is_in_memory(&mut self, value: bool) -> Result<&mut Self> {
                self.builder.add_field::<bool>(
                    PresentationPropertiesModel::SLOT_IS_IN_MEMORY,
                    value,
                    false,
                )?;
                Ok(self)
            }

            /// Closes the table and returns its offset.
            #[inline]
            pub fn finish(self) -> Result<Offset<PresentationPropertiesModel>> {
                self.builder.end_table()
            }
        }

        /// Reference to a serialized [PresentationPropertiesModel].
        #[derive(Copy, Clone)]
        pub struct PresentationPropertiesModelRef<'a>(Table<'a>);

        impl<'a> PresentationPropertiesModelRef<'a> {
            /// Reads the root of a finished buffer.
            #[inline]
            pub fn from_root(data: &'a [u8]) -> Result<PresentationPropertiesModelRef<'a>> {
                crate::root(data)
            }

            /// Reads the root of a size-prefixed buffer.
            #[inline]
            pub fn from_size_prefixed_root(
                data: &'a [u8],
            ) -> Result<PresentationPropertiesModelRef<'a>> {
                crate::size_prefixed_root(data)
            }

            /// Getter for the [`is_in_memory` field](PresentationPropertiesModel#structfield.is_in_memory).
            #[inline]
            pub fn is_in_memory(&self) -> Result<bool> {
                self.0
                    .get(PresentationPropertiesModel::SLOT_IS_IN_MEMORY, false)
            }
        }

        impl<'a> TableAccessor<'a> for PresentationPropertiesModelRef<'a> {
            const NAME: &'static str = "PresentationPropertiesModel";

            #[inline]
            fn from_table(table: Table<'a>) -> Self {
                PresentationPropertiesModelRef(table)
            }

            #[inline]
            fn as_table(&self) -> Table<'a> {
                self.0
            }
        }

        impl<'a> ::core::fmt::Debug for PresentationPropertiesModelRef<'a> {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                let mut f = f.debug_struct("PresentationPropertiesModelRef");
                f.field("is_in_memory", &self.is_in_memory());
                f.finish()
            }
        }

        impl<'a> ::core::convert::TryFrom<PresentationPropertiesModelRef<'a>>
            for PresentationPropertiesModel
        {
            type Error = Error;

            fn try_from(value: PresentationPropertiesModelRef<'a>) -> Result<Self> {
                Ok(PresentationPropertiesModel {
                    is_in_memory: value.is_in_memory()?,
                })
            }
        }

        impl<'a> Verifiable for PresentationPropertiesModelRef<'a> {
            fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
                v.visit_table(pos)?
                    .visit_field::<bool>(
                        "is_in_memory",
                        PresentationPropertiesModel::SLOT_IS_IN_MEMORY,
                        false,
                    )?
                    .finish();
                Ok(())
            }
        }

        /// In-place updates of a serialized [PresentationPropertiesModel].
        pub struct PresentationPropertiesModelMut<'a>(TableMut<'a>);

        impl<'a> PresentationPropertiesModelMut<'a> {
            /// Opens the root of a finished buffer for updates.
            #[inline]
            pub fn from_root(data: &'a mut [u8]) -> Result<PresentationPropertiesModelMut<'a>> {
                Ok(PresentationPropertiesModelMut(crate::root_mut(data)?))
            }

            /// Overwrites `is_in_memory`. Returns `false` when the field was not
            /// written, in which case the buffer is unchanged.
            #[inline]
            pub fn set_is_in_memory(&mut self, value: bool) -> Result<bool> {
                self.0
                    .set(PresentationPropertiesModel::SLOT_IS_IN_MEMORY, value)
            }

            /// Read access to the same table.
            #[inline]
            pub fn as_reader(&self) -> PresentationPropertiesModelRef<'_> {
                PresentationPropertiesModelRef(self.0.as_table())
            }
        }

        /// A vector of [PresentationPropertiesModel] tables.
        pub type PresentationPropertiesModelVector<'a> =
            Vector<'a, TableItem<PresentationPropertiesModelRef<'a>>>;
    }
}

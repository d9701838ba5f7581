//! Sealed settings buffers: a settings table finished with
//! [`SETTINGS_FILE_IDENTIFIER`] and framed as a checksummed message.

use tablebuf_common::Result;

use crate::{
    Builder, BuilderOptions, Offset, TableAccessor, Verifiable, VerifierOptions,
    defs::{
        SETTINGS_FILE_IDENTIFIER,
        settings::{
            document_2007::{DocumentSettingsModel, DocumentSettingsModelRef},
            presentation_2007::{PresentationPropertiesModel, PresentationPropertiesModelRef},
        },
    },
    message, root_with_identifier,
    verifier::Verifier,
};

impl PresentationPropertiesModel {
    /// Serializes the value as a sealed settings message.
    pub fn to_message(&self) -> Result<Vec<u8>> {
        let mut builder = Builder::with_options(BuilderOptions::default().initial_capacity(64));
        let root = self.prepare(&mut builder)?;
        seal(&mut builder, root)
    }

    /// Validates, verifies and decodes a sealed settings message.
    pub fn from_message(message: &[u8], options: &VerifierOptions) -> Result<Self> {
        open::<PresentationPropertiesModelRef>(message, options)?.try_into()
    }
}

impl DocumentSettingsModel {
    /// Serializes the value as a sealed settings message.
    pub fn to_message(&self) -> Result<Vec<u8>> {
        let mut builder = Builder::with_options(BuilderOptions::default().initial_capacity(64));
        let root = self.prepare(&mut builder)?;
        seal(&mut builder, root)
    }

    /// Validates, verifies and decodes a sealed settings message.
    pub fn from_message(message: &[u8], options: &VerifierOptions) -> Result<Self> {
        open::<DocumentSettingsModelRef>(message, options)?.try_into()
    }
}

fn seal<T>(builder: &mut Builder, root: Offset<T>) -> Result<Vec<u8>> {
    builder.finish_with_identifier(root, SETTINGS_FILE_IDENTIFIER)?;
    Ok(message::seal(builder.finished_data()?))
}

fn open<'a, T>(message: &'a [u8], options: &VerifierOptions) -> Result<T>
where
    T: TableAccessor<'a> + Verifiable,
{
    let payload = message::validate_message(message)?;
    let root = root_with_identifier::<T>(payload, &SETTINGS_FILE_IDENTIFIER)?;
    Verifier::new(payload, options).verify_root::<T>()?;
    Ok(root)
}

//! Demo command implementation

use anyhow::{Context, Result};
use tablebuf_format::{
    Builder,
    defs::{
        SETTINGS_FILE_IDENTIFIER,
        settings::{
            document_2007::DocumentSettingsModel, presentation_2007::PresentationPropertiesModel,
        },
    },
};

use crate::{commands::Schema, utils::format_size};

pub fn run(schema: Schema, in_memory: bool, message: bool, output: String) -> Result<()> {
    let data = build(schema, in_memory, message)?;
    std::fs::write(&output, &data).with_context(|| format!("Failed to write {output}"))?;
    println!("Wrote {} to {output}", format_size(data.len() as u64));
    Ok(())
}

fn build(schema: Schema, in_memory: bool, message: bool) -> Result<Vec<u8>> {
    match (schema, message) {
        (Schema::Generic, _) => anyhow::bail!("demo needs a concrete schema"),
        (Schema::Presentation, true) => Ok(PresentationPropertiesModel {
            is_in_memory: in_memory,
        }
        .to_message()?),
        (Schema::Document, true) => Ok(DocumentSettingsModel {}.to_message()?),
        (Schema::Presentation, false) => {
            let mut builder = Builder::new();
            let root = PresentationPropertiesModel::create(&mut builder, in_memory)?;
            builder.finish_with_identifier(root, SETTINGS_FILE_IDENTIFIER)?;
            Ok(builder.finished_data()?.to_vec())
        }
        (Schema::Document, false) => {
            let mut builder = Builder::new();
            let root = DocumentSettingsModel::create(&mut builder)?;
            builder.finish_with_identifier(root, SETTINGS_FILE_IDENTIFIER)?;
            Ok(builder.finished_data()?.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use tablebuf_format::{
        VerifierOptions, buffer_has_identifier,
        defs::settings::presentation_2007::PresentationPropertiesModelRef,
    };

    use super::*;

    #[test]
    fn test_demo_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presentation.bin");
        run(
            Schema::Presentation,
            true,
            false,
            path.to_string_lossy().into_owned(),
        )
        .unwrap();

        let data = std::fs::read(&path).unwrap();
        assert!(buffer_has_identifier(&data, &SETTINGS_FILE_IDENTIFIER, false));
        let model = PresentationPropertiesModelRef::from_root(&data).unwrap();
        assert!(model.is_in_memory().unwrap());

        let message = build(Schema::Document, false, true).unwrap();
        let decoded =
            DocumentSettingsModel::from_message(&message, &VerifierOptions::default()).unwrap();
        assert_eq!(decoded, DocumentSettingsModel {});

        assert!(build(Schema::Generic, false, false).is_err());
    }
}

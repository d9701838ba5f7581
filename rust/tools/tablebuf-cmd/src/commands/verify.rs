//! Verify command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tablebuf_format::{
    Table, TableAccessor, Verifiable, Verifier, VerifierOptions,
    defs::settings::{
        document_2007::{DocumentSettingsModel, DocumentSettingsModelRef},
        presentation_2007::{PresentationPropertiesModel, PresentationPropertiesModelRef},
    },
    root,
};

use crate::{commands::Schema, utils::read_buffer};

#[derive(Serialize)]
struct VerifySummary {
    schema: String,
    table_count: usize,
    apparent_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
}

pub fn run(schema: Schema, config: Option<String>, message: bool, input: String) -> Result<()> {
    let options = load_options(config.as_deref())?;
    let data = read_buffer(&input, message)?;
    let summary =
        verify(&data, schema, &options).with_context(|| format!("{input} failed verification"))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_options(config: Option<&str>) -> Result<VerifierOptions> {
    let Some(path) = config else {
        return Ok(VerifierOptions::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let options = serde_json::from_str(&text).with_context(|| format!("Invalid options in {path}"))?;
    log::debug!("verifier options: {options:?}");
    Ok(options)
}

fn verify(data: &[u8], schema: Schema, options: &VerifierOptions) -> Result<VerifySummary> {
    match schema {
        Schema::Generic => check::<Table>(data, options, |_| Ok(None)),
        Schema::Presentation => check::<PresentationPropertiesModelRef>(data, options, |r| {
            let value = PresentationPropertiesModel::try_from(r)?;
            Ok(Some(serde_json::to_value(value)?))
        }),
        Schema::Document => check::<DocumentSettingsModelRef>(data, options, |r| {
            let value = DocumentSettingsModel::try_from(r)?;
            Ok(Some(serde_json::to_value(value)?))
        }),
    }
}

fn check<'a, T>(
    data: &'a [u8],
    options: &VerifierOptions,
    decode: impl FnOnce(T) -> Result<Option<serde_json::Value>>,
) -> Result<VerifySummary>
where
    T: TableAccessor<'a> + Verifiable,
{
    let mut verifier = Verifier::new(data, options);
    verifier.verify_root::<T>()?;
    let value = decode(root::<T>(data)?)?;
    Ok(VerifySummary {
        schema: T::NAME.to_string(),
        table_count: verifier.num_tables(),
        apparent_size: verifier.apparent_size(),
        value,
    })
}

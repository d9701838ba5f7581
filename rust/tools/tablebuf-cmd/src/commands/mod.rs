//! Command implementations for tablebuf-cmd

pub mod demo;
pub mod inspect;
pub mod verify;

/// Root table types known to the tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Schema {
    /// Any table; only the generic table structure is checked
    Generic,
    /// `openxml_office.presentation_2007.PresentationPropertiesModel`
    Presentation,
    /// `openxml_office.document_2007.DocumentSettingsModel`
    Document,
}

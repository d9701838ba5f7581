#[allow(clippy::needless_lifetimes)]
#[path = "./settings.tbs.rs"]
pub mod settings;

pub mod settings_ext;

/// File identifier of sealed settings buffers.
pub const SETTINGS_FILE_IDENTIFIER: [u8; 4] = *b"OXST";

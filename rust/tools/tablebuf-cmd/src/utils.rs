//! Common utilities for tablebuf-cmd

use anyhow::{Context, Result};
use std::path::Path;
use tablebuf_format::message;

/// Checks if a file exists and is readable
pub fn validate_file_exists(path: &str) -> Result<()> {
    let file_path = Path::new(path);
    if !file_path.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }
    if !file_path.is_file() {
        anyhow::bail!("Path is not a file: {}", path);
    }
    Ok(())
}

/// Reads a buffer file. With `message`, the file is validated as a
/// checksummed message and only its payload is returned.
pub fn read_buffer(path: &str, message: bool) -> Result<Vec<u8>> {
    validate_file_exists(path)?;
    let data = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
    if !message {
        return Ok(data);
    }
    let payload = message::validate_message(&data)
        .with_context(|| format!("{path} is not a valid message"))?;
    log::debug!(
        "{path}: {} byte message, {} byte payload",
        data.len(),
        payload.len()
    );
    Ok(payload.to_vec())
}

/// Formats file size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Lowercase hex, bytes separated by spaces.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

//! Checksummed framing of finished buffers:
//!
//! ```text
//! len: u32 | payload: [u8; len] | checksum: u32
//! ```

use std::io::Write;

use tablebuf_common::{Error, ErrorKind, Result, verify_data};

use crate::{CHECKSUM_SIZE, MESSAGE_LEN_SIZE};

/// Validates a message and returns its payload.
///
/// # Errors
///
/// `InvalidFormat` if the message is shorter than its declared payload plus
/// framing, `ChecksumMismatch` if the payload does not match its checksum.
pub fn validate_message(message: &[u8]) -> Result<&[u8]> {
    verify_data!(message, message.len() >= MESSAGE_LEN_SIZE + CHECKSUM_SIZE);
    let size = u32::from_le_bytes([message[0], message[1], message[2], message[3]]) as usize;
    verify_data!(
        size,
        size <= message.len() - MESSAGE_LEN_SIZE - CHECKSUM_SIZE
    );
    let message = &message[MESSAGE_LEN_SIZE..];
    let (payload, rest) = message.split_at(size);
    let checksum = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
    validate_buffer(payload, checksum, Some("message"))?;
    Ok(payload)
}

/// Compares the checksum of `buf` with `checksum`.
pub fn validate_buffer(buf: &[u8], checksum: u32, name: Option<&str>) -> Result<()> {
    if compute(buf) == checksum {
        Ok(())
    } else {
        Err(ErrorKind::ChecksumMismatch {
            element: name.unwrap_or_default().to_string(),
        }
        .into())
    }
}

/// xxh3-64 of `buf`, folded to 32 bits.
pub fn compute(buf: &[u8]) -> u32 {
    let h = xxhash_rust::xxh3::xxh3_64(buf);
    (h as u32) ^ ((h >> 32) as u32)
}

/// Frames `payload` as a message.
pub fn seal(payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(MESSAGE_LEN_SIZE + payload.len() + CHECKSUM_SIZE);
    message.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    message.extend_from_slice(payload);
    message.extend_from_slice(&compute(payload).to_le_bytes());
    message
}

/// Frames `payload` as a message into `writer`.
pub fn write_message<W: Write>(payload: &[u8], writer: &mut W) -> Result<()> {
    write_all(writer, &(payload.len() as u32).to_le_bytes())?;
    write_all(writer, payload)?;
    write_all(writer, &compute(payload).to_le_bytes())
}

fn write_all<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer
        .write_all(bytes)
        .map_err(|e| Error::io("write_message", e))
}

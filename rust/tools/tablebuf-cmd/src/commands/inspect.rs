//! Inspect command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tablebuf_format::{FILE_IDENTIFIER_LENGTH, SIZE_UOFFSET, Table, root};

use crate::utils::{format_size, read_buffer, to_hex};

#[derive(Serialize)]
struct InspectSummary {
    buffer_size: String,
    root_position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
    root_table: TableInfo,
}

#[derive(Serialize)]
struct TableInfo {
    vtable_position: usize,
    vtable_size: usize,
    inline_size: usize,
    slot_count: usize,
    present_field_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    slots: Vec<SlotInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_bytes: Option<String>,
}

#[derive(Serialize)]
struct SlotInfo {
    slot: usize,
    offset: u16,
    position: usize,
}

pub fn run(verbose: u8, message: bool, input: String) -> Result<()> {
    let data = read_buffer(&input, message)?;
    let summary = summarize(&data, verbose).with_context(|| format!("Failed to inspect {input}"))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn summarize(data: &[u8], verbose: u8) -> Result<InspectSummary> {
    let table = root::<Table>(data)?;
    let vtable = table.vtable()?;

    let slots = if verbose >= 1 {
        vtable
            .present_slots()
            .map(|(slot, offset)| SlotInfo {
                slot,
                offset,
                position: table.position() + offset as usize,
            })
            .collect()
    } else {
        Vec::new()
    };
    let inline_bytes = if verbose >= 2 {
        Some(to_hex(
            table
                .view()
                .bytes_at(table.position(), vtable.table_inline_size())?,
        ))
    } else {
        None
    };

    Ok(InspectSummary {
        buffer_size: format_size(data.len() as u64),
        root_position: table.position(),
        identifier: identifier(data, table.position(), vtable.position()),
        root_table: TableInfo {
            vtable_position: vtable.position(),
            vtable_size: vtable.byte_size(),
            inline_size: vtable.table_inline_size(),
            slot_count: vtable.num_slots(),
            present_field_count: vtable.present_slots().count(),
            slots,
            inline_bytes,
        },
    })
}

/// Bytes 4..8 read as a file identifier, when the root structures start past
/// them and the bytes are printable.
fn identifier(data: &[u8], root_position: usize, vtable_position: usize) -> Option<String> {
    let end = SIZE_UOFFSET + FILE_IDENTIFIER_LENGTH;
    if root_position.min(vtable_position) < end {
        return None;
    }
    let ident = data.get(SIZE_UOFFSET..end)?;
    ident
        .iter()
        .all(|b| b.is_ascii_graphic())
        .then(|| String::from_utf8_lossy(ident).into_owned())
}

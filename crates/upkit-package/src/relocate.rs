//! Payload growth transforms used when relocating an export.
//!
//! These are pure functions over payload bytes; the file side of relocation
//! lives in [`UpkPackage::relocate`](crate::UpkPackage::relocate).

use upkit_common::BinaryReader;

use crate::{Error, Result};

/// Size of the fixed head preceding a function's bytecode.
pub const FUNCTION_HEAD_SIZE: usize = 0x30;

/// Offset of the in-memory bytecode size inside a function payload.
pub const FUNCTION_MEMORY_SIZE_FIELD: usize = 0x28;

/// Offset of the serialized bytecode size inside a function payload.
pub const FUNCTION_FILE_SIZE_FIELD: usize = 0x2C;

/// Filler written into the gap opened inside a function's bytecode.
pub const FUNCTION_FILL_BYTE: u8 = 0x0B;

/// How a payload is laid out, which decides where growth is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadShape {
    /// Opaque bytes; growth is zero padding at the end.
    #[default]
    Opaque,
    /// Function object; growth is inserted before the bytecode's final byte.
    Function,
}

/// Grow `payload` to `new_size` bytes.
///
/// Payloads already at least `new_size` long are returned unchanged.
pub fn grow_payload(payload: &[u8], new_size: usize, shape: PayloadShape) -> Result<Vec<u8>> {
    if new_size <= payload.len() {
        return Ok(payload.to_vec());
    }
    match shape {
        PayloadShape::Opaque => Ok(pad_with_zeros(payload, new_size)),
        PayloadShape::Function => grow_function(payload, new_size),
    }
}

fn pad_with_zeros(payload: &[u8], new_size: usize) -> Vec<u8> {
    let mut grown = Vec::with_capacity(new_size);
    grown.extend_from_slice(payload);
    grown.resize(new_size, 0);
    grown
}

/// Open a gap of `new_size - payload.len()` filler bytes between the head
/// (everything before the bytecode's last byte) and the tail, and bump both
/// bytecode size fields by the same amount.
fn grow_function(payload: &[u8], new_size: usize) -> Result<Vec<u8>> {
    if payload.len() < FUNCTION_HEAD_SIZE {
        return Err(Error::MalformedFunction(format!(
            "payload is {} bytes, smaller than the {:#x} byte head",
            payload.len(),
            FUNCTION_HEAD_SIZE
        )));
    }

    let mut reader = BinaryReader::new_at(payload, FUNCTION_MEMORY_SIZE_FIELD);
    let memory_size = reader.read_u32()?;
    let file_size = reader.read_u32()?;

    let head_size = (file_size as usize)
        .checked_add(FUNCTION_HEAD_SIZE - 1)
        .filter(|&size| size <= payload.len());
    let Some(head_size) = head_size else {
        return Err(Error::MalformedFunction(format!(
            "bytecode size {:#x} overruns the {} byte payload",
            file_size,
            payload.len()
        )));
    };
    let tail_size = payload.len() - head_size;

    let diff = new_size - payload.len();
    let grow_field = |value: u32| {
        u32::try_from(diff)
            .ok()
            .and_then(|d| value.checked_add(d))
            .ok_or_else(|| Error::MalformedFunction(format!("size field {value:#x} overflows")))
    };
    let new_memory_size = grow_field(memory_size)?;
    let new_file_size = grow_field(file_size)?;

    let mut grown = vec![FUNCTION_FILL_BYTE; new_size];
    grown[..head_size].copy_from_slice(&payload[..head_size]);
    grown[FUNCTION_MEMORY_SIZE_FIELD..FUNCTION_MEMORY_SIZE_FIELD + 4]
        .copy_from_slice(&new_memory_size.to_le_bytes());
    grown[FUNCTION_FILE_SIZE_FIELD..FUNCTION_FILE_SIZE_FIELD + 4]
        .copy_from_slice(&new_file_size.to_le_bytes());
    grown[head_size + diff..].copy_from_slice(&payload[head_size..]);
    debug_assert_eq!(grown.len() - (head_size + diff), tail_size);

    Ok(grown)
}

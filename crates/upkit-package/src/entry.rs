//! Name, export and import table records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// An entry of the name table.
///
/// On disk: `length: u32`, the string with its terminator, then two opaque
/// u32 words (object flags in UE3 packages).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NameEntry {
    /// Stored length prefix, terminator included.
    pub length: u32,
    /// Stored bytes decoded one char per byte; see [`upkit_common::ansi`].
    pub name: String,
    pub flags_lo: u32,
    pub flags_hi: u32,
}

impl NameEntry {
    /// Size of the length prefix preceding the string bytes.
    pub const LENGTH_PREFIX_SIZE: u64 = 4;
}

/// An entry of the export (object) table.
///
/// Each record is 17 u32 words, optionally followed by
/// `num_additional_fields` extra words that are skipped on load.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(C)]
pub struct ExportEntry {
    /// Class reference (negative: import, positive: export).
    pub class_ref: i32,
    /// Super class reference.
    pub super_ref: i32,
    /// 1-based export index of the owner, 0 for none.
    pub owner_ref: u32,
    /// Index into the name table.
    pub name_idx: u32,
    pub name_number: u32,
    pub archetype_ref: i32,
    pub object_flags_hi: u32,
    pub object_flags_lo: u32,
    /// Serialized payload size in bytes.
    pub object_file_size: u32,
    /// Absolute file offset of the payload.
    pub data_offset: u32,
    pub export_flags: u32,
    /// Count of trailing u32 words following this record.
    pub num_additional_fields: u32,
    pub guid: [u32; 4],
    pub package_flags: u32,
}

impl ExportEntry {
    /// Size of the fixed part of a record.
    pub const SIZE: usize = 17 * 4;

    /// Byte offset of `object_file_size` inside a record.
    pub const FILE_SIZE_FIELD: u64 = 8 * 4;

    /// Byte offset of `data_offset` inside a record.
    pub const DATA_OFFSET_FIELD: u64 = 9 * 4;

    /// On-disk bytes taken by this record including its trailing words.
    #[inline]
    pub fn disk_size(&self) -> u64 {
        Self::SIZE as u64 + u64::from(self.num_additional_fields) * 4
    }
}

/// An entry of the import table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(C)]
pub struct ImportEntry {
    /// Name index of the package the object comes from.
    pub package_idx: u32,
    pub package_number: u32,
    /// Name index of the object's class.
    pub class_name_idx: u32,
    pub class_name_number: u32,
    /// Owner: positive is an export index, negative an import index, 0 is root.
    pub owner_ref: i32,
    /// Index into the name table.
    pub name_idx: u32,
    pub name_number: u32,
}

impl ImportEntry {
    /// Size of a record.
    pub const SIZE: usize = 7 * 4;
}

//! Package header.

use std::io::BufRead;

use byteorder::{LittleEndian, ReadBytesExt};
use upkit_common::ReadExt;

use crate::{Error, Result, Section};

/// The fixed prologue of a package and its three table descriptors.
///
/// Layout (little-endian):
///
/// | Field | Type |
/// |-------|------|
/// | signature | u32 |
/// | version | u16 |
/// | license_version | u16 |
/// | header_size | u32 |
/// | folder_name_length | u32 |
/// | folder_name | null-terminated single-byte string |
/// | package_flags | u32 |
/// | name_count, name_offset | u32, u32 |
/// | export_count, export_offset | u32, u32 |
/// | import_count, import_offset | u32, u32 |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackageHeader {
    pub signature: u32,
    pub version: u16,
    pub license_version: u16,
    pub header_size: u32,
    /// Informational only; the folder name is delimited by its terminator.
    pub folder_name_length: u32,
    pub folder_name: String,
    pub package_flags: u32,
    pub name_count: u32,
    pub name_offset: u32,
    pub export_count: u32,
    pub export_offset: u32,
    pub import_count: u32,
    pub import_offset: u32,
}

impl PackageHeader {
    /// Tag found at offset 0 of an Unreal package.
    pub const SIGNATURE: u32 = 0x9E2A83C1;

    /// Read the header from a stream positioned at offset 0.
    ///
    /// The signature is not checked; see [`has_valid_signature`](Self::has_valid_signature).
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self> {
        let eof = || Error::while_reading(Section::Header, 0);

        let signature = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let version = reader.read_u16::<LittleEndian>().map_err(eof())?;
        let license_version = reader.read_u16::<LittleEndian>().map_err(eof())?;
        let header_size = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let folder_name_length = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let folder_name = reader.read_cstring().map_err(eof())?;
        let package_flags = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let name_count = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let name_offset = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let export_count = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let export_offset = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let import_count = reader.read_u32::<LittleEndian>().map_err(eof())?;
        let import_offset = reader.read_u32::<LittleEndian>().map_err(eof())?;

        Ok(Self {
            signature,
            version,
            license_version,
            header_size,
            folder_name_length,
            folder_name,
            package_flags,
            name_count,
            name_offset,
            export_count,
            export_offset,
            import_count,
            import_offset,
        })
    }

    /// Check the signature against [`PackageHeader::SIGNATURE`].
    #[inline]
    pub fn has_valid_signature(&self) -> bool {
        self.signature == Self::SIGNATURE
    }

    /// `(section, count, offset)` for each of the three tables.
    pub fn tables(&self) -> [(Section, u32, u32); 3] {
        [
            (Section::Names, self.name_count, self.name_offset),
            (Section::Exports, self.export_count, self.export_offset),
            (Section::Imports, self.import_count, self.import_offset),
        ]
    }
}
